#![forbid(unsafe_code)]

//! The popup stack: a LIFO registry of live popups plus the routing
//! surface the environment talks to.
//!
//! The stack owns every [`PopupInstance`] and the [`PopupHost`]. The
//! environment reports input as [`PopupSignal`]s addressed by id; the
//! stack routes them to the right instance. An entry that reaches
//! `Closed` is pruned before the routing call returns.
//!
//! # Invariants
//!
//! - Registration order is creation order; the newest popup is topmost.
//! - An id is never reused; ids are process-unique and monotonic.
//! - Closing one popup removes exactly that entry; the relative order of
//!   the rest is untouched, and focus hands back to the new topmost.
//!
//! # Example
//!
//! ```ignore
//! let mut stack = PopupStack::new(Box::new(host));
//! let (id, future) = stack.open(
//!     PopupContent::Markup("<p>Delete?</p>".into()),
//!     PopupKind::Confirm,
//!     "",
//!     PopupOptions::default(),
//! )?;
//! stack.complete_affirmative(id)?;
//! assert!(stack.is_empty());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;
use web_time::Instant;

use crate::error::PopupError;
use crate::instance::{PopupFuture, PopupInstance};
use crate::kind::PopupKind;
use crate::options::PopupOptions;
use crate::result::ResultCode;
use crate::view::{ControlRef, FocusTarget, PopupContent, PopupHost};

static POPUP_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique popup identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupId(u64);

impl PopupId {
    fn next() -> Self {
        Self(POPUP_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging and ordering.
    pub fn value(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn test_id() -> Self {
        Self::next()
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "popup#{}", self.0)
    }
}

/// Input event routed to one popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupSignal {
    /// A bound control was activated.
    Activate(ControlRef),
    /// Enter was pressed while the popup had focus.
    EnterPressed,
    /// The environment requested dismissal (Escape, backdrop click).
    CancelRequested,
    /// An open/close transition reported completion.
    TransitionFinished,
}

/// What currently sits on top, for routing keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleLayer {
    /// No visible popup; input belongs to the application.
    Root,
    /// This popup is the topmost visible, non-closing layer.
    Popup(PopupId),
}

/// Owning registry of live popups.
pub struct PopupStack {
    entries: Vec<PopupInstance>,
    host: Box<dyn PopupHost>,
}

impl fmt::Debug for PopupStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupStack")
            .field("entries", &self.entries)
            .finish()
    }
}

impl PopupStack {
    /// Create an empty stack over the given host.
    pub fn new(host: Box<dyn PopupHost>) -> Self {
        Self {
            entries: Vec::new(),
            host,
        }
    }

    /// Build a popup and register it on top, without showing it.
    pub fn create(
        &mut self,
        content: PopupContent,
        kind: PopupKind,
        main_value: &str,
        options: PopupOptions,
    ) -> Result<PopupId, PopupError> {
        let id = PopupId::next();
        let instance =
            PopupInstance::new(id, content, kind, main_value, options, self.host.as_mut())?;
        trace!(%id, ?kind, depth = self.entries.len() + 1, "popup created");
        self.entries.push(instance);
        Ok(id)
    }

    /// Show a previously created popup. Single-shot per instance.
    pub fn show(&mut self, id: PopupId) -> Result<PopupFuture, PopupError> {
        self.get_mut(id).ok_or(PopupError::UnknownPopup(id))?.show()
    }

    /// Build, register, and show in one step.
    pub fn open(
        &mut self,
        content: PopupContent,
        kind: PopupKind,
        main_value: &str,
        options: PopupOptions,
    ) -> Result<(PopupId, PopupFuture), PopupError> {
        let id = self.create(content, kind, main_value, options)?;
        let future = self.show(id)?;
        Ok((id, future))
    }

    /// Route an input signal to a popup.
    pub fn signal(&mut self, id: PopupId, signal: PopupSignal) -> Result<(), PopupError> {
        {
            let Self { entries, host } = self;
            let instance = entries
                .iter_mut()
                .find(|entry| entry.id() == id)
                .ok_or(PopupError::UnknownPopup(id))?;
            match signal {
                PopupSignal::Activate(control) => instance.activate(control),
                PopupSignal::EnterPressed => instance.enter_pressed(host.as_ref()),
                PopupSignal::CancelRequested => instance.attempt_complete(ResultCode::Cancelled),
                PopupSignal::TransitionFinished => instance.transition_finished(),
            }
        }
        self.reap();
        Ok(())
    }

    /// Attempt completion with an explicit result code.
    pub fn complete(&mut self, id: PopupId, result: ResultCode) -> Result<(), PopupError> {
        self.get_mut(id)
            .ok_or(PopupError::UnknownPopup(id))?
            .attempt_complete(result);
        self.reap();
        Ok(())
    }

    /// Attempt an affirmative completion.
    pub fn complete_affirmative(&mut self, id: PopupId) -> Result<(), PopupError> {
        self.complete(id, ResultCode::Affirmative)
    }

    /// Attempt a negative completion.
    pub fn complete_negative(&mut self, id: PopupId) -> Result<(), PopupError> {
        self.complete(id, ResultCode::Negative)
    }

    /// Attempt a cancellation.
    pub fn complete_cancelled(&mut self, id: PopupId) -> Result<(), PopupError> {
        self.complete(id, ResultCode::Cancelled)
    }

    /// Advance transition fallback deadlines.
    pub fn tick(&mut self, now: Instant) {
        for entry in &mut self.entries {
            entry.tick(now);
        }
        self.reap();
    }

    /// Record the environment-reported focus position for a popup.
    pub fn note_focus(&mut self, id: PopupId, target: FocusTarget) -> Result<(), PopupError> {
        self.get_mut(id)
            .ok_or(PopupError::UnknownPopup(id))?
            .note_focus(target);
        Ok(())
    }

    /// Discard a popup outright; no-op when absent. Its future settles
    /// like a cancellation.
    pub fn remove(&mut self, id: PopupId) {
        let Some(index) = self.entries.iter().position(|entry| entry.id() == id) else {
            return;
        };
        let mut instance = self.entries.remove(index);
        instance.abandon();
        trace!(%id, "popup removed");
        if let Some(top) = self.entries.last_mut() {
            top.restore_last_focus();
        }
    }

    /// Topmost live popup, if any.
    pub fn topmost(&self) -> Option<&PopupInstance> {
        self.entries.last()
    }

    /// Shared access by id.
    pub fn get(&self, id: PopupId) -> Option<&PopupInstance> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Mutable access by id.
    pub fn get_mut(&mut self, id: PopupId) -> Option<&mut PopupInstance> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    /// Number of live popups, closed-but-unreaped included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no popups are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a popup with this id is registered.
    pub fn contains(&self, id: PopupId) -> bool {
        self.entries.iter().any(|entry| entry.id() == id)
    }

    /// Whether any popup surface is currently visible.
    pub fn is_any_open(&self) -> bool {
        self.entries.iter().any(PopupInstance::is_visible)
    }

    /// The topmost visible layer that still accepts input.
    ///
    /// Closing and closed popups are skipped so keyboard routing moves on
    /// the instant a completion is accepted, not when its transition ends.
    pub fn topmost_visible_layer(&self) -> VisibleLayer {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.is_visible() && !entry.is_closing() && !entry.is_closed())
            .map_or(VisibleLayer::Root, |entry| VisibleLayer::Popup(entry.id()))
    }

    /// Prune closed popups and hand focus back to the new topmost one.
    ///
    /// The routing entry points do this on their way out; calling it is
    /// only needed after driving an instance directly via `get_mut`.
    pub fn reap(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_closed());
        if self.entries.len() != before
            && let Some(top) = self.entries.last_mut()
        {
            top.restore_last_focus();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use proptest::prelude::*;

    fn stack() -> PopupStack {
        PopupStack::new(Box::new(HeadlessHost::new()))
    }

    fn open_text(stack: &mut PopupStack) -> PopupId {
        let (id, _future) = stack
            .open(
                PopupContent::Markup("<p>hi</p>".into()),
                PopupKind::Text,
                "",
                PopupOptions::default().animation(crate::options::Animation::None),
            )
            .unwrap();
        id
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut stack = stack();
        let a = open_text(&mut stack);
        let b = open_text(&mut stack);
        let c = open_text(&mut stack);
        assert!(a.value() < b.value());
        assert!(b.value() < c.value());
    }

    #[test]
    fn newest_is_topmost() {
        let mut stack = stack();
        let _a = open_text(&mut stack);
        let b = open_text(&mut stack);
        assert_eq!(stack.topmost().unwrap().id(), b);
        assert_eq!(stack.topmost_visible_layer(), VisibleLayer::Popup(b));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut stack = stack();
        let id = open_text(&mut stack);
        stack.complete_affirmative(id).unwrap();
        assert_eq!(
            stack.complete_affirmative(id),
            Err(PopupError::UnknownPopup(id))
        );
    }

    #[test]
    fn closing_prunes_exactly_that_entry() {
        let mut stack = stack();
        let a = open_text(&mut stack);
        let b = open_text(&mut stack);
        stack.complete_negative(b).unwrap();
        assert!(stack.contains(a));
        assert!(!stack.contains(b));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn closing_popup_yields_routing_to_the_one_below() {
        let mut stack = stack();
        let a = open_text(&mut stack);
        let b = {
            let (id, _f) = stack
                .open(
                    PopupContent::Markup("<p>slow</p>".into()),
                    PopupKind::Text,
                    "",
                    PopupOptions::default().animation(crate::options::Animation::Slow),
                )
                .unwrap();
            id
        };
        assert_eq!(stack.topmost_visible_layer(), VisibleLayer::Popup(b));
        stack.complete_affirmative(b).unwrap();
        // b is mid closing transition: still registered, no longer routed to.
        assert!(stack.contains(b));
        assert_eq!(stack.topmost_visible_layer(), VisibleLayer::Popup(a));
    }

    #[test]
    fn remove_settles_the_future_as_cancelled() {
        let mut stack = stack();
        let (id, mut future) = stack
            .open(
                PopupContent::Markup("x".into()),
                PopupKind::Text,
                "",
                PopupOptions::default().animation(crate::options::Animation::None),
            )
            .unwrap();
        stack.remove(id);
        assert_eq!(future.try_take(), Some(Ok(None)));
        assert!(!stack.contains(id));
        // absent id is a no-op
        stack.remove(id);
    }

    proptest! {
        #[test]
        fn registration_order_is_creation_order(count in 1usize..8) {
            let mut stack = stack();
            let mut ids = Vec::new();
            for _ in 0..count {
                ids.push(open_text(&mut stack));
            }
            prop_assert_eq!(stack.len(), count);
            prop_assert_eq!(stack.topmost().unwrap().id(), *ids.last().unwrap());
            for window in ids.windows(2) {
                prop_assert!(window[0].value() < window[1].value());
            }
        }

        #[test]
        fn completing_any_subset_preserves_relative_order(
            count in 2usize..7,
            close_mask in proptest::collection::vec(any::<bool>(), 2..7),
        ) {
            let mut stack = stack();
            let ids: Vec<_> = (0..count).map(|_| open_text(&mut stack)).collect();
            let mut kept = Vec::new();
            for (index, id) in ids.iter().enumerate() {
                if close_mask.get(index).copied().unwrap_or(false) {
                    stack.complete_cancelled(*id).unwrap();
                } else {
                    kept.push(*id);
                }
            }
            prop_assert_eq!(stack.len(), kept.len());
            for (index, id) in kept.iter().enumerate() {
                prop_assert!(stack.contains(*id));
                if index + 1 == kept.len() {
                    prop_assert_eq!(stack.topmost().unwrap().id(), *id);
                }
            }
        }
    }
}
