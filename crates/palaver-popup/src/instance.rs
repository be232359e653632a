#![forbid(unsafe_code)]

//! The popup state machine.
//!
//! Lifecycle: `Constructed → Opening → Open → Closing → Closed`. A
//! completion attempt (`Completing`) and its veto (`Vetoed`) are transient:
//! both resolve synchronously inside [`PopupInstance::attempt_complete`],
//! either by entering `Closing` or by falling back to `Open`.
//!
//! # Invariants
//!
//! - `result`/`value`/`input_results` stay unset until a completion attempt
//!   survives the veto hook.
//! - The one-shot result channel is written exactly once, on the
//!   `Closing → Closed` edge. A vetoed attempt never settles it.
//! - A closed instance is never reused; the stack prunes it immediately.
//!
//! # Failure Modes
//!
//! - Crop-canvas extraction failure rejects the future (`PopupError::Crop`)
//!   through the normal close path instead of being swallowed.
//! - Completion attempts on a closing/closed instance are ignored.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use ahash::AHashMap;
use futures::channel::oneshot;
use tracing::{trace, warn};
use web_time::Instant;

use crate::controls::{ButtonAction, InputKind, InputSpec, InputValue};
use crate::error::PopupError;
use crate::kind::PopupKind;
use crate::options::{Animation, CloseHook, ClosingHook, OpenHook, PopupOptions};
use crate::result::ResultCode;
use crate::stack::PopupId;
use crate::view::{ControlRef, FocusTarget, PopupContent, PopupHost, PopupView, TransitionPhase};

/// Extra wait granted to the environment's transition-finished signal
/// before the fallback deadline fires.
const TRANSITION_SLACK: Duration = Duration::from_millis(250);

/// Where an instance sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built and stacked, not yet shown.
    Constructed,
    /// Modal-visible, opening transition running.
    Opening,
    /// Interactive.
    Open,
    /// Completion accepted, closing transition running.
    Closing,
    /// Future resolved; awaiting removal from the stack.
    Closed,
}

/// Kind-dependent completion payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PopupValue {
    /// The result code itself (text/confirm/display kinds).
    Code(ResultCode),
    /// Main text field contents (input kind).
    Text(String),
    /// Image-encoded crop result (crop kind).
    Image(String),
}

/// Settled payload of a non-cancelled popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupOutcome {
    /// Kind-dependent value; `None` when the result was below affirmative.
    pub value: Option<PopupValue>,
    /// Why the popup completed.
    pub result: ResultCode,
    /// Harvested custom-input states, when the popup had custom inputs.
    pub input_results: Option<AHashMap<String, InputValue>>,
}

/// What `show()`'s future resolves to: `Ok(None)` for cancellation,
/// `Ok(Some(outcome))` otherwise, `Err` for propagated failures.
pub type ShowResult = Result<Option<PopupOutcome>, PopupError>;

/// One-shot future returned by `show()`.
///
/// Settles only on a genuine `Closed` transition. If the popup is removed
/// without ever resolving (stack dropped, explicit `remove`), the future
/// settles to `Ok(None)` like a cancellation.
#[derive(Debug)]
pub struct PopupFuture {
    rx: oneshot::Receiver<ShowResult>,
}

impl PopupFuture {
    /// Non-blocking read for synchronous callers; `None` while pending.
    pub fn try_take(&mut self) -> Option<ShowResult> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Ok(None)),
        }
    }
}

impl Future for PopupFuture {
    type Output = ShowResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Ok(None)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A control the engine listens to, with its bound result and action.
pub struct Binding {
    /// The control slot.
    pub control: ControlRef,
    /// Result the control completes with; `None` for action-only controls.
    pub result: Option<ResultCode>,
    action: Option<ButtonAction>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("control", &self.control)
            .field("result", &self.result)
            .field("action", &self.action.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A single modal popup: owns its view binding and produces one
/// asynchronous result.
pub struct PopupInstance {
    id: PopupId,
    kind: PopupKind,
    animation: Animation,
    default_result: ResultCode,
    custom_inputs: Vec<InputSpec>,
    bindings: Vec<Binding>,
    on_open: Option<OpenHook>,
    on_closing: Option<ClosingHook>,
    on_close: Option<CloseHook>,
    view: Box<dyn PopupView>,
    state: Lifecycle,
    deadline: Option<Instant>,
    result: Option<ResultCode>,
    value: Option<PopupValue>,
    input_results: Option<AHashMap<String, InputValue>>,
    closing_vetoed: bool,
    last_focused: Option<FocusTarget>,
    resolver: Option<oneshot::Sender<ShowResult>>,
    receiver: Option<oneshot::Receiver<ShowResult>>,
    pending: Option<ShowResult>,
}

impl fmt::Debug for PopupInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("result", &self.result)
            .field("closing_vetoed", &self.closing_vetoed)
            .finish()
    }
}

impl PopupInstance {
    /// Build an instance: clone the template, apply kind defaults and
    /// options, bind controls, and preselect the autofocus target.
    ///
    /// The caller (the stack) registers the instance on top immediately.
    pub(crate) fn new(
        id: PopupId,
        content: PopupContent,
        kind: PopupKind,
        main_value: &str,
        options: PopupOptions,
        host: &mut dyn PopupHost,
    ) -> Result<Self, PopupError> {
        let mut view = host.instantiate(id)?;

        let body = match content {
            PopupContent::Markup(raw) => host.sanitize(&raw),
            PopupContent::Prepared(safe) => safe,
        };
        view.set_body(&body);
        view.apply_layout(options.layout);
        view.set_animation(options.animation);

        let defaults = kind.control_defaults();
        let ok_default = host
            .ok_label(kind)
            .unwrap_or_else(|| kind.default_ok_label().to_string());
        let (ok_visible, ok_label) = options.ok_button.resolve(&ok_default, defaults.ok);
        view.set_control_label(ControlRef::Ok, &ok_label);
        view.set_control_visible(ControlRef::Ok, ok_visible);
        let (cancel_visible, cancel_label) = options
            .cancel_button
            .resolve(kind.default_cancel_label(), defaults.cancel);
        view.set_control_label(ControlRef::Cancel, &cancel_label);
        view.set_control_visible(ControlRef::Cancel, cancel_visible);
        view.set_control_visible(ControlRef::Close, defaults.close);

        view.configure_main_input(main_value, options.rows.max(1), defaults.main_input);

        if defaults.crop {
            let image = options
                .crop_image
                .as_deref()
                .ok_or(PopupError::CropImageMissing)?;
            view.show_crop(image, options.crop_aspect.unwrap_or(2.0 / 3.0));
        }

        let mut bindings = vec![
            Binding {
                control: ControlRef::Ok,
                result: Some(ResultCode::Affirmative),
                action: None,
            },
            Binding {
                control: ControlRef::Cancel,
                result: Some(ResultCode::Negative),
                action: None,
            },
            Binding {
                control: ControlRef::Close,
                result: Some(ResultCode::Cancelled),
                action: None,
            },
        ];

        for (index, button) in options.custom_buttons.into_iter().enumerate() {
            let spec = button.into_spec(index);
            view.insert_custom_button(index as u16, &spec);
            bindings.push(Binding {
                control: ControlRef::CustomButton(index as u16),
                result: spec.result,
                action: spec.action,
            });
        }

        // Controls the template itself declares carry raw result attributes.
        for declared in view.declared_controls() {
            let result = match declared.result.as_str() {
                "undefined" => None,
                raw => {
                    let code: i32 = raw
                        .parse()
                        .map_err(|_| PopupError::MalformedResult(raw.to_string()))?;
                    Some(
                        ResultCode::from_code(code)
                            .ok_or_else(|| PopupError::MalformedResult(raw.to_string()))?,
                    )
                }
            };
            bindings.push(Binding {
                control: ControlRef::Declared(declared.index),
                result,
                action: None,
            });
        }

        let mut custom_inputs: Vec<InputSpec> = Vec::with_capacity(options.custom_inputs.len());
        for spec in options.custom_inputs {
            if spec.id.trim().is_empty() {
                warn!(label = %spec.label, "custom input without a usable id, skipping");
                continue;
            }
            if custom_inputs.iter().any(|seen| seen.id == spec.id) {
                warn!(id = %spec.id, "duplicate custom input id, skipping");
                continue;
            }
            view.insert_custom_input(&spec);
            custom_inputs.push(spec);
        }

        if let Some(default) = bindings
            .iter()
            .find(|binding| binding.result == Some(options.default_result))
        {
            view.mark_default(default.control);
        }

        let autofocus = if kind == PopupKind::Input {
            Some(FocusTarget::MainInput)
        } else {
            bindings
                .iter()
                .find(|binding| binding.result == Some(options.default_result))
                .map(|binding| FocusTarget::Control(binding.control))
        };
        if let Some(target) = &autofocus {
            view.set_autofocus(target);
        }

        let (resolver, receiver) = oneshot::channel();

        Ok(Self {
            id,
            kind,
            animation: options.animation,
            default_result: options.default_result,
            custom_inputs,
            bindings,
            on_open: options.on_open,
            on_closing: options.on_closing,
            on_close: options.on_close,
            view,
            state: Lifecycle::Constructed,
            deadline: None,
            result: None,
            value: None,
            input_results: None,
            closing_vetoed: false,
            last_focused: None,
            resolver: Some(resolver),
            receiver: Some(receiver),
            pending: None,
        })
    }

    // --- Accessors ---

    /// Unique popup id.
    pub fn id(&self) -> PopupId {
        self.id
    }

    /// Immutable popup kind.
    pub fn kind(&self) -> PopupKind {
        self.kind
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.state
    }

    /// Result of the in-flight completion, once one survived the veto.
    pub fn result(&self) -> Option<ResultCode> {
        self.result
    }

    /// Kind-dependent value of the in-flight completion.
    pub fn value(&self) -> Option<&PopupValue> {
        self.value.as_ref()
    }

    /// Harvested custom-input states of the in-flight completion.
    pub fn input_results(&self) -> Option<&AHashMap<String, InputValue>> {
        self.input_results.as_ref()
    }

    /// Whether the most recent completion attempt was vetoed.
    pub fn closing_vetoed(&self) -> bool {
        self.closing_vetoed
    }

    /// Live main text field contents.
    pub fn main_input_value(&self) -> String {
        self.view.main_input_value()
    }

    /// Controls the engine listens to, with their bound results.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Last focus target the environment reported for this popup.
    pub fn last_focused(&self) -> Option<&FocusTarget> {
        self.last_focused.as_ref()
    }

    /// Whether the surface is currently visible.
    pub fn is_visible(&self) -> bool {
        self.view.is_visible()
    }

    pub(crate) fn is_closing(&self) -> bool {
        matches!(self.state, Lifecycle::Closing)
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.state, Lifecycle::Closed)
    }

    // --- Lifecycle ---

    /// Make the popup modal-visible and hand out the one-shot future.
    ///
    /// `on_open` fires when the opening transition finishes, or immediately
    /// when no transition is active/detectable.
    pub(crate) fn show(&mut self) -> Result<PopupFuture, PopupError> {
        if self.state != Lifecycle::Constructed {
            return Err(PopupError::AlreadyShown(self.id));
        }
        let rx = self
            .receiver
            .take()
            .ok_or(PopupError::AlreadyShown(self.id))?;

        self.view.open_modal();
        let detectable = self.view.begin_transition(TransitionPhase::Opening);
        match self.animation.duration() {
            Some(duration) if detectable => {
                self.state = Lifecycle::Opening;
                self.deadline = Some(Instant::now() + duration + TRANSITION_SLACK);
            }
            _ => {
                self.state = Lifecycle::Open;
                self.fire_on_open();
            }
        }
        trace!(id = ?self.id, kind = ?self.kind, "popup shown");

        Ok(PopupFuture { rx })
    }

    /// External transition-finished signal; also reached via the fallback
    /// deadline in [`tick`](Self::tick).
    pub(crate) fn transition_finished(&mut self) {
        self.deadline = None;
        match self.state {
            Lifecycle::Opening => {
                self.state = Lifecycle::Open;
                self.fire_on_open();
            }
            Lifecycle::Closing => self.finish_close(),
            _ => {}
        }
    }

    /// Fire the fallback deadline if it has passed.
    pub(crate) fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            self.transition_finished();
        }
    }

    /// Activation of a bound control: runs its action, then attempts the
    /// bound result. Unknown controls are ignored.
    pub(crate) fn activate(&mut self, control: ControlRef) {
        let Some(index) = self
            .bindings
            .iter()
            .position(|binding| binding.control == control)
        else {
            return;
        };
        let result = {
            let binding = &mut self.bindings[index];
            if let Some(action) = binding.action.as_mut() {
                action();
            }
            binding.result
        };
        if let Some(code) = result {
            self.attempt_complete(code);
        }
    }

    /// Enter-key press. Not consumed when focus sits in a text field and
    /// the enter-to-send preference is off; otherwise completes with the
    /// focused control's result, or the default result.
    pub(crate) fn enter_pressed(&mut self, host: &dyn PopupHost) {
        let focused = self.view.focused();
        let in_text_field = match &focused {
            Some(FocusTarget::MainInput) => true,
            Some(FocusTarget::CustomInput(id)) => self
                .custom_inputs
                .iter()
                .any(|spec| spec.id == *id && spec.kind == InputKind::Text),
            _ => false,
        };
        if in_text_field && !host.enter_to_send() {
            return;
        }

        let code = match focused {
            Some(FocusTarget::Control(control)) => self
                .bindings
                .iter()
                .find(|binding| binding.control == control)
                .and_then(|binding| binding.result)
                .unwrap_or(self.default_result),
            _ => self.default_result,
        };
        self.attempt_complete(code);
    }

    /// Attempt to complete with `code`.
    ///
    /// Resolves the kind-dependent value, harvests custom inputs, consults
    /// the veto hook, and either starts the closing transition or falls
    /// back to `Open` with `result`/`value`/`input_results` reset.
    pub(crate) fn attempt_complete(&mut self, code: ResultCode) {
        if !matches!(self.state, Lifecycle::Opening | Lifecycle::Open) {
            return;
        }

        let value = if code == ResultCode::Cancelled {
            None
        } else {
            match self.kind {
                PopupKind::Input => code
                    .is_positive()
                    .then(|| PopupValue::Text(self.view.main_input_value())),
                PopupKind::Crop => {
                    if code.is_positive() {
                        match self.view.crop_result() {
                            Ok(data) => Some(PopupValue::Image(data)),
                            Err(reason) => {
                                self.begin_close(Err(PopupError::Crop(reason)));
                                return;
                            }
                        }
                    } else {
                        None
                    }
                }
                _ => Some(PopupValue::Code(code)),
            }
        };

        self.result = Some(code);
        self.value = value;
        self.input_results = self.harvest_inputs();

        if let Some(mut hook) = self.on_closing.take() {
            let keep_closing = hook(self);
            self.on_closing = Some(hook);
            if !keep_closing {
                trace!(id = ?self.id, ?code, "close vetoed");
                self.closing_vetoed = true;
                self.result = None;
                self.value = None;
                self.input_results = None;
                self.view.force_open();
                return;
            }
        }
        self.closing_vetoed = false;

        let outcome = if code == ResultCode::Cancelled {
            Ok(None)
        } else {
            Ok(Some(PopupOutcome {
                value: self.value.clone(),
                result: code,
                input_results: self.input_results.clone(),
            }))
        };
        self.begin_close(outcome);
    }

    /// Record where focus currently sits, for hand-back when a popup above
    /// this one closes.
    pub(crate) fn note_focus(&mut self, target: FocusTarget) {
        self.last_focused = Some(target);
    }

    /// Hand focus back to the last remembered target, if any.
    pub(crate) fn restore_last_focus(&mut self) {
        if let Some(target) = self.last_focused.clone() {
            self.view.focus(&target);
        }
    }

    /// Resolve the future without an outcome and close immediately.
    ///
    /// Used when the stack discards an instance (`remove`).
    pub(crate) fn abandon(&mut self) {
        self.pending = Some(Ok(None));
        self.finish_close();
    }

    fn harvest_inputs(&self) -> Option<AHashMap<String, InputValue>> {
        if self.custom_inputs.is_empty() {
            return None;
        }
        let mut results = AHashMap::with_capacity(self.custom_inputs.len());
        for spec in &self.custom_inputs {
            let value = self
                .view
                .input_value(&spec.id)
                .unwrap_or_else(|| spec.default.clone());
            results.insert(spec.id.clone(), value);
        }
        Some(results)
    }

    fn fire_on_open(&mut self) {
        if let Some(mut hook) = self.on_open.take() {
            hook(self);
            self.on_open = Some(hook);
        }
    }

    fn begin_close(&mut self, outcome: ShowResult) {
        self.pending = Some(outcome);
        self.state = Lifecycle::Closing;
        let detectable = self.view.begin_transition(TransitionPhase::Closing);
        match self.animation.duration() {
            Some(duration) if detectable => {
                self.deadline = Some(Instant::now() + duration + TRANSITION_SLACK);
            }
            _ => self.finish_close(),
        }
    }

    fn finish_close(&mut self) {
        self.deadline = None;
        if let Some(mut hook) = self.on_close.take() {
            hook(self);
            self.on_close = Some(hook);
        }
        self.view.detach();
        self.state = Lifecycle::Closed;
        trace!(id = ?self.id, "popup closed");
        if let Some(resolver) = self.resolver.take() {
            let outcome = self.pending.take().unwrap_or(Ok(None));
            let _ = resolver.send(outcome);
        }
    }
}
