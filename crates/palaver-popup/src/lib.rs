#![forbid(unsafe_code)]

//! Modal popup engine: a stacked, awaitable dialog layer.
//!
//! Popups are built from a kind ([`PopupKind`]), body content, and
//! [`PopupOptions`], registered on a [`PopupStack`], and resolved exactly
//! once through a one-shot future. Rendering is abstracted behind
//! [`PopupHost`]/[`PopupView`], so the engine runs identically under a
//! real UI backend and under the bundled [`headless`] doubles.
//!
//! # Architecture
//!
//! - [`stack`] owns every live popup and routes environment signals by id.
//! - [`instance`] is the per-popup state machine
//!   (`Constructed → Opening → Open → Closing → Closed`), including the
//!   veto hook and transition deadline handling.
//! - [`presets`] provides the one-call `input`/`confirm`/`text` builders
//!   with typed outcome projections.
//!
//! # Example
//!
//! ```ignore
//! use palaver_popup::{headless::HeadlessHost, presets, PopupOptions, PopupStack};
//!
//! let mut stack = PopupStack::new(Box::new(HeadlessHost::new()));
//! let mut pending = presets::confirm(
//!     &mut stack,
//!     "Delete chat",
//!     "<p>This cannot be undone.</p>",
//!     PopupOptions::default(),
//! )?;
//! stack.complete_affirmative(pending.id)?;
//! assert!(stack.is_empty());
//! # Ok::<(), palaver_popup::PopupError>(())
//! ```

pub mod controls;
pub mod error;
pub mod headless;
pub mod instance;
pub mod kind;
pub mod options;
pub mod presets;
pub mod result;
pub mod stack;
pub mod view;

pub use controls::{ButtonAction, ButtonSpec, CustomButton, InputKind, InputSpec, InputValue};
pub use error::PopupError;
pub use instance::{
    Binding, Lifecycle, PopupFuture, PopupInstance, PopupOutcome, PopupValue, ShowResult,
};
pub use kind::PopupKind;
pub use options::{
    Animation, CloseHook, ClosingHook, ControlText, LayoutFlags, OpenHook, PopupOptions,
};
pub use presets::Pending;
pub use result::ResultCode;
pub use stack::{PopupId, PopupSignal, PopupStack, VisibleLayer};
pub use view::{
    ControlRef, DeclaredControl, FocusTarget, PopupContent, PopupHost, PopupView, TransitionPhase,
};
