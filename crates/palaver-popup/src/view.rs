#![forbid(unsafe_code)]

//! Environment capability traits: template/view provider, sanitizer,
//! enter-to-send preference, and crop surface.
//!
//! The state machine in `instance` never touches concrete rendering; it
//! drives a `PopupView` through named control slots and reads the
//! environment through `PopupHost`. This keeps the engine independently
//! testable (see `headless`).
//!
//! # Failure Modes
//!
//! - `PopupHost::instantiate` failing with `TemplateMissing` is fatal for
//!   popup construction; there is nothing to render into.

use crate::controls::{ButtonSpec, InputSpec, InputValue};
use crate::error::PopupError;
use crate::kind::PopupKind;
use crate::options::{Animation, LayoutFlags};
use crate::stack::PopupId;

/// A bindable control in the popup template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRef {
    /// The confirm control (bound to affirmative).
    Ok,
    /// The cancel control (bound to negative).
    Cancel,
    /// The ✕ control (bound to cancelled).
    Close,
    /// A custom button by list position.
    CustomButton(u16),
    /// A template-declared extra control by position.
    Declared(u16),
}

/// Where keyboard focus sits inside a popup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    /// The main text field.
    MainInput,
    /// A custom form control, by id.
    CustomInput(String),
    /// A bindable control.
    Control(ControlRef),
}

/// An extra result-bearing control declared by the template itself.
///
/// The `result` attribute is raw template text: `"undefined"` marks a
/// non-completing control, an integer is parsed into a result code, and
/// anything else is a fatal bind error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredControl {
    /// Position among declared controls.
    pub index: u16,
    /// Raw result attribute text.
    pub result: String,
}

/// Direction of an open/close transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Opening,
    Closing,
}

/// Popup body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupContent {
    /// Raw markup; passes through the host sanitizer.
    Markup(String),
    /// Pre-built content, trusted as-is.
    Prepared(String),
}

/// Environment capabilities consumed by the popup engine.
pub trait PopupHost {
    /// Clone the modal template into a fresh view for popup `id`.
    fn instantiate(&mut self, id: PopupId) -> Result<Box<dyn PopupView>, PopupError>;

    /// Turn raw markup into safe markup. The engine trusts this boundary.
    fn sanitize(&self, raw: &str) -> String;

    /// Whether Enter inside a text field submits (consulted per keypress).
    fn enter_to_send(&self) -> bool;

    /// Localized confirm-control label for a kind, if the host has one.
    fn ok_label(&self, _kind: PopupKind) -> Option<String> {
        None
    }
}

/// One instantiated modal surface with named slots.
///
/// Implementations own presentation only; all state decisions stay in the
/// engine. Methods must be cheap and must not re-enter the engine.
pub trait PopupView {
    /// Set the (already sanitized) body markup.
    fn set_body(&mut self, markup: &str);

    /// Apply presentational container toggles.
    fn apply_layout(&mut self, flags: LayoutFlags);

    /// Apply the transition duration class.
    fn set_animation(&mut self, animation: Animation);

    /// Show or hide a fixed control slot.
    fn set_control_visible(&mut self, control: ControlRef, visible: bool);

    /// Set a fixed control slot's label.
    fn set_control_label(&mut self, control: ControlRef, label: &str);

    /// Attach the "this is the default" marker to a control.
    fn mark_default(&mut self, control: ControlRef);

    /// Configure the main text field: initial value, row count, visibility.
    fn configure_main_input(&mut self, value: &str, rows: u16, visible: bool);

    /// Current main text field contents.
    fn main_input_value(&self) -> String;

    /// Render a custom button at list position `index`.
    fn insert_custom_button(&mut self, index: u16, spec: &ButtonSpec);

    /// Render a custom form control; forces the input container visible.
    fn insert_custom_input(&mut self, spec: &InputSpec);

    /// Current state of a custom form control, if it exists.
    fn input_value(&self, id: &str) -> Option<InputValue>;

    /// Extra result-bearing controls the template declares on its own.
    fn declared_controls(&self) -> Vec<DeclaredControl>;

    /// Show the crop surface for an image with a fixed aspect ratio.
    /// Initial crop coverage spans the entire image; rotation is disabled.
    fn show_crop(&mut self, image: &str, aspect: f64);

    /// Image-encoded result of the current crop selection.
    fn crop_result(&mut self) -> Result<String, String>;

    /// Preselect the control that should receive focus once visible,
    /// without acquiring focus.
    fn set_autofocus(&mut self, target: &FocusTarget);

    /// Move keyboard focus to a target.
    fn focus(&mut self, target: &FocusTarget);

    /// Where keyboard focus currently sits, if inside this popup.
    fn focused(&self) -> Option<FocusTarget>;

    /// Make the popup modal-visible.
    fn open_modal(&mut self);

    /// Force the surface back open after a vetoed close, in case the
    /// environment already started closing it natively.
    fn force_open(&mut self);

    /// Start an open/close transition. Returns whether a transition is
    /// active/detectable; `false` means the engine skips the wait.
    fn begin_transition(&mut self, phase: TransitionPhase) -> bool;

    /// Remove the surface from the environment. Terminal.
    fn detach(&mut self);

    /// Whether the surface is currently visible.
    fn is_visible(&self) -> bool;
}
