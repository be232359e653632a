#![forbid(unsafe_code)]

//! Popup configuration: layout flags, animation speed, control label
//! overrides, custom controls, and lifecycle hooks.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;

use crate::controls::{CustomButton, InputSpec};
use crate::instance::PopupInstance;
use crate::result::ResultCode;

bitflags! {
    /// Purely presentational container toggles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u8 {
        const WIDE = 1 << 0;
        const WIDER = 1 << 1;
        const LARGE = 1 << 2;
        const TRANSPARENT = 1 << 3;
        const ALLOW_HORIZONTAL_SCROLLING = 1 << 4;
        const ALLOW_VERTICAL_SCROLLING = 1 << 5;
        const LEFT_ALIGN = 1 << 6;
    }
}

/// Open/close transition speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Animation {
    /// No transition; open and close complete immediately.
    None,
    /// Short transition.
    #[default]
    Fast,
    /// Long transition.
    Slow,
}

impl Animation {
    /// Transition duration, or `None` when transitions are disabled.
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fast => Some(Duration::from_millis(125)),
            Self::Slow => Some(Duration::from_millis(500)),
        }
    }
}

/// Label override for the confirm/cancel controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControlText {
    /// Kind-specific default label and visibility.
    #[default]
    Auto,
    /// Hide the control entirely.
    Hidden,
    /// Show the control with this label.
    Label(String),
}

impl ControlText {
    /// Resolve to `(visible, label)` given the kind defaults.
    pub(crate) fn resolve(&self, default_label: &str, default_visible: bool) -> (bool, String) {
        match self {
            Self::Auto => (default_visible, default_label.to_string()),
            Self::Hidden => (false, default_label.to_string()),
            Self::Label(label) => (true, label.clone()),
        }
    }
}

/// Hook invoked once the popup finished its opening transition.
pub type OpenHook = Box<dyn FnMut(&mut PopupInstance) + 'static>;
/// Hook consulted before a completion attempt closes the popup; returning
/// `false` vetoes the close.
pub type ClosingHook = Box<dyn FnMut(&mut PopupInstance) -> bool + 'static>;
/// Hook invoked after the closing transition, right before detach.
pub type CloseHook = Box<dyn FnMut(&mut PopupInstance) + 'static>;

/// Configuration for one popup instance.
///
/// All fields have usable defaults; builder methods consume `self`.
pub struct PopupOptions {
    /// Confirm control override.
    pub ok_button: ControlText,
    /// Cancel control override.
    pub cancel_button: ControlText,
    /// Main text field row count (input kind).
    pub rows: u16,
    /// Presentational container toggles.
    pub layout: LayoutFlags,
    /// Open/close transition speed.
    pub animation: Animation,
    /// Result implicitly chosen on Enter when no result control is focused.
    pub default_result: ResultCode,
    /// Extra buttons, rendered in order.
    pub custom_buttons: Vec<CustomButton>,
    /// Extra form controls, rendered in order.
    pub custom_inputs: Vec<InputSpec>,
    /// Fired on the `Opening → Open` edge.
    pub on_open: Option<OpenHook>,
    /// Veto hook; `false` aborts a completion attempt.
    pub on_closing: Option<ClosingHook>,
    /// Fired after the closing transition.
    pub on_close: Option<CloseHook>,
    /// Fixed crop aspect ratio (width/height); defaults to 2/3.
    pub crop_aspect: Option<f64>,
    /// Crop source image URL/data; required for the crop kind.
    pub crop_image: Option<String>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            ok_button: ControlText::Auto,
            cancel_button: ControlText::Auto,
            rows: 1,
            layout: LayoutFlags::empty(),
            animation: Animation::default(),
            default_result: ResultCode::Affirmative,
            custom_buttons: Vec::new(),
            custom_inputs: Vec::new(),
            on_open: None,
            on_closing: None,
            on_close: None,
            crop_aspect: None,
            crop_image: None,
        }
    }
}

impl PopupOptions {
    /// Create options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the confirm control label.
    pub fn ok_label(mut self, label: impl Into<String>) -> Self {
        self.ok_button = ControlText::Label(label.into());
        self
    }

    /// Hide the confirm control.
    pub fn ok_hidden(mut self) -> Self {
        self.ok_button = ControlText::Hidden;
        self
    }

    /// Override the cancel control label.
    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_button = ControlText::Label(label.into());
        self
    }

    /// Hide the cancel control.
    pub fn cancel_hidden(mut self) -> Self {
        self.cancel_button = ControlText::Hidden;
        self
    }

    /// Set the main text field row count.
    pub fn rows(mut self, rows: u16) -> Self {
        self.rows = rows.max(1);
        self
    }

    /// Set presentational layout toggles.
    pub fn layout(mut self, flags: LayoutFlags) -> Self {
        self.layout = flags;
        self
    }

    /// Set the transition speed.
    pub fn animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    /// Set the result implied by an untargeted Enter press.
    pub fn default_result(mut self, result: ResultCode) -> Self {
        self.default_result = result;
        self
    }

    /// Append a custom button (spec or bare-label sugar).
    pub fn custom_button(mut self, button: impl Into<CustomButton>) -> Self {
        self.custom_buttons.push(button.into());
        self
    }

    /// Append a custom form control.
    pub fn custom_input(mut self, input: InputSpec) -> Self {
        self.custom_inputs.push(input);
        self
    }

    /// Set the open hook.
    pub fn on_open(mut self, hook: impl FnMut(&mut PopupInstance) + 'static) -> Self {
        self.on_open = Some(Box::new(hook));
        self
    }

    /// Set the veto hook.
    pub fn on_closing(mut self, hook: impl FnMut(&mut PopupInstance) -> bool + 'static) -> Self {
        self.on_closing = Some(Box::new(hook));
        self
    }

    /// Set the close hook.
    pub fn on_close(mut self, hook: impl FnMut(&mut PopupInstance) + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Set the crop source image.
    pub fn crop_image(mut self, image: impl Into<String>) -> Self {
        self.crop_image = Some(image.into());
        self
    }

    /// Set the crop aspect ratio (width/height).
    pub fn crop_aspect(mut self, aspect: f64) -> Self {
        self.crop_aspect = Some(aspect);
        self
    }
}

impl fmt::Debug for PopupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupOptions")
            .field("ok_button", &self.ok_button)
            .field("cancel_button", &self.cancel_button)
            .field("rows", &self.rows)
            .field("layout", &self.layout)
            .field("animation", &self.animation)
            .field("default_result", &self.default_result)
            .field("custom_buttons", &self.custom_buttons.len())
            .field("custom_inputs", &self.custom_inputs)
            .field("on_open", &self.on_open.is_some())
            .field("on_closing", &self.on_closing.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("crop_aspect", &self.crop_aspect)
            .field("crop_image", &self.crop_image)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = PopupOptions::default();
        assert_eq!(options.ok_button, ControlText::Auto);
        assert_eq!(options.rows, 1);
        assert_eq!(options.animation, Animation::Fast);
        assert_eq!(options.default_result, ResultCode::Affirmative);
        assert!(options.custom_buttons.is_empty());
    }

    #[test]
    fn rows_never_below_one() {
        assert_eq!(PopupOptions::new().rows(0).rows, 1);
        assert_eq!(PopupOptions::new().rows(4).rows, 4);
    }

    #[test]
    fn control_text_resolution() {
        assert_eq!(ControlText::Auto.resolve("Yes", true), (true, "Yes".into()));
        assert_eq!(ControlText::Auto.resolve("Yes", false), (false, "Yes".into()));
        assert_eq!(ControlText::Hidden.resolve("Yes", true), (false, "Yes".into()));
        assert_eq!(
            ControlText::Label("Go".into()).resolve("Yes", false),
            (true, "Go".into())
        );
    }

    #[test]
    fn animation_durations() {
        assert_eq!(Animation::None.duration(), None);
        assert!(Animation::Fast.duration().unwrap() < Animation::Slow.duration().unwrap());
    }

    #[test]
    fn layout_flags_combine() {
        let flags = LayoutFlags::WIDE | LayoutFlags::LEFT_ALIGN;
        assert!(flags.contains(LayoutFlags::WIDE));
        assert!(!flags.contains(LayoutFlags::LARGE));
    }
}
