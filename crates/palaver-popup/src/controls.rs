#![forbid(unsafe_code)]

//! Declarative descriptors for extra popup controls.
//!
//! `ButtonSpec` describes an extra button (label, bound result, optional
//! click action) and `InputSpec` an extra form control (checkbox or text).
//! `CustomButton` is the `ButtonSpec | label` sugar: a bare label at list
//! position `i` binds the custom result with numeric code `i + 2`.
//!
//! # Failure Modes
//!
//! - An `InputSpec` whose id is empty (or duplicated within one popup) is
//!   skipped with a warning at construction time; it never reaches the view.

use std::fmt;

use crate::result::ResultCode;

/// Click action attached to a button that does not complete the popup by
/// itself (it may still carry a result that does).
pub type ButtonAction = Box<dyn FnMut() + 'static>;

/// Declarative description of an extra popup button.
pub struct ButtonSpec {
    /// Button label.
    pub label: String,
    /// Result the button completes the popup with; `None` makes the button
    /// action-only.
    pub result: Option<ResultCode>,
    /// Extra style classes applied by the view.
    pub classes: Vec<String>,
    /// Optional click action, run before any completion attempt.
    pub action: Option<ButtonAction>,
    /// Place the button after the confirm control instead of before it.
    pub append_at_end: bool,
}

impl ButtonSpec {
    /// Create a button with a label and no bound result.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            result: None,
            classes: Vec::new(),
            action: None,
            append_at_end: false,
        }
    }

    /// Bind a result code; activating the button completes the popup.
    pub fn result(mut self, result: ResultCode) -> Self {
        self.result = Some(result);
        self
    }

    /// Add a style class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Attach a click action.
    pub fn on_click(mut self, action: impl FnMut() + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Place the button after the confirm control.
    pub fn append_at_end(mut self) -> Self {
        self.append_at_end = true;
        self
    }
}

impl fmt::Debug for ButtonSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonSpec")
            .field("label", &self.label)
            .field("result", &self.result)
            .field("classes", &self.classes)
            .field("action", &self.action.as_ref().map(|_| "<fn>"))
            .field("append_at_end", &self.append_at_end)
            .finish()
    }
}

/// A custom button entry: either a full spec or bare-label sugar.
#[derive(Debug)]
pub enum CustomButton {
    /// Bare label; binds `ResultCode::for_custom_index(position)`.
    Label(String),
    /// Fully specified button.
    Spec(ButtonSpec),
}

impl CustomButton {
    /// Resolve the sugar into a concrete spec for list position `index`.
    pub(crate) fn into_spec(self, index: usize) -> ButtonSpec {
        match self {
            Self::Label(label) => {
                ButtonSpec::new(label).result(ResultCode::for_custom_index(index))
            }
            Self::Spec(spec) => spec,
        }
    }
}

impl From<&str> for CustomButton {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for CustomButton {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<ButtonSpec> for CustomButton {
    fn from(spec: ButtonSpec) -> Self {
        Self::Spec(spec)
    }
}

/// Kind of an extra form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputKind {
    /// Boolean toggle.
    Checkbox,
    /// Single-line text field.
    Text,
}

/// State of an extra form control, both as default and as harvested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputValue {
    /// Checkbox state.
    Flag(bool),
    /// Text field contents.
    Text(String),
}

/// Declarative description of an extra form control.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputSpec {
    /// Identifier, unique within one popup. Required.
    pub id: String,
    /// Visible label.
    pub label: String,
    /// Optional tooltip text.
    pub tooltip: Option<String>,
    /// Control kind.
    pub kind: InputKind,
    /// Default state, matching the kind.
    pub default: InputValue,
}

impl InputSpec {
    /// Create a checkbox input, unchecked by default.
    pub fn checkbox(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: None,
            kind: InputKind::Checkbox,
            default: InputValue::Flag(false),
        }
    }

    /// Create a text input, empty by default.
    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: None,
            kind: InputKind::Text,
            default: InputValue::Text(String::new()),
        }
    }

    /// Set the tooltip.
    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Set the default checked state (checkbox kind).
    pub fn checked(mut self, checked: bool) -> Self {
        self.default = InputValue::Flag(checked);
        self
    }

    /// Set the default text (text kind).
    pub fn initial(mut self, text: impl Into<String>) -> Self {
        self.default = InputValue::Text(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_label_sugar_binds_custom_slot() {
        let spec = CustomButton::from("Maybe").into_spec(0);
        assert_eq!(spec.label, "Maybe");
        assert_eq!(spec.result, Some(ResultCode::Custom(1)));
        assert_eq!(spec.result.unwrap().code(), 2);
    }

    #[test]
    fn later_labels_bind_later_slots() {
        let spec = CustomButton::from("Third".to_string()).into_spec(2);
        assert_eq!(spec.result.unwrap().code(), 4);
    }

    #[test]
    fn full_spec_passes_through_unchanged() {
        let spec = CustomButton::from(ButtonSpec::new("Keep").result(ResultCode::Negative))
            .into_spec(5);
        assert_eq!(spec.result, Some(ResultCode::Negative));
    }

    #[test]
    fn action_only_button_has_no_result() {
        let spec = ButtonSpec::new("Help").on_click(|| {});
        assert!(spec.result.is_none());
        assert!(spec.action.is_some());
    }

    #[test]
    fn button_builder_accumulates() {
        let spec = ButtonSpec::new("Go")
            .result(ResultCode::Custom(3))
            .class("primary")
            .class("wide")
            .append_at_end();
        assert_eq!(spec.classes, vec!["primary", "wide"]);
        assert!(spec.append_at_end);
    }

    #[test]
    fn input_spec_defaults_match_kind() {
        let cb = InputSpec::checkbox("keep", "Keep going").checked(true);
        assert_eq!(cb.default, InputValue::Flag(true));

        let txt = InputSpec::text("name", "Name").initial("anon").tooltip("hint");
        assert_eq!(txt.default, InputValue::Text("anon".into()));
        assert_eq!(txt.tooltip.as_deref(), Some("hint"));
    }
}
