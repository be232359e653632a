#![forbid(unsafe_code)]

//! Popup kind variants and their per-kind control defaults.
//!
//! The kind decides which template controls are visible before any
//! per-popup overrides, which label the confirm control carries, and how
//! the completion value is resolved (see `instance`).

/// Modal popup variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PopupKind {
    /// Plain text message with a confirm control.
    Text,
    /// Yes/no style confirmation.
    Confirm,
    /// Free-text input with a save control.
    Input,
    /// Display-only content; closed through the ✕ control.
    Display,
    /// Image crop surface with a crop control.
    Crop,
}

/// Default control visibility for a popup kind, before option overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlDefaults {
    pub ok: bool,
    pub cancel: bool,
    pub close: bool,
    pub main_input: bool,
    pub crop: bool,
}

impl PopupKind {
    /// Default label for the confirm control.
    pub fn default_ok_label(self) -> &'static str {
        match self {
            Self::Text | Self::Display => "OK",
            Self::Confirm => "Yes",
            Self::Input => "Save",
            Self::Crop => "Crop",
        }
    }

    /// Default label for the cancel control.
    pub fn default_cancel_label(self) -> &'static str {
        match self {
            Self::Confirm => "No",
            _ => "Cancel",
        }
    }

    pub(crate) fn control_defaults(self) -> ControlDefaults {
        match self {
            Self::Text => ControlDefaults {
                ok: true,
                cancel: false,
                close: false,
                main_input: false,
                crop: false,
            },
            Self::Confirm => ControlDefaults {
                ok: true,
                cancel: true,
                close: false,
                main_input: false,
                crop: false,
            },
            Self::Input => ControlDefaults {
                ok: true,
                cancel: true,
                close: false,
                main_input: true,
                crop: false,
            },
            Self::Display => ControlDefaults {
                ok: false,
                cancel: false,
                close: true,
                main_input: false,
                crop: false,
            },
            Self::Crop => ControlDefaults {
                ok: true,
                cancel: false,
                close: false,
                main_input: false,
                crop: true,
            },
        }
    }
}
