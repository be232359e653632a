#![forbid(unsafe_code)]

//! Popup engine errors.
//!
//! Vetoes are not errors; they are ordinary state-machine transitions.
//! Recoverable declaration problems (bad custom-input ids) are logged and
//! skipped instead of surfacing here.

use thiserror::Error;

use crate::stack::PopupId;

/// Errors surfaced by popup construction and completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopupError {
    /// The host has no modal template to clone; construction cannot proceed.
    #[error("modal template is not available")]
    TemplateMissing,

    /// A template-declared control carries a result attribute that is
    /// neither an integer nor `"undefined"`.
    #[error("control declares malformed result attribute {0:?}")]
    MalformedResult(String),

    /// The crop kind requires a source image.
    #[error("crop popup constructed without a source image")]
    CropImageMissing,

    /// No live popup with this id.
    #[error("popup {0:?} is not tracked")]
    UnknownPopup(PopupId),

    /// `show` was called more than once, or on a destroyed instance.
    #[error("popup {0:?} has already been shown")]
    AlreadyShown(PopupId),

    /// The crop tool failed to produce a canvas.
    #[error("crop tool failed: {0}")]
    Crop(String),
}
