#![forbid(unsafe_code)]

//! One-call popup builders for the common shapes: free-text input,
//! yes/no confirmation, and a plain text message.
//!
//! Each builder composes a body from an optional header and a text block,
//! opens the popup on the stack, and returns a [`Pending`] whose output is
//! already projected to the caller-facing type. The popup still resolves
//! through the ordinary stack machinery (signals, `tick`).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::PopupError;
use crate::instance::{PopupFuture, PopupOutcome, PopupValue};
use crate::kind::PopupKind;
use crate::options::PopupOptions;
use crate::result::ResultCode;
use crate::stack::{PopupId, PopupStack};
use crate::view::PopupContent;

/// An opened popup plus a typed projection of its eventual outcome.
#[derive(Debug)]
pub struct Pending<T> {
    /// Id of the opened popup, for routing signals to it.
    pub id: PopupId,
    future: PopupFuture,
    project: fn(Option<PopupOutcome>) -> T,
}

impl<T> Pending<T> {
    /// Non-blocking read; `None` while the popup is still live.
    pub fn try_take(&mut self) -> Option<Result<T, PopupError>> {
        self.future
            .try_take()
            .map(|result| result.map(self.project))
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, PopupError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let project = self.project;
        Pin::new(&mut self.future)
            .poll(cx)
            .map(|result| result.map(project))
    }
}

fn compose_body(header: &str, text: &str) -> PopupContent {
    if header.is_empty() {
        PopupContent::Markup(text.to_string())
    } else {
        PopupContent::Markup(format!("<h3>{header}</h3>{text}"))
    }
}

/// Open a free-text input popup.
///
/// Resolves to `Some(text)` on an affirmative-or-higher completion and
/// `None` otherwise, cancellation included.
pub fn input(
    stack: &mut PopupStack,
    header: &str,
    text: &str,
    default_value: &str,
    options: PopupOptions,
) -> Result<Pending<Option<String>>, PopupError> {
    let (id, future) = stack.open(
        compose_body(header, text),
        PopupKind::Input,
        default_value,
        options,
    )?;
    Ok(Pending {
        id,
        future,
        project: |outcome| match outcome {
            Some(PopupOutcome {
                value: Some(PopupValue::Text(text)),
                ..
            }) => Some(text),
            _ => None,
        },
    })
}

/// Open a yes/no confirmation popup.
///
/// Resolves to `Some(result)` on completion and `None` on cancellation.
pub fn confirm(
    stack: &mut PopupStack,
    header: &str,
    text: &str,
    options: PopupOptions,
) -> Result<Pending<Option<ResultCode>>, PopupError> {
    let (id, future) = stack.open(compose_body(header, text), PopupKind::Confirm, "", options)?;
    Ok(Pending {
        id,
        future,
        project: project_result,
    })
}

/// Open a plain text message popup with a single confirm control.
pub fn text(
    stack: &mut PopupStack,
    header: &str,
    text: &str,
    options: PopupOptions,
) -> Result<Pending<Option<ResultCode>>, PopupError> {
    let (id, future) = stack.open(compose_body(header, text), PopupKind::Text, "", options)?;
    Ok(Pending {
        id,
        future,
        project: project_result,
    })
}

fn project_result(outcome: Option<PopupOutcome>) -> Option<ResultCode> {
    outcome.map(|outcome| outcome.result)
}
