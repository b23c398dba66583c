use std::time::Duration;

use thiserror::Error;

/// The only failure that stops a workflow before it has any side effect.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("webhook token missing")]
    MissingToken,
    #[error("webhook token invalid")]
    InvalidToken,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}
