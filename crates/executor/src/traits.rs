use async_trait::async_trait;

use crate::error::NotifyError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to `destination` and returns the id of the delivered message.
    async fn send(&self, text: &str, destination: i64) -> Result<String, NotifyError>;
}
