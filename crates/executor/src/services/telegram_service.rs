use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::error::NotifyError;
use crate::traits::Notifier;

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramNotifier {
    bot: Bot,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str, destination: i64) -> Result<String, NotifyError> {
        debug!(chat_id = destination, "Sending Telegram message");

        let sent = tokio::time::timeout(
            self.timeout,
            self.bot.send_message(ChatId(destination), text),
        )
        .await
        .map_err(|_| NotifyError::Timeout(self.timeout))?;

        match sent {
            Ok(message) => Ok(message.id.0.to_string()),
            Err(e) => {
                error!("Failed to send Telegram message: {}", e);
                Err(e.into())
            }
        }
    }
}
