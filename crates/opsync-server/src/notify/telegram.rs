//! Telegram Bot API message sink.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{MessageSink, NotifyError};

const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Telegram transport configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Bot API root, overridable for tests.
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// True when both the token and the chat id are set.
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends Markdown messages to one chat through `sendMessage`.
pub struct TelegramSink {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramSink {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let (Some(token), Some(chat_id)) = (
            self.config.bot_token.as_deref().filter(|t| !t.is_empty()),
            self.config.chat_id.as_deref().filter(|c| !c.is_empty()),
        ) else {
            return Err(NotifyError::NotConfigured);
        };

        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            token
        );
        let response = self
            .http
            .post(&url)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id = %chat_id, "Telegram message sent");
        Ok(())
    }
}
