//! Minimal Telegram Bot API client.
//!
//! Covers the two calls this daemon needs: `sendMessage` for outbound
//! notifications and replies, and long-polled `getUpdates` for inbound
//! commands.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::TelegramConfig;
use crate::error::{MonitorError, Result};

const API_BASE: &str = "https://api.telegram.org";

/// Upper bound on a single outbound delivery
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side long-poll window for getUpdates
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    config: TelegramConfig,
}

/// Inbound update, reduced to the message fields we act on
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    fn url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.config.bot_token)
    }

    /// Send a message to the configured chat.
    ///
    /// Returns `Ok(false)` without touching the network when the channel
    /// is disabled or unconfigured; `Ok(true)` on confirmed delivery.
    pub async fn send_message(&self, text: &str) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let chat_id = self.config.chat_id.clone();
        self.deliver(&chat_id, text).await?;
        Ok(true)
    }

    /// Reply to an inbound command on its originating chat
    pub async fn reply(&self, chat_id: i64, text: &str) -> Result<()> {
        self.deliver(&chat_id.to_string(), text).await
    }

    async fn deliver(&self, chat_id: &str, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .http
            .post(self.url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::telegram(format!("sendMessage failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::telegram(format!(
                "sendMessage returned {status}: {body}"
            )));
        }

        Ok(())
    }

    /// Long-poll for updates with ids at or past `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let response = self
            .http
            .post(self.url("getUpdates"))
            // Client timeout must outlast the server-side poll window
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::telegram(format!("getUpdates failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MonitorError::telegram(format!(
                "getUpdates returned {}",
                response.status()
            )));
        }

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| MonitorError::telegram(format!("getUpdates parse failed: {e}")))?;

        if !body.ok {
            return Err(MonitorError::telegram(format!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_default()
            )));
        }

        Ok(body.result.unwrap_or_default())
    }
}
