use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Deliverer, DeliveryError};
use crate::config::{TelegramConfig, ENV_TELEGRAM_BOT_TOKEN, ENV_TELEGRAM_CHAT_ID};

/// Bot API `sendMessage` with HTML parse mode.
pub struct TelegramDeliverer {
    client: Client,
    api_base: String,
    bot_token: String,
    disable_link_preview: bool,
}

impl TelegramDeliverer {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building telegram http client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            disable_link_preview: true,
        })
    }

    pub fn from_config(cfg: &TelegramConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.api_base.clone(), cfg.bot_token.clone())?
            .with_link_preview(!cfg.disable_link_preview))
    }

    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.disable_link_preview = !enabled;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

fn transport(e: reqwest::Error) -> DeliveryError {
    DeliveryError::Transport(e.without_url())
}

#[async_trait]
impl Deliverer for TelegramDeliverer {
    async fn deliver(&self, message: &str, destination: &str) -> Result<(), DeliveryError> {
        if self.bot_token.trim().is_empty() {
            return Err(DeliveryError::MissingCredentials(ENV_TELEGRAM_BOT_TOKEN));
        }
        if destination.trim().is_empty() {
            return Err(DeliveryError::MissingCredentials(ENV_TELEGRAM_CHAT_ID));
        }

        let body = SendMessage {
            chat_id: destination,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: self.disable_link_preview,
        };
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;

        // The Bot API answers `{"ok":false,...}` for most rejections, sometimes with 200.
        let reply = serde_json::from_str::<ApiReply>(&text).ok();
        match reply {
            Some(r) if status.is_success() && r.ok => {
                tracing::debug!(destination, "telegram accepted message");
                Ok(())
            }
            Some(r) => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: r.description.unwrap_or_else(|| "ok=false".to_string()),
            }),
            None => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: text.chars().take(300).collect(),
            }),
        }
    }

    fn channel_name(&self) -> &'static str {
        "telegram"
    }
}
