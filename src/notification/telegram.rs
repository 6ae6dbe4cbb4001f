//! Telegram delivery through the Bot API `sendMessage` method.

use log::Level;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::config::{TelegramConfig, WalletConfig};
use crate::error::NotifyError;
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::ClassifiedTransaction;

/// A rendered, ready-to-send notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    send_url: String,
    chat_id: String,
    explorer_link: String,
}

impl TelegramNotifier {
    pub fn new(telegram: &TelegramConfig, wallet: &WalletConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(telegram.timeout_seconds))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                telegram.api_url.trim_end_matches('/'),
                telegram.bot_token
            ),
            chat_id: telegram.chat_id.clone(),
            explorer_link: format!("{}/{}", wallet.explorer_url.trim_end_matches('/'), wallet.address),
        })
    }

    /// Render the HTML notification for a classified transaction
    pub fn render(&self, tx: &ClassifiedTransaction) -> Message {
        let text = format!(
            "{} transaction\n\
             💎 Amount: <b>{:.2} TON</b>\n\
             👤 Counterparty: <code>{}</code>\n\
             🕒 Date: <i>{}</i>\n\
             🔍 <a href='{}'>View on TonViewer</a>",
            tx.direction.label(),
            tx.amount(),
            escape_html(&format_address(&tx.counterparty)),
            tx.timestamp.format("%d.%m.%Y %H:%M:%S"),
            escape_html(&self.explorer_link),
        );
        Message { text }
    }

    /// Deliver a message to the configured chat with link previews disabled
    pub async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let monitor = PerformanceMonitor::new("telegram_send_message");
        let result = self.send_inner(message).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_api_call("telegram.sendMessage", duration, result.is_ok());
        result
    }

    async fn send_inner(&self, message: &Message) -> Result<(), NotifyError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: &message.text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        LogContext::new("telegram", "send_message")
            .field("chat_id", &self.chat_id)
            .emit(Level::Trace, "Sending message");

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(redact_url)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(NotifyError::Authentication);
        }

        let body = response.text().await.map_err(redact_url)?;
        match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(reply) if status.is_success() && reply.ok => Ok(()),
            Ok(reply) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: reply.description.unwrap_or_else(|| "no description".to_string()),
            }),
            Err(_) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: body,
            }),
        }
    }
}

/// The send URL embeds the bot token, so it must never reach an error message
fn redact_url(err: reqwest::Error) -> NotifyError {
    NotifyError::Network(err.without_url())
}

/// Shorten an address to `abcd...wxyz`
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        address.to_string()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}
