//! Push notifications for newly recorded items.
//!
//! Delivery happens after the ledger has been written and never affects the
//! run's outcome: each destination is attempted once, in order, and a
//! failure is logged and counted before moving on to the next.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::diff::NewItemsBySource;
use crate::error::{Error, Result};
use crate::ledger::sorted;
use crate::source::api::error_chain;

/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// A sink that delivers a message to one destination.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver `message` to `destination` exactly once.
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}

/// Per-run delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Send `message` to every destination, sequentially and independently.
pub async fn notify_all<N: Notifier>(notifier: &N, destinations: &[String], message: &str) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for destination in destinations {
        match deliver(notifier, destination, message).await {
            Ok(()) => {
                info!(destination = %destination, "notification delivered");
                report.delivered += 1;
            }
            Err(e) => {
                warn!(destination = %destination, error = %e, "notification failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// One destination; long messages go out as several chunks in order and the
/// destination fails if any chunk does.
async fn deliver<N: Notifier>(notifier: &N, destination: &str, message: &str) -> Result<()> {
    for chunk in split_message(message, TELEGRAM_MESSAGE_LIMIT) {
        notifier.send(destination, &chunk).await?;
    }
    Ok(())
}

/// Plain-text summary of one run's new items.
pub fn format_message(new_items: &NewItemsBySource) -> String {
    let mut msg = format!("New items found: {}\n", new_items.total());
    for (source, items) in new_items.iter() {
        msg.push('\n');
        msg.push_str(source);
        msg.push('\n');
        for item in sorted(items) {
            msg.push_str("• ");
            msg.push_str(item);
            msg.push('\n');
        }
    }
    msg.trim_end().to_string()
}

/// Split on line boundaries into chunks of at most `limit` characters.  A
/// single line longer than `limit` is cut mid-line.
pub fn split_message(message: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.split('\n') {
        let mut pieces: Vec<String> = Vec::new();
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            pieces.push(String::new());
        }
        for piece in chars.chunks(limit) {
            pieces.push(piece.iter().collect());
        }

        for piece in pieces {
            let piece_len = piece.chars().count();
            let needed = if current.is_empty() { piece_len } else { current_len + 1 + piece_len };
            if needed > limit && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

/// Delivers through the Telegram Bot API `sendMessage` method.  A
/// destination is a chat id.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self::with_api_base(client, token, TELEGRAM_API)
    }

    pub fn with_api_base(client: Client, token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn error(destination: &str, reason: impl Into<String>) -> Error {
        Error::Notification {
            destination: destination.to_string(),
            reason: reason.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = json!({
            "chat_id": destination,
            "text": message,
            "disable_web_page_preview": true,
        });

        // The token is part of the url; keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::error(destination, error_chain(&e.without_url())))?;

        let status = response.status();
        let parsed: Option<TelegramResponse> = response.json().await.ok();
        match parsed {
            Some(r) if status.is_success() && r.ok => Ok(()),
            Some(r) => Err(Self::error(
                destination,
                format!("HTTP {status}: {}", r.description.unwrap_or_else(|| "not ok".into())),
            )),
            None => Err(Self::error(destination, format!("HTTP {status}: unreadable response"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
