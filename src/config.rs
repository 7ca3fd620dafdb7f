//! Configuration file loading and validation.
//!
//! ```json
//! {
//!   "userAgent": "release-watch/0.1",
//!   "ledgerPath": "known-items.md",
//!   "timeoutSecs": 20,
//!   "sources": [
//!     { "name": "Shows", "url": "https://example.com/api", "type": "api",
//!       "extractionPath": "result.*.title", "headers": { "X-Api-Key": "..." } }
//!   ],
//!   "telegram": { "botToken": "123:abc", "chatId": [12345, "@channel"] }
//! }
//! ```
//!
//! Anything wrong here is fatal: the run never starts on a bad config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::source::extract::JsonPath;
use crate::source::SourceDescriptor;

pub const DEFAULT_LEDGER_PATH: &str = "known-items.md";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub sources: Vec<SourceDescriptor>,

    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    /// Applied to every request unless a source overrides `User-Agent`.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: ChatIds,
}

/// A chat id may be given as a string, a number, or a list of either.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChatIds {
    One(ChatId),
    Many(Vec<ChatId>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Number(i64),
    Text(String),
}

impl ChatIds {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ChatIds::One(id) => vec![id.to_string()],
            ChatIds::Many(ids) => ids.iter().map(ChatId::to_string).collect(),
        }
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Number(n) => write!(f, "{n}"),
            ChatId::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl Config {
    /// Read, parse and validate the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_json(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), config_reason(&e))))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let ledger = config.ledger_path();
        if ledger.is_relative() {
            config.ledger_path = Some(base.join(ledger));
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("at least one source is required".into()));
        }
        for (i, src) in self.sources.iter().enumerate() {
            let at = |what: String| Error::Config(format!("sources[{i}]: {what}"));

            let url = Url::parse(&src.url).map_err(|e| at(format!("invalid url `{}`: {e}", src.url)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(at(format!("url `{}` must be http or https", src.url)));
            }
            JsonPath::parse(&src.extraction_path).map_err(|e| at(e.to_string()))?;
            src.request_headers(self.user_agent.as_deref())
                .map_err(|e| at(e.to_string()))?;
        }
        if let Some(tg) = &self.telegram {
            if tg.bot_token.trim().is_empty() {
                return Err(Error::Config("telegram.botToken must not be empty".into()));
            }
            let ids = tg.chat_id.to_vec();
            if ids.is_empty() || ids.iter().any(|id| id.is_empty()) {
                return Err(Error::Config("telegram.chatId must name at least one chat".into()));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::Config("timeoutSecs must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

fn config_reason(e: &Error) -> String {
    match e {
        Error::Config(reason) => reason.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
