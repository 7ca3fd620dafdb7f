//! Poll JSON endpoints once, record newly seen titles in an append-only
//! Markdown ledger, and optionally push a Telegram notification.
//!
//! The binary in `main.rs` is a thin wrapper around [`run::run_once`].

pub mod config;
pub mod diff;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod poll;
pub mod run;
pub mod source;
#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
