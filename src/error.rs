//! Error taxonomy for a single run.
//!
//! Only [`Error::Config`] and [`Error::LedgerWrite`] ever escape
//! [`crate::run::run_once`]; every other variant is logged and absorbed where
//! it happens so one bad source or destination cannot fail the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration.  Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network, HTTP status, or body-parse failure for one source.
    #[error("fetching {url} failed: {reason}")]
    SourceFetch { url: String, reason: String },

    /// Malformed extraction path.
    #[error("invalid extraction path `{path}`: {reason}")]
    Extraction { path: String, reason: String },

    /// An existing ledger file that could not be read.
    #[error("reading ledger {path} failed: {source}")]
    LedgerRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger could not be persisted.  Fatal.
    #[error("writing ledger {path} failed: {source}")]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delivery to one notification destination failed.
    #[error("notifying {destination} failed: {reason}")]
    Notification { destination: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
