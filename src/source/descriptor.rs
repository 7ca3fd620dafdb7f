//! The types shared by every stage of the pipeline.
//!
//! A [`SourceDescriptor`] comes straight from configuration; fetching it
//! produces exactly one [`FetchResult`] per run, whatever happens on the
//! wire.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::error::{Error, Result};

/// The kind of endpoint a source points at.  JSON APIs are the only kind
/// today; the tag is kept so configurations stay explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Api,
}

/// One configured endpoint plus its title-extraction rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    /// Display / grouping key.  Not required to be unique.
    #[serde(default)]
    pub name: Option<String>,

    /// The JSON endpoint to GET.
    pub url: String,

    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// Path expression selecting the titles, e.g. `result.*.title`.
    pub extraction_path: String,

    /// Extra request headers.  These win over the global user agent.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>, extraction_path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: url.into(),
            kind: SourceKind::Api,
            extraction_path: extraction_path.into(),
            headers: BTreeMap::new(),
        }
    }

    /// The name used in the ledger and notifications; the url when no
    /// (non-blank) name was configured.
    pub fn display_key(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.url.as_str(),
        }
    }

    /// `User-Agent` (if any) merged with the per-source headers, which take
    /// precedence.  Header names compare case-insensitively.
    pub fn request_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(ua) = user_agent {
            let value = HeaderValue::from_str(ua).map_err(|e| self.header_error("User-Agent", e))?;
            headers.insert(USER_AGENT, value);
        }
        for (name, value) in &self.headers {
            let name_h = HeaderName::from_bytes(name.as_bytes()).map_err(|e| self.header_error(name, e))?;
            let value_h = HeaderValue::from_str(value).map_err(|e| self.header_error(name, e))?;
            headers.insert(name_h, value_h);
        }
        Ok(headers)
    }

    fn header_error(&self, name: &str, e: impl std::fmt::Display) -> Error {
        Error::SourceFetch {
            url: self.url.clone(),
            reason: format!("invalid header `{name}`: {e}"),
        }
    }
}

/// The outcome of polling one source.
///
/// `titles` is empty when the fetch failed, the body was not JSON, or the
/// path simply matched nothing; `failure` tells those apart for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub source: SourceDescriptor,
    pub titles: Vec<String>,
    pub failure: Option<String>,
}

impl FetchResult {
    pub fn ok(source: SourceDescriptor, titles: Vec<String>) -> Self {
        Self {
            source,
            titles,
            failure: None,
        }
    }

    pub fn failed(source: SourceDescriptor, cause: impl Into<String>) -> Self {
        Self {
            source,
            titles: Vec::new(),
            failure: Some(cause.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
