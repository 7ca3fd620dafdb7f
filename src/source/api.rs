//! JSON API source: one GET, one extraction, one [`FetchResult`].
//!
//! [`fetch`] never fails.  Transport errors, non-2xx responses, bodies that
//! are not JSON and malformed extraction paths are logged with the source's
//! identity and degrade that source to an empty result, so a bad endpoint
//! cannot take the rest of the run down with it.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::extract::JsonPath;
use super::{FetchResult, SourceDescriptor};
use crate::error::{Error, Result};

/// Build the client shared by every fetch in a run.  `timeout` bounds each
/// request individually.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))
}

/// Poll one source exactly once.
pub async fn fetch(client: &Client, source: &SourceDescriptor, user_agent: Option<&str>) -> FetchResult {
    match fetch_titles(client, source, user_agent).await {
        Ok(titles) => {
            if titles.is_empty() {
                debug!(source = %source.display_key(), path = %source.extraction_path, "extraction matched nothing");
            } else {
                info!(source = %source.display_key(), count = titles.len(), "fetched titles");
            }
            FetchResult::ok(source.clone(), titles)
        }
        Err(e) => {
            warn!(source = %source.display_key(), url = %source.url, error = %e, "source failed; contributing no titles");
            FetchResult::failed(source.clone(), e.to_string())
        }
    }
}

async fn fetch_titles(client: &Client, source: &SourceDescriptor, user_agent: Option<&str>) -> Result<Vec<String>> {
    let path = JsonPath::parse(&source.extraction_path)?;
    let headers = source.request_headers(user_agent)?;

    let response = client
        .get(&source.url)
        .headers(headers)
        .send()
        .await
        .map_err(|e| fetch_error(source, error_chain(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(source, format!("HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| fetch_error(source, error_chain(&e)))?;
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| fetch_error(source, format!("response is not JSON: {e}")))?;

    Ok(path.titles(&document))
}

fn fetch_error(source: &SourceDescriptor, reason: String) -> Error {
    Error::SourceFetch {
        url: source.url.clone(),
        reason,
    }
}

/// `reqwest` errors hide the interesting part (DNS, TLS, timeout) in their
/// source chain.
pub(crate) fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut cur = e.source();
    while let Some(inner) = cur {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        cur = inner.source();
    }
    msg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
