//! Concurrent fan-out over every configured source.
//!
//! All fetches are issued at once and joined: the run waits for every source
//! to settle (a barrier, not a race).  Each fetch is bounded by the client's
//! per-request timeout, so one hung endpoint delays the run by at most that
//! long and never cancels its siblings.

use futures::future::join_all;
use reqwest::Client;

use crate::source::{api, FetchResult, SourceDescriptor, SourceKind};

/// Fetch every source once.  Results come back in configuration order; a
/// failing source yields an empty [`FetchResult`] and never affects others.
pub async fn fetch_all(client: &Client, sources: &[SourceDescriptor], user_agent: Option<&str>) -> Vec<FetchResult> {
    let fetches = sources.iter().map(|src| async move {
        match src.kind {
            SourceKind::Api => api::fetch(client, src, user_agent).await,
        }
    });
    join_all(fetches).await
}
