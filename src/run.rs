//! One complete run: ledger → fetch all → diff → append → notify.
//!
//! Only a ledger write failure makes a run fail here (configuration errors
//! are caught before a run starts).  Source and notification failures are
//! logged, counted in the [`RunSummary`], and otherwise ignored.

use chrono::Local;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::diff::{diff, NewItemsBySource};
use crate::error::Result;
use crate::ledger::{format_timestamp, Ledger};
use crate::notify::{format_message, notify_all, DeliveryReport, Notifier};
use crate::poll::fetch_all;

/// Where to send notifications, if anywhere.
pub struct NotifyTarget<'a, N> {
    pub notifier: &'a N,
    pub destinations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Fetch and diff, but leave the ledger untouched and send nothing.
    pub dry_run: bool,
    /// Section heading to use instead of the current local time.
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources_polled: usize,
    pub sources_failed: usize,
    pub titles_fetched: usize,
    pub new_items: NewItemsBySource,
    pub ledger_written: bool,
    pub notifications: DeliveryReport,
}

pub async fn run_once<N: Notifier>(
    config: &Config,
    client: &Client,
    notify: Option<NotifyTarget<'_, N>>,
    options: &RunOptions,
) -> Result<RunSummary> {
    let ledger = Ledger::new(config.ledger_path());
    let known = ledger.known_items().await;
    debug!(known = known.len(), path = %ledger.path().display(), "ledger read");

    let results = fetch_all(client, &config.sources, config.user_agent.as_deref()).await;
    let new_items = diff(&known, &results);

    let mut summary = RunSummary {
        sources_polled: results.len(),
        sources_failed: results.iter().filter(|r| r.is_failure()).count(),
        titles_fetched: results.iter().map(|r| r.titles.len()).sum(),
        new_items,
        ..Default::default()
    };

    if summary.new_items.is_empty() {
        info!("no new items");
        return Ok(summary);
    }

    if options.dry_run {
        for (source, items) in summary.new_items.iter() {
            info!(source = %source, items = ?items, "dry run: would record");
        }
        return Ok(summary);
    }

    let timestamp = options
        .timestamp
        .clone()
        .unwrap_or_else(|| format_timestamp(&Local::now()));
    ledger.append(&summary.new_items, &timestamp).await?;
    summary.ledger_written = true;
    info!(
        path = %ledger.path().display(),
        count = summary.new_items.total(),
        "recorded new items"
    );

    if let Some(target) = notify {
        let message = format_message(&summary.new_items);
        summary.notifications = notify_all(target.notifier, &target.destinations, &message).await;
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
