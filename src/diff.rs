//! Set difference between fresh fetch results and the known-items ledger.

use std::collections::HashSet;

use crate::ledger::{normalize_title, KnownItems};
use crate::source::FetchResult;

/// Newly discovered titles grouped by source display key.
///
/// Keys keep first-seen order; titles keep discovery order.  Sorting for
/// display happens when the ledger section or notification is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItemsBySource {
    groups: Vec<(String, Vec<String>)>,
}

impl NewItemsBySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `items` under `source`, creating the group if needed.  Titles
    /// already listed under that source are skipped.
    pub fn extend(&mut self, source: &str, items: impl IntoIterator<Item = String>) {
        let idx = match self.groups.iter().position(|(k, _)| k == source) {
            Some(i) => i,
            None => {
                self.groups.push((source.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx].1;
        for item in items {
            if !group.contains(&item) {
                group.push(item);
            }
        }
        if group.is_empty() {
            self.groups.remove(idx);
        }
    }

    pub fn get(&self, source: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(k, _)| k == source)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn sources(&self) -> usize {
        self.groups.len()
    }

    /// Total titles across all sources, counting a title once per source
    /// that reported it.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per source, the titles not already in `known`.
///
/// Titles are first put in the form the ledger stores them in
/// ([`normalize_title`]); after that, matching is exact and case-sensitive.
/// Sources with nothing new are left out.  There is no de-duplication across
/// sources: a new title reported by two sources is listed under both.
pub fn diff(known: &KnownItems, results: &[FetchResult]) -> NewItemsBySource {
    let mut out = NewItemsBySource::new();
    for result in results {
        let mut seen = HashSet::new();
        let fresh: Vec<String> = result
            .titles
            .iter()
            .filter_map(|t| normalize_title(t))
            .filter(|t| !known.contains(t))
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if !fresh.is_empty() {
            out.extend(result.source.display_key(), fresh);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
