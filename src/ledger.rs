//! The append-only Markdown ledger of every item ever recorded.
//!
//! ```text
//!
//! ## 18.10.2026 09:30
//! ### Source name
//! - Item one
//! - Item two
//! ```
//!
//! Parsing ([`read_known_items`]) and rendering ([`render_section`]) are pure;
//! [`Ledger`] owns the file I/O.  A missing file is the normal first-run
//! state and reads as an empty ledger.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{debug, warn};

use crate::diff::NewItemsBySource;
use crate::error::{Error, Result};

/// Every item name that appears anywhere in the ledger.
pub type KnownItems = HashSet<String>;

/// Section heading format: `DD.MM.YYYY HH:MM`.
const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Flatten ledger text into the set of recorded item names.
///
/// Headings of any level (`# `, `## `, `### `, ...) and blank lines are not
/// data; a leading `- ` list marker is stripped.
pub fn read_known_items(text: &str) -> KnownItems {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_heading(line))
        .map(|line| line.strip_prefix("- ").unwrap_or(line).trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// A run of `#` followed by whitespace or the end of the line.  `#1 Hit`
/// is data, `## 01.01.2026 08:00` and a bare `###` are not.
fn is_heading(line: &str) -> bool {
    let rest = line.trim_start_matches('#');
    rest.len() < line.len() && rest.chars().next().map_or(true, char::is_whitespace)
}

/// The form a title takes once written to and read back from the ledger:
/// trimmed, with line breaks collapsed to single spaces.  `None` for titles
/// that would read back as nothing.
pub fn normalize_title(title: &str) -> Option<String> {
    let joined = title
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Render one timestamped section.  Sources appear in the order they were
/// discovered; items within a source are sorted with [`collate`].
pub fn render_section(new_items: &NewItemsBySource, timestamp: &str) -> String {
    let mut out = format!("\n## {timestamp}\n");
    for (source, items) in new_items.iter() {
        out.push_str(&format!("### {source}\n"));
        for item in sorted(items) {
            out.push_str(&format!("- {item}\n"));
        }
    }
    out
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Human-friendly ordering: case-insensitive first, then by code point so
/// the order is total and stable.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn sorted(items: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = items.iter().map(String::as_str).collect();
    v.sort_by(|a, b| collate(a, b));
    v
}

// ---------------------------------------------------------------------------
// File-backed ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current ledger text; empty if the file does not exist yet.
    pub async fn read(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(Error::LedgerRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// The known-items set.  An unreadable file is logged and treated as
    /// empty rather than failing the run.
    pub async fn known_items(&self) -> KnownItems {
        match self.read().await {
            Ok(text) => {
                let known = read_known_items(&text);
                debug!(path = %self.path.display(), count = known.len(), "loaded ledger");
                known
            }
            Err(e) => {
                warn!(error = %e, "treating ledger as empty");
                KnownItems::new()
            }
        }
    }

    /// Append one section for `new_items` and persist the whole file in a
    /// single write.  Creates the file on first use.
    pub async fn append(&self, new_items: &NewItemsBySource, timestamp: &str) -> Result<()> {
        let mut text = match self.read().await {
            Ok(text) => text,
            Err(Error::LedgerRead { source, .. }) => {
                return Err(Error::LedgerWrite {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(e) => return Err(e),
        };
        text.push_str(&render_section(new_items, timestamp));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|source| Error::LedgerWrite {
                path: self.path.clone(),
                source,
            })?;
        }
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|source| Error::LedgerWrite {
                path: self.path.clone(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use chrono::{FixedOffset, Utc};

    fn items(groups: Vec<(&str, Vec<&str>)>) -> NewItemsBySource {
        let mut n = NewItemsBySource::new();
        for (source, titles) in groups {
            n.extend(source, titles.iter().map(|s| s.to_string()));
        }
        n
    }

    fn set(items: &[&str]) -> KnownItems {
        items.iter().map(|s| s.to_string()).collect()
    }

    // -- read_known_items ------------------------------------------------------

    #[test]
    fn ignores_headings_of_every_level_and_blank_lines() {
        let text = "# Known items\n\n## 01.02.2026 10:00\n### Source\n- Drama A\n-   Drama B  \n\n#### deep\n";
        assert_eq!(read_known_items(text), set(&["Drama A", "Drama B"]));
    }

    #[test]
    fn lines_without_list_marker_still_count() {
        assert_eq!(read_known_items("  plain line \n- listed"), set(&["plain line", "listed"]));
    }

    #[test]
    fn hash_without_space_is_data_not_a_heading() {
        let text = "## 01.01.2026 08:00\n###\n#1 Hit\n#\tTabbed heading\n- #2 Listed";
        assert_eq!(read_known_items(text), set(&["#1 Hit", "#2 Listed"]));
    }

    #[test]
    fn normalized_titles_survive_the_round_trip() {
        assert_eq!(normalize_title("  Drama A "), Some("Drama A".to_string()));
        assert_eq!(normalize_title("Line1\nLine2"), Some("Line1 Line2".to_string()));
        assert_eq!(normalize_title("a \r\n\n b"), Some("a b".to_string()));
        assert_eq!(normalize_title(""), None);
        assert_eq!(normalize_title(" \n\t "), None);

        let titles = ["Drama A ", "Line1\nLine2", "- dash", "#1 Hit", "  "];
        let normalized: Vec<String> = titles.iter().filter_map(|t| normalize_title(t)).collect();
        let mut n = NewItemsBySource::new();
        n.extend("S", normalized.clone());
        let known = read_known_items(&render_section(&n, "ts"));
        assert_eq!(known, normalized.into_iter().collect::<KnownItems>());
    }

    #[test]
    fn empty_text_is_empty_set() {
        assert!(read_known_items("").is_empty());
    }

    // -- render_section --------------------------------------------------------

    #[test]
    fn renders_sorted_items_under_source_headings() {
        let n = items(vec![("Shows", vec!["Drama B", "Drama A"])]);
        assert_eq!(
            render_section(&n, "01.02.2026 10:00"),
            "\n## 01.02.2026 10:00\n### Shows\n- Drama A\n- Drama B\n"
        );
    }

    #[test]
    fn sources_keep_discovery_order() {
        let n = items(vec![("Zeta", vec!["z"]), ("Alpha", vec!["a"])]);
        let s = render_section(&n, "ts");
        assert!(s.find("### Zeta").unwrap() < s.find("### Alpha").unwrap());
    }

    #[test]
    fn collation_is_case_insensitive_first() {
        let owned: Vec<String> = ["banana", "Cherry", "apple", "Apple"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sorted(&owned), ["Apple", "apple", "banana", "Cherry"]);
    }

    #[test]
    fn round_trip_unions_old_and_new() {
        let old = "\n## 01.01.2026 08:00\n### S\n- Drama A\n";
        let n = items(vec![("S", vec!["Drama C"]), ("T", vec!["Drama A", "Drama D"])]);
        let text = format!("{old}{}", render_section(&n, "02.01.2026 08:00"));
        assert_eq!(read_known_items(&text), set(&["Drama A", "Drama C", "Drama D"]));
    }

    #[test]
    fn timestamp_is_zero_padded() {
        let at = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 3, 4, 5, 6, 0).unwrap();
        assert_eq!(format_timestamp(&at), "04.03.2026 05:06");
        let utc = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(format_timestamp(&utc), "31.12.2026 23:59");
    }

    // -- Ledger (file I/O) -----------------------------------------------------

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let tmp = tempdir().unwrap();
        let ledger = Ledger::new(tmp.path().join("missing.md"));
        assert_eq!(ledger.read().await.unwrap(), "");
        assert!(ledger.known_items().await.is_empty());
    }

    #[tokio::test]
    async fn append_creates_then_extends_the_file() {
        let tmp = tempdir().unwrap();
        let ledger = Ledger::new(tmp.path().join("nested").join("ledger.md"));

        ledger.append(&items(vec![("S", vec!["Drama B", "Drama A"])]), "01.01.2026 08:00").await.unwrap();
        ledger.append(&items(vec![("S", vec!["Drama C"])]), "02.01.2026 08:00").await.unwrap();

        let text = ledger.read().await.unwrap();
        assert_eq!(
            text,
            "\n## 01.01.2026 08:00\n### S\n- Drama A\n- Drama B\n\n## 02.01.2026 08:00\n### S\n- Drama C\n"
        );
        assert_eq!(ledger.known_items().await, set(&["Drama A", "Drama B", "Drama C"]));
    }

    #[tokio::test]
    async fn append_preserves_existing_text_verbatim() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("existing.md");
        std::fs::write(&path, "# My list\n- Old one").unwrap();
        let ledger = Ledger::new(&path);

        ledger.append(&items(vec![("S", vec!["New one"])]), "ts").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# My list\n- Old one\n## ts\n"));
    }

    #[tokio::test]
    async fn unreadable_ledger_is_empty_but_unwritable() {
        // A directory where the file should be: reads fail, writes fail.
        let tmp = tempdir().unwrap();
        let ledger = Ledger::new(tmp.path());

        assert!(ledger.known_items().await.is_empty());
        let err = ledger.append(&items(vec![("S", vec!["x"])]), "ts").await.unwrap_err();
        assert!(matches!(err, Error::LedgerWrite { .. }));
    }
}
