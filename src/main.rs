//! release-watch: record newly published titles from JSON endpoints.
//!
//! ## Architecture overview
//!
//! ```text
//!                ┌───────────┐ FetchResult ┌─────────┐ NewItems ┌───────────┐
//! config.rs ───► │  poll.rs  │ ──────────► │ diff.rs │ ───────► │ ledger.rs │
//!                │ (join_all)│             └─────────┘          │  (append) │
//!                └───────────┘                  ▲               └───────────┘
//!                      │ per source             │ KnownItems          │
//!                ┌───────────┐             ┌───────────┐        ┌───────────┐
//!                │ source/   │             │ ledger.rs │        │ notify.rs │
//!                │ api +     │             │  (read)   │        │ (Telegram)│
//!                │ extract   │             └───────────┘        └───────────┘
//!                └───────────┘
//! ```
//!
//! * **`source/`**: source descriptors, the JSON path matcher and the HTTP
//!   fetcher.
//! * **`poll`**: fetches every source concurrently and waits for all.
//! * **`diff`**: per-source set difference against the ledger.
//! * **`ledger`**: parses and appends the Markdown ledger.
//! * **`notify`**: formats and delivers the summary message.
//! * **`run`**: sequences one complete run.
//! * **`main`**: parses args, loads config, sets up logging, runs once.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use release_watch::config::Config;
use release_watch::notify::TelegramNotifier;
use release_watch::run::{self, NotifyTarget, RunOptions};
use release_watch::source::api;

const DEFAULT_CONFIG: &str = "config.json";
const CONFIG_ENV: &str = "RELEASE_WATCH_CONFIG";

const USAGE: &str = "\
usage: release-watch [--dry-run] [CONFIG]

Polls every configured source once, appends new titles to the ledger and
sends a notification if Telegram is configured.

  CONFIG      path to the JSON config (default: $RELEASE_WATCH_CONFIG or config.json)
  --dry-run   fetch and diff only; do not write the ledger or notify

Logging is controlled with RUST_LOG (default: info).";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: PathBuf,
    dry_run: bool,
}

enum Command {
    Run(Args),
    Help,
}

fn parse_args(args: impl IntoIterator<Item = String>, env_config: Option<String>) -> Result<Command> {
    let mut config = None;
    let mut dry_run = false;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--dry-run" => dry_run = true,
            flag if flag.starts_with('-') => bail!("unknown option `{flag}`\n\n{USAGE}"),
            path if config.is_none() => config = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument `{extra}`\n\n{USAGE}"),
        }
    }
    let config = config
        .or_else(|| env_config.filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    Ok(Command::Run(Args { config, dry_run }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1), std::env::var(CONFIG_ENV).ok())? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Run(args) => args,
    };
    init_tracing();

    // -- configuration (fatal on error) --------------------------------------
    let config = Config::load(&args.config).context("loading configuration")?;
    info!(
        config = %args.config.display(),
        sources = config.sources.len(),
        ledger = %config.ledger_path().display(),
        "configuration loaded"
    );

    let client = api::http_client(config.timeout())?;

    // -- notification target (optional) --------------------------------------
    let telegram;
    let notify = if let Some(tg) = &config.telegram {
        telegram = TelegramNotifier::new(client.clone(), tg.bot_token.trim());
        Some(NotifyTarget {
            notifier: &telegram,
            destinations: tg.chat_id.to_vec(),
        })
    } else {
        None
    };

    // -- run ------------------------------------------------------------------
    let options = RunOptions {
        dry_run: args.dry_run,
        timestamp: None,
    };
    let summary = run::run_once(&config, &client, notify, &options)
        .await
        .context("run failed")?;

    info!(
        sources = summary.sources_polled,
        failed = summary.sources_failed,
        titles = summary.titles_fetched,
        new = summary.new_items.total(),
        new_sources = summary.new_items.sources(),
        ledger_written = summary.ledger_written,
        notified = summary.notifications.delivered,
        notify_failed = summary.notifications.failed,
        "run complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_args(cmd: Command) -> Args {
        match cmd {
            Command::Run(a) => a,
            Command::Help => panic!("expected a run command"),
        }
    }

    #[test]
    fn defaults_to_config_json() {
        let a = run_args(parse_args(args(&[]), None).unwrap());
        assert_eq!(a, Args { config: PathBuf::from("config.json"), dry_run: false });
    }

    #[test]
    fn env_var_is_used_when_no_path_given() {
        let a = run_args(parse_args(args(&[]), Some("/etc/rw.json".into())).unwrap());
        assert_eq!(a.config, PathBuf::from("/etc/rw.json"));

        let a = run_args(parse_args(args(&["local.json"]), Some("/etc/rw.json".into())).unwrap());
        assert_eq!(a.config, PathBuf::from("local.json"));
    }

    #[test]
    fn dry_run_flag_in_any_position() {
        let a = run_args(parse_args(args(&["c.json", "--dry-run"]), None).unwrap());
        assert!(a.dry_run);
        assert_eq!(a.config, PathBuf::from("c.json"));
    }

    #[test]
    fn help_and_bad_arguments() {
        assert!(matches!(parse_args(args(&["--help"]), None).unwrap(), Command::Help));
        assert!(parse_args(args(&["--verbose"]), None).is_err());
        assert!(parse_args(args(&["a.json", "b.json"]), None).is_err());
    }
}
