//! Sources: where titles come from.
//!
//! A source is a JSON endpoint plus an extraction path.  This module holds
//! the descriptor and result types, the path matcher ([`extract`]) and the
//! HTTP fetcher ([`api`]).
//!
//! ## For contributors: adding a new source kind
//!
//! 1. Add a variant to [`SourceKind`] so configurations can name it.
//! 2. Add a sub-module with an `async fn fetch(..) -> FetchResult` that
//!    turns every failure into [`FetchResult::failed`].
//! 3. Dispatch on the kind in [`crate::poll::fetch_all`].
//!
//! The diff, ledger and notification stages only ever see [`FetchResult`]s,
//! so nothing downstream changes.

pub mod api;
mod descriptor;
pub mod extract;

pub use descriptor::{FetchResult, SourceDescriptor, SourceKind};
