//! Tally Engine - orchestration over a remote document store
//!
//! Every engine is handed an `Arc<dyn RemoteStore>` at construction and
//! holds no other shared state:
//! - `BatchFetcher`: chunked fetch-by-id with order-preserving merge
//! - `ReviewEngine`: review lifecycle plus aggregate recompute
//! - `BackfillJob`: corpus-wide aggregate repair
//! - `WishlistSync`: live per-user membership set and toggles
//! - `Catalog`: the item listings the UI browses

pub mod commands;
pub mod config;

pub use commands::backfill::{BackfillJob, BackfillReport, ItemOutcome};
pub use commands::batch_fetch::BatchFetcher;
pub use commands::catalog::Catalog;
pub use commands::reviews::ReviewEngine;
pub use commands::wishlist::{LiveSet, WishlistSync};
pub use config::EngineConfig;
