//! Tally Store - in-process document store
//!
//! `MemoryStore` implements the `RemoteStore` contract entirely in memory:
//! - Collections of JSON documents addressed by slash paths
//! - Equality/range/bounded in-set filters, ordering and limits
//! - Full-snapshot subscriptions released on cancel or drop
//! - Server timestamps from a strictly monotonic clock
//! - Fault and latency injection plus per-operation call counters for tests
//! - JSON seed loading for the CLI and fixtures

pub mod clock;
pub mod fault;
pub mod memory;
pub mod query_eval;
pub mod seed;

pub use fault::{Fault, StoreOp};
pub use memory::{MemoryStore, MemoryStoreConfig};
