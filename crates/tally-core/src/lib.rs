//! Tally Core - domain model and contracts for the aggregate engine
//!
//! This crate holds everything the engines agree on without doing I/O:
//! - Item / Review / WishlistEntry models parsed from store documents
//! - The remote document store contract (`RemoteStore`, `Query`, `Subscription`)
//! - The identity provider contract
//! - Input validation and the pure aggregate function
//! - The pure wishlist toggle transition and caller-side reconciliation
//! - Error and logging facilities shared by every crate

pub mod aggregate;
pub mod errors;
pub mod identity;
pub mod logging_facility;
pub mod model;
pub mod rules;
pub mod store;
pub mod wishlist;

// Re-export commonly used types
pub use aggregate::Aggregate;
pub use errors::{ExError, ExErrorKind, Result, StoreError, StoreErrorCode, TallyError};
pub use identity::{IdentityProvider, StaticIdentity};
pub use model::{Document, Fields, Item, Review, WishlistEntry};
pub use store::{FieldValue, Filter, OrderBy, Query, RemoteStore, Subscription, WriteFields};
