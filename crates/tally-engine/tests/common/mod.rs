use std::sync::Arc;

use tally_core::model::{collections, Fields};
use tally_core::{Aggregate, RemoteStore, StaticIdentity};
use tally_engine::{BackfillJob, BatchFetcher, Catalog, EngineConfig, ReviewEngine, WishlistSync};
use tally_store::MemoryStore;

/// Every engine wired to one in-memory store
#[allow(dead_code)]
pub struct Harness {
    pub store: MemoryStore,
    pub identity: Arc<StaticIdentity>,
    pub reviews: Arc<ReviewEngine>,
    pub fetcher: BatchFetcher,
    pub backfill: BackfillJob,
    pub wishlist: WishlistSync,
    pub catalog: Catalog,
}

/// Harness with default config and user `u1` signed in
#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with(MemoryStore::new(), EngineConfig::default())
}

#[allow(dead_code)]
pub fn harness_with(store: MemoryStore, config: EngineConfig) -> Harness {
    let remote: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let identity = Arc::new(StaticIdentity::signed_in("u1"));
    let reviews = Arc::new(ReviewEngine::new(remote.clone(), &config.reviews));
    Harness {
        fetcher: BatchFetcher::new(remote.clone(), &config.batch),
        backfill: BackfillJob::new(remote.clone(), reviews.clone(), &config.backfill),
        wishlist: WishlistSync::new(remote.clone(), identity.clone()),
        catalog: Catalog::new(remote, &config.batch, &config.catalog),
        store,
        identity,
        reviews,
    }
}

/// Insert an item document with a title and no aggregate
#[allow(dead_code)]
pub fn seed_item(store: &MemoryStore, id: &str) {
    store.insert_document(
        collections::ITEMS,
        id,
        Fields::new().with("title", format!("Game {}", id)),
    );
}

/// Aggregate currently stored on an item
#[allow(dead_code)]
pub fn stored_aggregate(store: &MemoryStore, item_id: &str) -> Aggregate {
    let fields = store
        .document(collections::ITEMS, item_id)
        .expect("item should exist");
    Aggregate::from_fields(&fields)
}
