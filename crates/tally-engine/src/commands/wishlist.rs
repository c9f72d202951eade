//! Live per-user saved-items set
//!
//! `observe` turns the store subscription on `users/{uid}/wishlist` into a
//! stream of whole membership sets. `toggle` performs the write behind an
//! optimistic flip; undoing the flip on failure is up to the caller (see
//! `tally_core::wishlist::MembershipView`).
//!
//! Snapshots may arrive on any runtime thread. Callers with a
//! single-threaded presentation context must hand them over themselves.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tally_core::model::{collections, wishlist_entry};
use tally_core::store::{FieldValue, Query, WriteFields};
use tally_core::wishlist::ToggleIntent;
use tally_core::{
    log_op_start, Document, IdentityProvider, RemoteStore, Result, Subscription, TallyError,
    WishlistEntry,
};
use tally_core_types::RequestId;

use super::finish;

/// Membership set that follows the store
///
/// Without a signed-in user there is no registration: the set yields one
/// empty delivery and then ends.
#[derive(Debug)]
pub struct LiveSet {
    source: Source,
}

#[derive(Debug)]
enum Source {
    Live(Subscription),
    Unavailable { delivered: bool },
}

impl LiveSet {
    fn live(subscription: Subscription) -> Self {
        Self {
            source: Source::Live(subscription),
        }
    }

    fn unavailable() -> Self {
        Self {
            source: Source::Unavailable { delivered: false },
        }
    }

    /// Whether a store registration backs this set
    pub fn is_live(&self) -> bool {
        matches!(self.source, Source::Live(_))
    }

    /// Wait for the next full membership set
    ///
    /// Each delivery replaces everything before it. `None` once the stream
    /// has ended.
    pub async fn next(&mut self) -> Option<BTreeSet<String>> {
        match &mut self.source {
            Source::Live(sub) => sub.next().await.map(|docs| membership(&docs)),
            Source::Unavailable { delivered } => take_empty(delivered),
        }
    }

    /// Newest membership set already delivered, skipping older ones
    pub fn latest(&mut self) -> Option<BTreeSet<String>> {
        match &mut self.source {
            Source::Live(sub) => sub.latest().map(|docs| membership(&docs)),
            Source::Unavailable { delivered } => take_empty(delivered),
        }
    }

    /// Release the store registration
    pub fn cancel(self) {
        if let Source::Live(sub) = self.source {
            sub.cancel();
        }
    }
}

fn take_empty(delivered: &mut bool) -> Option<BTreeSet<String>> {
    if *delivered {
        None
    } else {
        *delivered = true;
        Some(BTreeSet::new())
    }
}

fn membership(docs: &[Document]) -> BTreeSet<String> {
    docs.iter()
        .map(|doc| WishlistEntry::from_document(doc).item_id)
        .collect()
}

pub struct WishlistSync {
    store: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl WishlistSync {
    pub fn new(store: Arc<dyn RemoteStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Subscribe to the signed-in user's saved set
    ///
    /// Signed out is not an error: the returned set is empty and not live.
    ///
    /// # Errors
    /// * `Remote` - the store refused the subscription
    pub async fn observe(&self) -> Result<LiveSet> {
        let op = "observe_wishlist";
        let request_id = RequestId::new();
        let started = Instant::now();

        let Some(user_id) = self.identity.current_user_id() else {
            log_op_start!(op, request_id = %request_id, signed_in = false);
            return finish(op, &request_id, started, Ok(LiveSet::unavailable()));
        };
        log_op_start!(op, request_id = %request_id, user_id = %user_id);

        let result = self
            .store
            .subscribe(&collections::wishlist(&user_id), &Query::new())
            .await
            .map(LiveSet::live)
            .map_err(TallyError::from);
        finish(op, &request_id, started, result)
    }

    /// Write the membership change for an optimistic flip
    ///
    /// A current member is removed, a non-member is added with a server
    /// `addedAt`. Returns the write that was performed.
    ///
    /// # Errors
    /// * `Unauthenticated` - no signed-in user
    /// * `Remote` - the write failed; the caller should revert its flip
    pub async fn toggle(&self, item_id: &str, known_member: bool) -> Result<ToggleIntent> {
        let op = "toggle_wishlist";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, item_id = item_id, known_member = known_member);

        let result = self.write_toggle(op, item_id, known_member).await;
        finish(op, &request_id, started, result)
    }

    async fn write_toggle(
        &self,
        op: &str,
        item_id: &str,
        known_member: bool,
    ) -> Result<ToggleIntent> {
        let user_id = self
            .identity
            .current_user_id()
            .ok_or_else(|| TallyError::Unauthenticated { op: op.to_string() })?;
        let collection = collections::wishlist(&user_id);

        let intent = ToggleIntent::for_membership(known_member);
        match intent {
            ToggleIntent::Add => {
                let mut data = WriteFields::new();
                data.insert(
                    wishlist_entry::FIELD_ADDED_AT.to_string(),
                    FieldValue::ServerTimestamp,
                );
                self.store.set(&collection, item_id, data).await?;
            }
            ToggleIntent::Remove => {
                self.store.delete(&collection, item_id).await?;
            }
        }
        Ok(intent)
    }
}
