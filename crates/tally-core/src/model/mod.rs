pub mod document;
pub mod fields;
pub mod item;
pub mod review;
pub mod wishlist_entry;

pub use document::Document;
pub use fields::Fields;
pub use item::Item;
pub use review::Review;
pub use wishlist_entry::WishlistEntry;

/// Collection paths used by the engines
pub mod collections {
    pub const ITEMS: &str = "items";
    pub const REVIEWS: &str = "reviews";
    pub const USERS: &str = "users";

    /// Per-user saved-items subcollection: `users/{uid}/wishlist`
    pub fn wishlist(user_id: &str) -> String {
        format!("{}/{}/wishlist", USERS, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::collections;

    #[test]
    fn test_wishlist_path_is_scoped_to_user() {
        assert_eq!(collections::wishlist("u1"), "users/u1/wishlist");
        assert_ne!(collections::wishlist("u1"), collections::wishlist("u2"));
    }
}
