pub mod validation;

pub use validation::{validate_body, validate_rating, validate_review_input, RatingBounds};
