use serde::{Deserialize, Serialize};

use crate::errors::{Result, TallyError};

/// Accepted rating domain, inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBounds {
    pub min: f64,
    pub max: f64,
}

impl RatingBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, rating: f64) -> bool {
        rating.is_finite() && rating >= self.min && rating <= self.max
    }
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

/// Reject ratings outside `bounds` (NaN and infinities included)
///
/// # Errors
/// * `InvalidInput` - rating outside the accepted domain
pub fn validate_rating(rating: f64, bounds: &RatingBounds) -> Result<()> {
    if !bounds.contains(rating) {
        return Err(TallyError::invalid_input(format!(
            "rating {} outside accepted range {}..={}",
            rating, bounds.min, bounds.max
        )));
    }
    Ok(())
}

/// Reject bodies that are empty after trimming
///
/// # Errors
/// * `InvalidInput` - body is empty or whitespace-only
pub fn validate_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(TallyError::invalid_input(
            "review body cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Validate the user-editable part of a review (rating first, then body)
///
/// # Errors
/// * `InvalidInput` - see `validate_rating` and `validate_body`
pub fn validate_review_input(rating: f64, body: &str, bounds: &RatingBounds) -> Result<()> {
    validate_rating(rating, bounds)?;
    validate_body(body)
}
