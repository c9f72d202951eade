//! Engine configuration
//!
//! Every section and field is optional in the TOML source; missing values
//! take the defaults below.
//!
//! ```toml
//! [batch]
//! chunk_size = 10
//!
//! [reviews]
//! min_rating = 0.0
//! max_rating = 5.0
//!
//! [backfill]
//! concurrency = 8
//!
//! [catalog]
//! default_limit = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use tally_core::rules::RatingBounds;
use tally_core::{Result, TallyError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub batch: BatchConfig,
    pub reviews: ReviewConfig,
    pub backfill: BackfillConfig,
    pub catalog: CatalogConfig,
}

/// Batch fetch chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on ids per chunk; the store's own in-filter limit caps it
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { chunk_size: 10 }
    }
}

/// Accepted rating domain, inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub min_rating: f64,
    pub max_rating: f64,
}

impl ReviewConfig {
    pub fn bounds(&self) -> RatingBounds {
        RatingBounds::new(self.min_rating, self.max_rating)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let bounds = RatingBounds::default();
        Self {
            min_rating: bounds.min,
            max_rating: bounds.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Maximum per-item recomputes in flight
    pub concurrency: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Page size when the caller does not pass one
    pub default_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { default_limit: 20 }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// * `Serialization` - not valid TOML or a field has the wrong type
    /// * `InvalidInput` - see `validate`
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| TallyError::Serialization {
            message: format!("invalid engine config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// * `InvalidInput` - file unreadable, or see `from_toml_str`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TallyError::invalid_input(format!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    /// * `InvalidInput` - zero chunk size, zero concurrency, zero default
    ///   limit, or an empty/non-finite rating range
    pub fn validate(&self) -> Result<()> {
        if self.batch.chunk_size == 0 {
            return Err(TallyError::invalid_input("batch.chunk_size must be at least 1"));
        }
        if self.backfill.concurrency == 0 {
            return Err(TallyError::invalid_input(
                "backfill.concurrency must be at least 1",
            ));
        }
        if self.catalog.default_limit == 0 {
            return Err(TallyError::invalid_input(
                "catalog.default_limit must be at least 1",
            ));
        }
        let r = &self.reviews;
        if !r.min_rating.is_finite() || !r.max_rating.is_finite() || r.min_rating > r.max_rating {
            return Err(TallyError::invalid_input(format!(
                "reviews rating range {}..={} is empty",
                r.min_rating, r.max_rating
            )));
        }
        Ok(())
    }
}
