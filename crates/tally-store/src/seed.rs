//! JSON seed loading
//!
//! A seed is one JSON object keyed by collection path, each holding an
//! object keyed by document id:
//!
//! ```json
//! { "items": { "g1": { "title": "Hades", "releaseDate": "2020-09-17" } },
//!   "users/u1/wishlist": { "g1": { "addedAt": "2025-11-01T10:00:00.000000Z" } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tally_core::model::Fields;
use tally_core::{Result, TallyError};

use crate::memory::MemoryStore;

/// Parsed seed: collection path -> document id -> fields
pub type Seed = BTreeMap<String, BTreeMap<String, Fields>>;

/// Parse and validate a seed from a string
pub fn parse_seed_str(content: &str) -> Result<Seed> {
    let seed: Seed = serde_json::from_str(content)?;
    validate_seed(&seed)?;
    Ok(seed)
}

/// Parse and validate a seed file
pub fn parse_seed_file(path: &Path) -> Result<Seed> {
    let content = fs::read_to_string(path).map_err(|e| {
        TallyError::invalid_input(format!(
            "Failed to read seed file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_seed_str(&content)
}

/// Write a seed as pretty-printed JSON
pub fn write_seed_file(path: &Path, seed: &Seed) -> Result<()> {
    let content = serde_json::to_string_pretty(seed)?;
    fs::write(path, content).map_err(|e| {
        TallyError::invalid_input(format!(
            "Failed to write seed file {}: {}",
            path.display(),
            e
        ))
    })
}

fn validate_seed(seed: &Seed) -> Result<()> {
    for (collection, docs) in seed {
        let segments: Vec<&str> = collection.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) || segments.len() % 2 == 0 {
            return Err(TallyError::invalid_input(format!(
                "Invalid collection path '{}'",
                collection
            )));
        }
        if let Some(id) = docs.keys().find(|id| id.is_empty() || id.contains('/')) {
            return Err(TallyError::invalid_input(format!(
                "Invalid document id '{}' in {}",
                id, collection
            )));
        }
    }
    Ok(())
}

impl MemoryStore {
    /// Build a store holding the seed's documents
    pub fn from_seed(seed: Seed) -> Self {
        let store = MemoryStore::new();
        store.load_seed(seed);
        store
    }

    /// Write every seeded document, replacing any existing one with the same id
    pub fn load_seed(&self, seed: Seed) -> usize {
        let mut loaded = 0;
        for (collection, docs) in seed {
            for (id, fields) in docs {
                self.insert_document(&collection, &id, fields);
                loaded += 1;
            }
        }
        tracing::debug!(documents = loaded, "seed loaded");
        loaded
    }

    /// Current contents in seed form, so a run's writes can be saved
    pub fn export_seed(&self) -> Seed {
        self.dump()
    }
}
