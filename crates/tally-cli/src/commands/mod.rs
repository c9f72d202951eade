//! Subcommands and the state they share

pub mod backfill;
pub mod catalog;
pub mod review;
pub mod wishlist;

use anyhow::Context as _;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tally_core::logging_facility::{self, Profile};
use tally_core::{RemoteStore, StaticIdentity};
use tally_engine::{BackfillJob, BatchFetcher, Catalog, EngineConfig, ReviewEngine, WishlistSync};
use tally_store::seed::{parse_seed_file, write_seed_file};
use tally_store::{MemoryStore, MemoryStoreConfig};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// JSON seed to load into the store
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    /// Write the store back out as a seed when the command succeeds
    #[arg(long, global = true)]
    pub save: Option<PathBuf>,

    /// TOML engine configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Signed-in user for per-user commands
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Logging profile: dev, prod or test
    #[arg(long, global = true, default_value = "dev")]
    pub log_profile: Profile,
}

/// `[store]` section of the config file; the rest belongs to the engines
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreSection {
    store: MemoryStoreConfig,
}

pub struct Context {
    pub store: MemoryStore,
    pub remote: Arc<dyn RemoteStore>,
    pub identity: Arc<StaticIdentity>,
    pub config: EngineConfig,
    save: Option<PathBuf>,
}

impl Context {
    pub fn open(args: &GlobalArgs) -> anyhow::Result<Self> {
        logging_facility::init(args.log_profile);

        let (config, store_config) = match &args.config {
            Some(path) => load_config(path)?,
            None => (EngineConfig::default(), MemoryStoreConfig::default()),
        };

        let store = MemoryStore::with_config(store_config);
        if let Some(path) = &args.seed {
            let seed = parse_seed_file(path)?;
            store.load_seed(seed);
        }

        let identity = Arc::new(match &args.user {
            Some(user) => StaticIdentity::signed_in(user.clone()),
            None => StaticIdentity::signed_out(),
        });

        Ok(Self {
            remote: Arc::new(store.clone()),
            store,
            identity,
            config,
            save: args.save.clone(),
        })
    }

    pub fn reviews(&self) -> Arc<ReviewEngine> {
        Arc::new(ReviewEngine::new(self.remote.clone(), &self.config.reviews))
    }

    pub fn fetcher(&self) -> BatchFetcher {
        BatchFetcher::new(self.remote.clone(), &self.config.batch)
    }

    pub fn backfill(&self) -> BackfillJob {
        BackfillJob::new(self.remote.clone(), self.reviews(), &self.config.backfill)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.remote.clone(), &self.config.batch, &self.config.catalog)
    }

    pub fn wishlist(&self) -> WishlistSync {
        WishlistSync::new(self.remote.clone(), self.identity.clone())
    }

    /// Persist the store if `--save` was given
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.save {
            write_seed_file(path, &self.store.export_seed())?;
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<(EngineConfig, MemoryStoreConfig)> {
    let engine = EngineConfig::load(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let section: StoreSection = toml::from_str(&content)
        .with_context(|| format!("invalid [store] section in {}", path.display()))?;
    section.store.validate()?;
    Ok((engine, section.store))
}

/// Print a value to stdout as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
