//! Persistence gateway for extracted primitives.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::{StoreArgs, StoreBackend};
use crate::config::AppConfig;

mod sqlite;
mod supabase;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrimitive {
    pub id: i64,
    pub primitive: String,
}

pub trait PrimitiveStore {
    /// Backend name and location, for logs and manifests.
    fn describe(&self) -> String;

    fn insert(&self, primitive: &str) -> Result<()>;

    /// All primitives, oldest first.
    fn list(&self) -> Result<Vec<StoredPrimitive>>;

    /// Returns whether a row was removed.
    fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    NotConfigured,
    Failed(String),
}

/// Wraps an optional store so a missing configuration degrades to logging.
pub struct PersistenceGateway {
    store: Option<Box<dyn PrimitiveStore>>,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn PrimitiveStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn open(args: &StoreArgs, config: &AppConfig) -> Result<Self> {
        match args.backend {
            StoreBackend::None => Ok(Self::disabled()),
            StoreBackend::Sqlite => Ok(Self::new(Box::new(SqliteStore::open(
                &args.resolved_db_path(),
            )?))),
            StoreBackend::Supabase => match &config.supabase {
                Some(supabase) => Ok(Self::new(Box::new(SupabaseStore::new(
                    config.http_agent(),
                    supabase.clone(),
                )))),
                None => {
                    warn!("SUPABASE_URL/SUPABASE_KEY not set; primitives will not be stored");
                    Ok(Self::disabled())
                }
            },
        }
    }

    pub fn describe(&self) -> String {
        self.store
            .as_ref()
            .map(|store| store.describe())
            .unwrap_or_else(|| "none".to_string())
    }

    pub fn store(&self, primitive: &str) -> StoreOutcome {
        let Some(store) = &self.store else {
            warn!("storage not configured; skipping primitive");
            return StoreOutcome::NotConfigured;
        };

        match store.insert(primitive) {
            Ok(()) => {
                info!(backend = %store.describe(), "stored primitive");
                StoreOutcome::Stored
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(backend = %store.describe(), error = %reason, "failed to store primitive");
                StoreOutcome::Failed(reason)
            }
        }
    }

    pub fn list(&self) -> Result<Vec<StoredPrimitive>> {
        self.configured()?.list()
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        self.configured()?.delete(id)
    }

    fn configured(&self) -> Result<&dyn PrimitiveStore> {
        match &self.store {
            Some(store) => Ok(store.as_ref()),
            None => bail!("no primitive store configured (set SUPABASE_URL/SUPABASE_KEY or use --backend sqlite)"),
        }
    }
}
