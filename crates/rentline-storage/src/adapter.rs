// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`LeadStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use rentline_config::model::StorageConfig;
use rentline_core::{
    AdapterType, ConversationId, HealthStatus, Lead, LeadStore, PluginAdapter, RentlineError,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed lead store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query module. The database is lazily initialized on the first call
/// to [`LeadStore::initialize`].
pub struct SqliteLeadStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteLeadStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, RentlineError> {
        self.db.get().ok_or_else(|| RentlineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteLeadStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RentlineError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn initialize(&self) -> Result<(), RentlineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RentlineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite lead store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RentlineError> {
        self.db()?.close().await
    }

    async fn load(&self, conversation: ConversationId) -> Result<Option<Lead>, RentlineError> {
        queries::leads::load_lead(self.db()?, conversation).await
    }

    async fn save(&self, lead: &Lead) -> Result<(), RentlineError> {
        queries::leads::save_lead(self.db()?, lead).await
    }

    async fn delete(&self, conversation: ConversationId) -> Result<(), RentlineError> {
        queries::leads::delete_lead(self.db()?, conversation).await
    }
}
