// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MessageStore trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use missive_config::model::StorageConfig;
use missive_core::{
    AdapterType, ChangeLogEntry, Created, HealthStatus, Message, MessageId, MessageStore,
    MissiveError, MutationOutcome, NewMessage, PluginAdapter, Transition, UserId, Version,
};

use crate::coordinator::MutationCoordinator;
use crate::database::Database;
use crate::queries;
use crate::sequence::{self, TimelineSequence};

struct Backend {
    db: Database,
    sequence: Arc<TimelineSequence>,
    coordinator: MutationCoordinator,
}

/// SQLite-backed message store.
///
/// Reads go straight to the query modules; writes go through the
/// [`MutationCoordinator`]. Nothing is opened until
/// [`MessageStore::initialize`] is called.
pub struct SqliteStorage {
    config: StorageConfig,
    backend: OnceCell<Backend>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            backend: OnceCell::new(),
        }
    }

    fn backend(&self) -> Result<&Backend, MissiveError> {
        self.backend.get().ok_or_else(|| MissiveError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// The most recently issued version. Zero before any mutation.
    pub fn last_version(&self) -> Result<Version, MissiveError> {
        Ok(self.backend()?.sequence.last_issued())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MissiveError> {
        let Ok(backend) = self.backend() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        backend
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MissiveError> {
        if let Some(backend) = self.backend.get() {
            backend.db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn initialize(&self) -> Result<(), MissiveError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;

        let last = db
            .connection()
            .call(|conn| sequence::load_last(conn))
            .await
            .map_err(crate::database::map_tr_err)?;
        let sequence = Arc::new(TimelineSequence::resume_after(last));
        let coordinator = MutationCoordinator::new(db.clone(), sequence.clone());

        self.backend
            .set(Backend {
                db,
                sequence,
                coordinator,
            })
            .map_err(|_| MissiveError::Storage {
                source: "storage already initialized".into(),
            })?;
        info!(path = %self.config.database_path, last_version = %last, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MissiveError> {
        self.backend()?.db.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn create_message(
        &self,
        sender: &UserId,
        message: &NewMessage,
    ) -> Result<Created, MissiveError> {
        self.backend()?.coordinator.create(sender, message).await
    }

    async fn get_message(
        &self,
        user: &UserId,
        id: MessageId,
    ) -> Result<Option<Message>, MissiveError> {
        queries::messages::get_message(&self.backend()?.db, user, id).await
    }

    async fn conditional_update(
        &self,
        id: MessageId,
        expected: Version,
        transition: Transition,
    ) -> Result<MutationOutcome, MissiveError> {
        self.backend()?
            .coordinator
            .conditional_update(id, expected, transition)
            .await
    }

    async fn sync_updates(
        &self,
        user: &UserId,
        after: Version,
        limit: u32,
    ) -> Result<Vec<ChangeLogEntry>, MissiveError> {
        queries::change_log::entries_after(&self.backend()?.db, user, after, limit).await
    }
}
