//! Repository Implementation - Concrete Adapter for the Repository Port
//!
//! Wraps `SnapshotStore` (atomic JSON snapshots) and `TradeJournal`
//! (JSONL append-only files) into a single struct implementing the
//! `Repository` trait. The usecases layer only knows about the trait,
//! never about files or JSON.

use anyhow::Result;
use async_trait::async_trait;

use super::journal::TradeJournal;
use super::snapshot::SnapshotStore;
use crate::ports::repository::{CoreStateSnapshot, Repository, TradeRecord};

/// File-backed repository combining snapshot and journal persistence.
pub struct FileRepository {
    snapshot_store: SnapshotStore,
    journal: TradeJournal,
}

impl FileRepository {
    /// Initialize both stores in the given data directory, creating
    /// subdirectories as needed.
    pub async fn from_data_dir(data_dir: &str) -> Result<Self> {
        let snapshot_store = SnapshotStore::new(data_dir).await?;
        let journal = TradeJournal::new(data_dir).await?;
        Ok(Self {
            snapshot_store,
            journal,
        })
    }

    /// Load the full journal history (for offline analysis and tests).
    pub async fn load_journal(&self) -> Result<Vec<TradeRecord>> {
        self.journal.load_all().await
    }
}

#[async_trait]
impl Repository for FileRepository {
    async fn append_trade(&self, record: &TradeRecord) -> Result<()> {
        self.journal.append(record).await
    }

    async fn save_snapshot(&self, snapshot: &CoreStateSnapshot) -> Result<()> {
        self.snapshot_store.save(snapshot).await
    }

    async fn load_snapshot(&self) -> Result<Option<CoreStateSnapshot>> {
        self.snapshot_store.load().await
    }

    async fn is_healthy(&self) -> bool {
        self.snapshot_store.is_healthy().await && self.journal.is_healthy().await
    }
}
