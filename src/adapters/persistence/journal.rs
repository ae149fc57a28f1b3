//! Trade Journal - Append-only JSONL Decision Records
//!
//! Persists every signal decision to daily JSONL files in the format
//! `trades/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record for easy parsing, streaming, and crash recovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::ports::repository::TradeRecord;

/// Append-only JSONL journal with daily file rotation.
///
/// Files are named `trades/YYYY-MM-DD.jsonl` by the record's own
/// timestamp, so late-night signals land in the day they belong to.
pub struct TradeJournal {
    /// Base directory for journal files.
    trades_dir: PathBuf,
}

impl TradeJournal {
    /// Create a new journal in the given data directory.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let trades_dir = Path::new(data_dir).join("trades");
        fs::create_dir_all(&trades_dir)
            .await
            .context("Failed to create trades directory")?;
        Ok(Self { trades_dir })
    }

    /// Append one decision record to its day's JSONL file.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn append(&self, record: &TradeRecord) -> Result<()> {
        let date = record.timestamp.format("%Y-%m-%d").to_string();
        let path = self.trades_dir.join(format!("{date}.jsonl"));

        let mut json =
            serde_json::to_string(record).context("Failed to serialize trade record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open journal file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write trade record")?;
        file.flush().await.context("Failed to flush journal")?;

        Ok(())
    }

    /// Load all records from all daily files, oldest first. Malformed
    /// lines are skipped with a warning rather than failing the load.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<TradeRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.trades_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                let content = fs::read_to_string(&path).await?;
                for line in content.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<TradeRecord>(line) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                error = %e,
                                "Skipping malformed trade record"
                            );
                        }
                    }
                }
            }
        }

        records.sort_by_key(|r| r.timestamp);
        info!(count = records.len(), "Loaded trade records");
        Ok(records)
    }

    /// Check if the journal directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let test_path = self.trades_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
