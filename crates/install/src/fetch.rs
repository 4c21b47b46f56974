//! Archive fetch queue
//!
//! The executor hands every archive it needs to a [`FetchQueue`] and runs it
//! once. How bytes are moved is up to the implementation; progress flows
//! back through [`AcquireStatus`].

use std::path::PathBuf;

use async_trait::async_trait;
use pkgjob_store::VersionKey;
use tokio::fs;

use crate::status::{AcquireStatus, FetchPulse};

/// One archive to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItem {
    pub uri: String,
    /// Final path inside the archive directory
    pub destination: PathBuf,
    pub hash: Option<String>,
    pub size: u64,
    /// Short text for progress output, `name version`
    pub description: String,
    pub version: VersionKey,
    pub package_id: String,
    /// Bytes already present from an interrupted download
    pub partial: u64,
}

/// How a queue run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Continue,
    Failed(String),
    Cancelled,
}

/// Byte counters over the enqueued items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTotals {
    pub fetch_needed: u64,
    pub partial_present: u64,
    /// Size of every archive of the transaction, fetched or cached
    pub total_needed: u64,
}

impl FetchTotals {
    pub fn add(&mut self, item: &FetchItem) {
        self.fetch_needed += item.size;
        self.partial_present += item.partial;
        self.total_needed += item.size;
    }

    /// Bytes still to be written to disk
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.fetch_needed.saturating_sub(self.partial_present)
    }
}

#[async_trait]
pub trait FetchQueue: Send {
    fn enqueue(&mut self, item: FetchItem);

    fn fetch_needed(&self) -> u64;

    fn partial_present(&self) -> u64;

    fn total_needed(&self) -> u64;

    /// Download every enqueued item
    ///
    /// Implementations stop early with [`FetchResult::Cancelled`] once
    /// [`AcquireStatus::pulse`] returns false.
    async fn run(&mut self, status: &mut AcquireStatus) -> FetchResult;
}

/// Builds a fresh queue for each transaction
pub trait FetchQueueFactory: Send + Sync {
    fn create(&self) -> Box<dyn FetchQueue>;
}

/// Queue for `file://` repositories
///
/// Archives are copied from the local mirror into the archive directory
/// and their length is checked against the index.
#[derive(Debug, Default)]
pub struct FileFetchQueue {
    items: Vec<FetchItem>,
    totals: FetchTotals,
}

impl FileFetchQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[FetchItem] {
        &self.items
    }

    async fn fetch_one(item: &FetchItem) -> Result<(), String> {
        let Some(source) = item.uri.strip_prefix("file://") else {
            return Err(format!("Unsupported URI {}", item.uri));
        };
        let copied = fs::copy(source, &item.destination)
            .await
            .map_err(|e| format!("Failed to fetch {}: {e}", item.uri))?;
        if copied != item.size {
            // A short or overlong archive must not be mistaken for a cached one
            let _ = fs::remove_file(&item.destination).await;
            return Err(format!(
                "Failed to fetch {}: size mismatch, expected {} got {copied}",
                item.uri, item.size
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FetchQueue for FileFetchQueue {
    fn enqueue(&mut self, item: FetchItem) {
        self.totals.add(&item);
        self.items.push(item);
    }

    fn fetch_needed(&self) -> u64 {
        self.totals.fetch_needed
    }

    fn partial_present(&self) -> u64 {
        self.totals.partial_present
    }

    fn total_needed(&self) -> u64 {
        self.totals.total_needed
    }

    async fn run(&mut self, status: &mut AcquireStatus) -> FetchResult {
        let total_items = self.items.len() as u64;
        let mut pulse = FetchPulse {
            total_bytes: self.totals.fetch_needed,
            total_items,
            ..FetchPulse::default()
        };

        for item in &self.items {
            if !status.pulse(&pulse) {
                return FetchResult::Cancelled;
            }
            status.fetch(item);
            if let Err(reason) = Self::fetch_one(item).await {
                status.fail(item, &reason);
                return FetchResult::Failed(reason);
            }
            status.done(item);

            pulse.current_bytes += item.size;
            pulse.current_items += 1;
        }

        if status.pulse(&pulse) {
            FetchResult::Continue
        } else {
            FetchResult::Cancelled
        }
    }
}

/// Factory producing [`FileFetchQueue`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetchQueueFactory;

impl FetchQueueFactory for FileFetchQueueFactory {
    fn create(&self) -> Box<dyn FetchQueue> {
        Box::new(FileFetchQueue::new())
    }
}
