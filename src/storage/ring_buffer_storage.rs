use std::{collections::VecDeque, num::NonZeroUsize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{
    storage::{StoreStats, WebhookStore},
    webhook::{Timestamp, WebhookRecord},
};

/// Keeps the most recent webhooks in a fixed-size FIFO buffer.
pub struct RingBufferStore {
    capacity: NonZeroUsize,
    // Oldest at the front, newest at the back. A single lock serializes every
    // operation, so eviction + insert and clear are atomic to readers.
    records: RwLock<VecDeque<WebhookRecord>>,
}

impl RingBufferStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            records: RwLock::new(VecDeque::with_capacity(capacity.get())),
        }
    }
}

#[async_trait::async_trait]
impl WebhookStore for RingBufferStore {
    #[instrument(skip_all)]
    async fn append(&self, record: WebhookRecord) {
        let mut records = self.records.write().await;
        if records.len() >= self.capacity.get() {
            records.pop_front();
            debug!("Evicted oldest webhook");
        }
        records.push_back(record);
        debug!("Stored webhook, {} retained", records.len());
    }

    #[instrument(skip_all)]
    async fn snapshot(&self) -> Vec<WebhookRecord> {
        let records = self.records.read().await;
        records.iter().rev().cloned().collect()
    }

    async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    async fn latest_timestamp(&self) -> Option<Timestamp> {
        self.records
            .read()
            .await
            .back()
            .map(|record| record.received_at)
    }

    async fn stats(&self) -> StoreStats {
        let records = self.records.read().await;
        StoreStats {
            count: records.len(),
            latest: records.back().map(|record| record.received_at),
        }
    }

    #[instrument(skip_all)]
    async fn clear(&self) {
        let mut records = self.records.write().await;
        debug!("Clearing {} webhooks", records.len());
        records.clear();
    }

    fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
