mod ring_buffer_storage;

use crate::webhook::{Timestamp, WebhookRecord};

pub use ring_buffer_storage::RingBufferStore;

/// Count and newest receive time, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub count: usize,
    pub latest: Option<Timestamp>,
}

/// Number of webhooks kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Storage trait for received webhooks.
///
/// Implementations keep at most `capacity()` records in insertion order and
/// evict the oldest on overflow. None of the operations can fail.
#[async_trait::async_trait]
pub trait WebhookStore {
    async fn append(&self, record: WebhookRecord);

    /// Copy of all retained records, newest first.
    async fn snapshot(&self) -> Vec<WebhookRecord>;

    async fn count(&self) -> usize;

    /// Receive time of the newest record.
    async fn latest_timestamp(&self) -> Option<Timestamp>;

    /// Count and latest timestamp taken under one read, so they never
    /// disagree with each other.
    async fn stats(&self) -> StoreStats;

    async fn clear(&self);

    fn capacity(&self) -> usize;
}
