// Key-value store for the timer's rolling history
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stored durations for `key`, oldest first; empty when nothing was saved yet
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u64>>;

    async fn save(&self, key: &str, entries: &[u64]) -> anyhow::Result<()>;
}
