// Source trait for the one-time dataset load
use crate::domain::record::RawRecord;
use async_trait::async_trait;

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Load every raw row in input order
    async fn load(&self) -> anyhow::Result<Vec<RawRecord>>;
}
