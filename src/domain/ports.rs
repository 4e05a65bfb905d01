use crate::domain::model::StationRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Produces the station records for one run.
#[async_trait]
pub trait StationSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<StationRecord>>;
}

/// Delivers station records to the backend. Returns the number of requests sent.
#[async_trait]
pub trait StationSink: Send + Sync {
    async fn publish(&self, records: &[StationRecord]) -> Result<usize>;
}
