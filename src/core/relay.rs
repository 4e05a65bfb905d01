use crate::domain::ports::{StationSink, StationSource};
use crate::utils::error::Result;

/// Outcome of one fetch-and-push cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub stations_fetched: usize,
    pub requests_sent: usize,
}

pub struct RelayEngine<F: StationSource, P: StationSink> {
    source: F,
    sink: P,
}

impl<F: StationSource, P: StationSink> RelayEngine<F, P> {
    pub fn new(source: F, sink: P) -> Self {
        Self { source, sink }
    }

    pub async fn run(&self) -> Result<RelayReport> {
        tracing::info!("🚀 Starting relay run");

        // Fetch
        let stations = self.source.fetch().await?;

        // Publish
        let requests_sent = self.sink.publish(&stations).await?;

        Ok(RelayReport {
            stations_fetched: stations.len(),
            requests_sent,
        })
    }
}
