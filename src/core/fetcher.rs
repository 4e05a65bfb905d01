use crate::adapters::http::build_client;
use crate::config::RelayConfig;
use crate::domain::model::{BikeTypeCount, StationFeed, StationRecord};
use crate::domain::ports::{StationSource, Storage};
use crate::utils::error::{RelayError, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Serialize;

/// Fetches `station_status.json` and derives the per-type bike counts.
pub struct FeedFetcher<S: Storage> {
    storage: S,
    client: Client,
    feed_url: String,
    snapshot_path: Option<String>,
}

impl<S: Storage> FeedFetcher<S> {
    pub fn new(storage: S, config: &RelayConfig) -> Result<Self> {
        Ok(Self {
            storage,
            client: build_client(config.timeout(), HeaderMap::new())?,
            feed_url: config.feed_url.clone(),
            snapshot_path: config.snapshot_path.clone(),
        })
    }

    /// Best effort: a failed dump is logged and never fails the fetch.
    async fn write_snapshot(&self, path: &str, feed: &StationFeed) {
        let snapshot = SnapshotFeed {
            data: SnapshotData {
                stations: feed
                    .data
                    .stations
                    .iter()
                    .map(|station| SnapshotStation {
                        station,
                        num_bikes_available_types: &station.bike_types,
                    })
                    .collect(),
            },
        };

        let bytes = match serde_json::to_vec_pretty(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("⚠️ Could not serialize snapshot: {}", e);
                return;
            }
        };

        match self.storage.write_file(path, &bytes).await {
            Ok(()) => tracing::debug!("Snapshot written to {} ({} bytes)", path, bytes.len()),
            Err(e) => tracing::warn!("⚠️ Could not write snapshot to {}: {}", path, e),
        }
    }
}

// 快照保留原始的 num_bikes_available_types，方便比對推導結果
#[derive(Serialize)]
struct SnapshotFeed<'a> {
    data: SnapshotData<'a>,
}

#[derive(Serialize)]
struct SnapshotData<'a> {
    stations: Vec<SnapshotStation<'a>>,
}

#[derive(Serialize)]
struct SnapshotStation<'a> {
    #[serde(flatten)]
    station: &'a StationRecord,
    num_bikes_available_types: &'a [BikeTypeCount],
}

#[async_trait::async_trait]
impl<S: Storage> StationSource for FeedFetcher<S> {
    async fn fetch(&self) -> Result<Vec<StationRecord>> {
        tracing::info!("🚲 Fetching station status from: {}", self.feed_url);
        let response = self.client.get(&self.feed_url).send().await?;

        tracing::debug!("Feed response status: {}", response.status());
        let body = response.error_for_status()?.text().await?;

        let mut feed: StationFeed =
            serde_json::from_str(&body).map_err(|source| RelayError::Decode { source })?;
        feed.apply_bike_type_counts();

        if let Some(path) = &self.snapshot_path {
            self.write_snapshot(path, &feed).await;
        }

        let stations = feed.into_stations();
        if let Some(latest) = stations.iter().filter_map(|s| s.last_reported_at()).max() {
            tracing::debug!("Most recent station report: {}", latest.to_rfc3339());
        }
        tracing::info!("📋 Decoded {} stations", stations.len());

        Ok(stations)
    }
}
