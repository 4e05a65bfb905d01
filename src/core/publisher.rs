use crate::adapters::http::{build_client, supabase_auth_headers};
use crate::config::{AcceptedStatuses, PublishMode, RelayConfig};
use crate::domain::model::StationRecord;
use crate::domain::ports::StationSink;
use crate::utils::error::{RelayError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;

/// Inserts station records into the Supabase `stations` table over PostgREST.
pub struct SupabasePublisher {
    client: Client,
    endpoint: String,
    mode: PublishMode,
    accepted: AcceptedStatuses,
}

impl SupabasePublisher {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let headers = supabase_auth_headers(config.api_key()?)?;

        Ok(Self {
            client: build_client(config.timeout(), headers)?,
            endpoint: config.backend_endpoint()?,
            mode: config.mode,
            accepted: config.accepted_statuses(),
        })
    }

    pub fn mode(&self) -> PublishMode {
        self.mode
    }

    /// Sends one JSON payload. The response body is always read so the
    /// connection goes back to the pool before the next insert.
    async fn post(&self, payload: String, prefer_minimal: bool) -> Result<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.clone());

        if prefer_minimal {
            request = request.header("Prefer", "return=minimal");
        }

        let response = request.send().await?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Could not read backend response body ({}): {}", status, e);
                String::new()
            }
        };

        tracing::debug!("Backend response status: {}", status);

        if !self.accepted.contains(status) {
            return Err(RelayError::BackendRejected {
                status: status.as_u16(),
                body,
                payload,
            });
        }

        Ok(())
    }

    async fn publish_each(&self, records: &[StationRecord]) -> Result<usize> {
        let mut sent = 0;

        for record in records {
            let payload =
                serde_json::to_string(record).map_err(|source| RelayError::Encode { source })?;

            if let Err(e) = self.post(payload, false).await {
                // 已送出的記錄不會回滾
                tracing::error!(
                    "Insert of station {} failed after {} successful inserts",
                    record.station_code,
                    sent
                );
                return Err(e);
            }
            sent += 1;
        }

        Ok(sent)
    }

    async fn publish_bulk(&self, records: &[StationRecord]) -> Result<usize> {
        let payload = bulk_payload(records)?;

        tracing::debug!("Bulk payload: {} records, {} bytes", records.len(), payload.len());
        self.post(payload, true).await?;

        Ok(1)
    }
}

/// Bulk rows repeat the docks count under the snake_case column name.
#[derive(Serialize)]
struct BulkStation<'a> {
    #[serde(flatten)]
    station: &'a StationRecord,
    num_docks_available: u32,
}

fn bulk_payload(records: &[StationRecord]) -> Result<String> {
    let rows: Vec<BulkStation<'_>> = records
        .iter()
        .map(|station| BulkStation {
            station,
            num_docks_available: station.num_docks_available,
        })
        .collect();

    serde_json::to_string(&rows).map_err(|source| RelayError::Encode { source })
}

#[async_trait::async_trait]
impl StationSink for SupabasePublisher {
    async fn publish(&self, records: &[StationRecord]) -> Result<usize> {
        tracing::info!(
            "📤 Publishing {} stations to {} ({} mode)",
            records.len(),
            self.endpoint,
            self.mode
        );

        match self.mode {
            PublishMode::PerRecord => self.publish_each(records).await,
            PublishMode::Bulk => self.publish_bulk(records).await,
        }
    }
}
