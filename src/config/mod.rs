#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str =
    "https://velib-metropole-opendata.smoove.pro/opendata/Velib_Metropole/station_status.json";
pub const DEFAULT_TABLE_PATH: &str = "rest/v1/stations";

/// How station records are sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum PublishMode {
    /// One POST per station; stops at the first rejected record.
    #[default]
    PerRecord,
    /// One POST carrying the whole station array.
    Bulk,
}

impl PublishMode {
    /// Per-record inserts were only ever checked against 200, bulk inserts
    /// against 200 and 201.
    pub fn default_accepted_statuses(&self) -> AcceptedStatuses {
        match self {
            PublishMode::PerRecord => AcceptedStatuses::new(vec![200]),
            PublishMode::Bulk => AcceptedStatuses::new(vec![200, 201]),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublishMode::PerRecord => "per-record",
            PublishMode::Bulk => "bulk",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP status codes the publisher treats as a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedStatuses(Vec<u16>);

impl AcceptedStatuses {
    pub fn new(codes: Vec<u16>) -> Self {
        Self(codes)
    }

    pub fn contains(&self, status: StatusCode) -> bool {
        self.0.contains(&status.as_u16())
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub feed_url: String,
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub table_path: String,
    pub mode: PublishMode,
    /// Overrides [`PublishMode::default_accepted_statuses`] when set.
    pub accepted_statuses: Option<Vec<u16>>,
    /// Where to dump the annotated feed; no dump when unset.
    pub snapshot_path: Option<String>,
    /// Applies to every request. Unset means requests may wait forever.
    pub timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            backend_url: None,
            api_key: None,
            table_path: DEFAULT_TABLE_PATH.to_string(),
            mode: PublishMode::default(),
            accepted_statuses: None,
            snapshot_path: None,
            timeout_secs: None,
        }
    }
}

// api_key 不可出現在日誌中
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("feed_url", &self.feed_url)
            .field("backend_url", &self.backend_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("table_path", &self.table_path)
            .field("mode", &self.mode)
            .field("accepted_statuses", &self.accepted_statuses)
            .field("snapshot_path", &self.snapshot_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RelayConfig {
    /// `<backend_url>/<table_path>`, tolerating stray slashes on either side.
    pub fn backend_endpoint(&self) -> Result<String> {
        let base = validate_required_field("backend_url", &self.backend_url)?;
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.table_path.trim_start_matches('/')
        ))
    }

    pub fn api_key(&self) -> Result<&str> {
        validate_required_field("api_key", &self.api_key).map(String::as_str)
    }

    pub fn accepted_statuses(&self) -> AcceptedStatuses {
        match &self.accepted_statuses {
            Some(codes) if !codes.is_empty() => AcceptedStatuses::new(codes.clone()),
            _ => self.mode.default_accepted_statuses(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        validate_url("feed_url", &self.feed_url)?;

        let backend_url = validate_required_field("backend_url", &self.backend_url)?;
        validate_url("backend_url", backend_url)?;

        let api_key = validate_required_field("api_key", &self.api_key)?;
        validate_non_empty_string("api_key", api_key)?;

        validate_non_empty_string("table_path", &self.table_path)?;

        if let Some(codes) = &self.accepted_statuses {
            for code in codes {
                validate_range("accepted_statuses", *code, 100, 599)?;
            }
        }

        if let Some(path) = &self.snapshot_path {
            validate_path("snapshot_path", path)?;
        }

        if let Some(timeout) = self.timeout_secs {
            validate_positive_number("timeout_secs", timeout, 1)?;
        }

        Ok(())
    }
}
