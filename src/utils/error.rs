use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode station feed: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode station payload: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("Backend rejected request with status {status}: {body}")]
    BackendRejected {
        status: u16,
        body: String,
        /// 被拒絕的序列化內容，僅供診斷
        payload: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl RelayError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::Network(_) => "Check network connectivity and that the feed/backend URL is reachable",
            RelayError::Decode { .. } => "The feed format may have changed; inspect the raw response",
            RelayError::Encode { .. } => "Report this as a bug: station records should always serialize",
            RelayError::BackendRejected { status, .. } => match status {
                401 | 403 => "Verify SUPABASE_API_KEY and the table's row level security policies",
                404 => "Verify SUPABASE_URL and the table path",
                409 => "The backend enforces uniqueness; rows for this snapshot may already exist",
                _ => "Inspect the backend response body and the accepted status codes",
            },
            RelayError::Io(_) | RelayError::Toml(_) => "Check the configuration file path and syntax",
            RelayError::Config { .. }
            | RelayError::MissingConfig { .. }
            | RelayError::InvalidConfigValue { .. } => {
                "Check command line flags, SUPABASE_URL / SUPABASE_API_KEY and the config file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
