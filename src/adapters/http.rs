use crate::utils::error::{RelayError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;

/// Builds the shared HTTP client. Without a timeout a hung server blocks the run.
pub fn build_client(timeout: Option<Duration>, default_headers: HeaderMap) -> Result<Client> {
    let mut builder = Client::builder().default_headers(default_headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Supabase expects the key twice: as `apikey` and as a bearer token.
pub fn supabase_auth_headers(api_key: &str) -> Result<HeaderMap> {
    let invalid_key = |_| RelayError::InvalidConfigValue {
        field: "api_key".to_string(),
        value: "<redacted>".to_string(),
        reason: "API key is not a valid header value".to_string(),
    };

    let mut key_header = HeaderValue::from_str(api_key).map_err(invalid_key)?;
    key_header.set_sensitive(true);

    let mut bearer_header =
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(invalid_key)?;
    bearer_header.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), key_header);
    headers.insert(AUTHORIZATION, bearer_header);
    Ok(headers)
}
