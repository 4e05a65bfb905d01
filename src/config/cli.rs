use crate::config::{PublishMode, RelayConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Command line flags. Anything left unset falls back to the config file, then
/// to [`RelayConfig::default`].
#[derive(Debug, Clone, Parser)]
#[command(name = "velib-relay")]
#[command(about = "Relay Vélib' station status to a Supabase table")]
pub struct CliArgs {
    #[arg(long, short, help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub feed_url: Option<String>,

    #[arg(long, env = "SUPABASE_URL")]
    pub backend_url: Option<String>,

    #[arg(long, env = "SUPABASE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub table_path: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<PublishMode>,

    #[arg(long = "accept-status", value_delimiter = ',', help = "HTTP statuses counted as success")]
    pub accepted_statuses: Vec<u16>,

    #[arg(long = "snapshot", help = "Write the annotated feed to this file")]
    pub snapshot_path: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn into_config(self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)?,
            None => RelayConfig::default(),
        };

        if let Some(feed_url) = self.feed_url {
            config.feed_url = feed_url;
        }
        if self.backend_url.is_some() {
            config.backend_url = self.backend_url;
        }
        if self.api_key.is_some() {
            config.api_key = self.api_key;
        }
        if let Some(table_path) = self.table_path {
            config.table_path = table_path;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if !self.accepted_statuses.is_empty() {
            config.accepted_statuses = Some(self.accepted_statuses);
        }
        if self.snapshot_path.is_some() {
            config.snapshot_path = self.snapshot_path;
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }

        Ok(config)
    }
}
