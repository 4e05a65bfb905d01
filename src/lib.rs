pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::storage::LocalStorage;
pub use config::{PublishMode, RelayConfig};
pub use crate::core::{fetcher::FeedFetcher, publisher::SupabasePublisher, relay::RelayEngine};
pub use domain::model::StationRecord;
pub use utils::error::{RelayError, Result};
