pub mod fetcher;
pub mod publisher;
pub mod relay;
