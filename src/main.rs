use anyhow::Context;
use clap::Parser;
use velib_relay::utils::{logger, validation::Validate};
use velib_relay::{CliArgs, FeedFetcher, LocalStorage, RelayEngine, RelayError, SupabasePublisher};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting velib-relay");

    // 錯誤只輸出到 stdout，程序仍正常結束，由外部排程器決定下一次執行
    if let Err(e) = run(args).await {
        tracing::error!("❌ Relay failed: {:#}", e);
        println!("❌ Error: {:#}", e);
        if let Some(relay_error) = e.downcast_ref::<RelayError>() {
            println!("💡 Suggestion: {}", relay_error.recovery_suggestion());
        }
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = args
        .into_config()
        .context("Failed to load configuration")?;
    tracing::debug!("Relay config: {:?}", config);

    config.validate().context("Invalid configuration")?;

    let fetcher = FeedFetcher::new(LocalStorage::default(), &config)?;
    let publisher = SupabasePublisher::new(&config)?;
    let mode = publisher.mode();

    let engine = RelayEngine::new(fetcher, publisher);
    let report = engine.run().await?;

    tracing::info!(
        "✅ Relayed {} stations in {} request(s) ({} mode)",
        report.stations_fetched,
        report.requests_sent,
        mode
    );
    println!(
        "✅ Relayed {} stations in {} request(s)",
        report.stations_fetched, report.requests_sent
    );

    Ok(())
}
