use clap::Parser;
use rust_watchlist::cli::Cli;
use rust_watchlist::config::AppConfig;
use rust_watchlist::exchange::types::Venue;
use rust_watchlist::services::pipeline::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let opts = cli.run_options()?;

    // Load Configuration
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    info!("Loaded Configuration: {:?}", config);

    let pipeline = Pipeline::from_config(config)?;
    let summary = pipeline.run(&opts).await?;

    for list in &summary.sorted {
        info!(
            "📄 {} ({} ranked, {} unsorted)",
            list.path.display(),
            list.ranked,
            list.leftover
        );
    }
    if let Some(cross) = &summary.cross_venue {
        info!(
            "🔗 {} -> {}: {} matched ({} special), {} unmatched",
            cross.source, cross.target, cross.matched, cross.special, cross.unmatched
        );
    }
    info!(
        "Completed: {} Fetch: {} Get Pairs: {} Hyperliquid: {}",
        cli.base,
        cli.fetch,
        cli.get_pairs,
        opts.match_from == Some(Venue::Hyperliquid)
    );

    Ok(())
}
