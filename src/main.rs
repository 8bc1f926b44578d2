use anyhow::Context;
use spreadbot::api::{AlpacaClient, PriceStreamClient};
use spreadbot::execution::{OrderComposer, PriceSampler, Trader};
use spreadbot::BotConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("🚀 SpreadBot starting");

    let config = BotConfig::load().context("Failed to load configuration")?;
    let risk = config.risk_params();

    tracing::info!("📊 Configuration:");
    tracing::info!("  Symbol: {}", config.symbol);
    tracing::info!("  Tick interval: {}ms", config.tick_interval_ms);
    tracing::info!("  Position size: {} of buying power", risk.position_size_fraction);
    tracing::info!("  Take profit: {}%", risk.take_profit_percent);
    tracing::info!("  Stop loss: {}%", risk.stop_loss_percent);
    tracing::info!("  Feed: {}", config.feed_url);
    tracing::info!("  Brokerage: {}", config.trading_url);

    // Without the feed there is nothing to trade on
    let feed = PriceStreamClient::connect(config.feed_url.clone())
        .await
        .with_context(|| format!("Failed to connect to price feed at {}", config.feed_url))?;

    let alpaca = AlpacaClient::from_config(&config).context("Failed to build Alpaca client")?;

    let sampler = PriceSampler::new(
        feed,
        alpaca.clone(),
        config.symbol.clone(),
        config.tick_interval(),
    );
    let composer = OrderComposer::new(config.symbol.clone(), risk);
    let mut trader = Trader::new(sampler, alpaca, composer, config.tick_interval());

    tracing::info!("Press Ctrl+C to stop...");

    let stats = trader.run(shutdown_signal()).await;

    tracing::info!(
        "👋 SpreadBot stopped after {} ticks ({} orders, {} failed)",
        stats.ticks,
        stats.submitted,
        stats.failed
    );
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spreadbot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("⚠️  Received Ctrl+C, shutting down...");
}
