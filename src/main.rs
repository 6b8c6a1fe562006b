use clap::Parser;
use ticker_dash::cli::{Cli, Commands};
use ticker_dash::config::Config;
use ticker_dash::currency::default_currencies;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    ticker_dash::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting ticker stream");
            args.execute(&config).await?;
        }
        Commands::Symbols => {
            for symbol in config.registry().symbols() {
                println!(
                    "{:<6} {:<14} {} {}",
                    symbol.code, symbol.display_name, symbol.color, symbol.glyph
                );
            }
        }
        Commands::Currencies => {
            let rates = config.conversion_table();
            for currency in default_currencies() {
                println!(
                    "{} {:<4} {:<18} {}",
                    currency.flag,
                    currency.code,
                    currency.name,
                    rates.rate(currency.code)
                );
            }
        }
        Commands::Config => {
            let feed = config.feed_settings();
            println!("Current configuration:");
            println!("  Feed: {} ({} quote)", feed.endpoint, feed.quote_asset);
            println!(
                "  Reconnect: {} attempts, {}ms apart",
                feed.max_reconnect_attempts,
                feed.reconnect_delay.as_millis()
            );
            println!(
                "  Display: {} (history {})",
                config.dashboard.display_currency, config.dashboard.history_capacity
            );
            println!("  Symbols: {}", config.registry().codes().collect::<Vec<_>>().join(", "));
        }
    }

    Ok(())
}
