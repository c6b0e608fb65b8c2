//! Dip-Buying Spot Trading Bot
//!
//! Scans the top non-stablecoin assets every hour, buys those down 5-10%
//! over 24h for a fixed quote amount, and parks a +5% take-profit limit sell
//! on each purchase.

mod api;
mod bot;
mod models;
mod trading;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{BinanceClient, CoinMarketCapClient, OrderGateway};
use crate::bot::{scan_market, Bot};
use crate::trading::{SignalZone, TradingConfig};

/// Dip-buying spot trading bot CLI.
#[derive(Parser)]
#[command(name = "dipbot")]
#[command(about = "Buy 24h dips on top-ranked assets with a take-profit exit", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the trading bot
    Start {
        /// Trading budget in the quote asset (defaults to the free exchange balance)
        #[arg(short, long)]
        budget: Option<f64>,

        /// Quote amount spent per buy
        #[arg(long)]
        investment: Option<f64>,

        /// Minutes between cycles
        #[arg(short, long)]
        interval: Option<u64>,

        /// Re-attempt missing take-profit orders at the start of each cycle
        #[arg(long)]
        reconcile: bool,
    },

    /// Fetch one snapshot and show its signals without trading
    Scan,

    /// Show the free balance of the quote asset
    Balance,

    /// Sell a quantity at market, e.g. to close a position by hand
    Sell {
        /// Trading pair (e.g., SOLUSDT)
        symbol: String,

        /// Quantity of the base asset
        quantity: f64,
    },

    /// Show current configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = TradingConfig::default();

    match cli.command {
        Commands::Start {
            budget,
            investment,
            interval,
            reconcile,
        } => {
            if let Some(investment) = investment {
                config.investment_unit = Decimal::try_from(investment)?;
            }
            if let Some(interval) = interval {
                config.cycle_interval_mins = interval.max(1);
            }
            config.reconcile_sell_orders |= reconcile;
            config.validate()?;

            let exchange = Arc::new(BinanceClient::from_env().context("Binance client not configured")?);
            let market = Arc::new(
                CoinMarketCapClient::from_env(&config.quote_asset)
                    .context("CoinMarketCap client not configured")?
                    .with_fetch_size(config.listing_fetch_size),
            );

            let budget = match budget {
                Some(budget) => Decimal::try_from(budget)?,
                None => exchange
                    .free_balance(&config.quote_asset)
                    .await
                    .context("Failed to fetch account balance")?,
            };

            if budget < config.investment_unit {
                bail!(
                    "Budget {} {} is below one investment unit ({} {})",
                    budget,
                    config.quote_asset,
                    config.investment_unit,
                    config.quote_asset
                );
            }
            if budget < config.low_balance_warning {
                warn!(
                    budget = %budget,
                    recommended = %config.low_balance_warning,
                    "Low balance, only a few trades possible"
                );
            }

            info!(
                budget = %budget,
                unit = %config.investment_unit,
                interval_mins = config.cycle_interval_mins,
                "Starting dip-buying bot"
            );

            println!("\n=== Dip-Buying Bot ===");
            println!("Budget:          {} {}", budget, config.quote_asset);
            println!("Per trade:       {} {}", config.investment_unit, config.quote_asset);
            println!("Max trades:      {}", (budget / config.investment_unit).floor());
            println!("Cycle interval:  {}m", config.cycle_interval_mins);
            println!("Reconciliation:  {}", if config.reconcile_sell_orders { "on" } else { "off" });
            println!("\nPress Ctrl+C to stop.\n");

            let mut bot = Bot::new(config, market, exchange, budget);

            // Run the bot
            if let Err(e) = bot.run().await {
                tracing::error!(error = %e, "Bot error");
            }

            // Show final stats
            let stats = bot.get_stats();
            println!("\n{}", stats);

            let unprotected: Vec<_> = bot.positions().unprotected_positions().collect();
            if !unprotected.is_empty() {
                println!("=== Positions Needing Manual Monitoring ===");
                for pos in unprotected {
                    println!(
                        "  #{:<3} {:<12} qty {} @ {} -> target {} (expected +{:.2})",
                        pos.id,
                        pos.symbol,
                        pos.quantity,
                        pos.buy_price,
                        pos.target_sell_price,
                        pos.expected_profit()
                    );
                }
            }
        }

        Commands::Scan => {
            let market = CoinMarketCapClient::from_env(&config.quote_asset)?
                .with_fetch_size(config.listing_fetch_size);

            let classified = scan_market(&market, &config).await?;

            println!("\n{:<4} {:<10} {:>16} {:>10}  {}", "#", "ASSET", "PRICE", "24H %", "SIGNAL");
            println!("{}", "-".repeat(52));

            for (rank, asset) in classified.iter().enumerate() {
                println!(
                    "{:<4} {:<10} {:>16} {:>9.2}%  {}",
                    rank + 1,
                    asset.quote.base_asset(&config.quote_asset),
                    asset.quote.last_price.round_dp(8).normalize(),
                    asset.quote.percent_change_24h,
                    asset.zone
                );
            }

            let buys = classified.iter().filter(|c| c.zone == SignalZone::Buy).count();
            println!("\n{} of {} assets in the buy zone", buys, classified.len());
        }

        Commands::Balance => {
            let exchange = BinanceClient::from_env()?;
            let balance = exchange.free_balance(&config.quote_asset).await?;

            println!("Free {}: {}", config.quote_asset, balance);
            if balance < config.investment_unit {
                println!("Below one investment unit ({}); the bot would not start.", config.investment_unit);
            }
        }

        Commands::Sell { symbol, quantity } => {
            let exchange = BinanceClient::from_env()?;
            let symbol = symbol.to_uppercase();
            let quantity = Decimal::try_from(quantity)?;

            info!(symbol = %symbol, quantity = %quantity, "Submitting market sell");
            let order = exchange.market_sell(&symbol, quantity).await?;

            println!("Order {} {}: sold {} {}", order.order_id, order.status, order.executed_qty, symbol);
            if let Some(price) = order.average_fill_price() {
                println!("Average price: {}", price);
            }
        }

        Commands::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            let t = &config.thresholds;

            println!("\n=== Trading Configuration ===\n");
            println!("Sizing:");
            println!("  Quote Asset:          {}", config.quote_asset);
            println!("  Investment Unit:      {}", config.investment_unit);
            println!("  Take Profit:          {}%", config.target_profit * Decimal::from(100));
            println!("  Low Balance Warning:  {}", config.low_balance_warning);

            println!("\nUniverse:");
            println!("  Assets Scanned:       {}", config.universe_size);
            println!("  Listings Fetched:     {}", config.listing_fetch_size);
            println!("  Cycle Interval:       {}m", config.cycle_interval_mins);

            println!("\nSignal Zones (24h change):");
            println!("  SKIP:                 <= {}%", t.safety_floor);
            println!("  RISKY:                ({}%, {}%)", t.safety_floor, t.buy_floor);
            println!("  BUY:                  [{}%, {}%]", t.buy_floor, t.buy_ceiling);
            println!("  WATCH:                ({}%, {}%]", t.buy_ceiling, t.watch_ceiling);
            println!("  HOLD:                 > {}%", t.watch_ceiling);

            println!("\nExecution:");
            println!("  Settlement Delay:     {}s", config.settlement_delay_secs);
            println!("  Sell Attempts:        {}", config.sell_retry_attempts);
            println!("  Sell Retry Delay:     {}s", config.sell_retry_delay_secs);
            println!("  Reconcile Sells:      {}", config.reconcile_sell_orders);
        }
    }

    Ok(())
}
