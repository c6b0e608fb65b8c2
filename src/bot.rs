//! Bot runner: the hourly scan-classify-buy cycle.
//!
//! Each cycle:
//! - Fetches a fresh ranked, non-stablecoin snapshot
//! - Optionally re-attempts missing take-profit orders
//! - Classifies every entry into a signal zone
//! - Buys BUY-zone assets one after another until the budget runs out

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::{MarketDataSource, OrderGateway};
use crate::models::AssetQuote;
use crate::trading::{
    classify_snapshot, BuyOutcome, ClassifiedAsset, PositionManager, SellPlacement, SignalZone,
    TradingConfig,
};

/// Fetch one snapshot and classify it without trading.
pub async fn scan_market(
    market_data: &dyn MarketDataSource,
    config: &TradingConfig,
) -> Result<Vec<ClassifiedAsset>> {
    let snapshot = market_data
        .fetch_ranked_assets(config.universe_size, true)
        .await
        .context("Failed to fetch market snapshot")?;

    Ok(classify_snapshot(&config.thresholds, &snapshot))
}

/// Main bot runner.
pub struct Bot {
    config: TradingConfig,
    market_data: Arc<dyn MarketDataSource>,
    positions: PositionManager,
    watch_list: Vec<AssetQuote>,
    cycles_run: u64,

    // Shutdown signal
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl Bot {
    pub fn new(
        config: TradingConfig,
        market_data: Arc<dyn MarketDataSource>,
        gateway: Arc<dyn OrderGateway>,
        budget: Decimal,
    ) -> Self {
        let positions = PositionManager::new(gateway, config.clone(), budget);
        Self {
            config,
            market_data,
            positions,
            watch_list: Vec::new(),
            cycles_run: 0,
            shutdown: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    /// Run a cycle now, then one per interval until Ctrl+C. A cycle in
    /// progress always finishes before the loop exits.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            interval_mins = self.config.cycle_interval_mins,
            budget = %self.positions.available_budget(),
            unit = %self.config.investment_unit,
            "Starting bot run loop"
        );

        let mut ticker = interval(self.config.cycle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Register shutdown handler
        let shutdown = self.shutdown.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
            wake.notify_one();
        });

        while !self.shutdown.load(Ordering::SeqCst) {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => break,
            }

            match self.run_cycle().await {
                Ok(report) => info!("Cycle summary\n{}", report),
                Err(e) => error!(error = %e, "Error in trading cycle"),
            }
        }

        info!("Bot stopped");
        Ok(())
    }

    /// One full decision pass: snapshot, classify, buy.
    ///
    /// A snapshot failure aborts the cycle before any order is placed,
    /// reconciliation included. Failed buys are logged and the cycle moves on.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycles_run += 1;
        info!(cycle = self.cycles_run, "Starting trading cycle");

        let classified = scan_market(self.market_data.as_ref(), &self.config).await?;

        let mut report = CycleReport::default();

        if self.config.reconcile_sell_orders {
            report.reconciled = self.positions.reconcile_sell_orders().await;
        }

        self.watch_list = classified.iter().map(|c| c.quote.clone()).collect();
        report.scanned = classified.len();

        for asset in &classified {
            report.record_zone(asset.zone);
            log_signal(asset);
        }

        for asset in classified.iter().filter(|c| c.zone == SignalZone::Buy) {
            report.buys_attempted += 1;

            match self.positions.execute_buy(&asset.quote).await {
                Ok(BuyOutcome::Opened { sell, .. }) => {
                    report.opened += 1;
                    if !sell.is_placed() {
                        report.unprotected += 1;
                    }
                    if let SellPlacement::Exhausted { error, .. } = &sell {
                        debug!(symbol = %asset.quote.symbol, error = %error, "Take-profit exhausted");
                    }
                }
                Ok(BuyOutcome::InsufficientBudget { .. }) => {
                    report.skipped_for_budget += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(symbol = %asset.quote.symbol, error = %e, "Buy failed");
                }
            }
        }

        info!(
            cycle = self.cycles_run,
            scanned = report.scanned,
            buy_signals = report.buy,
            opened = report.opened,
            available = %self.positions.available_budget(),
            positions = self.positions.positions().len(),
            "Trading cycle complete"
        );

        Ok(report)
    }

    /// Get current stats.
    pub fn get_stats(&self) -> BotStats {
        BotStats {
            total_budget: self.positions.total_budget(),
            available_budget: self.positions.available_budget(),
            investment_unit: self.positions.investment_unit(),
            open_positions: self.positions.positions().len(),
            unprotected_positions: self.positions.unprotected_positions().count(),
            portfolio_value: self.positions.portfolio_value(),
            watched_assets: self.watch_list.len(),
            cycles_run: self.cycles_run,
            is_running: !self.shutdown.load(Ordering::SeqCst),
        }
    }
}

fn log_signal(asset: &ClassifiedAsset) {
    let quote = &asset.quote;
    match asset.zone {
        SignalZone::Skip => warn!(
            symbol = %quote.symbol,
            change = %quote.percent_change_24h,
            "SKIP: drop exceeds safety limit"
        ),
        SignalZone::Risky => info!(
            symbol = %quote.symbol,
            change = %quote.percent_change_24h,
            "RISKY: just above safety limit, not buying"
        ),
        SignalZone::Buy => info!(
            symbol = %quote.symbol,
            change = %quote.percent_change_24h,
            price = %quote.last_price,
            "BUY signal"
        ),
        SignalZone::Watch => info!(
            symbol = %quote.symbol,
            change = %quote.percent_change_24h,
            "WATCH: approaching buy zone"
        ),
        SignalZone::Hold => debug!(
            symbol = %quote.symbol,
            change = %quote.percent_change_24h,
            "HOLD"
        ),
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned: usize,
    pub skip: usize,
    pub risky: usize,
    pub buy: usize,
    pub watch: usize,
    pub hold: usize,

    pub buys_attempted: usize,
    pub opened: usize,
    /// Opened without a resting take-profit order
    pub unprotected: usize,
    pub skipped_for_budget: usize,
    pub failed: usize,
    /// Take-profit orders placed by the reconciliation pass
    pub reconciled: usize,
}

impl CycleReport {
    fn record_zone(&mut self, zone: SignalZone) {
        match zone {
            SignalZone::Skip => self.skip += 1,
            SignalZone::Risky => self.risky += 1,
            SignalZone::Buy => self.buy += 1,
            SignalZone::Watch => self.watch += 1,
            SignalZone::Hold => self.hold += 1,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Cycle Report ===")?;
        writeln!(f, "Scanned:         {}", self.scanned)?;
        writeln!(
            f,
            "Signals:         BUY {} | WATCH {} | RISKY {} | SKIP {} | HOLD {}",
            self.buy, self.watch, self.risky, self.skip, self.hold
        )?;
        writeln!(
            f,
            "Buys:            {} attempted, {} opened ({} unprotected), {} over budget, {} failed",
            self.buys_attempted, self.opened, self.unprotected, self.skipped_for_budget, self.failed
        )?;
        if self.reconciled > 0 {
            writeln!(f, "Reconciled:      {}", self.reconciled)?;
        }
        Ok(())
    }
}

/// Bot statistics.
#[derive(Debug, Clone)]
pub struct BotStats {
    pub total_budget: Decimal,
    pub available_budget: Decimal,
    pub investment_unit: Decimal,
    pub open_positions: usize,
    pub unprotected_positions: usize,
    pub portfolio_value: Decimal,
    pub watched_assets: usize,
    pub cycles_run: u64,
    pub is_running: bool,
}

impl fmt::Display for BotStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Bot Statistics ===")?;
        writeln!(f, "Total Budget:     ${:.2}", self.total_budget)?;
        writeln!(f, "Available Budget: ${:.2}", self.available_budget)?;
        writeln!(f, "Investment Unit:  ${:.2}", self.investment_unit)?;
        writeln!(f, "Portfolio Value:  ${:.2}", self.portfolio_value)?;
        writeln!(f, "Open Positions:   {} ({} need manual monitoring)",
            self.open_positions, self.unprotected_positions)?;
        writeln!(f, "Watch List:       {} assets", self.watched_assets)?;
        writeln!(f, "Cycles Run:       {}", self.cycles_run)?;
        writeln!(f, "Status:           {}", if self.is_running { "Running" } else { "Stopped" })?;
        Ok(())
    }
}
