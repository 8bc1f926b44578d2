use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use super::{OrderComposer, PriceSampler};
use crate::api::{Brokerage, MarketData, PriceFeed};
use crate::models::{OrderAck, Signal};
use crate::strategy::generate_signal;
use crate::{ErrorCategory, Result};

/// What a completed tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Held,
    Submitted(OrderAck),
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub held: u64,
    pub submitted: u64,
    pub failed: u64,
}

/// Single-worker decision loop: sample, classify, maybe submit, once per tick
///
/// Ticks are independent. Nothing about earlier signals or orders is kept.
pub struct Trader<F, M, B> {
    sampler: PriceSampler<F, M>,
    brokerage: B,
    composer: OrderComposer,
    tick_interval: Duration,
}

impl<F, M, B> Trader<F, M, B>
where
    F: PriceFeed,
    M: MarketData,
    B: Brokerage,
{
    pub fn new(
        sampler: PriceSampler<F, M>,
        brokerage: B,
        composer: OrderComposer,
        tick_interval: Duration,
    ) -> Self {
        Self {
            sampler,
            brokerage,
            composer,
            tick_interval,
        }
    }

    /// Run one decision cycle. Any error means the tick was skipped.
    pub async fn run_tick(&mut self) -> Result<TickOutcome> {
        let snapshot = self.sampler.sample().await?;

        let signal = generate_signal(
            snapshot.sample.reference_price,
            snapshot.sample.confidence_interval,
            snapshot.quote.ask_price,
        );

        if signal == Signal::Hold {
            tracing::debug!(
                reference = %snapshot.sample.reference_price,
                ask = %snapshot.quote.ask_price,
                "Hold"
            );
            return Ok(TickOutcome::Held);
        }

        tracing::info!(
            signal = ?signal,
            reference = %snapshot.sample.reference_price,
            confidence = %snapshot.sample.confidence_interval,
            ask = %snapshot.quote.ask_price,
            "Divergence outside confidence band"
        );

        // Orders are anchored to the feed's reference price, not the brokerage ask
        match self
            .composer
            .execute(&self.brokerage, signal, snapshot.sample.reference_price)
            .await?
        {
            Some(ack) => Ok(TickOutcome::Submitted(ack)),
            None => Ok(TickOutcome::Held),
        }
    }

    /// Tick until `shutdown` resolves
    ///
    /// Per-tick failures are logged and counted, never propagated. A tick that
    /// overruns the interval causes missed ticks to be dropped, not queued.
    pub async fn run<S>(&mut self, shutdown: S) -> RunStats
    where
        S: Future<Output = ()>,
    {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut stats = RunStats::default();

        tracing::info!(
            symbol = %self.sampler.symbol(),
            interval_ms = self.tick_interval.as_millis() as u64,
            "Trading loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping trading loop");
                    break;
                }
                _ = ticker.tick() => {}
            }

            stats.ticks += 1;

            match self.run_tick().await {
                Ok(TickOutcome::Held) => stats.held += 1,
                Ok(TickOutcome::Submitted(_)) => stats.submitted += 1,
                Err(e) => {
                    stats.failed += 1;
                    match e.category() {
                        ErrorCategory::Data => {
                            tracing::warn!(tick = stats.ticks, error = %e, "Decision suppressed")
                        }
                        ErrorCategory::Transport | ErrorCategory::Config => {
                            tracing::error!(tick = stats.ticks, error = %e, "Tick skipped")
                        }
                    }
                }
            }
        }

        tracing::info!(
            ticks = stats.ticks,
            held = stats.held,
            submitted = stats.submitted,
            failed = stats.failed,
            "Trading loop stopped"
        );

        stats
    }
}
