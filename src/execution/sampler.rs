use std::time::Duration;

use tokio::time::timeout;

use crate::api::{MarketData, PriceFeed};
use crate::models::{PriceSample, QuotedPrice};
use crate::{BotError, Result};

/// Both prices for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub sample: PriceSample,
    pub quote: QuotedPrice,
}

/// Reads one feed message and one quote per tick
pub struct PriceSampler<F, M> {
    feed: F,
    market_data: M,
    symbol: String,
    deadline: Duration,
}

impl<F, M> PriceSampler<F, M>
where
    F: PriceFeed,
    M: MarketData,
{
    /// `deadline` bounds the wait for a feed message, normally the tick interval
    pub fn new(feed: F, market_data: M, symbol: impl Into<String>, deadline: Duration) -> Self {
        Self {
            feed,
            market_data,
            symbol: symbol.into(),
            deadline,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fetch the reference price, then the quote. Either failing fails the whole sample.
    pub async fn sample(&mut self) -> Result<MarketSnapshot> {
        let sample = timeout(self.deadline, self.feed.next_sample())
            .await
            .map_err(|_| BotError::FeedTimeout(self.deadline))??;

        let quote = self.market_data.latest_ask(&self.symbol).await?;

        tracing::debug!(
            symbol = %self.symbol,
            reference = %sample.reference_price,
            confidence = %sample.confidence_interval,
            ask = %quote.ask_price,
            published_at = ?sample.published_at,
            "Sampled prices"
        );

        Ok(MarketSnapshot { sample, quote })
    }
}
