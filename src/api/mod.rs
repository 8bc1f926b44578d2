pub mod alpaca;
pub mod price_stream;

pub use alpaca::AlpacaClient;
pub use price_stream::PriceStreamClient;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::models::{Account, OrderAck, OrderRequest, PriceSample, QuotedPrice};
use crate::Result;

/// Streaming source of reference prices for the traded symbol
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceFeed: Send {
    /// Wait for the next message on the stream
    async fn next_sample(&mut self) -> Result<PriceSample>;
}

/// Brokerage market data
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn latest_ask(&self, symbol: &str) -> Result<QuotedPrice>;
}

/// Brokerage account and order entry
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn account(&self) -> Result<Account>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck>;
}

/// Convert a float off the wire into a `Decimal`, rejecting NaN and infinities
pub(crate) fn decimal_from_f64(value: f64, field: &str) -> Result<rust_decimal::Decimal> {
    use rust_decimal::prelude::FromPrimitive;

    rust_decimal::Decimal::from_f64(value)
        .ok_or_else(|| crate::BotError::invalid_data(format!("{} is not finite: {}", field, value)))
}
