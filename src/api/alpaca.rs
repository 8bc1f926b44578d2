use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{decimal_from_f64, Brokerage, MarketData};
use crate::models::{
    Account, OrderAck, OrderClass, OrderRequest, OrderSide, OrderType, QuotedPrice, TimeInForce,
};
use crate::settings::BotConfig;
use crate::{BotError, Result};

// Alpaca Trading API v2 and Market Data API v1beta3
// Docs: https://docs.alpaca.markets/reference
const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";
const REQUEST_TIMEOUT_SECS: u64 = 5;
// Crypto order quantities are accepted up to 9 decimal places
const QTY_DECIMALS: u32 = 9;

type AlpacaRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the Alpaca brokerage: crypto quotes, account and order entry
///
/// Cloneable; all clones share one HTTP pool and one rate limiter.
#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    trading_url: String,
    data_url: String,
    api_key_id: String,
    api_secret_key: String,
    rate_limiter: Arc<AlpacaRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct LatestQuotesResponse {
    quotes: HashMap<String, RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "ap")]
    ask_price: f64,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    buying_power: Decimal,
}

// ============== Request Types ==============

#[derive(Debug, Serialize)]
struct PlaceOrderBody<'a> {
    symbol: &'a str,
    qty: String,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: OrderType,
    time_in_force: TimeInForce,
    order_class: OrderClass,
    client_order_id: String,
    take_profit: TakeProfitLeg,
    stop_loss: StopLossLeg,
}

#[derive(Debug, Serialize)]
struct TakeProfitLeg {
    limit_price: String,
}

#[derive(Debug, Serialize)]
struct StopLossLeg {
    stop_price: String,
}

impl<'a> PlaceOrderBody<'a> {
    fn from_request(order: &'a OrderRequest) -> Result<Self> {
        let qty = order
            .quantity
            .round_dp_with_strategy(QTY_DECIMALS, RoundingStrategy::ToZero);
        if qty <= Decimal::ZERO {
            return Err(BotError::invalid_data(format!(
                "order quantity {} rounds to zero",
                order.quantity
            )));
        }

        Ok(Self {
            symbol: &order.symbol,
            qty: wire_decimal(qty),
            side: order.side,
            order_type: order.order_type,
            time_in_force: order.time_in_force,
            order_class: order.order_class,
            client_order_id: order.client_order_id.to_string(),
            take_profit: TakeProfitLeg {
                limit_price: wire_decimal(order.bracket.take_profit_limit_price),
            },
            stop_loss: StopLossLeg {
                stop_price: wire_decimal(order.bracket.stop_loss_stop_price),
            },
        })
    }
}

fn wire_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

impl AlpacaClient {
    pub fn new(
        api_key_id: impl Into<String>,
        api_secret_key: impl Into<String>,
        trading_url: impl Into<String>,
        data_url: impl Into<String>,
        requests_per_minute: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let per_minute = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| BotError::Config("requests_per_minute must be positive".to_string()))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client,
            trading_url: trading_url.into().trim_end_matches('/').to_string(),
            data_url: data_url.into().trim_end_matches('/').to_string(),
            api_key_id: api_key_id.into(),
            api_secret_key: api_secret_key.into(),
            rate_limiter,
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(
            config.api_key_id.clone(),
            config.api_secret_key.clone(),
            config.trading_url.clone(),
            config.data_url.clone(),
            config.requests_per_minute,
        )
    }

    /// Authenticate, rate-limit and send a request, decoding a JSON body
    ///
    /// The limiter is checked without waiting: a spent quota fails the call so
    /// the tick is skipped instead of stalled.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        if self.rate_limiter.check().is_err() {
            return Err(BotError::RateLimited(endpoint));
        }

        let response = request
            .header(KEY_ID_HEADER, &self.api_key_id)
            .header(SECRET_KEY_HEADER, &self.api_secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(endpoint, status = status.as_u16(), body = %body, "Alpaca request failed");
            return Err(BotError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MarketData for AlpacaClient {
    async fn latest_ask(&self, symbol: &str) -> Result<QuotedPrice> {
        let url = format!("{}/v1beta3/crypto/us/latest/quotes", self.data_url);
        let request = self.client.get(&url).query(&[("symbols", symbol)]);

        let response: LatestQuotesResponse = self.send("latest quote", request).await?;
        let quote = response
            .quotes
            .get(symbol)
            .ok_or_else(|| BotError::invalid_data(format!("no quote returned for {}", symbol)))?;

        Ok(QuotedPrice {
            ask_price: decimal_from_f64(quote.ask_price, "ask price")?,
        })
    }
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn account(&self) -> Result<Account> {
        let url = format!("{}/v2/account", self.trading_url);
        let request = self.client.get(&url);

        let response: AccountResponse = self.send("account", request).await?;
        Ok(Account {
            buying_power: response.buying_power,
        })
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let body = PlaceOrderBody::from_request(order)?;
        let url = format!("{}/v2/orders", self.trading_url);

        tracing::info!(
            symbol = %body.symbol,
            side = ?body.side,
            qty = %body.qty,
            take_profit = %body.take_profit.limit_price,
            stop_loss = %body.stop_loss.stop_price,
            "Placing bracket order"
        );

        let request = self.client.post(&url).json(&body);
        self.send("orders", request).await
    }
}
