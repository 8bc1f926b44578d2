use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reference price from the streaming feed
/// Consumed once per tick, never cached
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub reference_price: Decimal,
    pub confidence_interval: Decimal,
    pub published_at: Option<DateTime<Utc>>,
}

/// The brokerage's current ask for the traded symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotedPrice {
    pub ask_price: Decimal,
}

/// Read-only snapshot of the brokerage account
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub buying_power: Decimal,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Order side this signal trades on, `None` for Hold
    pub fn side(self) -> Option<OrderSide> {
        match self {
            Signal::Buy => Some(OrderSide::Buy),
            Signal::Sell => Some(OrderSide::Sell),
            Signal::Hold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Gtc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderClass {
    Bracket,
}

/// Take-profit and stop-loss legs attached to an entry order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub take_profit_limit_price: Decimal,
    pub stop_loss_stop_price: Decimal,
}

/// A fully sized order, built fresh per decision and discarded after submission
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub order_class: OrderClass,
    pub bracket: Bracket,
}

/// Brokerage acknowledgement for a submitted order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderAck {
    pub id: Uuid,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub status: String,
}
