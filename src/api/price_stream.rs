use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{decimal_from_f64, PriceFeed};
use crate::models::PriceSample;
use crate::{BotError, ErrorCategory, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Status the feed attaches to prices that are safe to trade on
const TRADING_STATUS: &str = "trading";

/// One frame from the price service
#[derive(Debug, Deserialize)]
struct FeedMessage {
    price: f64,
    confidence_interval: f64,
    #[serde(default)]
    timestamp: Option<FeedTimestamp>,
    #[serde(default)]
    status: Option<String>,
}

/// Publish time as Unix seconds or an RFC 3339 string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedTimestamp {
    Secs(i64),
    Text(String),
}

impl FeedTimestamp {
    /// `None` when the value is out of range or unparseable
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            FeedTimestamp::Secs(secs) => DateTime::<Utc>::from_timestamp(*secs, 0),
            FeedTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|at| at.with_timezone(&Utc)),
        }
    }
}

/// WebSocket client for the streaming reference price service
///
/// The first connection is made by [`PriceStreamClient::connect`] and its failure
/// is fatal to the caller. After that a dropped stream is re-dialed lazily, once,
/// on the next call to `next_sample`.
pub struct PriceStreamClient {
    url: String,
    stream: Option<WsStream>,
}

impl PriceStreamClient {
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let stream = dial(&url).await?;
        Ok(Self {
            url,
            stream: Some(stream),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

async fn dial(url: &str) -> Result<WsStream> {
    let (stream, _) = tokio_tungstenite::connect_async(url).await?;
    tracing::info!(url, "Connected to price feed");
    Ok(stream)
}

/// Read frames until one carries a price; control and binary frames are skipped
async fn read_sample(stream: &mut WsStream) -> Result<PriceSample> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return parse_sample(&text),
            Some(Ok(Message::Close(frame))) => {
                return Err(BotError::Feed(format!("stream closed by server: {:?}", frame)))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(BotError::Feed("stream ended".to_string())),
        }
    }
}

pub(crate) fn parse_sample(text: &str) -> Result<PriceSample> {
    let message: FeedMessage = serde_json::from_str(text)?;

    if let Some(status) = &message.status {
        if !status.eq_ignore_ascii_case(TRADING_STATUS) {
            return Err(BotError::invalid_data(format!(
                "feed price not tradable (status {})",
                status
            )));
        }
    }

    let published_at = message.timestamp.as_ref().and_then(FeedTimestamp::to_utc);

    Ok(PriceSample {
        reference_price: decimal_from_f64(message.price, "feed price")?,
        confidence_interval: decimal_from_f64(message.confidence_interval, "confidence interval")?,
        published_at,
    })
}

#[async_trait]
impl PriceFeed for PriceStreamClient {
    async fn next_sample(&mut self) -> Result<PriceSample> {
        if self.stream.is_none() {
            tracing::info!(url = %self.url, "Re-dialing price feed");
            self.stream = Some(dial(&self.url).await?);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(BotError::Feed("not connected".to_string()));
        };

        let result = read_sample(stream).await;

        // Bad frames are dropped per message; a broken transport is re-dialed next tick
        if let Err(e) = &result {
            if e.category() == ErrorCategory::Transport {
                self.stream = None;
            }
        }

        result
    }
}
