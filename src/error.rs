use std::time::Duration;

use thiserror::Error;

/// Coarse error classes used to decide how a failed tick is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Feed or brokerage unreachable, timed out, or rejected the call
    Transport,
    /// Prices, buying power or frames that cannot be traded on
    Data,
    /// Bad or missing configuration, only raised at startup
    Config,
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("brokerage API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("client-side rate limit reached for {0}")]
    RateLimited(&'static str),

    #[error("price feed websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("price feed unavailable: {0}")]
    Feed(String),

    #[error("no price from feed within {0:?}")]
    FeedTimeout(Duration),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::Http(_)
            | BotError::Api { .. }
            | BotError::RateLimited(_)
            | BotError::WebSocket(_)
            | BotError::Feed(_)
            | BotError::FeedTimeout(_) => ErrorCategory::Transport,
            BotError::Json(_) | BotError::InvalidData(_) => ErrorCategory::Data,
            BotError::Config(_) => ErrorCategory::Config,
        }
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        BotError::InvalidData(msg.into())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BotError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BotError::WebSocket(Box::new(err))
    }
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        assert_eq!(
            BotError::FeedTimeout(Duration::from_millis(100)).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            BotError::Api {
                status: 403,
                body: "forbidden".to_string()
            }
            .category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            BotError::invalid_data("zero price").category(),
            ErrorCategory::Data
        );
        assert_eq!(
            BotError::Config("missing key".to_string()).category(),
            ErrorCategory::Config
        );
    }

    #[test]
    fn test_json_errors_are_data_errors() {
        let err: BotError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Data);
    }
}
