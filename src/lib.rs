// Core modules
pub mod api;
pub mod settings;
pub mod error;
pub mod execution;
pub mod models;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use api::*;
pub use settings::BotConfig;
pub use error::{BotError, ErrorCategory};
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
