// Price sampling, order composition and the tick loop
pub mod executor;
pub mod sampler;
pub mod trader;

pub use executor::{ExecutionAction, ExecutionDecision, OrderComposer};
pub use sampler::{MarketSnapshot, PriceSampler};
pub use trader::{RunStats, TickOutcome, Trader};
