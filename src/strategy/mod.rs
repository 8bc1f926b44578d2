// Trading strategy module
pub mod signals;

pub use signals::{divergence, generate_signal};
