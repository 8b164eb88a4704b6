// Trading strategy module
pub mod engulfing;

pub use engulfing::EngulfingStrategy;

use crate::models::{Candle, Signal};
use crate::Result;

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from a chronological candle window
    ///
    /// The last entry is the still-forming candle; implementations decide
    /// which closed candles they read. Errors if the window is shorter
    /// than `min_candles_required`.
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
