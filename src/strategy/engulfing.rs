use super::Strategy;
use crate::models::{Candle, Signal};
use crate::Result;

/// Two-candle engulfing reversal pattern
///
/// Looks at the last two entries of the window: `prev` (second-to-last,
/// the most recently closed candle) and `curr` (last). A bearish candle
/// whose body fully engulfs the previous bullish body is a Sell; the
/// mirror is a Buy. Strict inequalities on the body comparisons, so doji
/// and equal-price candles fall through to no signal.
#[derive(Debug, Clone, Default)]
pub struct EngulfingStrategy;

impl EngulfingStrategy {
    pub fn new() -> Self {
        Self
    }

    fn classify(prev: &Candle, curr: &Candle) -> Signal {
        // Bearish engulfing: current bearish body swallows previous bullish body
        if curr.open > curr.close
            && prev.open < prev.close
            && curr.close < prev.open
            && curr.open >= prev.close
        {
            return Signal::Sell;
        }

        // Bullish engulfing: mirror conditions
        if curr.open < curr.close
            && prev.open > prev.close
            && curr.close > prev.open
            && curr.open <= prev.close
        {
            return Signal::Buy;
        }

        Signal::None
    }
}

impl Strategy for EngulfingStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal> {
        if candles.len() < self.min_candles_required() {
            return Err(format!(
                "Insufficient data: {} candles, need {}",
                candles.len(),
                self.min_candles_required()
            )
            .into());
        }

        let prev = &candles[candles.len() - 2];
        let curr = &candles[candles.len() - 1];

        Ok(Self::classify(prev, curr))
    }

    fn name(&self) -> &str {
        "EngulfingStrategy"
    }

    fn min_candles_required(&self) -> usize {
        2
    }
}
