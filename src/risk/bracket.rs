use crate::error::TickError;
use crate::models::{Quote, RiskLevels};

/// Computes bracket prices from recent volatility
///
/// Stop-loss distance is the previous closed candle's high-low range;
/// take-profit distance is that range scaled by the reward:risk ratio.
/// All outputs are absolute prices anchored on the current quote.
#[derive(Debug, Clone, Copy)]
pub struct BracketCalculator {
    pub reward_risk_ratio: f64,
}

impl Default for BracketCalculator {
    fn default() -> Self {
        Self {
            reward_risk_ratio: 2.0,
        }
    }
}

impl BracketCalculator {
    pub fn new(reward_risk_ratio: f64) -> Self {
        Self { reward_risk_ratio }
    }

    /// Compute risk levels for both prospective directions
    ///
    /// The range must come from the previous *closed* candle; the forming
    /// candle's extremes are not final. A zero or negative range is
    /// rejected rather than producing a zero-width bracket. A ratio of 0
    /// disables take-profit for both directions.
    pub fn compute(
        &self,
        prev_high: f64,
        prev_low: f64,
        quote: &Quote,
    ) -> Result<RiskLevels, TickError> {
        let range = prev_high - prev_low;
        if range <= 0.0 {
            return Err(TickError::DegenerateRange { range });
        }

        let take_profit_distance = range * self.reward_risk_ratio;
        let (take_profit_buy, take_profit_sell) = if self.reward_risk_ratio > 0.0 {
            (
                Some(quote.ask + take_profit_distance),
                Some(quote.bid - take_profit_distance),
            )
        } else {
            (None, None)
        };

        Ok(RiskLevels {
            stop_loss_buy: quote.bid - range,
            take_profit_buy,
            stop_loss_sell: quote.ask + range,
            take_profit_sell,
        })
    }
}
