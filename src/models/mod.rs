use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candlestick data for one period
///
/// Sequences of candles are chronological, most recent last. The last
/// entry is the still-forming period; the second-to-last is the most
/// recently closed candle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// High-low range of this candle
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Candlestick timeframe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Wire token used by the terminal bridge
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "m1",
            Timeframe::M5 => "m5",
            Timeframe::M15 => "m15",
            Timeframe::M30 => "m30",
            Timeframe::H1 => "h1",
            Timeframe::H4 => "h4",
            Timeframe::D1 => "d1",
        }
    }

    pub fn minutes(&self) -> u64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }
}

/// Current bid/ask for a symbol
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

/// Trading signal, recomputed from the candle window each tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    None,
    Sell,
    Buy,
}

/// Order direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// How long an order stays working
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    GoodTillCancel,
}

/// Execution policy for the fill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    FillOrKill,
}

/// Stop-loss / take-profit prices for both prospective directions
///
/// Derived per tick from the previous closed candle's range and the
/// current quote; never persisted. A take-profit of `None` means the
/// configured reward:risk ratio is 0 and the order carries no TP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss_buy: f64,
    pub take_profit_buy: Option<f64>,
    pub stop_loss_sell: f64,
    pub take_profit_sell: Option<f64>,
}

impl RiskLevels {
    /// Bracket prices for one direction: (stop_loss, take_profit)
    pub fn for_side(&self, side: OrderSide) -> (f64, Option<f64>) {
        match side {
            OrderSide::Buy => (self.stop_loss_buy, self.take_profit_buy),
            OrderSide::Sell => (self.stop_loss_sell, self.take_profit_sell),
        }
    }
}

/// A bracketed market order, built fresh per decision
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub volume: f64,
    pub side: OrderSide,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub time_in_force: TimeInForce,
    pub fill_policy: FillPolicy,
    pub comment: String,
}

/// Broker confirmation of a filled order
///
/// `executed_volume` may differ from the requested volume when the broker
/// normalizes it to its step/min/max constraints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OrderReceipt {
    pub ticket: u64,
    pub filled_price: f64,
    pub executed_volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_range() {
        let candle = Candle {
            timestamp: Utc::now(),
            open: 1.1000,
            high: 1.1060,
            low: 1.0980,
            close: 1.1050,
            volume: 1250.0,
        };

        assert!((candle.range() - 0.0080).abs() < 1e-12);
    }

    #[test]
    fn test_timeframe_wire_token() {
        assert_eq!(Timeframe::M15.as_str(), "m15");
        assert_eq!(Timeframe::H1.minutes(), 60);

        let parsed: Timeframe = serde_json::from_str("\"m15\"").unwrap();
        assert_eq!(parsed, Timeframe::M15);
    }

    #[test]
    fn test_risk_levels_for_side() {
        let levels = RiskLevels {
            stop_loss_buy: 1.0911,
            take_profit_buy: Some(1.1152),
            stop_loss_sell: 1.1072,
            take_profit_sell: Some(1.0831),
        };

        assert_eq!(levels.for_side(OrderSide::Sell), (1.1072, Some(1.0831)));
        assert_eq!(levels.for_side(OrderSide::Buy), (1.0911, Some(1.1152)));
    }
}
