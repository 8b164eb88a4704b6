use crate::broker::{TerminalApi, TerminalClient};
use crate::error::TickError;
use crate::models::{
    FillPolicy, OrderReceipt, OrderRequest, OrderSide, Quote, Signal, Timeframe, TimeInForce,
};
use crate::risk::BracketCalculator;
use crate::strategy::Strategy;

/// Order comment attached to every submission
const ORDER_COMMENT: &str = "engulfbot";

/// Below this the requested and executed volumes are the same lot size;
/// brokers quote lots in 0.01 steps, so float noise sits far under it
const VOLUME_TOLERANCE: f64 = 1e-9;

/// Did the broker adjust the volume to its step/min/max?
fn volume_was_normalized(requested: f64, executed: f64) -> bool {
    (executed - requested).abs() > VOLUME_TOLERANCE
}

/// What a single tick ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Window showed no reversal pattern; nothing was fetched or sent
    /// beyond the candles themselves
    NoSignal,
    /// Exactly one bracketed order went out
    Submitted {
        side: OrderSide,
        receipt: OrderReceipt,
    },
}

/// One tick of the trading pipeline: fetch, decide, maybe submit
///
/// The pipeline holds no cross-tick state. It does not know about open
/// positions and will happily re-enter in the same direction on
/// consecutive ticks if the pattern persists; position reconciliation is
/// out of scope.
pub struct TradingPipeline<S: Strategy> {
    client: TerminalClient,
    strategy: S,
    calculator: BracketCalculator,
    symbol: String,
    timeframe: Timeframe,
    volume: f64,
    candle_window: usize,
}

impl<S: Strategy> TradingPipeline<S> {
    pub fn new(
        client: TerminalClient,
        strategy: S,
        calculator: BracketCalculator,
        symbol: String,
        timeframe: Timeframe,
        volume: f64,
        candle_window: usize,
    ) -> Self {
        // Two closed candles plus the forming one is the useful minimum
        let candle_window = candle_window.max(strategy.min_candles_required());
        Self {
            client,
            strategy,
            calculator,
            symbol,
            timeframe,
            volume,
            candle_window,
        }
    }

    /// Run one scheduled tick
    ///
    /// Acquires a terminal session, decides, and releases the session on
    /// every path. At most one order leaves per call; there are no
    /// retries within a tick.
    pub async fn run_tick(&self) -> Result<TickOutcome, TickError> {
        let session = self.client.acquire().await?;
        let outcome = self.decide(&session).await;
        session.release().await;
        outcome
    }

    async fn decide(&self, terminal: &impl TerminalApi) -> Result<TickOutcome, TickError> {
        let candles = terminal
            .fetch_candles(&self.symbol, self.timeframe, self.candle_window)
            .await?;

        if candles.len() < self.strategy.min_candles_required() {
            return Err(TickError::DataUnavailable(format!(
                "received {} candles, need at least {}",
                candles.len(),
                self.strategy.min_candles_required()
            )));
        }

        let signal = self
            .strategy
            .generate_signal(&candles)
            .map_err(|e| TickError::DataUnavailable(e.to_string()))?;

        let side = match signal {
            Signal::None => {
                tracing::info!(symbol = %self.symbol, "No reversal pattern, standing down");
                return Ok(TickOutcome::NoSignal);
            }
            Signal::Sell => OrderSide::Sell,
            Signal::Buy => OrderSide::Buy,
        };

        let quote = terminal.current_quote(&self.symbol).await?;

        // SL/TP distance comes from the previous *closed* candle; the
        // last entry is still forming and its extremes are not final.
        let prev = &candles[candles.len() - 2];
        let levels = self.calculator.compute(prev.high, prev.low, &quote)?;
        let (stop_loss, take_profit) = levels.for_side(side);

        let request = self.build_request(side, &quote, stop_loss, take_profit);

        tracing::info!(
            symbol = %self.symbol,
            side = %side.as_str(),
            volume = request.volume,
            entry = request.entry_price,
            stop_loss,
            take_profit = ?take_profit,
            "Submitting bracketed market order"
        );

        let receipt = terminal.submit_order(&request).await?;

        if volume_was_normalized(request.volume, receipt.executed_volume) {
            tracing::warn!(
                requested = request.volume,
                executed = receipt.executed_volume,
                "Broker normalized order volume"
            );
        }

        tracing::info!(
            ticket = receipt.ticket,
            filled_price = receipt.filled_price,
            executed_volume = receipt.executed_volume,
            "Order filled"
        );

        Ok(TickOutcome::Submitted { side, receipt })
    }

    fn build_request(
        &self,
        side: OrderSide,
        quote: &Quote,
        stop_loss: f64,
        take_profit: Option<f64>,
    ) -> OrderRequest {
        let entry_price = match side {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };

        OrderRequest {
            symbol: self.symbol.clone(),
            volume: self.volume,
            side,
            entry_price,
            stop_loss: Some(stop_loss),
            take_profit,
            time_in_force: TimeInForce::GoodTillCancel,
            fill_policy: FillPolicy::FillOrKill,
            comment: ORDER_COMMENT.to_string(),
        }
    }
}
