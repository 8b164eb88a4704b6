// Broker terminal collaborators
pub mod terminal;

pub use terminal::{TerminalClient, TerminalSession};

use crate::error::TickError;
use crate::models::{Candle, OrderReceipt, OrderRequest, Quote, Timeframe};

/// Contract with an acquired broker terminal session
///
/// One session covers all three collaborator roles of the terminal:
/// candle source, quote source, and order router. The session is an
/// exclusive resource; callers acquire it at tick start and release it
/// when the tick ends.
pub trait TerminalApi {
    /// Fetch the most recent `count` candles, chronological, most recent
    /// last. The last entry is the still-forming period.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Candle>, TickError>> + Send;

    /// Current bid/ask for a symbol
    fn current_quote(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<Quote, TickError>> + Send;

    /// Submit a bracketed market order
    ///
    /// The broker may normalize the volume to its step/min/max; the
    /// executed volume comes back in the receipt.
    fn submit_order(
        &self,
        request: &OrderRequest,
    ) -> impl std::future::Future<Output = Result<OrderReceipt, TickError>> + Send;
}
