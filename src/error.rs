use thiserror::Error;

/// Failures local to a single scheduled tick
///
/// None of these are fatal to the process; the scheduler logs and moves
/// on to the next tick. Startup-time configuration errors go through
/// `anyhow` instead.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("candle data unavailable: {0}")]
    DataUnavailable(String),

    #[error("quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("degenerate previous-candle range ({range}), refusing zero-width bracket")]
    DegenerateRange { range: f64 },

    #[error("order rejected by broker (code {code}): {reason}")]
    OrderRejected { code: i64, reason: String },

    #[error("terminal session error: {0}")]
    Session(String),

    #[error("terminal transport error: {0}")]
    Http(#[from] reqwest::Error),
}
