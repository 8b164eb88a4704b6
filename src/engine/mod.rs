// Decision pipeline
pub mod pipeline;

pub use pipeline::{TickOutcome, TradingPipeline};
