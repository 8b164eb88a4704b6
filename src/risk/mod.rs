// Risk management module
pub mod bracket;

pub use bracket::BracketCalculator;
