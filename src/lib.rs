// Core modules
pub mod broker;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod risk;
pub mod scheduler;
pub mod strategy;

// Re-export commonly used types
pub use error::TickError;
pub use models::*;
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
