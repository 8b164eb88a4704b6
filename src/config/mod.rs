use anyhow::Context;
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::models::Timeframe;

/// Shipped defaults, compiled in so a bare binary still starts
const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// All runtime settings; loaded once at startup, immutable after
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub trading: TradingSettings,
    pub schedule: ScheduleSettings,
    pub terminal: TerminalSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingSettings {
    /// Symbol as the broker names it, e.g. "EURUSD"
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Fixed lot size per order
    pub volume: f64,
    /// Take-profit distance as a multiple of stop-loss distance; 0
    /// disables take-profit
    pub reward_risk_ratio: f64,
    /// Candles fetched per tick: the forming candle plus closed history
    pub candle_window: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    pub day_of_week: String,
    pub hours: String,
    pub minutes: String,
    pub utc_offset_minutes: i32,
    /// "YYYY-MM-DD HH:MM:SS", interpreted at the configured offset
    pub start: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerminalSettings {
    /// Base URL of the terminal REST bridge
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// tracing env-filter expression, e.g. "engulfbot=info"
    pub level: String,
}

impl Settings {
    /// Load settings: compiled defaults, optional operator file,
    /// `ENGULFBOT_*` environment overrides (e.g.
    /// `ENGULFBOT_TRADING__SYMBOL=GBPUSD`)
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("ENGULFBOT").separator("__"))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize::<Settings>()
            .context("invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.trading.volume <= 0.0 {
            anyhow::bail!("trading.volume must be positive, got {}", self.trading.volume);
        }
        if self.trading.reward_risk_ratio < 0.0 {
            anyhow::bail!(
                "trading.reward_risk_ratio must be >= 0, got {}",
                self.trading.reward_risk_ratio
            );
        }
        if self.trading.candle_window < 2 {
            anyhow::bail!(
                "trading.candle_window must be at least 2, got {}",
                self.trading.candle_window
            );
        }
        Ok(())
    }
}
