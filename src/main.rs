use clap::Parser;

use engulfbot::broker::TerminalClient;
use engulfbot::config::Settings;
use engulfbot::engine::TradingPipeline;
use engulfbot::risk::BracketCalculator;
use engulfbot::scheduler::{ScheduleSpec, Scheduler};
use engulfbot::strategy::EngulfingStrategy;

#[derive(Debug, Parser)]
#[command(name = "engulfbot", about = "Engulfing-pattern bracket-order trading bot")]
struct Cli {
    /// Path to a TOML config file layered over the shipped defaults
    #[arg(long)]
    config: Option<String>,

    /// Override the configured log filter, e.g. "engulfbot=debug"
    #[arg(long)]
    log_level: Option<String>,
}

/// Everything the process needs, wired once at startup
struct AppContext {
    settings: Settings,
    pipeline: TradingPipeline<EngulfingStrategy>,
    scheduler: Scheduler,
}

impl AppContext {
    fn build(settings: Settings) -> anyhow::Result<Self> {
        let spec = ScheduleSpec::parse(
            &settings.schedule.day_of_week,
            &settings.schedule.hours,
            &settings.schedule.minutes,
            settings.schedule.utc_offset_minutes,
            &settings.schedule.start,
        )?;

        let client = TerminalClient::new(settings.terminal.base_url.clone());
        let pipeline = TradingPipeline::new(
            client,
            EngulfingStrategy::new(),
            BracketCalculator::new(settings.trading.reward_risk_ratio),
            settings.trading.symbol.clone(),
            settings.trading.timeframe,
            settings.trading.volume,
            settings.trading.candle_window,
        );

        Ok(Self {
            settings,
            pipeline,
            scheduler: Scheduler::new(spec),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    setup_logging(cli.log_level.as_deref().unwrap_or(&settings.log.level));

    tracing::info!(
        symbol = %settings.trading.symbol,
        timeframe = %settings.trading.timeframe.as_str(),
        volume = settings.trading.volume,
        ratio = settings.trading.reward_risk_ratio,
        "engulfbot starting"
    );

    let app = AppContext::build(settings)?;

    tracing::info!(
        schedule = %format!(
            "{} {} {} (offset {}m)",
            app.settings.schedule.day_of_week,
            app.settings.schedule.hours,
            app.settings.schedule.minutes,
            app.settings.schedule.utc_offset_minutes
        ),
        terminal = %app.settings.terminal.base_url,
        "Configuration loaded, handing over to the scheduler"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = app.scheduler.run(&app.pipeline) => {
            tracing::error!("Scheduler loop exited unexpectedly");
        }
    }

    // An interrupt mid-tick may leave an order in an unknown state;
    // the operator reconciles through the terminal.
    tracing::info!("engulfbot stopped");
    Ok(())
}

fn setup_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
