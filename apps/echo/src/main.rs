use echo_app::error::EchoError;
use echo_app::logger::initialize as LoggerInitialize;
use echo_app::session::run_session;

use app_core::config::{AppConfig, default_config_dir};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;

use log::{error, info};

const LOG_DIR_NAME: &str = "logs";
const GREETING: &[u8] = b"hello from the loopback caller";

#[tokio::main]
async fn main() -> Result<(), EchoError> {
    // .env is optional
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let config_dir = default_config_dir()?;
    let config = AppConfig::load(&config_dir)?;

    let log_dir = config_dir.join(LOG_DIR_NAME);
    create_dir_all(&log_dir).map_err(|e| EchoError::Echo {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir, config.log_level()?)?;

    info!("Echo application starting");
    info!("Config directory: {}", config_dir.display());
    info!("Log directory: {}", log_dir.display());
    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    match run_session(&config, GREETING).await {
        Ok(summary) => {
            info!(
                "Echoed {} byte(s); closed {} provider(s) on quit; caller released: {}",
                summary.reply.len(),
                summary.report.providers_closed,
                summary.caller_closed
            );
            Ok(())
        }
        Err(e) => {
            error!("Echo session failed: {e}");
            Err(e)
        }
    }
}
