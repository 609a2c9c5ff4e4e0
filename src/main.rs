#![cfg(not(tarpaulin_include))]

use shop_admin::app;
use shop_admin::config::Config;

/// Main entry point for the console server
///
/// Reads the configuration from the environment and serves the relay and
/// console routes until the process is stopped.
///
/// # Environment
/// * `ENDPOINT_SERVER` - backend base URL (required)
/// * `RUST_LOG` - log filter, defaults to `info`
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!("Starting console server, relaying /api to {}", config.endpoint_server);

    app::run(config).await
}
