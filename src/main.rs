//! photond - acquisition daemon for a serial-attached photon counter
//!
//! Reads the instrument's byte stream in fixed-size chunks, reframes it
//! into fixed-size packets, and serves those packets to TCP clients over a
//! small ASCII request/response protocol.

use photond::app::App;
use photond::{Config, Result};
use std::env;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `photond <path>` (positional)
/// - `photond --config <path>` (flag-based)
/// - `photond -c <path>` (short flag)
///
/// Defaults to `/etc/photond.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/photond.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = Config::from_file(&config_path)?;

    // RUST_LOG still overrides the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("photond starting (config: {})", config_path);

    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            return Err(e);
        }
    };

    app.run()
}
