use std::sync::Arc;

use tracing::{error, info};

use sortbox::web::WebServer;
use sortbox::{Config, FileStorage};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = sortbox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        sortbox::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("sortbox - file sorting drop box");

    let storage = match FileStorage::new(&config.storage.path) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            error!("Failed to initialize storage at {}: {}", config.storage.path, e);
            std::process::exit(1);
        }
    };
    info!("File storage initialized at: {}", config.storage.path);

    let server = match WebServer::new(&config, storage) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
