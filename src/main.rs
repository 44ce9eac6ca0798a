//! Climate Observations API - Service Entry Point
//!
//! Serves a read-only HTTP API over a pre-populated SQLite climate dataset:
//! precipitation and temperature observations from weather stations, plus a
//! station directory and date-range temperature summaries.
//!
//! Usage:
//!   cargo run --release                # Serve on the configured port (default 5000)
//!   cargo run --release -- --port 8080 # Override the bind port
//!
//! Environment:
//!   CLIMATE_DB   - Path to the SQLite dataset (default: Resources/hawaii.sqlite)
//!   CLIMATE_PORT - Bind port (default: 5000)

use climate_service::config;
use climate_service::db::ClimateStore;
use climate_service::endpoint;
use std::env;

fn main() {
    println!("🌡️  Climate Observations API");
    println!("============================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    port_override = args[i + 1].parse().ok();
                    if port_override.is_none() {
                        eprintln!("Error: --port requires a valid port number");
                        std::process::exit(1);
                    }
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    // Load configuration
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    let port = port_override.unwrap_or(config.port);

    // Open the dataset with startup validation. A missing or malformed
    // dataset is fatal; there is no request-time recovery path.
    println!("📊 Opening climate dataset...");
    let store = match ClimateStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("\n❌ Startup failed: {}\n", e);
            std::process::exit(1);
        }
    };
    println!("✓ Dataset ready: {}\n", store.path().display());

    // Serve until killed
    if let Err(e) = endpoint::start_endpoint_server(port, store) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
