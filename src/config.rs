/// Service configuration loader.
///
/// The service needs exactly two settings: where the pre-populated SQLite
/// dataset lives and which port to bind. Both have fixed defaults and can be
/// overridden by an optional `climate.toml` file or by environment variables
/// (`CLIMATE_DB`, `CLIMATE_PORT`, loadable from a `.env` file).
///
/// Precedence, lowest to highest: defaults, climate.toml, environment.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default location of the climate dataset, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "Resources/hawaii.sqlite";

/// Default bind port for the HTTP endpoint.
pub const DEFAULT_PORT: u16 = 5000;

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the SQLite dataset file. Prepared out-of-band; this service
    /// never creates or migrates it.
    pub database_path: PathBuf,
    /// Port the HTTP endpoint binds on.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            port: DEFAULT_PORT,
        }
    }
}

/// Root structure for climate.toml parsing.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    service: Option<ServiceSection>,
}

#[derive(Debug, Deserialize)]
struct ServiceSection {
    database_path: Option<PathBuf>,
    port: Option<u16>,
}

/// Loads configuration from `climate.toml` in the working directory plus
/// environment overrides. A missing file is fine (defaults apply); a file
/// that exists but does not parse is a startup error.
pub fn load_config() -> Result<ServiceConfig, String> {
    load_config_from("climate.toml")
}

/// Same as [`load_config`] but with an explicit file path, for tests.
pub fn load_config_from(path: &str) -> Result<ServiceConfig, String> {
    dotenv::dotenv().ok();

    let mut config = ServiceConfig::default();

    if let Ok(contents) = fs::read_to_string(path) {
        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path, e))?;
        if let Some(service) = file.service {
            if let Some(db) = service.database_path {
                config.database_path = db;
            }
            if let Some(port) = service.port {
                config.port = port;
            }
        }
    }

    if let Ok(db) = env::var("CLIMATE_DB") {
        if !db.is_empty() {
            config.database_path = PathBuf::from(db);
        }
    }

    if let Ok(port) = env::var("CLIMATE_PORT") {
        if !port.is_empty() {
            config.port = port
                .parse()
                .map_err(|_| format!("CLIMATE_PORT is not a valid port number: {}", port))?;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = load_config_from("no_such_config_file.toml").unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\ndatabase_path = \"data/climate.sqlite\"\nport = 8080"
        )
        .unwrap();

        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("data/climate.sqlite"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nport = 9000").unwrap();

        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service\nport = ").unwrap();

        let result = load_config_from(file.path().to_str().unwrap());
        assert!(result.is_err(), "Malformed config must not be ignored");
    }
}
