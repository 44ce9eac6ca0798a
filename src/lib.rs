/// climate_service: read-only HTTP API over a pre-populated climate dataset.
///
/// # Module structure
///
/// ```text
/// climate_service
/// ├── model    — shared data types (StationRecord, TempReading, TemperatureSummary, …)
/// ├── config   — service configuration loader (climate.toml + environment)
/// ├── db       — SQLite data access layer (ClimateStore, per-request DataSession)
/// └── endpoint — HTTP routing layer (five API routes + route listing + health)
/// ```

pub mod config;
pub mod db;
pub mod endpoint;
pub mod model;
