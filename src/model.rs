/// Shared data types for the climate observations service.
///
/// These are the typed shapes flowing between the data access layer and the
/// HTTP endpoint: station records, per-date readings, and the temperature
/// summary triple. Keeping them here avoids positional-index row handling in
/// the endpoint code — every field is named.

use serde::{Deserialize, Serialize};

/// Date format used throughout the dataset. `YYYY-MM-DD` sorts the same
/// lexically as chronologically, so range filters compare the raw strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A weather station from the `station` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    /// Station code, e.g. "USC00519397".
    pub station: String,
    /// Official station name.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// A single (date, precipitation) observation from the `measurement` table.
/// Precipitation is nullable in the dataset; missing readings stay `None`
/// all the way to the JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecipReading {
    pub date: String,
    pub prcp: Option<f64>,
}

/// A single (date, temperature observation) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempReading {
    pub date: String,
    pub tobs: f64,
}

/// Aggregate temperature statistics over a date range.
///
/// All three fields are null when no measurement falls in the range — the
/// summary routes serialize this as-is rather than reporting an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureSummary {
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub tmax: Option<f64>,
}

impl TemperatureSummary {
    /// True when the range matched zero rows.
    pub fn is_empty(&self) -> bool {
        self.tmin.is_none() && self.tavg.is_none() && self.tmax.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_nulls() {
        let summary = TemperatureSummary {
            tmin: None,
            tavg: None,
            tmax: None,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tmin": null, "tavg": null, "tmax": null})
        );
        assert!(summary.is_empty());
    }

    #[test]
    fn test_station_record_field_names() {
        let record = StationRecord {
            station: "USC00519397".to_string(),
            name: "WAIKIKI 717.2, HI US".to_string(),
            latitude: 21.2716,
            longitude: -157.8168,
            elevation: 3.0,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["station"], "USC00519397");
        assert_eq!(json["elevation"], 3.0);
    }
}
