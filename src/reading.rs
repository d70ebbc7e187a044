//! # Sensor Reading Model
//!
//! One decoded measurement from the humidity sensor, and the fixed column
//! order shared by the decoder output and the CSV archive.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of columns in every archive row
pub const COLUMN_COUNT: usize = 9;

/// Archive column names, in row order
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "timestamp",
    "potId",
    "airLevel",
    "waterLevel",
    "soilHumidity",
    "soilHumidityPercent",
    "airTemperature",
    "airHumidity",
    "heatIndex",
];

/// Timestamp format used in archive rows (UTC, microsecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single sensor measurement
///
/// The device does not transmit a timestamp; it is stamped on the host when
/// the record has been read. Every field is always filled by the binary
/// decoder, `None` only shows up as an empty CSV cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Host capture time
    pub timestamp: DateTime<Utc>,

    /// Pot identifier configured on the device
    pub pot_id: Option<u16>,

    /// Raw capacitive reading in dry air (calibration point)
    pub air_level: Option<u16>,

    /// Raw capacitive reading in water (calibration point)
    pub water_level: Option<u16>,

    /// Raw soil humidity reading
    pub soil_humidity: Option<u16>,

    /// Soil humidity mapped between air and water levels (0-100%)
    pub soil_humidity_percent: Option<u16>,

    /// Air temperature in °C
    pub air_temperature: Option<f32>,

    /// Relative air humidity in %
    pub air_humidity: Option<f32>,

    /// Heat index in °C
    pub heat_index: Option<f32>,
}

impl SensorReading {
    /// Render the reading as one archive row, in [`COLUMNS`] order
    pub fn to_record(&self) -> [String; COLUMN_COUNT] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            cell(self.pot_id),
            cell(self.air_level),
            cell(self.water_level),
            cell(self.soil_humidity),
            cell(self.soil_humidity_percent),
            cell(self.air_temperature),
            cell(self.air_humidity),
            cell(self.heat_index),
        ]
    }
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
