use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// A pair of WGS84 coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Imperial, UnitSystem::Metric]
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported systems: imperial, metric."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub direction_deg: u16,
    pub gust: Option<f64>,
}

/// Precipitation observed over the last hour, in millimetres.
/// When a report carries both rain and snow, rain wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Precipitation {
    Rain(f64),
    Snow(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    pub icon: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure_hpa: u32,
    pub humidity_pct: u8,
    pub clouds_pct: u8,
    pub visibility_m: u32,
    pub wind: Wind,
    pub precipitation: Option<Precipitation>,
    /// Sunrise and sunset as unix timestamps, paired with the station's
    /// UTC offset in seconds for rendering local clock times.
    pub sunrise: i64,
    pub sunset: i64,
    pub timezone_offset: i32,
    pub observed_at: DateTime<Utc>,
}

/// Reverse-geocoded description of where a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: String,
    pub region: Option<String>,
    pub country: String,
}

/// One refresh cycle's worth of data: the weather and the place it
/// belongs to, resolved from the same coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionsReport {
    pub coordinates: Coordinates,
    pub weather: WeatherSnapshot,
    pub place: PlaceInfo,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_system_as_str_roundtrip() {
        for units in UnitSystem::all() {
            let s = units.as_str();
            let parsed = UnitSystem::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unit_system_parse_is_case_insensitive() {
        let parsed = UnitSystem::try_from("Imperial").expect("should parse");
        assert_eq!(parsed, UnitSystem::Imperial);
    }

    #[test]
    fn unknown_unit_system_error() {
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn unit_system_defaults_to_imperial() {
        assert_eq!(UnitSystem::default(), UnitSystem::Imperial);
    }
}
