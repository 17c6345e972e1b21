use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// A point on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Human readable fallback label, e.g. `51.5073, -0.1276`.
    pub fn label(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Unit system passed to the API as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }

    /// Suffix shown after a temperature value.
    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "c",
            Units::Imperial => "f",
            Units::Standard => "k",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial, standard."
            )),
        }
    }
}

/// One entry of a (reverse) geocoding response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl LocationCandidate {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// `"{state}, {country}"`, falling back to the name when there is no state.
    pub fn subtitle(&self) -> String {
        let region = self.state.as_deref().unwrap_or(&self.name);
        if self.country.is_empty() {
            region.to_string()
        } else {
            format!("{region}, {}", self.country)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SunTimes {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
}

/// `/data/2.5/weather` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub name: String,
    pub dt: i64,
    pub timezone: i32,
    pub weather: Vec<Condition>,
    pub sys: SunTimes,
    pub main: MainReadings,
    /// Meters. Missing for some stations.
    #[serde(default)]
    pub visibility: Option<u32>,
}

impl CurrentWeather {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AqiReading {
    pub aqi: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Components {
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollutionEntry {
    pub main: AqiReading,
    pub components: Components,
}

/// `/data/2.5/air_pollution` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AirPollution {
    pub list: Vec<PollutionEntry>,
}

impl AirPollution {
    pub fn current(&self) -> Option<&PollutionEntry> {
        self.list.first()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: ForecastMain,
    pub weather: Vec<Condition>,
    pub wind: Wind,
    /// `"2024-01-05 21:00:00"`, UTC.
    #[serde(default)]
    pub dt_txt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    pub timezone: i32,
}

/// `/data/2.5/forecast` response: 5 days in 3 hour steps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Forecast {
    pub city: ForecastCity,
    pub list: Vec<ForecastEntry>,
}

impl Forecast {
    /// Entries for the next 24 hours.
    pub fn hourly(&self) -> impl Iterator<Item = &ForecastEntry> {
        self.list.iter().take(HOURLY_ENTRIES)
    }

    /// One entry per day: every 8th entry starting with the 8th.
    pub fn daily(&self) -> impl Iterator<Item = &ForecastEntry> {
        self.list.iter().skip(HOURLY_ENTRIES - 1).step_by(HOURLY_ENTRIES)
    }
}

const HOURLY_ENTRIES: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_parse_is_case_insensitive() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str().to_uppercase().as_str()).unwrap();
            assert_eq!(*units, parsed);
        }
        assert!(Units::try_from("kelvinish").is_err());
    }

    #[test]
    fn candidate_subtitle_prefers_state() {
        let mut candidate = LocationCandidate {
            name: "London".into(),
            lat: 51.5,
            lon: -0.12,
            country: "GB".into(),
            state: Some("England".into()),
        };
        assert_eq!(candidate.subtitle(), "England, GB");

        candidate.state = None;
        assert_eq!(candidate.subtitle(), "London, GB");
    }

    #[test]
    fn geocoding_entry_without_state_deserializes() {
        let json = r#"{"name":"Paris","lat":48.85,"lon":2.35,"country":"FR","local_names":{"fr":"Paris"}}"#;
        let candidate: LocationCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.state, None);
        assert_eq!(candidate.coordinates(), Coordinates::new(48.85, 2.35));
    }

    fn entry(dt: i64) -> ForecastEntry {
        ForecastEntry {
            dt,
            main: ForecastMain { temp: 1.0, temp_max: 2.0 },
            weather: vec![],
            wind: Wind { speed: 1.0, deg: 0.0 },
            dt_txt: None,
        }
    }

    #[test]
    fn forecast_hourly_and_daily_slices() {
        let forecast = Forecast {
            city: ForecastCity { name: "X".into(), timezone: 0 },
            list: (0..40).map(entry).collect(),
        };

        let hourly: Vec<i64> = forecast.hourly().map(|e| e.dt).collect();
        assert_eq!(hourly, (0..8).collect::<Vec<_>>());

        let daily: Vec<i64> = forecast.daily().map(|e| e.dt).collect();
        assert_eq!(daily, vec![7, 15, 23, 31, 39]);
    }

    #[test]
    fn forecast_daily_is_empty_for_short_lists() {
        let forecast = Forecast {
            city: ForecastCity { name: "X".into(), timezone: 0 },
            list: (0..5).map(entry).collect(),
        };
        assert_eq!(forecast.hourly().count(), 5);
        assert_eq!(forecast.daily().count(), 0);
    }
}
