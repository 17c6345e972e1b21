use std::fmt;

use tracing::{info, warn};

use crate::{
    api::WeatherApi,
    error::FetchError,
    model::{AirPollution, Coordinates, CurrentWeather, Forecast, LocationCandidate},
};

/// The independent requests behind one dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CurrentWeather,
    ReverseGeocode,
    AirPollution,
    Forecast,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CurrentWeather => "current weather",
            Stage::ReverseGeocode => "reverse geocode",
            Stage::AirPollution => "air pollution",
            Stage::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything fetched for one location. Each stage succeeds or fails on its own.
#[derive(Debug)]
pub struct Dashboard {
    pub coordinates: Coordinates,
    pub current: Result<CurrentWeather, FetchError>,
    pub place: Result<LocationCandidate, FetchError>,
    pub pollution: Result<AirPollution, FetchError>,
    pub forecast: Result<Forecast, FetchError>,
}

impl Dashboard {
    /// Run all stages concurrently and collect their outcomes.
    pub async fn load(api: &WeatherApi, at: Coordinates) -> Self {
        info!(lat = at.lat, lon = at.lon, "loading dashboard");

        let (current, place, pollution, forecast) = tokio::join!(
            api.current_weather(at),
            api.reverse_geocode(at),
            api.air_pollution(at),
            api.forecast(at),
        );

        let dashboard = Self {
            coordinates: at,
            current,
            place,
            pollution,
            forecast,
        };

        for (stage, err) in dashboard.failures() {
            warn!(%stage, error = %err, "dashboard stage unavailable");
        }

        dashboard
    }

    /// `"London, GB"` from reverse geocoding, else the station name, else the coordinates.
    pub fn location_label(&self) -> String {
        if let Ok(place) = &self.place {
            if place.country.is_empty() {
                return place.name.clone();
            }
            return format!("{}, {}", place.name, place.country);
        }

        match &self.current {
            Ok(current) if !current.name.is_empty() => current.name.clone(),
            _ => self.coordinates.label(),
        }
    }

    pub fn failures(&self) -> Vec<(Stage, &FetchError)> {
        [
            (Stage::CurrentWeather, self.current.as_ref().err()),
            (Stage::ReverseGeocode, self.place.as_ref().err()),
            (Stage::AirPollution, self.pollution.as_ref().err()),
            (Stage::Forecast, self.forecast.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(stage, err)| err.map(|e| (stage, e)))
        .collect()
    }

    /// True when no stage produced anything worth rendering.
    pub fn is_unavailable(&self) -> bool {
        self.current.is_err() && self.forecast.is_err()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::{
        api::{UrlBuilder, testing::StubFetcher},
        config::DEFAULT_API_BASE,
        model::Units,
    };
    use std::sync::Arc;

    fn api(stub: StubFetcher) -> WeatherApi {
        let urls = UrlBuilder::new(DEFAULT_API_BASE, "KEY", Units::Metric).unwrap();
        WeatherApi::new(Arc::new(stub), urls)
    }

    fn full_stub() -> StubFetcher {
        StubFetcher::default()
            .with("/data/2.5/weather", fixtures::current_weather())
            .with("/geo/1.0/reverse", fixtures::reverse_geocode())
            .with("/data/2.5/air_pollution", fixtures::air_pollution())
            .with("/data/2.5/forecast", fixtures::forecast())
    }

    #[tokio::test]
    async fn all_stages_load() {
        let d = Dashboard::load(&api(full_stub()), Coordinates::new(51.5, -0.12)).await;

        assert!(d.failures().is_empty());
        assert_eq!(d.location_label(), "City of Westminster, GB");
        assert_eq!(d.forecast.as_ref().unwrap().list.len(), 40);
        assert!(!d.is_unavailable());
    }

    #[tokio::test]
    async fn failed_reverse_geocode_does_not_block_other_stages() {
        let stub = StubFetcher::default()
            .with("/data/2.5/weather", fixtures::current_weather())
            .with("/data/2.5/air_pollution", fixtures::air_pollution())
            .with("/data/2.5/forecast", fixtures::forecast());

        let d = Dashboard::load(&api(stub), Coordinates::new(51.5, -0.12)).await;

        let failed: Vec<Stage> = d.failures().into_iter().map(|(s, _)| s).collect();
        assert_eq!(failed, vec![Stage::ReverseGeocode]);
        assert!(d.forecast.is_ok());
        assert_eq!(d.location_label(), "London");
    }

    #[tokio::test]
    async fn label_falls_back_to_coordinates() {
        let d = Dashboard::load(&api(StubFetcher::default()), Coordinates::new(1.0, 2.0)).await;

        assert_eq!(d.failures().len(), 4);
        assert_eq!(d.location_label(), "1.0000, 2.0000");
        assert!(d.is_unavailable());
    }
}
