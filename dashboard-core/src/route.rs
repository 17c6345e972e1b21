use std::{fmt, str::FromStr};

use reqwest::Url;

use crate::{error::RouteError, model::Coordinates};

/// Hash routes the rendered page navigates between.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// `#/current-location`
    CurrentLocation,
    /// `#/weather?lat=..&lon=..`
    Weather(Coordinates),
    /// Any other hash; the page shows its 404 section.
    NotFound(String),
}

impl Route {
    /// Coordinates to load, resolving the current location to `fallback`.
    /// `None` for routes that load nothing.
    pub fn coordinates(&self, fallback: Coordinates) -> Option<Coordinates> {
        match self {
            Route::CurrentLocation => Some(fallback),
            Route::Weather(at) => Some(*at),
            Route::NotFound(_) => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::CurrentLocation => f.write_str("#/current-location"),
            Route::Weather(at) => write!(f, "#/weather?lat={}&lon={}", at.lat, at.lon),
            Route::NotFound(hash) => f.write_str(hash),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // An empty hash is the landing page.
        if trimmed.is_empty() || trimmed == "#" || trimmed == "#/" {
            return Ok(Route::CurrentLocation);
        }

        let (path, query) = trimmed.split_once('?').unwrap_or((trimmed, ""));
        match path {
            "#/current-location" => Ok(Route::CurrentLocation),
            "#/weather" => {
                let params = query_params(query);
                let lat = coordinate(trimmed, &params, "lat", -90.0..=90.0)?;
                let lon = coordinate(trimmed, &params, "lon", -180.0..=180.0)?;
                Ok(Route::Weather(Coordinates::new(lat, lon)))
            }
            _ => Ok(Route::NotFound(trimmed.to_string())),
        }
    }
}

/// Percent-decoded `key=value` pairs of a hash query.
fn query_params(query: &str) -> Vec<(String, String)> {
    Url::parse(&format!("http://localhost/?{query}"))
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

fn coordinate(
    route: &str,
    params: &[(String, String)],
    param: &'static str,
    range: std::ops::RangeInclusive<f64>,
) -> Result<f64, RouteError> {
    let raw = params
        .iter()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| RouteError::MissingParam {
            route: route.to_string(),
            param,
        })?;

    raw.parse::<f64>()
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(|| RouteError::InvalidParam {
            route: route.to_string(),
            param,
            value: raw.to_string(),
        })
}
