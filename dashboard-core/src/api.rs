use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    error::FetchError,
    model::{AirPollution, Coordinates, CurrentWeather, Forecast, LocationCandidate},
};

pub mod url;

pub use self::url::UrlBuilder;

/// Performs a GET against a fully-formed URL and hands back the parsed JSON body.
#[async_trait]
pub trait DataFetcher: Send + Sync + Debug {
    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError>;
}

/// [`DataFetcher`] backed by a `reqwest` client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { http })
    }
}

#[async_trait]
impl DataFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        let shown = redact(url);
        debug!(url = %shown, "GET");

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: shown.clone(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Body {
            url: shown.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: shown,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Payload {
            what: "JSON",
            source,
        })
    }
}

/// Typed access to the five endpoints the dashboard uses.
#[derive(Debug, Clone)]
pub struct WeatherApi {
    fetcher: Arc<dyn DataFetcher>,
    urls: UrlBuilder,
}

impl WeatherApi {
    pub fn new(fetcher: Arc<dyn DataFetcher>, urls: UrlBuilder) -> Self {
        Self { fetcher, urls }
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub async fn geocode(&self, query: &str) -> Result<Vec<LocationCandidate>, FetchError> {
        self.get("geocoding", &self.urls.geo(query)).await
    }

    pub async fn reverse_geocode(&self, at: Coordinates) -> Result<LocationCandidate, FetchError> {
        let places: Vec<LocationCandidate> =
            self.get("reverse geocoding", &self.urls.reverse_geo(at)).await?;

        places.into_iter().next().ok_or(FetchError::MissingField {
            what: "reverse geocoding",
            field: "places",
        })
    }

    pub async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeather, FetchError> {
        self.get("current weather", &self.urls.current_weather(at))
            .await
    }

    pub async fn air_pollution(&self, at: Coordinates) -> Result<AirPollution, FetchError> {
        let pollution: AirPollution = self.get("air pollution", &self.urls.air_pollution(at)).await?;
        if pollution.list.is_empty() {
            return Err(FetchError::MissingField {
                what: "air pollution",
                field: "list",
            });
        }
        Ok(pollution)
    }

    pub async fn forecast(&self, at: Coordinates) -> Result<Forecast, FetchError> {
        self.get("forecast", &self.urls.forecast(at)).await
    }

    async fn get<T: DeserializeOwned>(&self, what: &'static str, url: &Url) -> Result<T, FetchError> {
        let body = self.fetcher.fetch_json(url).await?;
        decode(what, body)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(what: &'static str, body: Value) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|source| FetchError::Payload { what, source })
}

/// Strip the API key before a URL ends up in logs or error messages.
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
