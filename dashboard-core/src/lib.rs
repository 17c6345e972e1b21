//! Core library for the `weather-dashboard` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - OpenWeather request URLs and a pluggable data fetcher
//! - The debounced location search and its async driver
//! - Concurrent loading of a location's dashboard and its HTML rendering
//!
//! It is used by `dashboard-cli`, but can also be embedded in other front ends.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod route;
pub mod scheduler;
pub mod search;

pub use api::{DataFetcher, HttpFetcher, UrlBuilder, WeatherApi};
pub use config::{Config, MapConfig};
pub use dashboard::{Dashboard, Stage};
pub use error::{FetchError, RouteError};
pub use model::{Coordinates, LocationCandidate, Units};
pub use render::Presenter;
pub use route::Route;
pub use scheduler::{ManualScheduler, Scheduler, TimerToken, TokioScheduler};
pub use search::{
    SearchController, SearchState, SearchTicket, SearchView, Selection,
    session::{SearchEvent, SearchInput, SearchSession},
};

/// Build the API client described by `config`.
pub fn api_from_config(config: &Config) -> anyhow::Result<WeatherApi> {
    let api_key = config.resolve_api_key()?;
    let urls = UrlBuilder::new(&config.api_base, api_key, config.units)?;
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    Ok(WeatherApi::new(std::sync::Arc::new(fetcher), urls))
}
