use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, Dashboard, MapConfig, Presenter, Route, SearchEvent, SearchInput,
    SearchSession, Units, WeatherApi, api_from_config, render,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::debug;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store the API key, unit system and wind map settings.
    Configure,

    /// Type-ahead location search. Each input line replaces the search text;
    /// `#N` picks result N and shows its weather.
    Search {
        /// Quiet period before a search is sent, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Show the dashboard for a place, coordinates or page route.
    Show {
        /// Place name; the first geocoding match is used.
        place: Option<String>,

        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Page route, e.g. `#/weather?lat=51.5&lon=-0.12` or `#/current-location`.
        #[arg(long, conflicts_with_all = ["place", "lat"])]
        route: Option<String>,

        /// Write the full HTML page to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { delay_ms } => {
                let mut config = Config::load()?;
                if let Some(ms) = delay_ms {
                    config.search_delay_ms = ms;
                }
                search(&config).await
            }
            Command::Show {
                place,
                lat,
                lon,
                route,
                out,
            } => {
                let config = Config::load()?;
                let api = api_from_config(&config)?;

                let at = match (lat.zip(lon), route, place) {
                    (Some((lat, lon)), _, _) => Coordinates::new(lat, lon),
                    (None, Some(route), _) => {
                        let route: Route = route.parse().context("Invalid page route")?;
                        match route.coordinates(config.default_location) {
                            Some(at) => at,
                            None => return not_found(&route, out.as_deref()),
                        }
                    }
                    (None, None, Some(place)) => resolve_place(&api, &place).await?,
                    (None, None, None) => config.default_location,
                };

                show(&config, &api, at, out).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key.trim().to_string());

    let start = Units::all()
        .iter()
        .position(|u| *u == config.units)
        .unwrap_or(0);
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()?;

    config.search_delay_ms = CustomType::<u64>::new("Search delay (ms):")
        .with_default(config.search_delay_ms)
        .prompt()?;

    if Confirm::new("Embed a Windy wind map?")
        .with_default(config.map.is_some())
        .prompt()?
    {
        let api_key = Text::new("Windy map API key:").prompt()?;
        let zoom = CustomType::<u8>::new("Initial zoom:")
            .with_default(config.map.as_ref().map_or(5, |m| m.zoom))
            .prompt()?;
        config.map = Some(MapConfig {
            api_key: api_key.trim().to_string(),
            zoom,
        });
    } else {
        config.map = None;
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn search(config: &Config) -> anyhow::Result<()> {
    let api = api_from_config(config)?;
    let session = SearchSession::new(api.clone(), config.search_delay(), config.request_timeout());

    let (input_tx, input_rx) = mpsc::channel(32);
    let (event_tx, mut events) = mpsc::channel(32);
    let session = tokio::spawn(session.run(input_rx, event_tx));

    eprintln!("Type a place name; `#N` selects result N. Ctrl-D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = Some(input_tx);
    let mut selected = None;

    while selected.is_none() {
        tokio::select! {
            line = lines.next_line(), if input.is_some() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) => {
                        if let Some(tx) = &input {
                            tx.send(parse_line(&line)).await.ok();
                        }
                    }
                    // EOF: the session stops once the last search settles.
                    None => input = None,
                }
            }
            event = events.recv() => match event {
                Some(SearchEvent::Searching(query)) => eprintln!("Searching for '{query}'..."),
                Some(SearchEvent::Results(results)) => output::print_candidates(&results),
                Some(SearchEvent::Failed(message)) => eprintln!("Search failed: {message}"),
                Some(SearchEvent::Cleared) => debug!("search cleared"),
                Some(SearchEvent::Overlay(open)) => debug!(open, "search overlay toggled"),
                Some(SearchEvent::Selected(selection)) => selected = Some(selection),
                None => break,
            },
        }
    }

    drop(input);
    session.await.context("Search session panicked")?;

    if let Some(at) = selected.and_then(|s| s.route.coordinates(config.default_location)) {
        show(config, &api, at, None).await?;
    }
    Ok(())
}

/// `#3` selects the third result; anything else is new search text.
fn parse_line(line: &str) -> SearchInput {
    line.trim()
        .strip_prefix('#')
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| SearchInput::Select(n - 1))
        .unwrap_or_else(|| SearchInput::Text(line.to_string()))
}

async fn resolve_place(api: &WeatherApi, place: &str) -> anyhow::Result<Coordinates> {
    let candidates = api
        .geocode(place)
        .await
        .with_context(|| format!("Failed to look up '{place}'"))?;

    let first = candidates
        .first()
        .ok_or_else(|| anyhow!("No location found for '{place}'"))?;
    debug!(name = %first.name, country = %first.country, "place resolved");
    Ok(first.coordinates())
}

async fn show(
    config: &Config,
    api: &WeatherApi,
    at: Coordinates,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dashboard = tokio::time::timeout(
        config.request_timeout() + Duration::from_secs(1),
        Dashboard::load(api, at),
    )
    .await
    .context("Weather service did not answer in time")?;

    output::print_dashboard(&dashboard, config.units);

    if let Some(path) = out {
        let page = Presenter::new(config.units, config.map.clone()).page(&dashboard);
        fs::write(&path, page.into_string())
            .with_context(|| format!("Failed to write dashboard page: {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    if dashboard.is_unavailable() {
        return Err(anyhow!(
            "No weather data could be loaded for {}",
            dashboard.location_label()
        ));
    }

    Ok(())
}

/// Unknown routes get the 404 page instead of a dashboard.
fn not_found(route: &Route, out: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = out {
        fs::write(path, render::not_found_page().into_string())
            .with_context(|| format!("Failed to write 404 page: {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }
    Err(anyhow!("Page not found: {route}"))
}
