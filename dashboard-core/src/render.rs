//! HTML fragments for the dashboard page.
//!
//! Class names and `data-*` hooks match the page stylesheet and script, so the
//! fragments can be injected as-is into their containers.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde_json::json;

use crate::{
    config::MapConfig,
    dashboard::Dashboard,
    format,
    model::{Coordinates, CurrentWeather, Forecast, LocationCandidate, PollutionEntry, Units},
    route::Route,
    search::SearchView,
};

const ICON_DIR: &str = "./assets/images/weather_icons";
const WINDY_BOOT: &str = "https://api.windy.com/assets/map-forecast/libBoot.js";

fn icon(name: &str) -> String {
    format!("{ICON_DIR}/{name}.png")
}

/// The `<ul>` of search candidates, in the given order.
pub fn search_results(results: &[LocationCandidate]) -> Markup {
    html! {
        ul.view-list data-search-list {
            @for candidate in results {
                li.view-item {
                    span.m-icon { "location_on" }
                    div {
                        p.item-title { (candidate.name) }
                        p."label-2".item-subtitle { (candidate.subtitle()) }
                    }
                    a.item-link.has-state
                        href=(Route::Weather(candidate.coordinates()).to_string())
                        aria-label={ (candidate.name) " weather" }
                        data-search-toggler {}
                }
            }
        }
    }
}

/// The search panel: field state, result list and error message.
pub fn search_view(view: &SearchView) -> Markup {
    html! {
        div.search-view.active[view.overlay_open] data-search-view {
            div.search-wrapper.searching[view.searching] data-search-field {}
            div.search-result.active[view.results_visible] data-search-result {
                @if let Some(error) = &view.error {
                    p.search-error role="alert" { (error) }
                } @else {
                    (search_results(&view.results))
                }
            }
        }
    }
}

/// Renders dashboard sections in the configured unit system.
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    units: Units,
    map: Option<MapConfig>,
}

impl Presenter {
    pub fn new(units: Units, map: Option<MapConfig>) -> Self {
        Self { units, map }
    }

    fn degrees(&self, value: f64) -> Markup {
        html! { (format::whole(value)) "°" sup { (self.units.temperature_suffix()) } }
    }

    fn wind_speed(&self, speed: f64) -> String {
        match self.units {
            Units::Imperial => format!("{} mph", format::whole(speed)),
            Units::Metric | Units::Standard => format!("{} km/h", format::mps_to_kmh(speed)),
        }
    }

    pub fn current_weather(&self, current: &CurrentWeather, location: &str) -> Markup {
        let condition = current.condition();
        html! {
            div.card.card-lg.current-weather-card {
                h2."title-2".card-title { "Now" }
                div.weapper {
                    p.heading { (self.degrees(current.main.temp)) }
                    @if let Some(condition) = condition {
                        img.weather-icon src=(icon(&condition.icon)) width="64" height="64"
                            alt=(condition.description);
                    }
                }
                @if let Some(condition) = condition {
                    p."body-3" { (condition.description) }
                }
                ul.meta-list {
                    @if let Some(date) = format::date(current.dt, current.timezone) {
                        li.meta-item {
                            span.m-icon { "today" }
                            p."title-3".meta-text { (date) }
                        }
                    }
                    li.meta-item {
                        span.m-icon { "location_on" }
                        p."title-3".meta-text data-location { (location) }
                    }
                }
            }
        }
    }

    pub fn highlights(&self, current: &CurrentWeather, pollution: Option<&PollutionEntry>) -> Markup {
        let sunrise = format::time(current.sys.sunrise, current.timezone);
        let sunset = format::time(current.sys.sunset, current.timezone);

        html! {
            div.card.card-lg {
                h2."title-2" #highlights-label { "Todays Highlights" }
                div.highlight-list {
                    @if let Some(entry) = pollution {
                        (air_quality_card(entry))
                    }
                    @if let (Some(sunrise), Some(sunset)) = (sunrise, sunset) {
                        div.card.card-sm.highlight-card.two {
                            h3."title-3" { "Sunrise & Sunset" }
                            div.card-list {
                                div.card-item {
                                    span.m-icon { "clear_day" }
                                    div {
                                        p."label-1" { "Sunrise" }
                                        p."title-1" { (sunrise) }
                                    }
                                }
                                div.card-item {
                                    span.m-icon { "clear_night" }
                                    div {
                                        p."label-1" { "Sunset" }
                                        p."title-1" { (sunset) }
                                    }
                                }
                            }
                        }
                    }
                    (small_card("Humidity", "humidity_percentage", html! { (current.main.humidity) sub { "%" } }))
                    (small_card("Pressure", "airwave", html! { (current.main.pressure) sub { "hPa" } }))
                    @if let Some(meters) = current.visibility {
                        (small_card("Visibility", "visibility", html! { (format::visibility_km(meters)) sub { "km" } }))
                    }
                    (small_card("Feels Like", "thermostat", self.degrees(current.main.feels_like)))
                }
            }
        }
    }

    /// Next 24 hours: temperature row and wind row.
    pub fn hourly(&self, forecast: &Forecast) -> Markup {
        let tz = forecast.city.timezone;
        html! {
            h2."title-2" { "Today at" }
            div.slider-container {
                ul.slider-list data-temp {
                    @for entry in forecast.hourly() {
                        li.slider-item {
                            div.card.card-sm.slider-card {
                                p."body-3" { (format::hours(entry.dt, tz).unwrap_or_default()) }
                                @if let Some(condition) = entry.weather.first() {
                                    img.weather-icon src=(icon(&condition.icon)) width="48" height="48"
                                        loading="lazy" alt=(condition.description) title=(condition.description);
                                }
                                p."body-3" { (format::whole(entry.main.temp)) "°" }
                            }
                        }
                    }
                }
                ul.slider-list data-wind {
                    @for entry in forecast.hourly() {
                        li.slider-item {
                            div.card.card-sm.slider-card {
                                p."body-3" { (format::hours(entry.dt, tz).unwrap_or_default()) }
                                img.weather-icon src=(icon("direction")) width="48" height="48"
                                    loading="lazy" alt="direction"
                                    style={ "transform: rotate(" (format::whole(entry.wind.deg - 180.0)) "deg)" };
                                p."body-3" { (self.wind_speed(entry.wind.speed)) }
                            }
                        }
                    }
                }
            }
        }
    }

    /// One line per day with the daily maximum.
    pub fn five_day(&self, forecast: &Forecast) -> Markup {
        html! {
            h2."title-2" #forecast-label { "5 Days Forecast" }
            div.card.card-lg.forecast-card {
                ul data-forecast-list {
                    @for entry in forecast.daily() {
                        @if let Some(condition) = entry.weather.first() {
                            @let day = entry.dt_txt.as_deref().and_then(format::forecast_day);
                            li.card-item {
                                div.icon-wrapper {
                                    img.weather-icon src=(icon(&condition.icon)) width="36" height="36"
                                        alt=(condition.description);
                                    span.span {
                                        p."title-2" { (format::whole(entry.main.temp_max)) }
                                    }
                                }
                                @if let Some((date, weekday)) = day {
                                    p."label-1" { (date) }
                                    p."label-1" { (weekday) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Windy map embed centred on `at`, or nothing without a map key.
    pub fn wind_map(&self, at: Coordinates, label: &str) -> Markup {
        let Some(map) = &self.map else {
            return html! {};
        };

        let options = json!({
            "key": map.api_key,
            "verbose": false,
            "lat": at.lat,
            "lon": at.lon,
            "zoom": map.zoom,
        });
        let popup = json!(label);
        let init = format!(
            "windyInit({}, windyAPI => {{ L.popup().setLatLng([{}, {}]).setContent({}).openOn(windyAPI.map); }});",
            script_safe(&options.to_string()),
            at.lat,
            at.lon,
            script_safe(&popup.to_string()),
        );

        html! {
            div.card.card-lg.wind-map-card {
                h2."title-2" { "Wind Map" }
                div #windy data-wind-map {}
                script src=(WINDY_BOOT) {}
                script { (PreEscaped(init)) }
            }
        }
    }

    /// Every section that has data; failed stages are left out.
    pub fn sections(&self, dashboard: &Dashboard) -> Markup {
        let label = dashboard.location_label();
        let pollution = dashboard.pollution.as_ref().ok().and_then(|p| p.current());

        html! {
            section.section.current-weather data-current-weather {
                @if let Ok(current) = &dashboard.current {
                    (self.current_weather(current, &label))
                }
            }
            section.section.forecast data-5-day-forecast {
                @if let Ok(forecast) = &dashboard.forecast {
                    (self.five_day(forecast))
                }
            }
            section.section.highlights data-highlights {
                @if let Ok(current) = &dashboard.current {
                    (self.highlights(current, pollution))
                }
            }
            section.section.hourly-forecast data-hourly-forecast {
                @if let Ok(forecast) = &dashboard.forecast {
                    (self.hourly(forecast))
                }
            }
            (self.wind_map(dashboard.coordinates, &label))
        }
    }

    /// Complete standalone document.
    pub fn page(&self, dashboard: &Dashboard) -> Markup {
        let body = if dashboard.is_unavailable() {
            not_found()
        } else {
            html! {
                article.container.fade-in data-container {
                    (self.sections(dashboard))
                }
            }
        };
        document(&dashboard.location_label(), body)
    }
}

/// Standalone document for a route the page does not know.
pub fn not_found_page() -> Markup {
    document("Page not found", not_found())
}

fn document(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Weather | " (title) }
                link rel="stylesheet" href="./assets/css/style.css";
            }
            body {
                main { (body) }
            }
        }
    }
}

fn air_quality_card(entry: &PollutionEntry) -> Markup {
    let aqi = entry.main.aqi;
    let c = &entry.components;
    let readings = [
        (format::precision(c.pm2_5, 2), "PM", "2.5"),
        (format::precision(c.so2, 2), "SO", "2"),
        (format::precision(c.no2, 2), "NO", "2"),
        (format::precision(c.o3, 3), "O", "3"),
    ];

    html! {
        div.card.card-sm.highlight-card.one {
            h3."title-3" { "Air Quality Index" }
            div.wrapper {
                span.m-icon { "air" }
                ul.card-list {
                    @for (value, symbol, subscript) in &readings {
                        li.card-item {
                            p."title-1" { (value) }
                            p."label-1" { (symbol) sub { (subscript) } }
                        }
                    }
                }
            }
            @if let Some(text) = format::aqi_text(aqi) {
                span class={ "badge aqi-" (aqi) " label-" (aqi) } title=(text.message) { (text.level) }
            }
        }
    }
}

fn small_card(title: &str, icon_name: &str, value: Markup) -> Markup {
    html! {
        div.card.card-sm.highlight-card {
            h3."title-3" { (title) }
            div.wrapper {
                span.m-icon { (icon_name) }
                p."title-1" { (value) }
            }
        }
    }
}

/// Shown for unknown routes and when nothing could be loaded.
pub fn not_found() -> Markup {
    html! {
        section.error-content data-error-content {
            h2.heading { "404" }
            p."body-1" { "Page not found!" }
            a.btn-primary href=(Route::CurrentLocation.to_string()) {
                span.span { "Go Home" }
            }
        }
    }
}

/// Keep `</script>` sequences in embedded JSON from closing the tag early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::decode,
        dashboard::fixtures,
        error::FetchError,
    };

    fn candidate(name: &str, country: &str, state: Option<&str>) -> LocationCandidate {
        LocationCandidate {
            name: name.into(),
            lat: 48.8588897,
            lon: 2.3200410,
            country: country.into(),
            state: state.map(Into::into),
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard {
            coordinates: Coordinates::new(51.5, -0.12),
            current: decode("current weather", fixtures::current_weather()),
            place: decode::<Vec<LocationCandidate>>("reverse geocoding", fixtures::reverse_geocode())
                .map(|mut v| v.remove(0)),
            pollution: decode("air pollution", fixtures::air_pollution()),
            forecast: decode("forecast", fixtures::forecast()),
        }
    }

    #[test]
    fn renders_one_item_per_candidate_verbatim() {
        let results = vec![
            candidate("Paris", "FR", Some("Ile-de-France")),
            candidate("Paris", "US", Some("Texas")),
            candidate("Paris", "CA", None),
        ];
        let html = search_results(&results).into_string();

        assert_eq!(html.matches("<li class=\"view-item\">").count(), 3);
        assert_eq!(html.matches("data-search-toggler").count(), 3);
        assert!(html.contains("Ile-de-France, FR"));
        assert!(html.contains("Texas, US"));
        assert!(html.contains("Paris, CA"));
        assert!(html.contains("href=\"#/weather?lat=48.8588897&amp;lon=2.320041\""));
    }

    #[test]
    fn empty_result_list_renders_empty_ul() {
        let html = search_results(&[]).into_string();
        assert_eq!(html, "<ul class=\"view-list\" data-search-list></ul>");
    }

    #[test]
    fn candidate_text_is_escaped() {
        let html = search_results(&[candidate("<b>Evil</b>", "X&Y", None)]).into_string();
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;Evil&lt;/b&gt;"));
        assert!(html.contains("X&amp;Y"));
    }

    #[test]
    fn search_view_reflects_state() {
        let view = SearchView {
            searching: true,
            results_visible: true,
            results: vec![],
            overlay_open: false,
            error: Some("Could not reach the weather service.".into()),
        };
        let html = search_view(&view).into_string();

        assert!(html.contains("search-wrapper searching"));
        assert!(html.contains("search-result active"));
        assert!(html.contains("role=\"alert\""));
        assert!(!html.contains("search-view active"));
    }

    #[test]
    fn full_dashboard_renders_all_sections() {
        let presenter = Presenter::new(Units::Metric, None);
        let html = presenter.page(&dashboard()).into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("City of Westminster, GB"));
        assert!(html.contains("Friday 5, Jan"));
        assert!(html.contains("7°<sup>c</sup>"));
        assert!(html.contains("7:05 AM"));
        assert!(html.contains("4:05 PM"));
        assert!(html.contains("badge aqi-2 label-2"));
        assert!(html.contains(">Fair<"));
        assert!(html.contains("18 km/h"));
        assert!(html.contains("rotate(90deg)"));
        assert!(html.contains("10<sub>km</sub>"));
        assert_eq!(html.matches("class=\"slider-item\"").count(), 16);
        assert!(!html.contains("data-wind-map"));
        assert!(!html.contains("data-error-content"));
    }

    #[test]
    fn five_day_list_has_one_entry_per_day() {
        let presenter = Presenter::default();
        let forecast: Forecast = decode("forecast", fixtures::forecast()).unwrap();
        let html = presenter.five_day(&forecast).into_string();

        assert_eq!(html.matches("<li class=\"card-item\">").count(), 5);
        // Entry 7 is 21 hours after Friday noon.
        assert!(html.contains("6 Jan"));
        assert!(html.contains("Saturday"));
    }

    #[test]
    fn failed_pollution_only_drops_the_aqi_card() {
        let mut d = dashboard();
        d.pollution = Err(FetchError::Timeout(std::time::Duration::from_secs(1)));

        let html = Presenter::default().sections(&d).into_string();
        assert!(!html.contains("Air Quality Index"));
        assert!(html.contains("Sunrise &amp; Sunset"));
        assert!(html.contains("5 Days Forecast"));
    }

    #[test]
    fn page_without_any_data_is_404() {
        let mut d = dashboard();
        d.current = Err(FetchError::Timeout(std::time::Duration::from_secs(1)));
        d.forecast = Err(FetchError::Timeout(std::time::Duration::from_secs(1)));

        let html = Presenter::default().page(&d).into_string();
        assert!(html.contains("data-error-content"));
        assert!(html.contains("href=\"#/current-location\""));
    }

    #[test]
    fn unknown_route_renders_404_page() {
        let route: Route = "#/nowhere".parse().unwrap();
        assert_eq!(route, Route::NotFound("#/nowhere".into()));

        let html = not_found_page().into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("data-error-content"));
        assert!(html.contains("<title>Weather | Page not found</title>"));
    }

    #[test]
    fn imperial_units_show_mph_and_fahrenheit() {
        let presenter = Presenter::new(Units::Imperial, None);
        let html = presenter.page(&dashboard()).into_string();
        assert!(html.contains("5 mph"));
        assert!(html.contains("<sup>f</sup>"));
    }

    #[test]
    fn wind_map_embeds_options_safely() {
        let presenter = Presenter::new(
            Units::Metric,
            Some(MapConfig {
                api_key: "MAPKEY".into(),
                zoom: 7,
            }),
        );
        let html = presenter
            .wind_map(Coordinates::new(50.4, 14.3), "</script><script>alert(1)")
            .into_string();

        assert!(html.contains("data-wind-map"));
        assert!(html.contains("\"key\":\"MAPKEY\""));
        assert!(html.contains("\"zoom\":7"));
        assert!(html.contains("setLatLng([50.4, 14.3])"));
        assert!(!html.contains("</script><script>alert"));
    }
}
