use reqwest::Url;

use crate::{
    error::FetchError,
    model::{Coordinates, Units},
};

/// How many candidates the geocoding endpoints return.
pub const GEOCODING_LIMIT: u8 = 5;

/// Builds complete OpenWeather request URLs. Every URL carries the API key and unit system.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    api_key: String,
    units: Units,
}

impl UrlBuilder {
    pub fn new(base: &str, api_key: impl Into<String>, units: Units) -> Result<Self, FetchError> {
        let base = Url::parse(base).map_err(|e| FetchError::InvalidUrl {
            base: base.to_string(),
            reason: e.to_string(),
        })?;

        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                base: base.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            base,
            api_key: api_key.into(),
            units,
        })
    }

    /// Direct geocoding: place name to candidates.
    pub fn geo(&self, query: &str) -> Url {
        let limit = GEOCODING_LIMIT.to_string();
        self.build("/geo/1.0/direct", &[("q", query), ("limit", &limit)])
    }

    pub fn reverse_geo(&self, at: Coordinates) -> Url {
        let limit = GEOCODING_LIMIT.to_string();
        self.build_at("/geo/1.0/reverse", at, &[("limit", &limit)])
    }

    pub fn current_weather(&self, at: Coordinates) -> Url {
        self.build_at("/data/2.5/weather", at, &[])
    }

    pub fn air_pollution(&self, at: Coordinates) -> Url {
        self.build_at("/data/2.5/air_pollution", at, &[])
    }

    /// 5 day / 3 hour forecast.
    pub fn forecast(&self, at: Coordinates) -> Url {
        self.build_at("/data/2.5/forecast", at, &[])
    }

    pub fn units(&self) -> Units {
        self.units
    }

    fn build_at(&self, path: &str, at: Coordinates, extra: &[(&str, &str)]) -> Url {
        let lat = at.lat.to_string();
        let lon = at.lon.to_string();

        let mut params = vec![("lat", lat.as_str()), ("lon", lon.as_str())];
        params.extend_from_slice(extra);
        self.build(path, &params)
    }

    fn build(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{path}"));

        url.query_pairs_mut()
            .clear()
            .extend_pairs(params)
            .append_pair("units", self.units.as_str())
            .append_pair("appid", &self.api_key);

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_BASE;

    fn builder() -> UrlBuilder {
        UrlBuilder::new(DEFAULT_API_BASE, "KEY", Units::Metric).unwrap()
    }

    #[test]
    fn geo_url_encodes_query() {
        let url = builder().geo("São Paulo & co");
        assert_eq!(url.path(), "/geo/1.0/direct");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".into(), "São Paulo & co".into()),
                ("limit".into(), "5".into()),
                ("units".into(), "metric".into()),
                ("appid".into(), "KEY".into()),
            ]
        );
    }

    #[test]
    fn coordinate_urls_carry_lat_lon_units_and_key() {
        let b = UrlBuilder::new(DEFAULT_API_BASE, "KEY", Units::Imperial).unwrap();
        let at = Coordinates::new(51.5, -0.12);

        for (url, path) in [
            (b.current_weather(at), "/data/2.5/weather"),
            (b.air_pollution(at), "/data/2.5/air_pollution"),
            (b.forecast(at), "/data/2.5/forecast"),
            (b.reverse_geo(at), "/geo/1.0/reverse"),
        ] {
            assert_eq!(url.host_str(), Some("api.openweathermap.org"));
            assert_eq!(url.path(), path);
            let query = url.query().unwrap();
            assert!(query.starts_with("lat=51.5&lon=-0.12"), "{query}");
            assert!(query.contains("units=imperial"));
            assert!(query.ends_with("appid=KEY"));
        }
    }

    #[test]
    fn base_with_path_prefix_is_kept() {
        let b = UrlBuilder::new("http://localhost:8080/proxy/", "K", Units::Metric).unwrap();
        assert_eq!(b.forecast(Coordinates::new(0.0, 0.0)).path(), "/proxy/data/2.5/forecast");
    }

    #[test]
    fn invalid_base_is_rejected() {
        let err = UrlBuilder::new("not a url", "K", Units::Metric).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
