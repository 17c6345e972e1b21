use std::time::Duration;

use thiserror::Error;

/// Failure of a single API request. Every request is terminal on error; nothing retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send request to {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected {what} payload")]
    Payload {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} payload is missing {field}")]
    MissingField {
        what: &'static str,
        field: &'static str,
    },

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Invalid API base URL '{base}': {reason}")]
    InvalidUrl { base: String, reason: String },
}

impl FetchError {
    /// Short message suitable for showing in place of a search result list.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Timeout(_) => "The weather service did not answer in time.".to_string(),
            FetchError::Status { status, .. } if status.as_u16() == 401 => {
                "The weather service rejected the API key.".to_string()
            }
            FetchError::Payload { .. } | FetchError::MissingField { .. } => {
                "The weather service sent an unexpected response.".to_string()
            }
            _ => "Could not reach the weather service.".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("Route '{route}' is missing the '{param}' parameter")]
    MissingParam { route: String, param: &'static str },

    #[error("Route '{route}' has an invalid '{param}' value: {value}")]
    InvalidParam {
        route: String,
        param: &'static str,
        value: String,
    },
}
