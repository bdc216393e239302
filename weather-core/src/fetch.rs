//! Extract stage: one GET against the current-weather endpoint.

use log::{debug, error, info};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::{ApiConfig, ConfigError, Location},
    model::RawWeatherResponse,
};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid weather API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to send request to weather API")]
    Request(#[source] reqwest::Error),

    #[error("Weather API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to read weather API response body")]
    Body(#[source] reqwest::Error),

    #[error("Failed to parse weather API JSON")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    api: ApiConfig,
    http: Client,
}

impl WeatherFetcher {
    pub fn new(api: ApiConfig) -> Self {
        Self::with_client(api, Client::new())
    }

    pub fn with_client(api: ApiConfig, http: Client) -> Self {
        Self { api, http }
    }

    /// Request URL for the configured location, API key and metric units.
    pub fn request_url(&self) -> Result<Url, FetchError> {
        self.build_url().map(|(_, url)| url)
    }

    fn build_url(&self) -> Result<(Location, Url), FetchError> {
        let location = self.api.location()?;

        let mut params: Vec<(&str, String)> = match &location {
            Location::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
            Location::City(city) => vec![("q", city.clone())],
        };
        params.push(("appid", self.api.key.clone()));
        params.push(("units", "metric".to_string()));

        let url = Url::parse_with_params(&self.api.base_url, &params).map_err(|e| {
            FetchError::InvalidUrl {
                url: self.api.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok((location, url))
    }

    /// Fetch the current observation. Every failure is logged here; callers
    /// only need to check for `Err`.
    pub async fn fetch(&self) -> Result<RawWeatherResponse, FetchError> {
        self.try_fetch()
            .await
            .inspect_err(|err| error!("Failed to fetch data: {}", describe(err)))
    }

    async fn try_fetch(&self) -> Result<RawWeatherResponse, FetchError> {
        let (location, url) = self.build_url()?;
        debug!("Requesting current weather for {location}");

        // The URL carries the API key, keep it out of error messages.
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.without_url()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Body(e.without_url()))?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(FetchError::Decode)?;

        info!("Data fetched successfully for {location}");
        debug!("Response JSON: {data}");

        Ok(RawWeatherResponse::new(data))
    }
}

fn describe(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
