use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Where the job looks for its configuration unless told otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration")]
    Invalid(#[from] serde_yaml::Error),

    #[error(
        "No location configured.\n\
         Hint: set both `api.lat` and `api.lon`, or `api.city`."
    )]
    MissingLocation,
}

/// Top-level configuration, one YAML document per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
}

/// Weather endpoint and the location to query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full URL of the current-weather endpoint, without a query string.
    pub base_url: String,
    pub key: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Connection settings for the destination database.
///
/// Example YAML:
/// ```yaml
/// database:
///   host: localhost
///   port: 5432
///   user: etl
///   password: secret
///   dbname: weather
/// ```
///
/// `url` takes precedence over the individual fields when present, which is
/// also the only way to select SQLite (`sqlite://weather.db`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub dbname: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

/// Location selector resolved from [`ApiConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates { lat: f64, lon: f64 },
    City(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates { lat, lon } => write!(f, "lat={lat}, lon={lon}"),
            Location::City(city) => write!(f, "city={city}"),
        }
    }
}

impl ApiConfig {
    /// Coordinates win over the city name when both `lat` and `lon` are set
    /// and non-zero; a zero coordinate counts as unset.
    pub fn location(&self) -> Result<Location, ConfigError> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            if lat != 0.0 && lon != 0.0 {
                return Ok(Location::Coordinates { lat, lon });
            }
        }

        match self.city.as_deref().map(str::trim) {
            Some(city) if !city.is_empty() => Ok(Location::City(city.to_string())),
            _ => Err(ConfigError::MissingLocation),
        }
    }
}

impl Config {
    /// Load config from a YAML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
