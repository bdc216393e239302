use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded JSON body of the current-weather endpoint.
///
/// Deliberately untyped: the transformer decides field by field what it can
/// use, so an unexpected shape never fails decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeatherResponse(Value);

impl RawWeatherResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// One flattened observation, i.e. one row of `weather_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: Option<String>,
    pub country: Option<String>,
    pub weather_main: Option<String>,
    pub weather_description: Option<String>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<i32>,
    pub humidity: Option<i32>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<i32>,
    pub clouds_all: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// Output of the transform stage: zero or one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<WeatherRecord>,
}

impl RecordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(record: WeatherRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn first(&self) -> Option<&WeatherRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeatherRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a WeatherRecord;
    type IntoIter = std::slice::Iter<'a, WeatherRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
