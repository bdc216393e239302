//! Transform stage: flatten a current-weather body into one [`WeatherRecord`].
//!
//! Every record field is read through one of the typed extractors below.
//! Absence, `null` or a scalar of the wrong type yields `None` for that field
//! only. Containers are stricter: only a missing key defaults to an empty
//! mapping. A `null` or wrongly shaped `sys`, `main`, `wind`, `clouds` or
//! `weather` (including an empty `weather` list) is malformed input and the
//! whole set comes back empty.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{RawWeatherResponse, RecordSet, WeatherRecord};

type Object = Map<String, Value>;

/// Top-level keys whose absence is worth a warning.
const EXPECTED_FIELDS: [&str; 4] = ["name", "sys", "main", "weather"];

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),

    #[error("expected `{field}` to be {expected}, found {found}")]
    UnexpectedShape {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Map the fetched body to a record set.
///
/// `None` stands for a failed fetch. This function never fails: problems are
/// logged and reported as an empty set.
pub fn transform(raw: Option<&RawWeatherResponse>) -> RecordSet {
    let Some(raw) = raw.filter(|raw| !is_blank(raw.as_value())) else {
        error!("No data provided for transformation.");
        return RecordSet::empty();
    };

    match map_record(raw) {
        Ok(record) => {
            info!(
                "Data transformed successfully for city={}",
                record.city.as_deref().unwrap_or("<unknown>")
            );
            RecordSet::single(record)
        }
        Err(err) => {
            error!("Error during transformation: {err}; input: {}", raw.as_value());
            RecordSet::empty()
        }
    }
}

fn map_record(raw: &RawWeatherResponse) -> Result<WeatherRecord, TransformError> {
    let root = raw
        .as_value()
        .as_object()
        .ok_or_else(|| TransformError::NotAnObject(kind(raw.as_value())))?;

    for field in EXPECTED_FIELDS {
        if !root.contains_key(field) {
            warn!("Missing field: {field}");
        }
    }

    let sys = object_at(root, "sys")?;
    let main = object_at(root, "main")?;
    let wind = object_at(root, "wind")?;
    let clouds = object_at(root, "clouds")?;
    let condition = first_condition(root)?;

    Ok(WeatherRecord {
        city: str_at(Some(root), "name"),
        country: str_at(sys, "country"),
        weather_main: str_at(condition, "main"),
        weather_description: str_at(condition, "description"),
        temp: f64_at(main, "temp"),
        feels_like: f64_at(main, "feels_like"),
        temp_min: f64_at(main, "temp_min"),
        temp_max: f64_at(main, "temp_max"),
        pressure: i32_at(main, "pressure"),
        humidity: i32_at(main, "humidity"),
        wind_speed: f64_at(wind, "speed"),
        wind_deg: i32_at(wind, "deg"),
        clouds_all: i32_at(clouds, "all"),
        date: timestamp_at(Some(root), "dt"),
        sunrise: timestamp_at(sys, "sunrise"),
        sunset: timestamp_at(sys, "sunset"),
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn object_at<'a>(
    parent: &'a Object,
    key: &'static str,
) -> Result<Option<&'a Object>, TransformError> {
    match parent.get(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(TransformError::UnexpectedShape {
            field: key,
            expected: "an object",
            found: kind(other),
        }),
    }
}

/// `weather[0]`; only an absent `weather` key reads as an empty condition.
fn first_condition(root: &Object) -> Result<Option<&Object>, TransformError> {
    let items = match root.get("weather") {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(TransformError::UnexpectedShape {
                field: "weather",
                expected: "an array",
                found: kind(other),
            });
        }
    };

    match items.first() {
        None => Err(TransformError::UnexpectedShape {
            field: "weather",
            expected: "a non-empty array",
            found: "an empty array",
        }),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(TransformError::UnexpectedShape {
            field: "weather[0]",
            expected: "an object",
            found: kind(other),
        }),
    }
}

fn value_at<'a>(obj: Option<&'a Object>, key: &str) -> Option<&'a Value> {
    obj?.get(key)
}

fn str_at(obj: Option<&Object>, key: &str) -> Option<String> {
    value_at(obj, key)?.as_str().map(str::to_owned)
}

fn f64_at(obj: Option<&Object>, key: &str) -> Option<f64> {
    value_at(obj, key)?.as_f64()
}

/// Integral numbers that fit in `i32`; `1012.0` is accepted, `1012.5` is not.
fn i32_at(obj: Option<&Object>, key: &str) -> Option<i32> {
    let value = value_at(obj, key)?;
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }

    let f = value.as_f64()?;
    let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
    (f.fract() == 0.0 && in_range).then_some(f as i32)
}

fn timestamp_at(obj: Option<&Object>, key: &str) -> Option<DateTime<Utc>> {
    value_at(obj, key).and_then(epoch_to_utc)
}

/// Coerce epoch seconds (integer, float or numeric string) to UTC.
fn epoch_to_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => DateTime::from_timestamp(secs, 0),
            None => fractional_epoch(n.as_f64()?),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(secs) => DateTime::from_timestamp(secs, 0),
                Err(_) => fractional_epoch(s.parse::<f64>().ok()?),
            }
        }
        _ => None,
    }
}

fn fractional_epoch(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }

    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);

    DateTime::from_timestamp(whole as i64, nanos)
}
