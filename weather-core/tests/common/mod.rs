#![allow(dead_code)]

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};
use weather_etl_core::Config;

pub const WEATHER_PATH: &str = "/data/2.5/weather";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sample current-weather body for New York.
pub fn new_york() -> Value {
    json!({
        "name": "New York",
        "sys": {"country": "US", "sunrise": 1700000000, "sunset": 1700040000},
        "main": {
            "temp": 15.2,
            "feels_like": 14.8,
            "temp_min": 13.0,
            "temp_max": 17.0,
            "pressure": 1012,
            "humidity": 55
        },
        "weather": [{"main": "Clouds", "description": "overcast clouds"}],
        "wind": {"speed": 3.1, "deg": 200},
        "clouds": {"all": 90},
        "dt": 1700010000
    })
}

/// Local stand-in for the weather endpoint. Records every query it sees.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockApi {
    pub async fn spawn(status: StatusCode, body: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        let app = Router::new().route(
            WEATHER_PATH,
            get(move |Query(params): Query<HashMap<String, String>>| {
                let seen = seen.clone();
                let body = body.clone();
                async move {
                    seen.lock().unwrap().push(params);
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}{WEATHER_PATH}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn coordinate_config(base_url: &str, db: &Path) -> Config {
    Config::from_yaml(&format!(
        r#"
api:
  base_url: {base_url}
  key: TEST_KEY
  city: Ignored
  lat: 40.7
  lon: -74.0
database:
  url: sqlite://{}
"#,
        db.display()
    ))
    .unwrap()
}

pub fn city_config(base_url: &str, db: &Path) -> Config {
    Config::from_yaml(&format!(
        r#"
api:
  base_url: {base_url}
  key: TEST_KEY
  city: New York
database:
  url: sqlite://{}
"#,
        db.display()
    ))
    .unwrap()
}
