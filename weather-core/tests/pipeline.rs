mod common;

use axum::http::StatusCode;
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde_json::json;
use sqlx::{Connection, Row, SqliteConnection, sqlite::SqliteConnectOptions, sqlite::SqliteRow};
use std::path::Path;
use weather_etl_core::{PipelineError, RunOutcome, pipeline};

use common::{MockApi, city_config, coordinate_config, init_logging, new_york};

async fn stored_rows(path: &Path) -> Vec<SqliteRow> {
    let mut conn = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(path))
        .await
        .unwrap();
    sqlx::query("SELECT * FROM weather_data ORDER BY id")
        .fetch_all(&mut conn)
        .await
        .unwrap()
}

fn naive(secs: i64) -> NaiveDateTime {
    Utc.timestamp_opt(secs, 0).unwrap().naive_utc()
}

#[tokio::test]
async fn new_york_by_coordinates_end_to_end() {
    init_logging();
    let api = MockApi::spawn(StatusCode::OK, new_york()).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");

    let outcome = pipeline::run(&coordinate_config(&api.base_url, &db))
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Loaded(1));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let query = &requests[0];
    assert_eq!(query.get("lat").map(String::as_str), Some("40.7"));
    assert_eq!(query.get("lon").map(String::as_str), Some("-74"));
    assert_eq!(query.get("appid").map(String::as_str), Some("TEST_KEY"));
    assert_eq!(query.get("units").map(String::as_str), Some("metric"));
    assert!(!query.contains_key("q"));

    let rows = stored_rows(&db).await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];

    assert_eq!(row.get::<Option<String>, _>("city").as_deref(), Some("New York"));
    assert_eq!(row.get::<Option<String>, _>("country").as_deref(), Some("US"));
    assert_eq!(row.get::<Option<String>, _>("weather_main").as_deref(), Some("Clouds"));
    assert_eq!(
        row.get::<Option<String>, _>("weather_description").as_deref(),
        Some("overcast clouds")
    );
    assert_eq!(row.get::<Option<f64>, _>("temp"), Some(15.2));
    assert_eq!(row.get::<Option<f64>, _>("feels_like"), Some(14.8));
    assert_eq!(row.get::<Option<i32>, _>("pressure"), Some(1012));
    assert_eq!(row.get::<Option<i32>, _>("humidity"), Some(55));
    assert_eq!(row.get::<Option<f64>, _>("wind_speed"), Some(3.1));
    assert_eq!(row.get::<Option<i32>, _>("wind_deg"), Some(200));
    assert_eq!(row.get::<Option<i32>, _>("clouds_all"), Some(90));

    let date = row.get::<Option<NaiveDateTime>, _>("date").unwrap();
    assert_eq!(date.to_string(), "2023-11-15 01:00:00");
    assert_eq!(row.get::<Option<NaiveDateTime>, _>("sunrise"), Some(naive(1_700_000_000)));
    assert_eq!(row.get::<Option<NaiveDateTime>, _>("sunset"), Some(naive(1_700_040_000)));
}

#[tokio::test]
async fn city_name_lookup_uses_q() {
    init_logging();
    let api = MockApi::spawn(StatusCode::OK, new_york()).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");

    pipeline::run(&city_config(&api.base_url, &db)).await.unwrap();

    let query = &api.requests()[0];
    assert_eq!(query.get("q").map(String::as_str), Some("New York"));
    assert!(!query.contains_key("lat"));
    assert!(!query.contains_key("lon"));
}

#[tokio::test]
async fn repeated_runs_append_duplicate_rows() {
    init_logging();
    let api = MockApi::spawn(StatusCode::OK, new_york()).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");
    let config = coordinate_config(&api.base_url, &db);

    pipeline::run(&config).await.unwrap();
    pipeline::run(&config).await.unwrap();

    let rows = stored_rows(&db).await;
    let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
    assert_eq!(ids, [1, 2]);
}

#[tokio::test]
async fn http_error_means_no_data_and_no_database_access() {
    init_logging();
    let api = MockApi::spawn(
        StatusCode::UNAUTHORIZED,
        json!({"cod": 401, "message": "Invalid API key"}),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");

    let err = pipeline::run(&coordinate_config(&api.base_url, &db))
        .await
        .unwrap_err();

    let msg = match err {
        PipelineError::NoData(source) => source.to_string(),
        other => panic!("expected a fetch failure, got {other:?}"),
    };
    assert!(msg.contains("401"));
    assert!(msg.contains("Invalid API key"));
    assert!(!db.exists());
}

#[tokio::test]
async fn empty_body_means_nothing_to_load() {
    init_logging();
    let api = MockApi::spawn(StatusCode::OK, json!({})).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");

    let outcome = pipeline::run(&coordinate_config(&api.base_url, &db))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NothingToLoad);
    assert!(!db.exists());
}

#[tokio::test]
async fn missing_wind_is_loaded_as_null() {
    init_logging();
    let mut body = new_york();
    body.as_object_mut().unwrap().remove("wind");
    let api = MockApi::spawn(StatusCode::OK, body).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather.db");

    pipeline::run(&coordinate_config(&api.base_url, &db))
        .await
        .unwrap();

    let rows = stored_rows(&db).await;
    assert_eq!(rows[0].get::<Option<f64>, _>("wind_speed"), None);
    assert_eq!(rows[0].get::<Option<i32>, _>("wind_deg"), None);
}

#[tokio::test]
async fn database_failure_is_reported_as_load_error() {
    init_logging();
    let api = MockApi::spawn(StatusCode::OK, new_york()).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("missing-dir").join("weather.db");

    let err = pipeline::run(&coordinate_config(&api.base_url, &db))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Load(_)));
}
