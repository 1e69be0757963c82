//! HTTP-level tests for the GIOŚ client and the offline fallback.

use std::time::Duration;

use airq_core::{
    Error, GiosClient, Provenance, RemoteError, RemoteSource, ResilienceController,
    SourceZone, SqliteRepository,
};
use time::OffsetDateTime;
use time::macros::{datetime, format_description};

const TIMEOUT: Duration = Duration::from_secs(5);

fn client(server: &mockito::Server) -> GiosClient {
    GiosClient::new(&server.url(), TIMEOUT).unwrap()
}

/// A v1 series body with hourly readings ending at the current Warsaw hour.
fn recent_series_body(hours: i64) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let now = SourceZone::WARSAW
        .localize(OffsetDateTime::now_utc())
        .replace_minute(0)
        .unwrap()
        .replace_second(0)
        .unwrap()
        .replace_nanosecond(0)
        .unwrap();
    let rows: Vec<serde_json::Value> = (0..hours)
        .map(|i| {
            let ts = now - time::Duration::hours(i);
            serde_json::json!({
                "Kod stanowiska": "MpKrakAlKras-PM10-1g",
                "Data": ts.format(&fmt).unwrap(),
                "Wartość": 30.0 + i as f64
            })
        })
        .collect();
    serde_json::json!({ "Lista danych pomiarowych": rows }).to_string()
}

#[tokio::test]
async fn test_series_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/data/getData/92")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"key":"NO2","values":[
                {"date":"2024-03-01 11:00:00","value":null},
                {"date":"2024-03-01 10:00:00","value":21.5}
            ]}"#,
        )
        .create_async()
        .await;

    let samples = client(&server).fetch_series(92).await.unwrap();
    mock.assert_async().await;

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].timestamp, datetime!(2024-03-01 09:00 UTC));
    assert_eq!(samples[0].value, Some(21.5));
    assert_eq!(samples[1].value, None);
}

#[tokio::test]
async fn test_station_list() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/station/findAll")
        .with_status(200)
        .with_body(
            r#"[{"id":14,"stationName":"Działoszyn","gegrLat":"50.972167","gegrLon":"14.941319",
                "city":{"id":192,"name":"Działoszyn","commune":{"communeName":"Bogatynia",
                "districtName":"zgorzelecki","provinceName":"DOLNOŚLĄSKIE"}},
                "addressStreet":null}]"#,
        )
        .create_async()
        .await;

    let stations = client(&server).stations().await.unwrap();
    assert_eq!(stations.len(), 1);
    assert!(stations[0].in_city("działoszyn"));
}

#[tokio::test]
async fn test_server_error_is_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/data/getData/92")
        .with_status(500)
        .create_async()
        .await;

    let err = client(&server).series(92).await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_invalid_json_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/data/getData/92")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server).series(92).await.unwrap_err();
    assert!(matches!(err, RemoteError::Malformed { .. }));
}

#[tokio::test]
async fn test_unexpected_shape_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/aqindex/getIndex/52")
        .with_status(200)
        .with_body(r#"{"error":"unknown station"}"#)
        .create_async()
        .await;

    let err = client(&server).index(52).await.unwrap_err();
    assert!(matches!(err, RemoteError::Malformed { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_not_reachable() {
    let client = GiosClient::new("http://127.0.0.1:1", TIMEOUT).unwrap();
    let err = client.series(92).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotReachable { .. }));
}

#[tokio::test]
async fn test_controller_falls_back_when_server_fails() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/data/getData/16784")
        .with_status(200)
        .with_body(recent_series_body(4))
        .create_async()
        .await;

    let controller =
        ResilienceController::new(client(&server), SqliteRepository::in_memory().unwrap());

    let live = controller.current_series(16784).await.unwrap();
    assert_eq!(live.provenance, Provenance::Live);
    assert_eq!(live.data.len(), 4);

    ok.remove_async().await;
    server
        .mock("GET", "/data/getData/16784")
        .with_status(503)
        .create_async()
        .await;

    let cached = controller.current_series(16784).await.unwrap();
    assert_eq!(cached.provenance, Provenance::Cached);
    assert_eq!(cached.data, live.data);

    let err = controller.current_series(1).await.unwrap_err();
    assert!(matches!(err, Error::NoDataAvailable { .. }));
}
