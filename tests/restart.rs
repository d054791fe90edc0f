//! end to end: poll a mock endpoint, stop, start again from the saved file.

use mockito::Server;
use std::sync::Arc;
use weather_station::persistence::{FileStorage, StatePersistence};
use weather_station::poller::Poller;
use weather_station::source::HttpSource;
use weather_station::store::{HistoryStore, ResponseOrdering};

fn persistence(dir: &std::path::Path) -> StatePersistence {
    StatePersistence::new(Arc::new(FileStorage::new(dir)), "sensorData")
}

#[tokio::test]
async fn history_survives_a_restart() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/weather")
        .with_status(200)
        .with_body(r#"{"temperature_celsius": 20.5, "humidity_percent": 45.0, "wind_speed_kmh": 3.0}"#)
        .expect(3)
        .create_async()
        .await;
    let url = format!("{}/weather", server.url());
    let dir = tempfile::tempdir().unwrap();

    // first session
    let store = HistoryStore::new(24, ResponseOrdering::LastArrival);
    let poller = Poller::new(HttpSource::new(url.clone()), store.clone(), persistence(dir.path()));
    for _ in 0..3 {
        assert!(poller.poll_once().await.unwrap());
    }

    // second session: rehydrated, still loading, history intact
    let restored = persistence(dir.path()).load(24);
    let store = HistoryStore::hydrate(restored, 24, ResponseOrdering::LastArrival);
    let state = store.snapshot().await;
    assert!(state.loading);
    assert_eq!(state.temperature.values(), vec![20.5; 3]);
    assert_eq!(state.wind_speed.len(), 3);
    assert!(state.pressure.is_empty());

    // a failing endpoint keeps the rehydrated state as it was
    let broken = Poller::new(HttpSource::new("http://127.0.0.1:9/weather"), store.clone(), persistence(dir.path()));
    assert!(broken.poll_once().await.is_err());
    assert_eq!(store.snapshot().await, state);
}

#[tokio::test]
async fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sensorData.json"), r#"{"currentData": {"temperature_cel"#).unwrap();

    let state = persistence(dir.path()).load(24);
    assert!(state.current_reading.is_none());
    assert!(state.temperature.is_empty());
    assert!(state.loading);
}
