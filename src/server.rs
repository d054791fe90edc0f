//! ==============================================================================
//! server.rs - read-only dashboard api
//! ==============================================================================
//!
//! purpose:
//!     exposes the store to presentation consumers. every handler works on a
//!     snapshot; nothing here can mutate state.
//!
//! routes:
//!     GET /                     -> small html status page
//!     GET /api                  -> full application state (json)
//!     GET /api/current          -> latest reading or null
//!     GET /api/series/:metric   -> one series (temperature|humidity|pressure|wind_speed)
//!     GET /api/forecast         -> simulated seven day forecast
//!     GET /api/history/:period  -> simulated summary (week|month|year)
//!
//! ==============================================================================

use crate::domain::{ApplicationState, Metric, Reading, TimeSeries};
use crate::outlook::{self, ForecastDay, HistoryEntry, Period};
use crate::store::HistoryStore;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use chrono::Local;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

pub fn router(store: HistoryStore) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api", get(api_handler))
        .route("/api/current", get(current_handler))
        .route("/api/series/:metric", get(series_handler))
        .route("/api/forecast", get(forecast_handler))
        .route("/api/history/:period", get(history_handler))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn run_server(bind: &str, store: HistoryStore, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("[SERVER] ✓ Dashboard live at http://{}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// json api endpoint for programmatic access
async fn api_handler(State(store): State<HistoryStore>) -> Json<ApplicationState> {
    Json(store.snapshot().await)
}

async fn current_handler(State(store): State<HistoryStore>) -> Json<Option<Reading>> {
    Json(store.snapshot().await.current_reading)
}

async fn series_handler(
    State(store): State<HistoryStore>,
    Path(metric): Path<String>,
) -> Result<Json<TimeSeries>, StatusCode> {
    let metric = Metric::from_slug(&metric).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(store.snapshot().await.series(metric).clone()))
}

async fn forecast_handler() -> Json<Vec<ForecastDay>> {
    Json(outlook::forecast(Local::now().date_naive()))
}

async fn history_handler(Path(period): Path<String>) -> Result<Json<Vec<HistoryEntry>>, StatusCode> {
    let period = Period::from_slug(&period).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(outlook::history(period)))
}

async fn dashboard_handler(State(store): State<HistoryStore>) -> Html<String> {
    Html(render_dashboard(&store.snapshot().await))
}

fn render_dashboard(state: &ApplicationState) -> String {
    let mut cards = String::new();
    for metric in Metric::ALL {
        let value = if state.loading {
            "…".to_string()
        } else {
            state
                .current_reading
                .as_ref()
                .and_then(|r| r.value(metric))
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "--".to_string())
        };
        cards.push_str(&format!(
            r#"<div class="card"><h2>{}</h2><p>{} {}</p><small>{} points</small></div>"#,
            metric,
            value,
            metric.unit(),
            state.series(metric).len()
        ));
    }

    let updated = if state.last_updated.is_empty() { "never" } else { state.last_updated.as_str() };

    format!(
        r#"<!doctype html>
<html>
<head><title>weather station</title><meta http-equiv="refresh" content="10"></head>
<body style="font-family: system-ui; padding: 2rem; background: #1a1a2e; color: #eee;">
    <h1>Real-time sensor data</h1>
    <p style="color: #888;">Last updated: {}</p>
    <div style="display: flex; gap: 1rem;">{}</div>
</body>
</html>"#,
        html_escape(updated),
        cards
    )
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResponseOrdering;

    async fn store_with_reading() -> HistoryStore {
        let store = HistoryStore::new(24, ResponseOrdering::LastArrival);
        store
            .apply(
                Reading {
                    temperature_celsius: 22.4,
                    humidity_percent: 40.0,
                    pressure_hpa: None,
                    wind_speed_kmh: Some(7.0),
                    timestamp: None,
                },
                Local::now(),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn series_endpoint_returns_points() {
        let store = store_with_reading().await;
        let Json(series) = series_handler(State(store), Path("wind_speed".into())).await.unwrap();
        assert_eq!(series.values(), vec![7.0]);
    }

    #[tokio::test]
    async fn unknown_metric_is_not_found() {
        let store = store_with_reading().await;
        let err = series_handler(State(store), Path("uv_index".into())).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn forecast_endpoint_returns_a_week() {
        let Json(days) = forecast_handler().await;
        assert_eq!(days.len(), outlook::FORECAST_DAYS);
    }

    #[tokio::test]
    async fn history_endpoint_serves_known_periods_only() {
        let Json(year) = history_handler(Path("year".into())).await.unwrap();
        assert_eq!(year.len(), 12);
        assert_eq!(year[0].date, "Month 1");

        let err = history_handler(Path("decade".into())).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn current_is_null_before_first_fetch() {
        let store = HistoryStore::new(24, ResponseOrdering::LastArrival);
        let Json(current) = current_handler(State(store)).await;
        assert!(current.is_none());
    }

    #[tokio::test]
    async fn dashboard_shows_values_and_placeholders() {
        let html = render_dashboard(&store_with_reading().await.snapshot().await);
        assert!(html.contains("22.4 °C"));
        assert!(html.contains("-- hPa"));
        assert!(!html.contains("Last updated: never"));
    }

    #[test]
    fn loading_dashboard_hides_values() {
        let html = render_dashboard(&ApplicationState::initial(24));
        assert!(html.contains("Last updated: never"));
        assert!(html.contains("… °C"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
