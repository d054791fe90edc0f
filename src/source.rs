//! ==============================================================================
//! source.rs - where readings come from
//! ==============================================================================
//!
//! purpose:
//!     abstracts the remote weather endpoint so the poller does not care
//!     whether it talks to a real station or to the simulator.
//!     - HttpSource: plain GET against the configured url, json body
//!     - SimulatedSource: plausible made-up readings for offline demos
//!
//! relationships:
//!     - used by: poller.rs (one fetch per timer tick)
//!     - produces: domain::Reading
//!
//! ==============================================================================

use crate::domain::Reading;

use chrono::{Timelike, Utc};
use rand::Rng;
use std::future::Future;
use thiserror::Error;

/// the recoverable fetch failures. none of them are fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

pub trait ReadingSource: Send + Sync + 'static {
    /// fetch one fresh reading
    fn fetch(&self) -> impl Future<Output = Result<Reading, FetchError>> + Send;

    /// short name for log lines
    fn describe(&self) -> String;
}

// ==============================================================================
// http source
// ==============================================================================
// no auth, no query parameters, no timeout. a hung request is simply
// superseded by the next tick's request.

pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl ReadingSource for HttpSource {
    fn fetch(&self) -> impl Future<Output = Result<Reading, FetchError>> + Send {
        async move {
            let response = self.client.get(&self.url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.bytes().await?;
            Ok(serde_json::from_slice::<Reading>(&body)?)
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ==============================================================================
// simulated source
// ==============================================================================
// temperature follows a daily curve peaking mid-afternoon, everything else
// wanders inside a realistic band.

#[derive(Default)]
pub struct SimulatedSource;

impl SimulatedSource {
    pub fn new() -> Self {
        Self
    }

    fn generate(&self) -> Reading {
        let now = Utc::now();
        let mut rng = rand::rng();

        let hour = now.hour() as f64 + now.minute() as f64 / 60.0;
        let curve = ((hour - 9.0) / 24.0 * std::f64::consts::TAU).sin();
        let temperature = 18.0 + 6.0 * curve + rng.random_range(-0.5..0.5);

        Reading {
            temperature_celsius: round1(temperature),
            humidity_percent: round1(rng.random_range(50.0..80.0)),
            pressure_hpa: Some(round1(1013.0 + rng.random_range(-5.0..5.0))),
            wind_speed_kmh: Some(round1(rng.random_range(0.0..30.0))),
            timestamp: Some(now.to_rfc3339()),
        }
    }
}

impl ReadingSource for SimulatedSource {
    fn fetch(&self) -> impl Future<Output = Result<Reading, FetchError>> + Send {
        std::future::ready(Ok(self.generate()))
    }

    fn describe(&self) -> String {
        "simulator".to_string()
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
