//! ==============================================================================
//! poller.rs - periodic fetch loop
//! ==============================================================================
//!
//! purpose:
//!     fires one fetch immediately, then one per interval. every tick runs its
//!     own task, so a slow response does not hold back the next request and
//!     two fetches can be in flight at once. responses are applied to the store
//!     in the order they arrive (see store.rs for the optional sequencing).
//!
//! failure handling:
//!     transport errors, bad statuses and malformed bodies are logged and
//!     otherwise ignored. state is only touched on success. no retry, no
//!     backoff, no timeout.
//!
//! teardown:
//!     `PollerHandle::shutdown` cancels the timer and every in-flight fetch.
//!     nothing is applied after shutdown returns.
//!
//! ==============================================================================

use crate::domain::Reading;
use crate::persistence::StatePersistence;
use crate::source::{FetchError, ReadingSource};
use crate::store::HistoryStore;

use chrono::Local;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct Poller<S> {
    source: Arc<S>,
    store: HistoryStore,
    persistence: StatePersistence,
    next_seq: Arc<AtomicU64>,
    show_data: bool,
}

// manual impl: `S` itself does not need to be Clone
impl<S> Clone for Poller<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            store: self.store.clone(),
            persistence: self.persistence.clone(),
            next_seq: self.next_seq.clone(),
            show_data: self.show_data,
        }
    }
}

impl<S: ReadingSource> Poller<S> {
    pub fn new(source: S, store: HistoryStore, persistence: StatePersistence) -> Self {
        Self {
            source: Arc::new(source),
            store,
            persistence,
            next_seq: Arc::new(AtomicU64::new(0)),
            show_data: false,
        }
    }

    /// log every applied reading at info level
    pub fn show_data(mut self, show: bool) -> Self {
        self.show_data = show;
        self
    }

    /// one fetch cycle.
    ///
    /// returns `Ok(true)` if the reading was applied and saved, `Ok(false)` if
    /// the store discarded it as stale, and the fetch error otherwise.
    pub async fn poll_once(&self) -> Result<bool, FetchError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!("[POLL] ⚠ Fetch #{} from {} failed: {}", seq, self.source.describe(), e);
                return Err(e);
            }
        };

        if self.show_data {
            log_reading(&reading);
        }

        let persistence = &self.persistence;
        let applied = self
            .store
            .apply_sequenced(seq, reading, Local::now(), |state| {
                if let Err(e) = persistence.save(state) {
                    tracing::warn!("[STORAGE] ⚠ Could not save state: {}", e);
                }
            })
            .await;

        Ok(applied)
    }

    /// start polling: one fetch now, then one per `interval`
    pub fn spawn(self, interval: Duration) -> PollerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let fetches = TaskTracker::new();
        let loop_fetches = fetches.clone();

        tracing::info!(
            "[POLL] Starting polling of {} ({}s interval)",
            self.source.describe(),
            interval.as_secs_f64()
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let poller = self.clone();
                        let fetch_token = loop_token.clone();
                        loop_fetches.spawn(async move {
                            tokio::select! {
                                biased;
                                _ = fetch_token.cancelled() => {}
                                _ = poller.poll_once() => {}
                            }
                        });
                    }
                }
            }

            tracing::info!("[POLL] Polling stopped");
        });

        PollerHandle { token, task, fetches }
    }
}

/// cancellation handle for a running poller
pub struct PollerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    fetches: TaskTracker,
}

impl PollerHandle {
    /// stop the timer and drop in-flight fetches.
    /// returns once every fetch task has finished.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("[POLL] Poll loop ended abnormally: {}", e);
        }

        // the loop is gone, so no new fetch can be tracked past this point
        self.fetches.close();
        self.fetches.wait().await;
    }
}

fn log_reading(r: &Reading) {
    let pressure = r.pressure_hpa.map(|p| format!("{p:.1} hPa")).unwrap_or_else(|| "--".into());
    let wind = r.wind_speed_kmh.map(|w| format!("{w:.1} km/h")).unwrap_or_else(|| "--".into());
    tracing::info!(
        "[POLL] Temp: {:.1}°C | Humidity: {:.1}% | Pressure: {} | Wind: {}",
        r.temperature_celsius,
        r.humidity_percent,
        pressure,
        wind
    );
}
