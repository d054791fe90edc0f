//! ==============================================================================
//! store.rs - rolling history store
//! ==============================================================================
//!
//! purpose:
//!     owns the application state. every successful fetch lands here as a
//!     single `apply`, which replaces the current reading and appends one
//!     point per reported metric to its bounded series.
//!
//! relationships:
//!     - used by: poller.rs (writes), server.rs (reads snapshots)
//!     - uses: domain.rs (state, series)
//!     - hydrated from: persistence.rs at startup
//!
//! ordering:
//!     fetches may overlap. by default the last response to ARRIVE wins, even
//!     if it was requested earlier. `ResponseOrdering::LatestRequest` instead
//!     drops any response older than the one already applied.
//!
//! ==============================================================================

use crate::domain::{ApplicationState, DataPoint, Metric, Reading};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

const TIME_OF_DAY: &str = "%H:%M:%S";
const LAST_UPDATED: &str = "%Y-%m-%d %H:%M:%S";

/// how overlapping responses are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// last-arriving response is authoritative
    #[default]
    LastArrival,
    /// responses older than the applied one are discarded
    LatestRequest,
}

struct Inner {
    state: ApplicationState,
    /// sequence number of the request whose response is currently applied
    applied_seq: Option<u64>,
}

/// clone-able handle to the shared state
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<RwLock<Inner>>,
    ordering: ResponseOrdering,
}

impl HistoryStore {
    pub fn new(capacity: usize, ordering: ResponseOrdering) -> Self {
        Self::hydrate(ApplicationState::initial(capacity), capacity, ordering)
    }

    /// start from a previously persisted state.
    /// the state stays `loading` until a live fetch succeeds.
    pub fn hydrate(mut state: ApplicationState, capacity: usize, ordering: ResponseOrdering) -> Self {
        state.set_capacity(capacity);
        state.loading = true;
        Self {
            inner: Arc::new(RwLock::new(Inner { state, applied_seq: None })),
            ordering,
        }
    }

    /// read-only copy for consumers
    pub async fn snapshot(&self) -> ApplicationState {
        self.inner.read().await.state.clone()
    }

    /// apply a reading as the newest response, with nothing to run afterwards
    #[cfg(test)]
    pub(crate) async fn apply(&self, reading: Reading, received_at: DateTime<Local>) {
        let next = self.inner.read().await.applied_seq.map_or(1, |applied| applied + 1);
        self.apply_sequenced(next, reading, received_at, |_| {}).await;
    }

    /// apply the response to request `seq`.
    ///
    /// `after` runs with the updated state while the write lock is still held,
    /// so whatever it persists is exactly the state that was applied.
    /// returns false if the response was discarded as stale.
    pub async fn apply_sequenced<F>(
        &self,
        seq: u64,
        reading: Reading,
        received_at: DateTime<Local>,
        after: F,
    ) -> bool
    where
        F: FnOnce(&ApplicationState),
    {
        let mut inner = self.inner.write().await;

        if self.ordering == ResponseOrdering::LatestRequest {
            if let Some(applied) = inner.applied_seq {
                if seq < applied {
                    tracing::debug!("[STORE] Discarding stale response #{} (applied #{})", seq, applied);
                    return false;
                }
            }
        }

        update(&mut inner.state, reading, received_at);
        inner.applied_seq = Some(inner.applied_seq.map_or(seq, |applied| applied.max(seq)));
        after(&inner.state);
        true
    }
}

fn update(state: &mut ApplicationState, reading: Reading, received_at: DateTime<Local>) {
    let time = point_time(&reading, received_at);

    for metric in Metric::ALL {
        if let Some(value) = reading.value(metric) {
            state.series_mut(metric).push(DataPoint { time: time.clone(), value });
        }
    }

    state.current_reading = Some(reading);
    state.loading = false;
    state.last_updated = received_at.format(LAST_UPDATED).to_string();
}

/// local time-of-day label for a reading.
/// falls back to the arrival time when the station sent no usable timestamp.
pub fn point_time(reading: &Reading, received_at: DateTime<Local>) -> String {
    reading
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(received_at)
        .format(TIME_OF_DAY)
        .to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    // zone-less timestamps are taken as utc
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().with_timezone(&Local))
        .or_else(|| raw.parse::<DateTime<Utc>>().ok().map(|dt| dt.with_timezone(&Local)))
}
