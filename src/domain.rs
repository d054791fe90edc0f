//! ==============================================================================
//! domain.rs - readings, time series and the shared application state
//! ==============================================================================
//!
//! purpose:
//!     the data model shared by the poller, the store, persistence and the
//!     web server. wire names follow the sensor endpoint payload and the
//!     persisted snapshot layout, so they are pinned with serde renames.
//!
//! ==============================================================================

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;

/// number of points each series keeps unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 24;

/// one sensor/weather snapshot as served by the remote endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// temperature in celsius
    pub temperature_celsius: f64,
    /// relative humidity (0-100%)
    pub humidity_percent: f64,
    /// pressure in hPa (optional, not every station reports it)
    #[serde(rename = "pressure_hPa", default, skip_serializing_if = "Option::is_none")]
    pub pressure_hpa: Option<f64>,
    /// wind speed in km/h (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
    /// ISO-8601 timestamp assigned by the station
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Reading {
    /// value of a single metric, `None` when the station did not report it
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => Some(self.temperature_celsius),
            Metric::Humidity => Some(self.humidity_percent),
            Metric::Pressure => self.pressure_hpa,
            Metric::WindSpeed => self.wind_speed_kmh,
        }
    }
}

/// the four tracked metrics, one time series each
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Pressure,
        Metric::WindSpeed,
    ];

    /// path segment used by the api (`/api/series/wind_speed`)
    pub fn slug(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::WindSpeed => "wind_speed",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.slug() == slug)
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Pressure => "hPa",
            Metric::WindSpeed => "km/h",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// a single chart point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub time: String,
    pub value: f64,
}

// ==============================================================================
// time series - fixed capacity, fifo eviction
// ==============================================================================
// points are kept in arrival order. once the series is full every push drops
// exactly one point from the front. nothing is evicted by age.

#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    points: VecDeque<DataPoint>,
    capacity: usize,
}

impl TimeSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// append a point, evicting the oldest one if the series overflows
    pub fn push(&mut self, point: DataPoint) {
        self.points.push_back(point);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// change the capacity, keeping the most recent points
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

// the persisted layout is a bare array of points; capacity is runtime config
impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.points)
    }
}

impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<DataPoint>::deserialize(deserializer)?;
        let mut series = TimeSeries::with_capacity(DEFAULT_CAPACITY.max(points.len()));
        for point in points {
            series.push(point);
        }
        Ok(series)
    }
}

// ==============================================================================
// application state
// ==============================================================================
// owned by the store. consumers only ever see clones (snapshots).
// missing fields in a persisted snapshot fall back to the initial values.

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationState {
    #[serde(rename = "currentData")]
    pub current_reading: Option<Reading>,
    #[serde(rename = "temperatureData")]
    pub temperature: TimeSeries,
    #[serde(rename = "humidityData")]
    pub humidity: TimeSeries,
    #[serde(rename = "pressureData")]
    pub pressure: TimeSeries,
    #[serde(rename = "windSpeedData")]
    pub wind_speed: TimeSeries,
    pub loading: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

impl ApplicationState {
    /// the empty, still-loading state every session starts from
    pub fn initial(capacity: usize) -> Self {
        Self {
            current_reading: None,
            temperature: TimeSeries::with_capacity(capacity),
            humidity: TimeSeries::with_capacity(capacity),
            pressure: TimeSeries::with_capacity(capacity),
            wind_speed: TimeSeries::with_capacity(capacity),
            loading: true,
            last_updated: String::new(),
        }
    }

    pub fn series(&self, metric: Metric) -> &TimeSeries {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::Pressure => &self.pressure,
            Metric::WindSpeed => &self.wind_speed,
        }
    }

    pub fn series_mut(&mut self, metric: Metric) -> &mut TimeSeries {
        match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::Pressure => &mut self.pressure,
            Metric::WindSpeed => &mut self.wind_speed,
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        for metric in Metric::ALL {
            self.series_mut(metric).set_capacity(capacity);
        }
    }
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::initial(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: f64) -> DataPoint {
        DataPoint { time: format!("t{value}"), value }
    }

    #[test]
    fn series_evicts_oldest_once_full() {
        let mut series = TimeSeries::with_capacity(3);
        for v in 1..=5 {
            series.push(point(v as f64));
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn shrinking_capacity_keeps_newest_points() {
        let mut series = TimeSeries::with_capacity(10);
        for v in 1..=6 {
            series.push(point(v as f64));
        }
        series.set_capacity(2);
        assert_eq!(series.values(), vec![5.0, 6.0]);
    }

    #[test]
    fn reading_parses_endpoint_payload() {
        let json = r#"{
            "temperature_celsius": 21.5,
            "humidity_percent": 48.0,
            "pressure_hPa": 1012.3,
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.value(Metric::Temperature), Some(21.5));
        assert_eq!(reading.value(Metric::Pressure), Some(1012.3));
        assert_eq!(reading.value(Metric::WindSpeed), None);
    }

    #[test]
    fn state_uses_persisted_field_names() {
        let state = ApplicationState::default();
        let json = serde_json::to_value(&state).unwrap();
        for key in [
            "currentData",
            "temperatureData",
            "humidityData",
            "pressureData",
            "windSpeedData",
            "loading",
            "lastUpdated",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["temperatureData"].is_array());
    }

    #[test]
    fn partial_snapshot_fills_missing_fields() {
        let state: ApplicationState =
            serde_json::from_str(r#"{"lastUpdated": "yesterday"}"#).unwrap();
        assert_eq!(state.last_updated, "yesterday");
        assert!(state.loading);
        assert!(state.temperature.is_empty());
    }

    #[test]
    fn metric_slugs_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_slug(metric.slug()), Some(metric));
        }
        assert_eq!(Metric::from_slug("uv_index"), None);
    }
}
