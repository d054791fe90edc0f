//! ==============================================================================
//! outlook.rs - simulated forecast and historical summaries
//! ==============================================================================
//!
//! purpose:
//!     the sensor endpoint only reports the present. the dashboard also shows a
//!     seven day forecast and week/month/year history, which are generated here
//!     the same way `SimulatedSource` generates readings.
//!     - forecast: one entry per day starting today. temperature follows a
//!       curve that peaks at both ends of the week, the middle days are more
//!       likely to be wet, precipitation chance follows the condition
//!     - history: fixed-length summaries per period with banded values
//!
//! relationships:
//!     - used by: server.rs (/api/forecast, /api/history/:period)
//!
//! ==============================================================================

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
pub const FORECAST_DAYS: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
}

impl Condition {
    /// precipitation chance in percent, drawn from the band for this condition
    fn precipitation<R: Rng + ?Sized>(self, rng: &mut R) -> u8 {
        match self {
            Condition::Sunny => rng.random_range(0..10),
            Condition::PartlyCloudy => rng.random_range(10..30),
            Condition::Cloudy => rng.random_range(30..60),
            Condition::Rainy => rng.random_range(60..100),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastDay {
    pub day: String,
    pub temperature: i32,
    pub condition: Condition,
    pub precipitation: u8,
}

// ==============================================================================
// forecast
// ==============================================================================

pub fn forecast(today: NaiveDate) -> Vec<ForecastDay> {
    forecast_with(today, &mut rand::rng())
}

pub fn forecast_with<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<ForecastDay> {
    let base = rng.random_range(15i32..25) as f64;

    today
        .iter_days()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(i, date)| {
            let offset = i as i32 - 3;
            let curve = (offset as f64 * 0.5).cos() * 5.0;
            let temperature = (base + curve + rng.random_range(-2.0..2.0)).round() as i32;

            let condition = pick_condition(offset.abs() <= 1, rng.random_range(0.0..1.0));

            ForecastDay {
                day: DAY_NAMES[date.weekday().num_days_from_sunday() as usize].to_string(),
                temperature,
                condition,
                precipitation: condition.precipitation(&mut *rng),
            }
        })
        .collect()
}

/// mid-week: 40% rain, 30% cloud, 20% partly cloudy, 10% sun.
/// otherwise: 10% rain, 20% cloud, 30% partly cloudy, 40% sun.
fn pick_condition(mid_week: bool, chance: f64) -> Condition {
    let [rainy, cloudy, partly] = if mid_week { [0.4, 0.7, 0.9] } else { [0.1, 0.3, 0.6] };
    if chance < rainy {
        Condition::Rainy
    } else if chance < cloudy {
        Condition::Cloudy
    } else if chance < partly {
        Condition::PartlyCloudy
    } else {
        Condition::Sunny
    }
}

// ==============================================================================
// history
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    /// number of entries in a summary
    pub fn entries(self) -> usize {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 12,
        }
    }

    /// (temperature, humidity) ranges, lower bound inclusive
    fn bands(self) -> (std::ops::Range<i32>, std::ops::Range<i32>) {
        match self {
            Period::Week => (15..25, 50..80),
            Period::Month => (10..25, 40..80),
            Period::Year => (5..25, 30..80),
        }
    }

    fn label(self, index: usize) -> String {
        match self {
            Period::Year => format!("Month {}", index + 1),
            _ => format!("Day {}", index + 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub date: String,
    pub temperature: i32,
    pub humidity: i32,
}

pub fn history(period: Period) -> Vec<HistoryEntry> {
    history_with(period, &mut rand::rng())
}

pub fn history_with<R: Rng + ?Sized>(period: Period, rng: &mut R) -> Vec<HistoryEntry> {
    let (temperature, humidity) = period.bands();
    (0..period.entries())
        .map(|i| HistoryEntry {
            date: period.label(i),
            temperature: rng.random_range(temperature.clone()),
            humidity: rng.random_range(humidity.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn may_first() -> NaiveDate {
        // a wednesday
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn forecast_covers_a_week_from_today() {
        let days = forecast(may_first());
        assert_eq!(days.len(), FORECAST_DAYS);
        let names: Vec<&str> = days.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(names, ["WED", "THU", "FRI", "SAT", "SUN", "MON", "TUE"]);
    }

    #[test]
    fn forecast_values_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            for day in forecast_with(may_first(), &mut rng) {
                assert!((13..=31).contains(&day.temperature), "{day:?}");
                let band: std::ops::Range<u8> = match day.condition {
                    Condition::Sunny => 0..10,
                    Condition::PartlyCloudy => 10..30,
                    Condition::Cloudy => 30..60,
                    Condition::Rainy => 60..100,
                };
                assert!(band.contains(&day.precipitation), "{day:?}");
            }
        }
    }

    #[test]
    fn mid_week_is_wetter() {
        assert_eq!(pick_condition(true, 0.35), Condition::Rainy);
        assert_eq!(pick_condition(false, 0.35), Condition::PartlyCloudy);
        assert_eq!(pick_condition(true, 0.95), Condition::Sunny);
        assert_eq!(pick_condition(false, 0.05), Condition::Rainy);
    }

    #[test]
    fn conditions_use_dashboard_names() {
        let json = serde_json::to_string(&[Condition::Sunny, Condition::PartlyCloudy]).unwrap();
        assert_eq!(json, r#"["sunny","partlyCloudy"]"#);
    }

    #[test]
    fn history_shape_per_period() {
        let mut rng = StdRng::seed_from_u64(11);
        for (period, len, first, last) in [
            (Period::Week, 7, "Day 1", "Day 7"),
            (Period::Month, 30, "Day 1", "Day 30"),
            (Period::Year, 12, "Month 1", "Month 12"),
        ] {
            let entries = history_with(period, &mut rng);
            assert_eq!(entries.len(), len);
            assert_eq!(entries[0].date, first);
            assert_eq!(entries[len - 1].date, last);

            let (temperature, humidity) = period.bands();
            for e in &entries {
                assert!(temperature.contains(&e.temperature), "{period:?} {e:?}");
                assert!(humidity.contains(&e.humidity), "{period:?} {e:?}");
            }
        }
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert_eq!(Period::from_slug("month"), Some(Period::Month));
        assert_eq!(Period::from_slug("decade"), None);
    }
}
