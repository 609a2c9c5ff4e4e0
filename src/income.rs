//! Income dashboard figures.
//!
//! The backend reports gross figures per day, month and year. The
//! dashboards chart them as fixed-length series, so the sparse point lists
//! are bucketed here into zero-filled slots.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Overview for a month or a year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grow {
    #[serde(default)]
    pub gross: f64,
    #[serde(default)]
    pub sub_gross: f64,
    #[serde(default)]
    pub orders: u64,
    #[serde(default, rename = "cancle_orders")]
    pub cancelled_orders: u64,
    #[serde(default)]
    pub delivered_orders: u64,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

/// Gross for one month of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    #[serde(deserialize_with = "number_or_string")]
    pub month: u32,
    #[serde(default)]
    pub gross: f64,
    #[serde(default)]
    pub sub_gross: f64,
}

/// Gross for one day of a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPoint {
    #[serde(deserialize_with = "number_or_string")]
    pub day: u32,
    #[serde(default)]
    pub gross: f64,
    #[serde(default)]
    pub sub_gross: f64,
}

/// A year the backend has figures for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrossYear {
    #[serde(deserialize_with = "number_or_string")]
    pub year: u32,
}

/// Chart-ready series: one label per slot, gross and sub-gross side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub gross: Vec<f64>,
    pub sub_gross: Vec<f64>,
}

impl Series {
    fn zeroed(labels: Vec<String>) -> Self {
        let len = labels.len();
        Series {
            labels,
            gross: vec![0.0; len],
            sub_gross: vec![0.0; len],
        }
    }

    fn set(&mut self, slot: u32, gross: f64, sub_gross: f64) {
        // Slots are 1-based; anything outside the range is dropped.
        let Some(index) = (slot as usize).checked_sub(1) else {
            return;
        };
        if index < self.gross.len() {
            self.gross[index] = gross;
            self.sub_gross[index] = sub_gross;
        }
    }
}

/// Twelve monthly slots for a year.
pub fn year_series(points: &[MonthPoint]) -> Series {
    let mut series = Series::zeroed((1..=12).map(|m| m.to_string()).collect());
    for point in points {
        series.set(point.month, point.gross, point.sub_gross);
    }
    series
}

/// One slot per day of `month` in `year`, labelled `day/month`.
///
/// Returns an empty series for an invalid month.
pub fn month_series(year: i32, month: u32, points: &[DayPoint]) -> Series {
    let days = days_in_month(year, month).unwrap_or(0);
    let mut series = Series::zeroed((1..=days).map(|d| format!("{}/{}", d, month)).collect());
    for point in points {
        series.set(point.day, point.gross, point.sub_gross);
    }
    series
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next.pred_opt()?;
    debug_assert_eq!(last.month(), first.month());
    Some(last.day())
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
