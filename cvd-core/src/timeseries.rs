use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::region::RegionKey;

/// The epidemiological metric a chart displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    #[serde(alias = "confirmed")]
    Cases,
    Deaths,
}

impl Metric {
    /// Lowercase label used in tooltips, e.g. "cases".
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Metric::Cases => "Cases",
            Metric::Deaths => "Deaths",
        }
    }
}

/// One normalized calendar day of a region's series.
///
/// Within a normalized series dates are strictly increasing with no gaps and
/// both daily deltas are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub date: NaiveDate,
    pub confirmed: f64,
    pub confirmed_daily: f64,
    pub deaths: f64,
    pub deaths_daily: f64,
}

impl TimeseriesRow {
    pub fn cumulative(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cases => self.confirmed,
            Metric::Deaths => self.deaths,
        }
    }

    pub fn daily(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cases => self.confirmed_daily,
            Metric::Deaths => self.deaths_daily,
        }
    }

    pub fn value(&self, metric: Metric, is_cumulative: bool) -> f64 {
        if is_cumulative {
            self.cumulative(metric)
        } else {
            self.daily(metric)
        }
    }
}

/// A single chart coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A region's series re-indexed for charting.
///
/// `x` is an epoch timestamp in milliseconds in calendar mode, or an ordinal
/// day number (1-based) in threshold-alignment mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub name: String,
    pub key: RegionKey,
    pub data: Vec<Point>,
}

impl AlignedSeries {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last_y(&self) -> f64 {
        self.data.last().map(|p| p.y).unwrap_or(0.0)
    }
}

/// Midnight UTC of a date as epoch milliseconds.
pub fn epoch_millis(date: NaiveDate) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
        .unwrap_or_default()
}

/// Inverse of [`epoch_millis`].
pub fn date_from_millis(millis: f64) -> Option<NaiveDate> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_round_trips_to_date() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(epoch_millis(date), 1_615_680_000_000.0);
        assert_eq!(date_from_millis(epoch_millis(date)), Some(date));
    }

    #[test]
    fn metric_deserializes_legacy_name() {
        let m: Metric = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(m, Metric::Cases);
        assert_eq!(Metric::Deaths.label(), "deaths");
    }
}
