//! Values derived from a normalized series: incidence, moving averages,
//! weekly trend points and per-region summaries.

use chrono::NaiveDate;
use cvd_core::{Metric, TimeseriesRow};
use serde::Serialize;

/// Days summed for the weekly trend.
pub const TREND_WINDOW: usize = 7;

/// Value per 100k inhabitants. Unknown or zero population leaves the value as is.
pub fn per_100k(value: f64, population: Option<f64>) -> f64 {
    match population {
        Some(p) if p > 0.0 => value / p * 100_000.0,
        _ => value,
    }
}

/// Trailing mean over up to `window` values; leading entries average what
/// is available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            if i >= window {
                sum -= values[i - window];
            }
            sum / (i + 1).min(window) as f64
        })
        .collect()
}

/// Which value of each row a chart plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSelector {
    pub metric: Metric,
    pub is_cumulative: bool,
    /// Population to scale by, when incidence is requested.
    pub per_100k: Option<f64>,
    /// Smoothing window over the selected values.
    pub moving_average: Option<usize>,
}

impl ValueSelector {
    pub fn new(metric: Metric, is_cumulative: bool) -> Self {
        ValueSelector {
            metric,
            is_cumulative,
            per_100k: None,
            moving_average: None,
        }
    }

    pub fn values(&self, series: &[TimeseriesRow]) -> Vec<f64> {
        let raw: Vec<f64> = series
            .iter()
            .map(|row| per_100k(row.value(self.metric, self.is_cumulative), self.per_100k))
            .collect();
        match self.moving_average {
            Some(window) => moving_average(&raw, window),
            None => raw,
        }
    }
}

/// Median, ignoring NaN. Empty input yields zero.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Mean, zero for empty input.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// One point of a trajectory chart: total to date against new in the past week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
}

/// Total-vs-weekly-new points for rows whose total reaches `align_at`.
///
/// The weekly value sums the daily values of the seven rows before the
/// current one.
pub fn trend_points(series: &[TimeseriesRow], metric: Metric, align_at: f64) -> Vec<TrendPoint> {
    series
        .iter()
        .enumerate()
        .filter(|(_, row)| row.cumulative(metric) >= align_at)
        .map(|(index, row)| TrendPoint {
            date: row.date,
            x: row.cumulative(metric),
            y: series[index.saturating_sub(TREND_WINDOW)..index]
                .iter()
                .map(|r| r.daily(metric))
                .sum(),
        })
        .collect()
}

/// Headline numbers of a region for tooltips.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: f64,
    pub median_daily: f64,
}

/// Summary over the rows where the metric is positive; `None` if there are none.
pub fn summarize(series: &[TimeseriesRow], metric: Metric) -> Option<SeriesSummary> {
    let with_values: Vec<&TimeseriesRow> = series
        .iter()
        .filter(|row| row.cumulative(metric) > 0.0)
        .collect();
    let first = with_values.first()?;
    let last = with_values.last()?;
    let daily: Vec<f64> = with_values.iter().map(|r| r.daily(metric)).collect();
    Some(SeriesSummary {
        start_date: first.date,
        end_date: last.date,
        total: last.cumulative(metric),
        median_daily: median(&daily),
    })
}
