//! Re-indexing normalized series for charts.
//!
//! Two mutually exclusive modes, chosen by `align_at`:
//! - calendar (`align_at == 0`): one point per day over
//!   `[today - day_interval, today]`, x = epoch milliseconds
//! - threshold (`align_at > 0`): rows from the first day the cumulative metric
//!   reaches `align_at`, x = 1, 2, 3, …

use chrono::NaiveDate;
use cvd_core::{
    date_range::DateRange,
    timeseries::{date_from_millis, epoch_millis},
    AlignedSeries, Metric, Point, RegionInfo, TimeseriesRow,
};
use std::collections::HashMap;

use crate::measures::ValueSelector;

/// Alignment parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignConfig {
    pub metric: Metric,
    pub is_cumulative: bool,
    pub day_interval: u32,
    pub align_at: f64,
    /// Scale values per 100k inhabitants when the population is known.
    pub incidence: bool,
    pub moving_average: Option<usize>,
}

impl Default for AlignConfig {
    fn default() -> Self {
        AlignConfig {
            metric: Metric::Cases,
            is_cumulative: true,
            day_interval: 30,
            align_at: 0.0,
            incidence: false,
            moving_average: None,
        }
    }
}

impl AlignConfig {
    pub fn is_calendar(&self) -> bool {
        self.align_at <= 0.0
    }

    fn selector(&self, population: Option<f64>) -> ValueSelector {
        ValueSelector {
            metric: self.metric,
            is_cumulative: self.is_cumulative,
            per_100k: if self.incidence { population } else { None },
            moving_average: self.moving_average,
        }
    }
}

/// Align one series. An empty result means the region has nothing to plot
/// (no data, or the threshold is never reached).
pub fn align(series: &[TimeseriesRow], config: &AlignConfig, today: NaiveDate) -> Vec<Point> {
    align_with(series, config, None, today)
}

/// Align a region's series and label it with the region's display name.
pub fn align_series(
    info: &RegionInfo,
    series: &[TimeseriesRow],
    config: &AlignConfig,
    today: NaiveDate,
) -> AlignedSeries {
    AlignedSeries {
        name: info.display_name.clone(),
        key: info.key.clone(),
        data: align_with(series, config, info.population, today),
    }
}

fn align_with(
    series: &[TimeseriesRow],
    config: &AlignConfig,
    population: Option<f64>,
    today: NaiveDate,
) -> Vec<Point> {
    let values = config.selector(population).values(series);
    if config.is_calendar() {
        let points: Vec<Point> = series
            .iter()
            .zip(values)
            .map(|(row, y)| Point {
                x: epoch_millis(row.date),
                y,
            })
            .collect();
        calendar_window(&points, config.day_interval, today, config.is_cumulative)
    } else {
        threshold_align(series, &values, config.metric, config.align_at)
    }
}

/// Restrict date-indexed points to the window ending `today`, one point per
/// day. Days without a point repeat the previous value for cumulative views
/// and are zero for daily views.
///
/// Applying the window to its own output with the same arguments returns the
/// same points.
pub fn calendar_window(points: &[Point], day_interval: u32, today: NaiveDate, is_cumulative: bool) -> Vec<Point> {
    let window = DateRange::ending_at(today, day_interval);
    let by_date: HashMap<NaiveDate, f64> = points
        .iter()
        .filter_map(|p| date_from_millis(p.x).map(|d| (d, p.y)))
        .collect();

    let mut carried = if is_cumulative {
        points
            .iter()
            .filter_map(|p| date_from_millis(p.x).map(|d| (d, p.y)))
            .filter(|(d, _)| *d < window.0)
            .max_by_key(|(d, _)| *d)
            .map(|(_, y)| y)
            .unwrap_or(0.0)
    } else {
        0.0
    };

    window
        .map(|date| {
            let y = match by_date.get(&date) {
                Some(&y) => y,
                None if is_cumulative => carried,
                None => 0.0,
            };
            carried = y;
            Point {
                x: epoch_millis(date),
                y,
            }
        })
        .collect()
}

/// Points from the first row whose cumulative metric reaches `align_at`,
/// numbered from day 1.
pub fn threshold_align(series: &[TimeseriesRow], values: &[f64], metric: Metric, align_at: f64) -> Vec<Point> {
    let Some(start) = series.iter().position(|row| row.cumulative(metric) >= align_at) else {
        return Vec::new();
    };
    values[start..]
        .iter()
        .enumerate()
        .map(|(i, &y)| Point {
            x: (i + 1) as f64,
            y,
        })
        .collect()
}

/// Keep the first `n` points of every series; `0` keeps everything.
pub fn slice_series(series: &mut [AlignedSeries], n: usize) {
    if n == 0 {
        return;
    }
    for s in series.iter_mut() {
        s.data.truncate(n);
    }
}
