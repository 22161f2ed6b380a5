//! Chart builders: pure functions from prepared series and a configuration
//! to a [`ChartSpec`](crate::spec::ChartSpec).
//!
//! Builders never fetch or mutate shared state. Equal inputs give equal
//! output, including key order in the options object.

mod heatmap;
mod prediction;
mod projection;
mod series;
mod trend;

pub use heatmap::build_heatmap;
pub use prediction::{build_prediction, prediction_series, PredictionSeries};
pub use projection::{build_projection, project_regions, projection_input, ProjectionSeries};
pub use series::build_series_chart;
pub use trend::{build_trend, log_domain, trend_series, TrendSeries};

use chrono::NaiveDate;
use cvd_core::{timeseries::date_from_millis, AlignedSeries, RegionInfo, TimeseriesRow};
use cvd_data::align::align_series;
use serde_json::{json, Value};

use crate::config::{ChartConfig, DisplayConfig};
use crate::format::{display_number, long_date, ordinal, percent_change, si};
use crate::spec::{ChartSpec, PointSpec, SeriesSpec, Tooltip};

/// Build the configured chart over normalized regional series.
///
/// Regions with nothing to plot (no data, threshold never reached) are left
/// out of the chart.
pub fn build_chart(config: &ChartConfig, regions: &[(&RegionInfo, &[TimeseriesRow])], today: NaiveDate) -> ChartSpec {
    let aligned = |align: cvd_data::AlignConfig| -> Vec<AlignedSeries> {
        let series: Vec<AlignedSeries> = regions
            .iter()
            .map(|(info, rows)| align_series(info, rows, &align, today))
            .collect();
        let empty = series.iter().filter(|s| s.is_empty()).count();
        if empty > 0 {
            log::debug!("{} of {} regions have nothing to plot", empty, series.len());
        }
        series
    };
    match config {
        ChartConfig::Heatmap(c) => build_heatmap(&aligned(c.display.align_config(c.day_interval, None)), c),
        ChartConfig::Series(c) => build_series_chart(
            &aligned(c.display.align_config(c.day_interval, c.moving_average)),
            c,
        ),
        ChartConfig::Projection(c) => build_projection(&project_regions(regions, c).0, c),
        ChartConfig::Trend(c) => {
            let series: Vec<TrendSeries> = regions
                .iter()
                .map(|(info, rows)| trend_series(info, rows, c.display.metric, c.display.align_at))
                .collect();
            build_trend(&series, c)
        }
        ChartConfig::Prediction(c) => {
            let series: Vec<PredictionSeries> = regions
                .iter()
                .map(|(info, rows)| prediction_series(info, rows, c, today))
                .collect();
            build_prediction(&series, c)
        }
    }
}

pub(crate) const FONT_FAMILY: &str = "Lato, 'Helvetica Neue', Arial, Helvetica, sans-serif";

pub(crate) fn title_json(display: &DisplayConfig, font_size: &str) -> Value {
    json!({
        "text": display.title,
        "style": { "fontSize": font_size, "fontFamily": FONT_FAMILY },
    })
}

/// Datetime axis in calendar mode, numeric (days since threshold) otherwise.
pub(crate) fn x_axis_json(display: &DisplayConfig) -> Value {
    if display.is_calendar() {
        json!({ "type": "datetime" })
    } else {
        json!({ "type": "numeric", "labels": { "format": "ordinal" } })
    }
}

/// `12th day after 100 cases` in threshold mode, the date otherwise.
pub(crate) fn x_tooltip(x: f64, display: &DisplayConfig) -> Option<String> {
    if display.is_calendar() {
        date_from_millis(x).map(long_date)
    } else {
        Some(format!(
            "{} day after {} {}",
            ordinal(x),
            si(display.align_at),
            display.metric.label()
        ))
    }
}

/// `1,234 cases (+5.2%)`; the change is left out when there is no previous
/// non-zero value.
pub(crate) fn y_tooltip(y: f64, previous: Option<f64>, display: &DisplayConfig) -> String {
    let mut text = format!(
        "{} {}{}",
        display_number(y),
        display.metric.label(),
        if display.is_incidence { " per 100k inhab." } else { "" }
    );
    if let Some(change) = previous.and_then(|p| percent_change(y, p)) {
        text.push_str(&format!(" ({}%)", change));
    }
    text
}

/// Points of an aligned series with labels and tooltips.
pub(crate) fn aligned_points(series: &AlignedSeries, display: &DisplayConfig) -> Vec<PointSpec> {
    let mut previous: Option<f64> = None;
    series
        .data
        .iter()
        .map(|p| {
            let before = previous.replace(p.y);
            PointSpec {
                x: p.x,
                y: p.y,
                label: display.show_data_labels.then(|| si(p.y)),
                tooltip: Tooltip {
                    x: x_tooltip(p.x, display),
                    y: y_tooltip(p.y, before, display),
                },
                is_prediction: false,
            }
        })
        .collect()
}

pub(crate) fn aligned_spec(series: &AlignedSeries, color: Option<String>, display: &DisplayConfig) -> SeriesSpec {
    SeriesSpec {
        name: series.name.clone(),
        key: series.key.clone(),
        color,
        data: aligned_points(series, display),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use cvd_core::{timeseries::epoch_millis, AlignedSeries, Metric, Point, RegionKey};

    use crate::config::DisplayConfig;

    pub fn display() -> DisplayConfig {
        DisplayConfig {
            title: "Chart".to_string(),
            metric: Metric::Cases,
            is_cumulative: true,
            align_at: 0.0,
            show_data_labels: false,
            is_incidence: false,
            height: 350,
        }
    }

    pub fn calendar(name: &str, ys: &[f64]) -> AlignedSeries {
        let start = chrono::NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        AlignedSeries {
            name: name.to_string(),
            key: RegionKey::from(name),
            data: ys
                .iter()
                .enumerate()
                .map(|(i, &y)| Point {
                    x: epoch_millis(start + chrono::Days::new(i as u64)),
                    y,
                })
                .collect(),
        }
    }

    pub fn days_since(name: &str, ys: &[f64]) -> AlignedSeries {
        AlignedSeries {
            name: name.to_string(),
            key: RegionKey::from(name),
            data: ys
                .iter()
                .enumerate()
                .map(|(i, &y)| Point { x: (i + 1) as f64, y })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn threshold_tooltips_count_days() {
        let mut d = display();
        d.align_at = 100.0;
        assert_eq!(x_tooltip(3.0, &d).as_deref(), Some("3rd day after 100 cases"));
        d.align_at = 1500.0;
        assert_eq!(x_tooltip(1.0, &d).as_deref(), Some("1st day after 1.5k cases"));
    }

    #[test]
    fn y_tooltip_includes_change() {
        let mut d = display();
        assert_eq!(y_tooltip(1100.0, Some(1000.0), &d), "1,100 cases (+10%)");
        assert_eq!(y_tooltip(5.0, Some(0.0), &d), "5 cases");
        assert_eq!(y_tooltip(5.0, None, &d), "5 cases");
        d.is_incidence = true;
        assert_eq!(y_tooltip(2.5, Some(2.5), &d), "2.5 cases per 100k inhab. (+0%)");
    }

    #[test]
    fn chart_kind_follows_options() {
        use crate::options::{ChartOptions, ChartType};
        use cvd_core::RegionKey;

        let start = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        let rows: Vec<TimeseriesRow> = (0..10)
            .map(|i| TimeseriesRow {
                date: start + chrono::Days::new(i),
                confirmed: (i * 10) as f64,
                confirmed_daily: 10.0,
                deaths: 0.0,
                deaths_daily: 0.0,
            })
            .collect();
        let info = RegionInfo::fallback(&RegionKey::from("Italy"));
        let regions: Vec<(&RegionInfo, &[TimeseriesRow])> = vec![(&info, &rows[..])];
        let today = NaiveDate::from_ymd_opt(2020, 4, 10).unwrap();

        for (chart_type, expected) in [
            (ChartType::Heatmap, "heatmap"),
            (ChartType::Bar, "bar"),
            (ChartType::Trend, "line"),
            (ChartType::Prediction, "line"),
            (ChartType::Projection, "scatter"),
        ] {
            let options = ChartOptions {
                chart_type,
                day_interval: 5,
                ..ChartOptions::default()
            };
            let config = ChartConfig::from_options(&options).unwrap();
            let spec = build_chart(&config, &regions, today);
            assert_eq!(spec.chart_type, expected);
            assert_eq!(spec, build_chart(&config, &regions, today));
        }

        let heatmap = ChartConfig::from_options(&ChartOptions {
            day_interval: 5,
            ..ChartOptions::default()
        })
        .unwrap();
        assert_eq!(build_chart(&heatmap, &regions, today).series[0].data.len(), 6);
    }

    #[test]
    fn calendar_points_get_dates() {
        let s = calendar("Italy", &[1.0, 2.0]);
        let points = aligned_points(&s, &display());
        assert_eq!(points[0].tooltip.x.as_deref(), Some("April 1st, 2020"));
        assert_eq!(points[1].tooltip.y, "2 cases (+100%)");
        assert!(points[0].label.is_none());
    }
}
