use cvd_core::{Metric, RegionInfo, RegionKey, TimeseriesRow};
use cvd_data::measures::{trend_points, TrendPoint};
use serde_json::{json, Value};

use super::title_json;
use crate::colors::series_colors;
use crate::config::TrendConfig;
use crate::format::{display_number, long_date};
use crate::options::Scale;
use crate::spec::{ChartSpec, PointSpec, SeriesSpec, Tooltip};

/// Smallest lower bound of a logarithmic axis.
const LOG_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub name: String,
    pub key: RegionKey,
    pub points: Vec<TrendPoint>,
}

pub fn trend_series(info: &RegionInfo, rows: &[TimeseriesRow], metric: Metric, align_at: f64) -> TrendSeries {
    TrendSeries {
        name: info.display_name.clone(),
        key: info.key.clone(),
        points: trend_points(rows, metric, align_at),
    }
}

/// Bounds of a log axis over `values`, widened to powers of ten.
pub fn log_domain(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;
    let lo = 10f64.powi(min.log10().floor() as i32).max(LOG_FLOOR);
    let hi = 10f64.powi(max.log10().ceil() as i32);
    Some((lo, hi))
}

fn axis(title: String, scale: Scale, domain: Option<(f64, f64)>) -> Value {
    let mut axis = json!({
        "title": { "text": title },
        "logarithmic": scale == Scale::Log,
        "labels": { "format": "si" },
    });
    if let Some((min, max)) = domain {
        axis["min"] = json!(min);
        axis["max"] = json!(max);
    }
    axis
}

/// Total against new-in-the-past-week, one line per region.
pub fn build_trend(series: &[TrendSeries], config: &TrendConfig) -> ChartSpec {
    let display = &config.display;
    let metric = display.metric;
    let log = config.scale == Scale::Log;

    let mut series: Vec<TrendSeries> = series
        .iter()
        .map(|s| TrendSeries {
            name: s.name.clone(),
            key: s.key.clone(),
            points: s
                .points
                .iter()
                .filter(|p| !log || (p.x > 0.0 && p.y > 0.0))
                .copied()
                .collect(),
        })
        .filter(|s| !s.points.is_empty())
        .collect();
    series.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<(&str, &str)> = series.iter().map(|s| (s.name.as_str(), s.key.as_str())).collect();
    let colors = series_colors(&names);

    let (x_domain, y_domain) = if log {
        (
            log_domain(series.iter().flat_map(|s| s.points.iter().map(|p| p.x))),
            log_domain(series.iter().flat_map(|s| s.points.iter().map(|p| p.y))),
        )
    } else {
        (None, None)
    };

    let mut x_axis = axis(format!("Total Confirmed {}", metric.title()), config.scale, x_domain);
    x_axis["type"] = json!("numeric");

    let options = json!({
        "chart": { "type": "line", "height": display.height, "zoom": { "enabled": true } },
        "title": title_json(display, "18px"),
        "colors": colors,
        "dataLabels": { "enabled": false },
        "stroke": { "curve": "straight", "width": 2 },
        "xaxis": x_axis,
        "yaxis": axis(
            format!("New Confirmed {} (in the Past Week)", metric.title()),
            config.scale,
            y_domain,
        ),
        "legend": { "show": true, "position": "bottom" },
    });

    let series = series
        .iter()
        .zip(colors)
        .map(|(s, color)| SeriesSpec {
            name: s.name.clone(),
            key: s.key.clone(),
            color: Some(color),
            data: s
                .points
                .iter()
                .map(|p| PointSpec {
                    x: p.x,
                    y: p.y,
                    label: None,
                    tooltip: Tooltip {
                        x: Some(format!(
                            "{} confirmed {} at {}",
                            display_number(p.x),
                            metric.label(),
                            long_date(p.date)
                        )),
                        y: format!("Weekly Confirmed {}: {}", metric.title(), display_number(p.y)),
                    },
                    is_prediction: false,
                })
                .collect(),
        })
        .collect();

    ChartSpec {
        chart_type: "line".to_string(),
        height: display.height,
        options,
        series,
    }
}
