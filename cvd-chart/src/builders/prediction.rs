use chrono::NaiveDate;
use cvd_core::{timeseries::epoch_millis, Point, RegionInfo, RegionKey, TimeseriesRow};
use cvd_data::align::align_series;
use cvd_data::measures::per_100k;
use cvd_data::predict::{forecast, DEFAULT_DEGREE};
use serde_json::json;

use super::{title_json, x_tooltip, y_tooltip};
use crate::colors::series_colors;
use crate::config::PredictionConfig;
use crate::format::si;
use crate::spec::{ChartSpec, PointSpec, SeriesSpec, Tooltip};

/// Observed window and forecast of one region, both calendar-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSeries {
    pub name: String,
    pub key: RegionKey,
    pub history: Vec<Point>,
    pub forecast: Vec<Point>,
}

impl PredictionSeries {
    fn last_y(&self) -> f64 {
        self.history.last().map(|p| p.y).unwrap_or(0.0)
    }
}

/// The cumulative metric over the `day_interval` days up to the last
/// observation, followed by `prediction_days` forecast days fitted over the
/// whole history. The window never extends past `today`.
pub fn prediction_series(
    info: &RegionInfo,
    rows: &[TimeseriesRow],
    config: &PredictionConfig,
    today: NaiveDate,
) -> PredictionSeries {
    let display = &config.display;
    let mut align = display.align_config(config.day_interval, None);
    align.is_cumulative = true;
    align.align_at = 0.0;
    let end = rows.last().map(|r| r.date.min(today)).unwrap_or(today);
    let history = align_series(info, rows, &align, end);

    let population = if display.is_incidence { info.population } else { None };
    let forecast = forecast(rows, display.metric, config.prediction_days, DEFAULT_DEGREE)
        .into_iter()
        .map(|f| Point {
            x: epoch_millis(f.date),
            y: per_100k(f.value, population),
        })
        .collect();

    PredictionSeries {
        name: history.name,
        key: history.key,
        history: history.data,
        forecast,
    }
}

/// Line chart of observed totals continued by their forecast; the forecast
/// window is shaded.
pub fn build_prediction(series: &[PredictionSeries], config: &PredictionConfig) -> ChartSpec {
    let mut display = config.display.clone();
    display.is_cumulative = true;
    display.align_at = 0.0;

    let mut series: Vec<&PredictionSeries> = series
        .iter()
        .filter(|s| !s.history.is_empty() || !s.forecast.is_empty())
        .collect();
    series.sort_by(|a, b| a.last_y().total_cmp(&b.last_y()).then_with(|| a.name.cmp(&b.name)));

    let names: Vec<(&str, &str)> = series.iter().map(|s| (s.name.as_str(), s.key.as_str())).collect();
    let colors = series_colors(&names);

    let window = series
        .iter()
        .flat_map(|s| s.forecast.iter().map(|p| p.x))
        .fold(None, |acc: Option<(f64, f64)>, x| match acc {
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            None => Some((x, x)),
        });
    let annotations = match window {
        Some((from, to)) => json!({
            "xaxis": [{
                "x": from,
                "x2": to,
                "fillColor": "#0000FF",
                "opacity": 0.1,
                "label": { "text": "Prediction" },
            }],
        }),
        None => json!({}),
    };

    let options = json!({
        "chart": { "type": "line", "height": display.height },
        "title": title_json(&display, "18px"),
        "colors": colors,
        "dataLabels": { "enabled": display.show_data_labels },
        "stroke": { "curve": "straight", "width": 2 },
        "annotations": annotations,
        "xaxis": { "type": "datetime" },
        "yaxis": {
            "title": { "text": display.y_axis_title() },
            "labels": { "format": "si" },
        },
        "legend": { "show": true, "position": "bottom" },
    });

    let series = series
        .iter()
        .zip(colors)
        .map(|(s, color)| {
            let mut previous: Option<f64> = None;
            let observed = s.history.iter().map(|p| (p, false));
            let predicted = s.forecast.iter().map(|p| (p, true));
            let data = observed
                .chain(predicted)
                .map(|(p, is_prediction)| {
                    let before = previous.replace(p.y);
                    let mut y = y_tooltip(p.y, before, &display);
                    if is_prediction {
                        y.push_str(" (Prediction)");
                    }
                    PointSpec {
                        x: p.x,
                        y: p.y,
                        label: display.show_data_labels.then(|| si(p.y)),
                        tooltip: Tooltip {
                            x: x_tooltip(p.x, &display),
                            y,
                        },
                        is_prediction,
                    }
                })
                .collect();
            SeriesSpec {
                name: s.name.clone(),
                key: s.key.clone(),
                color: Some(color),
                data,
            }
        })
        .collect();

    ChartSpec {
        chart_type: "line".to_string(),
        height: display.height,
        options,
        series,
    }
}
