use cvd_core::{AlignedSeries, RegionInfo, TimeseriesRow};
use cvd_data::align::threshold_align;
use cvd_data::measures::{summarize, SeriesSummary, ValueSelector};
use cvd_projection::{project_report, ProjectedPoint};
use serde_json::json;

use super::title_json;
use crate::colors::series_colors;
use crate::config::{DisplayConfig, ProjectionConfig};
use crate::format::{display_number, long_date};
use crate::spec::{ChartSpec, PointSpec, SeriesSpec, Tooltip};

/// A projected region with the numbers its tooltip shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSeries {
    pub point: ProjectedPoint,
    pub summary: Option<SeriesSummary>,
}

/// The series a region contributes to a projection: its selected values from
/// the day the metric reaches `align_at`, numbered from day 1. With no
/// threshold this is the whole history.
pub fn projection_input(info: &RegionInfo, rows: &[TimeseriesRow], display: &DisplayConfig) -> AlignedSeries {
    let selector = ValueSelector {
        per_100k: if display.is_incidence { info.population } else { None },
        ..ValueSelector::new(display.metric, display.is_cumulative)
    };
    let values = selector.values(rows);
    AlignedSeries {
        name: info.display_name.clone(),
        key: info.key.clone(),
        data: threshold_align(rows, &values, display.metric, display.align_at),
    }
}

/// Project regions and attach their summaries. Also returns the embedding's
/// stress, when there was anything to embed.
///
/// Regions whose metric never goes above zero are left out.
pub fn project_regions(
    regions: &[(&RegionInfo, &[TimeseriesRow])],
    config: &ProjectionConfig,
) -> (Vec<ProjectionSeries>, Option<f64>) {
    let metric = config.display.metric;
    let with_values: Vec<(&RegionInfo, &[TimeseriesRow], SeriesSummary)> = regions
        .iter()
        .filter_map(|&(info, rows)| match summarize(rows, metric) {
            Some(summary) => Some((info, rows, summary)),
            None => {
                log::debug!("{} has no {} to project", info.key, metric.label());
                None
            }
        })
        .collect();

    let inputs: Vec<AlignedSeries> = with_values
        .iter()
        .map(|(info, rows, _)| projection_input(info, rows, &config.display))
        .collect();
    let report = project_report(&inputs, &config.params);
    let series = report
        .points
        .into_iter()
        .map(|point| {
            let summary = with_values
                .iter()
                .find(|(info, _, _)| info.key == point.key)
                .map(|(_, _, summary)| summary.clone());
            ProjectionSeries { point, summary }
        })
        .collect();
    (series, report.stress)
}

/// Scatter chart with one single-point series per region.
pub fn build_projection(points: &[ProjectionSeries], config: &ProjectionConfig) -> ChartSpec {
    let display = &config.display;
    let names: Vec<(&str, &str)> = points
        .iter()
        .map(|p| (p.point.name.as_str(), p.point.key.as_str()))
        .collect();
    let colors = series_colors(&names);

    let options = json!({
        "chart": {
            "type": "scatter",
            "height": display.height,
            "zoom": { "enabled": true, "type": "xy" },
        },
        "title": title_json(display, "18px"),
        "subtitle": { "text": display.subtitle() },
        "colors": colors,
        "dataLabels": { "enabled": display.show_data_labels },
        "markers": { "size": 6 },
        "xaxis": { "type": "numeric", "labels": { "show": false }, "tooltip": { "enabled": false } },
        "yaxis": { "labels": { "show": false } },
        "legend": { "show": true, "position": "bottom" },
    });

    let series = points
        .iter()
        .zip(colors)
        .map(|(p, color)| {
            let tooltip = match &p.summary {
                Some(summary) => Tooltip {
                    x: Some(format!(
                        "From {} to {}",
                        long_date(summary.start_date),
                        long_date(summary.end_date)
                    )),
                    y: format!("{} {}", display_number(summary.total), display.metric.label()),
                },
                None => Tooltip {
                    x: None,
                    y: p.point.name.clone(),
                },
            };
            SeriesSpec {
                name: p.point.name.clone(),
                key: p.point.key.clone(),
                color: Some(color),
                data: vec![PointSpec {
                    x: p.point.x,
                    y: p.point.y,
                    label: display.show_data_labels.then(|| p.point.name.clone()),
                    tooltip,
                    is_prediction: false,
                }],
            }
        })
        .collect();

    ChartSpec {
        chart_type: "scatter".to_string(),
        height: display.height,
        options,
        series,
    }
}
