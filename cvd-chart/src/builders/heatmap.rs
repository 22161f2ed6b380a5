use cvd_core::AlignedSeries;
use cvd_data::align::slice_series;
use serde_json::json;

use super::{aligned_spec, title_json, x_axis_json};
use crate::colors::{adaptive_ranges, fixed_ranges};
use crate::config::HeatmapConfig;
use crate::options::ColorScaleKind;
use crate::spec::ChartSpec;

/// Rows shorter than this get squeezed; the chart grows instead.
const ROW_HEIGHT: u32 = 30;

/// One row per region, sorted ascending by its last value so the highest
/// ends on top.
pub fn build_heatmap(series: &[AlignedSeries], config: &HeatmapConfig) -> ChartSpec {
    let display = &config.display;
    let mut series: Vec<AlignedSeries> = series.iter().filter(|s| !s.is_empty()).cloned().collect();
    slice_series(&mut series, config.timeserie_slice);
    series.sort_by(|a, b| a.last_y().total_cmp(&b.last_y()).then_with(|| a.name.cmp(&b.name)));

    let ranges = match config.color_scale {
        ColorScaleKind::Fixed => fixed_ranges(),
        ColorScaleKind::Adaptive => {
            let values: Vec<f64> = series.iter().flat_map(|s| s.data.iter().map(|p| p.y)).collect();
            adaptive_ranges(&values)
        }
    };

    let height = display.height.max(ROW_HEIGHT * series.len() as u32);
    let options = json!({
        "chart": { "type": "heatmap", "height": height },
        "title": title_json(display, "18px"),
        "dataLabels": { "enabled": display.show_data_labels },
        "plotOptions": {
            "heatmap": {
                "enableShades": false,
                "colorScale": { "ranges": ranges },
            },
        },
        "xaxis": x_axis_json(display),
        "yaxis": { "title": { "text": null } },
        "legend": { "show": true, "position": "bottom" },
    });

    ChartSpec {
        chart_type: "heatmap".to_string(),
        height,
        options,
        series: series.iter().map(|s| aligned_spec(s, None, display)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn config(color_scale: ColorScaleKind) -> HeatmapConfig {
        HeatmapConfig {
            display: display(),
            day_interval: 30,
            timeserie_slice: 0,
            color_scale,
        }
    }

    #[test]
    fn rows_sorted_by_last_value() {
        let input = vec![
            calendar("Spain", &[1.0, 500.0]),
            calendar("Empty", &[]),
            calendar("Italy", &[1.0, 20.0]),
            calendar("Brazil", &[1.0, 9000.0]),
        ];
        let spec = build_heatmap(&input, &config(ColorScaleKind::Fixed));
        let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Italy", "Spain", "Brazil"]);
        assert_eq!(spec.chart_type, "heatmap");
        assert_eq!(spec.options["xaxis"]["type"], "datetime");
        let ranges = spec.options["plotOptions"]["heatmap"]["colorScale"]["ranges"]
            .as_array()
            .unwrap();
        assert_eq!(ranges.len(), 9);
        assert_eq!(ranges[1]["name"], "11-50");
    }

    #[test]
    fn many_rows_grow_the_chart() {
        let input: Vec<AlignedSeries> = (0..20).map(|i| days_since(&format!("R{:02}", i), &[i as f64])).collect();
        let mut c = config(ColorScaleKind::Adaptive);
        c.display.align_at = 10.0;
        let spec = build_heatmap(&input, &c);
        assert_eq!(spec.height, 600);
        assert_eq!(spec.options["chart"]["height"], 600);
        assert_eq!(spec.options["xaxis"]["type"], "numeric");
    }

    #[test]
    fn slice_and_determinism() {
        let input = vec![calendar("Italy", &[1.0, 2.0, 3.0, 4.0]), calendar("Spain", &[5.0, 6.0, 7.0])];
        let mut c = config(ColorScaleKind::Adaptive);
        c.timeserie_slice = 2;
        let a = build_heatmap(&input, &c);
        assert!(a.series.iter().all(|s| s.data.len() == 2));
        assert_eq!(a, build_heatmap(&input, &c));
        assert_eq!(a.to_json().unwrap(), build_heatmap(&input, &c).to_json().unwrap());
    }
}
