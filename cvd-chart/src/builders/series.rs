use cvd_core::AlignedSeries;
use cvd_data::align::slice_series;
use serde_json::json;

use super::{aligned_spec, title_json, x_axis_json};
use crate::colors::series_colors;
use crate::config::{SeriesConfig, SeriesKind};
use crate::spec::ChartSpec;

/// Line, area and bar charts: one series per region, ordered by name.
pub fn build_series_chart(series: &[AlignedSeries], config: &SeriesConfig) -> ChartSpec {
    let display = &config.display;
    let mut series: Vec<AlignedSeries> = series.iter().filter(|s| !s.is_empty()).cloned().collect();
    slice_series(&mut series, config.timeserie_slice);
    series.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<(&str, &str)> = series.iter().map(|s| (s.name.as_str(), s.key.as_str())).collect();
    let colors = series_colors(&names);

    let kind = config.kind.as_str();
    let mut options = json!({
        "chart": { "type": kind, "height": display.height, "stacked": false },
        "title": title_json(display, "18px"),
        "colors": colors,
        "dataLabels": { "enabled": display.show_data_labels },
        "stroke": { "curve": "straight", "width": 2 },
        "xaxis": x_axis_json(display),
        "yaxis": {
            "title": { "text": display.y_axis_title() },
            "labels": { "format": "si" },
        },
        "legend": { "show": true, "position": "bottom" },
    });
    if config.kind == SeriesKind::Area {
        options["fill"] = json!({ "type": "gradient", "gradient": { "opacityFrom": 0.6, "opacityTo": 0.1 } });
    }

    ChartSpec {
        chart_type: kind.to_string(),
        height: display.height,
        options,
        series: series
            .iter()
            .zip(colors)
            .map(|(s, color)| aligned_spec(s, Some(color), display))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::colors::CATEGORY10;

    fn config(kind: SeriesKind) -> SeriesConfig {
        SeriesConfig {
            kind,
            display: display(),
            day_interval: 30,
            timeserie_slice: 0,
            moving_average: None,
        }
    }

    #[test]
    fn sorted_by_name_with_palette_colors() {
        let input = vec![calendar("Spain", &[3.0]), calendar("Brazil", &[1.0]), calendar("Italy", &[])];
        let spec = build_series_chart(&input, &config(SeriesKind::Line));
        let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Brazil", "Spain"]);
        assert_eq!(spec.series[0].color.as_deref(), Some(CATEGORY10[0]));
        assert_eq!(spec.options["colors"][1], CATEGORY10[1]);
        assert_eq!(spec.options["yaxis"]["title"]["text"], "Total Confirmed Cases");
        assert!(spec.options.get("fill").is_none());
    }

    #[test]
    fn kind_sets_chart_type() {
        let input = vec![days_since("Italy", &[100.0, 150.0])];
        let mut c = config(SeriesKind::Area);
        c.display.align_at = 100.0;
        let spec = build_series_chart(&input, &c);
        assert_eq!(spec.chart_type, "area");
        assert_eq!(spec.options["chart"]["type"], "area");
        assert_eq!(spec.options["fill"]["type"], "gradient");
        assert_eq!(spec.series[0].data[1].tooltip.x.as_deref(), Some("2nd day after 100 cases"));

        let bar = build_series_chart(&input, &config(SeriesKind::Bar));
        assert_eq!(bar.chart_type, "bar");
    }

    #[test]
    fn data_labels_when_enabled() {
        let mut c = config(SeriesKind::Line);
        c.display.show_data_labels = true;
        let spec = build_series_chart(&[calendar("Italy", &[1500.0])], &c);
        assert_eq!(spec.series[0].data[0].label.as_deref(), Some("1.5k"));
        assert_eq!(spec.options["dataLabels"]["enabled"], true);
    }
}
