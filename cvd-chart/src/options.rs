//! The chart options document: what a user picks in the editor.
//!
//! Parsed from JSON with camelCase keys; missing keys take the defaults
//! below. Older documents name the region selection `selectedCountries`;
//! both spellings are accepted, as a `{ key: bool }` map (disabled entries
//! dropped) or a plain list of keys.

use cvd_core::{Metric, RegionKey};
use cvd_projection::ProjectionType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_TITLE: &str = "Heatmap of Coronavirus Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Heatmap,
    Line,
    Area,
    Bar,
    #[serde(alias = "scatter")]
    Projection,
    Trend,
    Prediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    #[default]
    Log,
}

/// How heatmap cells are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScaleKind {
    #[default]
    Fixed,
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartOptions {
    pub chart_type: ChartType,
    pub metric: Metric,
    pub is_cumulative: bool,
    pub align_at: f64,
    pub show_data_labels: bool,
    pub title: String,
    pub day_interval: u32,
    #[serde(
        alias = "selectedCountries",
        deserialize_with = "deserialize_selection",
        serialize_with = "serialize_selection"
    )]
    pub selected_regions: Vec<RegionKey>,
    pub is_incidence: bool,
    pub moving_average: Option<usize>,
    pub timeserie_slice: usize,
    pub color_scale: ColorScaleKind,
    pub height: u32,

    // trend
    pub scale: Scale,

    // predictions
    pub prediction_days: u32,

    // projections
    pub projection_type: ProjectionType,
    pub epsilon: f64,
    pub perplexity: f64,
    pub iterations: usize,
    pub spread: f64,
    pub neighbors: usize,
    pub min_dist: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            chart_type: ChartType::Heatmap,
            metric: Metric::Cases,
            is_cumulative: true,
            align_at: 0.0,
            show_data_labels: false,
            title: DEFAULT_TITLE.to_string(),
            day_interval: 30,
            selected_regions: Vec::new(),
            is_incidence: false,
            moving_average: None,
            timeserie_slice: 0,
            color_scale: ColorScaleKind::Fixed,
            height: 500,
            scale: Scale::Log,
            prediction_days: 7,
            projection_type: ProjectionType::Tsne,
            epsilon: 10.0,
            perplexity: 10.0,
            iterations: 500,
            spread: 1.0,
            neighbors: 15,
            min_dist: 0.1,
        }
    }
}

impl ChartOptions {
    pub fn from_json(json: &str) -> cvd_core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Selection {
    Flags(BTreeMap<String, bool>),
    Keys(Vec<String>),
}

fn deserialize_selection<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RegionKey>, D::Error> {
    let keys = match Selection::deserialize(deserializer)? {
        Selection::Flags(flags) => flags
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(key, _)| RegionKey::new(key))
            .collect(),
        Selection::Keys(keys) => keys.into_iter().map(RegionKey::new).collect(),
    };
    Ok(keys)
}

fn serialize_selection<S: Serializer>(keys: &[RegionKey], serializer: S) -> Result<S::Ok, S::Error> {
    let flags: BTreeMap<&str, bool> = keys.iter().map(|k| (k.as_str(), true)).collect();
    flags.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let o = ChartOptions::from_json("{}").unwrap();
        assert_eq!(o, ChartOptions::default());
        assert_eq!(o.chart_type, ChartType::Heatmap);
        assert_eq!(o.title, "Heatmap of Coronavirus Data");
        assert_eq!(o.day_interval, 30);
        assert!(o.is_cumulative);
    }

    #[test]
    fn legacy_selection_drops_disabled_regions() {
        let o = ChartOptions::from_json(
            r#"{"chartType": "line", "metric": "deaths",
                "selectedCountries": {"Brazil": true, "Italy": false, "Spain": true}}"#,
        )
        .unwrap();
        assert_eq!(o.chart_type, ChartType::Line);
        assert_eq!(o.metric, Metric::Deaths);
        assert_eq!(
            o.selected_regions,
            vec![RegionKey::from("Brazil"), RegionKey::from("Spain")]
        );
    }

    #[test]
    fn selection_as_list_and_scatter_alias() {
        let o = ChartOptions::from_json(
            r#"{"chartType": "scatter", "projectionType": "umap", "neighbors": 5,
                "selectedRegions": ["Brazil.regions.RS"]}"#,
        )
        .unwrap();
        assert_eq!(o.chart_type, ChartType::Projection);
        assert_eq!(o.projection_type, ProjectionType::Umap);
        assert_eq!(o.neighbors, 5);
        assert_eq!(o.selected_regions[0].country(), "Brazil");
    }

    #[test]
    fn selection_serializes_as_flags() {
        let o = ChartOptions {
            selected_regions: vec![RegionKey::from("Italy")],
            ..ChartOptions::default()
        };
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["selectedRegions"]["Italy"], serde_json::json!(true));
        let back: ChartOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, o);
    }
}
