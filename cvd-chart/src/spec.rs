//! Renderer-neutral chart description produced by the builders.

use cvd_core::RegionKey;
use serde::Serialize;
use serde_json::Value;

/// A chart ready to hand to a charting widget: its options object plus
/// series whose points carry their preformatted tooltip text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub height: u32,
    pub options: Value,
    pub series: Vec<SeriesSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    pub key: RegionKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub data: Vec<PointSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSpec {
    pub x: f64,
    pub y: f64,
    /// Data label, present when labels are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub tooltip: Tooltip,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_prediction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    pub y: String,
}

impl ChartSpec {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
