//! Chart building for the COVID-19 dashboard.
//!
//! - [`options`]: the JSON options document a user edits
//! - [`config`]: per-kind configuration validated from the options
//! - [`builders`]: pure functions producing a [`ChartSpec`]
//! - [`colors`] and [`format`]: color scales and label formatting

pub mod builders;
pub mod colors;
pub mod config;
pub mod format;
pub mod options;
pub mod spec;

pub use builders::{
    build_chart, build_heatmap, build_prediction, build_projection, build_series_chart, build_trend, project_regions,
    prediction_series, projection_input, trend_series, PredictionSeries, ProjectionSeries, TrendSeries,
};
pub use config::{ChartConfig, DisplayConfig};
pub use options::{ChartOptions, ChartType};
pub use spec::ChartSpec;
