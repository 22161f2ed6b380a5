//! Per-kind chart configuration assembled from [`ChartOptions`].
//!
//! Each chart kind only sees the options that apply to it, so a projection
//! config has no day interval and a heatmap has no perplexity.

use cvd_core::{CovidError, Metric, Result};
use cvd_data::AlignConfig;
use cvd_projection::{ProjectionMethod, ProjectionParams, ProjectionType, TsneParams, UmapParams};

use crate::options::{ChartOptions, ChartType, ColorScaleKind, Scale};

/// Options shared by every chart kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub title: String,
    pub metric: Metric,
    pub is_cumulative: bool,
    pub align_at: f64,
    pub show_data_labels: bool,
    pub is_incidence: bool,
    pub height: u32,
}

impl DisplayConfig {
    pub fn is_calendar(&self) -> bool {
        self.align_at <= 0.0
    }

    /// `Total Confirmed Cases (per 100k inhab.)` and the like.
    pub fn y_axis_title(&self) -> String {
        format!(
            "{} Confirmed {}{}",
            if self.is_cumulative { "Total" } else { "Daily" },
            self.metric.title(),
            if self.is_incidence { " (per 100k inhab.)" } else { "" }
        )
    }

    /// `Total number of cases` and the like.
    pub fn subtitle(&self) -> String {
        format!(
            "{} number of {}",
            if self.is_cumulative { "Total" } else { "Daily" },
            self.metric.label()
        )
    }

    pub fn align_config(&self, day_interval: u32, moving_average: Option<usize>) -> AlignConfig {
        AlignConfig {
            metric: self.metric,
            is_cumulative: self.is_cumulative,
            day_interval,
            align_at: self.align_at,
            incidence: self.is_incidence,
            moving_average,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Area,
    Bar,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Line => "line",
            SeriesKind::Area => "area",
            SeriesKind::Bar => "bar",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    pub display: DisplayConfig,
    pub day_interval: u32,
    pub timeserie_slice: usize,
    pub color_scale: ColorScaleKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub kind: SeriesKind,
    pub display: DisplayConfig,
    pub day_interval: u32,
    pub timeserie_slice: usize,
    pub moving_average: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub display: DisplayConfig,
    pub params: ProjectionParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub display: DisplayConfig,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionConfig {
    pub display: DisplayConfig,
    pub day_interval: u32,
    pub prediction_days: u32,
}

/// Configuration of one chart, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartConfig {
    Heatmap(HeatmapConfig),
    Series(SeriesConfig),
    Projection(ProjectionConfig),
    Trend(TrendConfig),
    Prediction(PredictionConfig),
}

fn invalid(message: String) -> CovidError {
    CovidError::InvalidConfig(message)
}

fn positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}

impl ChartConfig {
    pub fn from_options(options: &ChartOptions) -> Result<Self> {
        if !options.align_at.is_finite() || options.align_at < 0.0 {
            return Err(invalid(format!("alignAt must be >= 0, got {}", options.align_at)));
        }
        if options.moving_average == Some(0) {
            return Err(invalid("movingAverage must be at least 1".to_string()));
        }

        let display = DisplayConfig {
            title: options.title.clone(),
            metric: options.metric,
            is_cumulative: options.is_cumulative,
            align_at: options.align_at,
            show_data_labels: options.show_data_labels,
            is_incidence: options.is_incidence,
            height: options.height,
        };

        let series = |kind| {
            ChartConfig::Series(SeriesConfig {
                kind,
                display: display.clone(),
                day_interval: options.day_interval,
                timeserie_slice: options.timeserie_slice,
                moving_average: options.moving_average,
            })
        };

        let config = match options.chart_type {
            ChartType::Heatmap => ChartConfig::Heatmap(HeatmapConfig {
                display: display.clone(),
                day_interval: options.day_interval,
                timeserie_slice: options.timeserie_slice,
                color_scale: options.color_scale,
            }),
            ChartType::Line => series(SeriesKind::Line),
            ChartType::Area => series(SeriesKind::Area),
            ChartType::Bar => series(SeriesKind::Bar),
            ChartType::Trend => ChartConfig::Trend(TrendConfig {
                display: display.clone(),
                scale: options.scale,
            }),
            ChartType::Prediction => ChartConfig::Prediction(PredictionConfig {
                display: display.clone(),
                day_interval: options.day_interval,
                prediction_days: options.prediction_days,
            }),
            ChartType::Projection => {
                let method = match options.projection_type {
                    ProjectionType::Tsne => {
                        if options.iterations == 0 {
                            return Err(invalid("iterations must be at least 1".to_string()));
                        }
                        ProjectionMethod::Tsne(TsneParams {
                            epsilon: positive("epsilon", options.epsilon)?,
                            perplexity: positive("perplexity", options.perplexity)?,
                            iterations: options.iterations,
                            ..TsneParams::default()
                        })
                    }
                    ProjectionType::Umap => {
                        if options.neighbors == 0 {
                            return Err(invalid("neighbors must be at least 1".to_string()));
                        }
                        if !(options.min_dist >= 0.0) {
                            return Err(invalid(format!("minDist must be >= 0, got {}", options.min_dist)));
                        }
                        ProjectionMethod::Umap(UmapParams {
                            neighbors: options.neighbors,
                            spread: positive("spread", options.spread)?,
                            min_dist: options.min_dist,
                            ..UmapParams::default()
                        })
                    }
                };
                ChartConfig::Projection(ProjectionConfig {
                    display: display.clone(),
                    params: ProjectionParams {
                        method,
                        timeserie_slice: options.timeserie_slice,
                    },
                })
            }
        };
        Ok(config)
    }

    pub fn display(&self) -> &DisplayConfig {
        match self {
            ChartConfig::Heatmap(c) => &c.display,
            ChartConfig::Series(c) => &c.display,
            ChartConfig::Projection(c) => &c.display,
            ChartConfig::Trend(c) => &c.display,
            ChartConfig::Prediction(c) => &c.display,
        }
    }

    /// Alignment for the kinds that plot aligned series over calendar days or
    /// days since a threshold.
    pub fn align_config(&self) -> Option<AlignConfig> {
        match self {
            ChartConfig::Heatmap(c) => Some(c.display.align_config(c.day_interval, None)),
            ChartConfig::Series(c) => Some(c.display.align_config(c.day_interval, c.moving_average)),
            ChartConfig::Projection(_) | ChartConfig::Trend(_) | ChartConfig::Prediction(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_by_default() {
        let config = ChartConfig::from_options(&ChartOptions::default()).unwrap();
        let ChartConfig::Heatmap(heatmap) = &config else {
            panic!("expected heatmap, got {:?}", config);
        };
        assert_eq!(heatmap.day_interval, 30);
        assert_eq!(config.display().title, "Heatmap of Coronavirus Data");
        assert!(config.align_config().unwrap().is_calendar());
    }

    #[test]
    fn series_kinds() {
        for (chart_type, kind) in [
            (ChartType::Line, SeriesKind::Line),
            (ChartType::Area, SeriesKind::Area),
            (ChartType::Bar, SeriesKind::Bar),
        ] {
            let options = ChartOptions {
                chart_type,
                moving_average: Some(7),
                ..ChartOptions::default()
            };
            match ChartConfig::from_options(&options).unwrap() {
                ChartConfig::Series(c) => {
                    assert_eq!(c.kind, kind);
                    assert_eq!(c.moving_average, Some(7));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn projection_params_are_validated() {
        let options = ChartOptions {
            chart_type: ChartType::Projection,
            projection_type: ProjectionType::Umap,
            neighbors: 5,
            timeserie_slice: 20,
            ..ChartOptions::default()
        };
        let ChartConfig::Projection(p) = ChartConfig::from_options(&options).unwrap() else {
            panic!("expected projection");
        };
        assert_eq!(p.params.timeserie_slice, 20);
        assert!(matches!(p.params.method, ProjectionMethod::Umap(u) if u.neighbors == 5));

        let bad = ChartOptions {
            chart_type: ChartType::Projection,
            epsilon: 0.0,
            ..ChartOptions::default()
        };
        assert!(matches!(
            ChartConfig::from_options(&bad),
            Err(CovidError::InvalidConfig(_))
        ));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let options = ChartOptions {
            align_at: -1.0,
            ..ChartOptions::default()
        };
        assert!(ChartConfig::from_options(&options).is_err());
    }

    #[test]
    fn axis_titles() {
        let mut display = ChartConfig::from_options(&ChartOptions::default())
            .unwrap()
            .display()
            .clone();
        assert_eq!(display.y_axis_title(), "Total Confirmed Cases");
        display.is_cumulative = false;
        display.metric = Metric::Deaths;
        display.is_incidence = true;
        assert_eq!(display.y_axis_title(), "Daily Confirmed Deaths (per 100k inhab.)");
        assert_eq!(display.subtitle(), "Daily number of deaths");
    }
}
