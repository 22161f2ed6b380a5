//! Shaping aligned series into equal-length windows and zipping embedding
//! coordinates back onto their regions.

use cvd_core::{AlignedSeries, RegionKey};
use serde::{Deserialize, Serialize};

use crate::embed::Embedder;
use crate::stress::sammon_stress;
use crate::tsne::{Tsne, TsneParams};
use crate::umap::{Umap, UmapParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    #[default]
    Tsne,
    Umap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMethod {
    Tsne(TsneParams),
    Umap(UmapParams),
}

impl ProjectionMethod {
    pub fn kind(&self) -> ProjectionType {
        match self {
            ProjectionMethod::Tsne(_) => ProjectionType::Tsne,
            ProjectionMethod::Umap(_) => ProjectionType::Umap,
        }
    }

    pub fn embedder(&self) -> Box<dyn Embedder> {
        match self {
            ProjectionMethod::Tsne(params) => Box::new(Tsne::new(*params)),
            ProjectionMethod::Umap(params) => Box::new(Umap::new(*params)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub method: ProjectionMethod,
    /// Points per region fed to the embedding; `0` uses the shortest series.
    pub timeserie_slice: usize,
}

/// One region placed in the plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub name: String,
    pub key: RegionKey,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectionReport {
    pub points: Vec<ProjectedPoint>,
    pub stress: Option<f64>,
}

/// Series long enough for the window, with their first `window` values.
pub fn shape_windows(series: &[AlignedSeries], timeserie_slice: usize) -> (Vec<&AlignedSeries>, Vec<Vec<f64>>) {
    let non_empty: Vec<&AlignedSeries> = series.iter().filter(|s| !s.is_empty()).collect();
    let window = if timeserie_slice > 0 {
        timeserie_slice
    } else {
        non_empty.iter().map(|s| s.data.len()).min().unwrap_or(0)
    };

    let kept: Vec<&AlignedSeries> = non_empty
        .into_iter()
        .filter(|s| s.data.len() >= window)
        .collect();
    let dropped = series.len() - kept.len();
    if dropped > 0 {
        log::info!("{} series shorter than {} points left out of the projection", dropped, window);
    }
    let rows = kept
        .iter()
        .map(|s| s.data[..window].iter().map(|p| p.y).collect())
        .collect();
    (kept, rows)
}

/// Embed each series as one point, preserving input order.
pub fn project(series: &[AlignedSeries], params: &ProjectionParams) -> Vec<ProjectedPoint> {
    project_report(series, params).points
}

pub fn project_report(series: &[AlignedSeries], params: &ProjectionParams) -> ProjectionReport {
    let embedder = params.method.embedder();
    project_with(series, params.timeserie_slice, embedder.as_ref())
}

/// [`project_report`] with any [`Embedder`].
pub fn project_with(series: &[AlignedSeries], timeserie_slice: usize, embedder: &dyn Embedder) -> ProjectionReport {
    let (kept, rows) = shape_windows(series, timeserie_slice);
    if rows.is_empty() {
        return ProjectionReport::default();
    }
    if rows.len() < embedder.min_rows() {
        log::warn!(
            "{} needs at least {} series, got {}; nothing projected",
            embedder.name(),
            embedder.min_rows(),
            rows.len()
        );
        return ProjectionReport::default();
    }

    let coords = embedder.embed(&rows);
    let stress = sammon_stress(&rows, &coords);
    let points = kept
        .into_iter()
        .zip(coords)
        .map(|(s, [x, y])| ProjectedPoint {
            name: s.name.clone(),
            key: s.key.clone(),
            x,
            y,
        })
        .collect();
    ProjectionReport { points, stress }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvd_core::Point;

    fn series(name: &str, ys: &[f64]) -> AlignedSeries {
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

    /// Places row `i` at `(i, first value)`.
    struct Diagonal;

    impl Embedder for Diagonal {
        fn name(&self) -> &'static str {
            "diagonal"
        }

        fn embed(&self, rows: &[Vec<f64>]) -> Vec<[f64; 2]> {
            rows.iter().enumerate().map(|(i, r)| [i as f64, r[0]]).collect()
        }
    }

    #[test]
    fn umap_with_too_few_series_is_empty() {
        let input = vec![
            series("A", &[1.0, 2.0, 3.0]),
            series("B", &[2.0, 3.0, 4.0]),
            series("C", &[5.0, 6.0, 7.0]),
        ];
        let params = ProjectionParams {
            method: ProjectionMethod::Umap(UmapParams {
                neighbors: 5,
                ..UmapParams::default()
            }),
            timeserie_slice: 3,
        };
        assert!(project(&input, &params).is_empty());
    }

    #[test]
    fn short_series_are_excluded_and_order_is_kept() {
        let input = vec![
            series("Zeta", &[9.0, 9.0, 9.0]),
            series("Short", &[1.0]),
            series("Alpha", &[4.0, 5.0, 6.0, 7.0]),
        ];
        let report = project_with(&input, 3, &Diagonal);
        let names: Vec<&str> = report.points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!((report.points[1].x, report.points[1].y), (1.0, 4.0));
        assert!(report.stress.is_some());
    }

    #[test]
    fn zero_slice_uses_shortest_series() {
        let input = vec![series("A", &[1.0, 2.0, 3.0]), series("B", &[4.0, 5.0]), series("C", &[])];
        let (kept, rows) = shape_windows(&input, 0);
        assert_eq!(kept.len(), 2);
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![4.0, 5.0]]);
    }

    #[test]
    fn tsne_projects_every_series() {
        let input: Vec<AlignedSeries> = (0..5)
            .map(|i| series(&format!("R{}", i), &[i as f64, (i * 2) as f64, (i * 3) as f64]))
            .collect();
        let params = ProjectionParams {
            method: ProjectionMethod::Tsne(TsneParams {
                iterations: 50,
                perplexity: 2.0,
                ..TsneParams::default()
            }),
            timeserie_slice: 3,
        };
        let points = project(&input, &params);
        assert_eq!(points.len(), 5);
        assert_eq!(points[3].key, RegionKey::from("R3"));
    }

    #[test]
    fn projection_type_parses_lowercase() {
        let t: ProjectionType = serde_json::from_str("\"umap\"").unwrap();
        assert_eq!(t, ProjectionType::Umap);
        assert_eq!(ProjectionMethod::Tsne(TsneParams::default()).kind(), ProjectionType::Tsne);
    }
}
