//! Projecting regions into the plane by the shape of their series.
//!
//! Each region's aligned series is cut to a common window and embedded as a
//! single 2-D point with t-SNE or UMAP. The [`Embedder`] trait lets callers
//! plug in another algorithm.

pub mod embed;
pub mod project;
pub mod stress;
pub mod tsne;
pub mod umap;

pub use embed::Embedder;
pub use project::{
    project, project_report, project_with, shape_windows, ProjectedPoint, ProjectionMethod, ProjectionParams,
    ProjectionReport, ProjectionType,
};
pub use stress::sammon_stress;
pub use tsne::{Tsne, TsneParams};
pub use umap::{Umap, UmapParams};
