//! Data processing for regional COVID-19 series.
//!
//! This crate turns raw CSV rows into gap-free daily series and re-indexes
//! them into chart-ready [`AlignedSeries`](cvd_core::AlignedSeries).

pub mod align;
pub mod measures;
pub mod normalize;
pub mod predict;

pub use align::{align, align_series, AlignConfig};
pub use normalize::normalize;
