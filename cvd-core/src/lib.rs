//! Core types shared by every `cvd-*` crate.
//!
//! - [`region`]: region keys and raw CSV rows
//! - [`timeseries`]: normalized rows and aligned chart series
//! - [`metadata`]: the metadata tree and the memoizing region resolver
//! - [`config`]: per-country column/date-format overrides
//! - [`date_range`]: inclusive calendar-day iteration

pub mod config;
pub mod date_range;
pub mod error;
pub mod metadata;
pub mod region;
pub mod timeseries;

pub use error::{CovidError, Result};
pub use metadata::{MetadataResolver, MetadataTree, RegionInfo};
pub use region::{RawRow, RegionKey};
pub use timeseries::{AlignedSeries, Metric, Point, TimeseriesRow};
