//! Region data fetching.
//!
//! - [`source`]: the [`FileSource`] trait, a local directory source, and a
//!   wrapper that serves from the persisted store
//! - [`fetcher`]: [`RegionFetcher`], grouping keys by backing file and
//!   sharing in-flight downloads
//! - [`loader`]: [`RegionLoader`], fetch plus normalization
//! - [`generation`]: discarding results of superseded requests
//! - `http` (feature `api`): [`HttpSource`] for the public data repository

pub mod cache;
pub mod fetcher;
pub mod generation;
#[cfg(feature = "api")]
pub mod http;
pub mod loader;
pub mod source;

#[cfg(test)]
mod testing;

pub use cache::{MemoryCache, RegionCache};
pub use fetcher::{FetchBatch, FetchError, RegionFetcher, Rows};
pub use generation::{LatestRequest, Ticket};
#[cfg(feature = "api")]
pub use http::HttpSource;
pub use loader::{RegionData, RegionLoader};
pub use source::{load_metadata, CachedSource, DirectorySource, FileSource, METADATA_FILE};
