//! Fetching raw rows for a set of regions.
//!
//! Keys are grouped by the file that backs them, so sibling sub-regions
//! stored in one CSV cost one download. A file that is already being
//! downloaded is not requested again: later callers await the same shared
//! future. Files are fetched concurrently and one failing file only fails
//! the keys it backs.

use cvd_core::{CovidError, MetadataResolver, RawRow, RegionKey};
use futures::future::{join_all, FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::cache::{MemoryCache, RegionCache};
use crate::source::FileSource;

/// Rows of one backing file, shared by every region stored in it.
pub type Rows = Rc<Vec<RawRow>>;

/// Failure shared by every key of the file that failed.
pub type FetchError = Rc<CovidError>;

type FileLoad = Shared<LocalBoxFuture<'static, Result<Rows, FetchError>>>;

/// Outcome of one [`RegionFetcher::fetch`]. Every requested key lands in
/// exactly one of the two maps.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub rows: HashMap<RegionKey, Rows>,
    pub failures: HashMap<RegionKey, FetchError>,
}

impl FetchBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RegionFetcher<S, C = MemoryCache<Rows>> {
    source: S,
    resolver: Rc<MetadataResolver>,
    cache: C,
    in_flight: Rc<RefCell<HashMap<String, FileLoad>>>,
}

impl<S: FileSource> RegionFetcher<S> {
    pub fn new(source: S, resolver: Rc<MetadataResolver>) -> Self {
        Self::with_cache(source, resolver, MemoryCache::new())
    }
}

impl<S: FileSource, C: RegionCache<Rows>> RegionFetcher<S, C> {
    pub fn with_cache(source: S, resolver: Rc<MetadataResolver>, cache: C) -> Self {
        RegionFetcher {
            source,
            resolver,
            cache,
            in_flight: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Forget the rows of one region so the next fetch downloads them again.
    pub fn invalidate(&self, key: &RegionKey) -> bool {
        self.cache.invalidate(key)
    }

    /// Number of files currently being downloaded.
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Raw rows for every key. Cached keys are answered without touching
    /// the source.
    pub async fn fetch(&self, keys: &[RegionKey]) -> FetchBatch {
        let mut batch = FetchBatch::default();
        let mut by_file: BTreeMap<String, Vec<RegionKey>> = BTreeMap::new();

        for key in keys {
            if batch.rows.contains_key(key) || batch.failures.contains_key(key) {
                continue;
            }
            if let Some(rows) = self.cache.get(key) {
                log::debug!("cache hit for {}", key);
                batch.rows.insert(key.clone(), rows);
                continue;
            }
            match self.resolver.resolve(key).file {
                Some(file) => by_file.entry(file).or_default().push(key.clone()),
                None => {
                    log::warn!("no backing file for {}", key);
                    batch
                        .failures
                        .insert(key.clone(), Rc::new(CovidError::MissingFile(key.to_string())));
                }
            }
        }

        let loads: Vec<FileLoad> = by_file.keys().map(|file| self.load_file(file)).collect();
        let results = join_all(loads).await;

        for ((file, file_keys), result) in by_file.into_iter().zip(results) {
            match result {
                Ok(rows) => {
                    for key in file_keys {
                        self.cache.set(key.clone(), Rc::clone(&rows));
                        batch.rows.insert(key, Rc::clone(&rows));
                    }
                }
                Err(e) => {
                    log::warn!("fetch of {} failed for {} region(s): {}", file, file_keys.len(), e);
                    for key in file_keys {
                        batch.failures.insert(key, Rc::clone(&e));
                    }
                }
            }
        }
        batch
    }

    /// Shared download of one file, joining a download already in flight.
    fn load_file(&self, file: &str) -> FileLoad {
        let mut in_flight = self.in_flight.borrow_mut();
        if let Some(pending) = in_flight.get(file) {
            log::debug!("joining in-flight download of {}", file);
            return pending.clone();
        }

        log::info!("fetching {}", file);
        let body = self.source.load(file);
        let registry = Rc::clone(&self.in_flight);
        let name = file.to_string();
        let load = async move {
            let result = body.await.and_then(|text| RawRow::parse_csv(&text));
            registry.borrow_mut().remove(&name);
            match result {
                Ok(rows) => {
                    log::info!("fetched {} ({} rows)", name, rows.len());
                    Ok(Rc::new(rows))
                }
                Err(e) => Err(Rc::new(e)),
            }
        }
        .boxed_local()
        .shared();

        in_flight.insert(file.to_string(), load.clone());
        load
    }
}
