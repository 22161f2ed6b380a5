//! Where file bodies come from.

use cvd_core::{CovidError, MetadataResolver, Result};
use cvd_store::{namespaced_key, Store};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::path::PathBuf;
use std::rc::Rc;

/// Path of the metadata document, relative to the data root.
pub const METADATA_FILE: &str = "data/metadata.json";

pub type LoadFuture = LocalBoxFuture<'static, Result<String>>;

/// A store of files addressed by paths relative to the data root
/// (`data/brazil.csv`, [`METADATA_FILE`], ...).
///
/// The returned future owns everything it needs so callers can share it
/// between concurrent requests.
pub trait FileSource {
    fn load(&self, path: &str) -> LoadFuture;
}

impl<S: FileSource + ?Sized> FileSource for Rc<S> {
    fn load(&self, path: &str) -> LoadFuture {
        (**self).load(path)
    }
}

/// Files read from a local checkout of the data repository.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }
}

impl FileSource for DirectorySource {
    fn load(&self, path: &str) -> LoadFuture {
        let full = self.root.join(path.trim_start_matches('/'));
        log::debug!("reading {}", full.display());
        let result = std::fs::read_to_string(&full).map_err(CovidError::from);
        future::ready(result).boxed_local()
    }
}

/// Wraps a source with the persisted store.
///
/// Fresh entries are served without touching the inner source. Otherwise the
/// inner source is asked; a successful body is saved, and on failure a stale
/// entry is served instead when one exists.
#[derive(Clone)]
pub struct CachedSource<S> {
    inner: S,
    store: Store,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, store: Store) -> Self {
        CachedSource { inner, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

fn store_key(path: &str) -> String {
    if path == METADATA_FILE {
        namespaced_key("metadata", path)
    } else {
        namespaced_key("file", path)
    }
}

impl<S: FileSource> FileSource for CachedSource<S> {
    fn load(&self, path: &str) -> LoadFuture {
        let key = store_key(path);
        let cached = match self.store.get::<String>(&key) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("store read failed for {}: {}", key, e);
                None
            }
        };
        if let Some(entry) = &cached {
            if entry.fresh {
                log::debug!("store hit for {}", path);
                return future::ready(Ok(entry.value.clone())).boxed_local();
            }
        }

        let store = self.store.clone();
        let pending = self.inner.load(path);
        let path = path.to_string();
        async move {
            match pending.await {
                Ok(body) => {
                    if let Err(e) = store.put(&key, &body) {
                        log::warn!("store write failed for {}: {}", key, e);
                    }
                    Ok(body)
                }
                Err(e) => match cached {
                    Some(entry) => {
                        log::warn!(
                            "fetch of {} failed ({}), serving copy saved at {}",
                            path,
                            e,
                            entry.saved_at
                        );
                        Ok(entry.value)
                    }
                    None => Err(e),
                },
            }
        }
        .boxed_local()
    }
}

/// Load and parse the metadata document.
pub async fn load_metadata<S: FileSource + ?Sized>(source: &S) -> Result<MetadataResolver> {
    let body = source.load(METADATA_FILE).await?;
    let resolver = MetadataResolver::from_json(&body)?;
    log::info!(
        "loaded metadata for {} countries",
        resolver.tree().0.len()
    );
    Ok(resolver)
}
