//! Source, metadata and loader shared by the commands.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use cvd_core::{config::RegionConfigTable, MetadataResolver, RegionKey, TimeseriesRow};
use cvd_fetch::{
    load_metadata, CachedSource, DirectorySource, FileSource, HttpSource, RegionData, RegionFetcher, RegionLoader,
    METADATA_FILE,
};
use cvd_store::Store;
use log::{info, warn};
use std::rc::Rc;

use crate::SourceArgs;

pub type SharedSource = Rc<dyn FileSource>;

const STORE_FILE: &str = "cache.sqlite3";

pub struct Session {
    loader: RegionLoader<SharedSource>,
    today: NaiveDate,
}

/// The file source described by the arguments: a local directory or HTTP,
/// wrapped with the persisted store unless disabled.
pub fn build_source(args: &SourceArgs) -> anyhow::Result<SharedSource> {
    let base: SharedSource = match &args.data_dir {
        Some(dir) => {
            info!("reading data files from {}", dir.display());
            Rc::new(DirectorySource::new(dir))
        }
        None => {
            let mut http = HttpSource::new(&args.data_url);
            if let Some(url) = &args.metadata_url {
                http = http.pin(METADATA_FILE, url);
            }
            Rc::new(http)
        }
    };
    if args.no_cache || args.data_dir.is_some() {
        return Ok(base);
    }

    let path = match &args.cache_dir {
        Some(dir) => dir.join(STORE_FILE),
        None => match cvd_store::default_path() {
            Some(path) => path,
            None => {
                warn!("no cache directory available, running without the persisted cache");
                return Ok(base);
            }
        },
    };
    let store = Store::open(&path)
        .with_context(|| format!("opening cache {}", path.display()))?
        .with_ttl(chrono::Duration::minutes(args.cache_ttl_minutes));
    Ok(Rc::new(CachedSource::new(base, store)))
}

impl Session {
    pub async fn open(args: &SourceArgs) -> anyhow::Result<Self> {
        let source = build_source(args)?;
        let families = match &args.region_config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading region config {}", path.display()))?;
                RegionConfigTable::from_json(&json)?
            }
            None => RegionConfigTable::builtin(),
        };
        let today = args.today.unwrap_or_else(|| Local::now().naive_local().date());
        Self::with_source(source, families, today).await
    }

    pub async fn with_source(source: SharedSource, families: RegionConfigTable, today: NaiveDate) -> anyhow::Result<Self> {
        let resolver = load_metadata(&source).await.context("loading region metadata")?;
        let fetcher = RegionFetcher::new(source, Rc::new(resolver));
        Ok(Session {
            loader: RegionLoader::new(fetcher, families),
            today,
        })
    }

    pub fn resolver(&self) -> &MetadataResolver {
        self.loader.fetcher().resolver()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Load regions, logging the ones that failed. Failed regions are kept
    /// with an empty series.
    pub async fn load(&self, keys: &[RegionKey]) -> Vec<RegionData> {
        let data = self.loader.load(keys).await;
        for region in data.iter().filter(|r| r.failed()) {
            if let Some(e) = &region.error {
                warn!("no data for {}: {}", region.info.key, e);
            }
        }
        data
    }
}

/// Borrowed `(info, rows)` pairs, the shape the chart builders take.
pub fn as_pairs(data: &[RegionData]) -> Vec<(&cvd_core::RegionInfo, &[TimeseriesRow])> {
    data.iter().map(|r| (&r.info, r.series.as_slice())).collect()
}

pub fn parse_keys(keys: &[String]) -> Vec<RegionKey> {
    keys.iter().map(|k| RegionKey::new(k.as_str())).collect()
}
