//! Fetch plus normalization, with normalized series cached per region.

use chrono::NaiveDate;
use cvd_core::{config::RegionConfigTable, AlignedSeries, RegionInfo, RegionKey, TimeseriesRow};
use cvd_data::{align_series, normalize, AlignConfig};
use std::collections::HashSet;
use std::rc::Rc;

use crate::cache::{MemoryCache, RegionCache};
use crate::fetcher::{FetchError, RegionFetcher, Rows};
use crate::generation::LatestRequest;
use crate::source::FileSource;

/// A region's normalized series, or the reason it has none.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub info: RegionInfo,
    pub series: Rc<Vec<TimeseriesRow>>,
    pub error: Option<FetchError>,
}

impl RegionData {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn align(&self, config: &AlignConfig, today: NaiveDate) -> AlignedSeries {
        align_series(&self.info, &self.series, config, today)
    }
}

pub struct RegionLoader<S, C = MemoryCache<Rows>> {
    fetcher: RegionFetcher<S, C>,
    families: RegionConfigTable,
    series: MemoryCache<Rc<Vec<TimeseriesRow>>>,
    latest: LatestRequest,
}

impl<S: FileSource, C: RegionCache<Rows>> RegionLoader<S, C> {
    pub fn new(fetcher: RegionFetcher<S, C>, families: RegionConfigTable) -> Self {
        RegionLoader {
            fetcher,
            families,
            series: MemoryCache::new(),
            latest: LatestRequest::new(),
        }
    }

    pub fn fetcher(&self) -> &RegionFetcher<S, C> {
        &self.fetcher
    }

    pub fn invalidate(&self, key: &RegionKey) {
        self.series.invalidate(key);
        self.fetcher.invalidate(key);
    }

    /// Normalized data for every distinct key, in request order. Keys whose
    /// file could not be fetched come back with an empty series and the error.
    pub async fn load(&self, keys: &[RegionKey]) -> Vec<RegionData> {
        let mut seen = HashSet::new();
        let keys: Vec<&RegionKey> = keys.iter().filter(|k| seen.insert(*k)).collect();

        let missing: Vec<RegionKey> = keys
            .iter()
            .filter(|k| self.series.get(k).is_none())
            .map(|k| (*k).clone())
            .collect();
        let mut batch = self.fetcher.fetch(&missing).await;

        keys.into_iter()
            .map(|key| {
                let info = self.fetcher.resolver().resolve(key);
                if let Some(series) = self.series.get(key) {
                    return RegionData {
                        info,
                        series,
                        error: None,
                    };
                }
                match batch.rows.remove(key) {
                    Some(rows) => {
                        let family = self.families.family_for(&info);
                        let series = Rc::new(normalize(&rows, &info, &family));
                        log::debug!("normalized {} into {} days", key, series.len());
                        self.series.set(key.clone(), Rc::clone(&series));
                        RegionData {
                            info,
                            series,
                            error: None,
                        }
                    }
                    None => RegionData {
                        info,
                        series: Rc::new(Vec::new()),
                        error: batch.failures.remove(key),
                    },
                }
            })
            .collect()
    }

    /// Like [`load`](Self::load), but `None` when another call started while
    /// this one was waiting; only the newest key set is delivered.
    pub async fn load_latest(&self, keys: &[RegionKey]) -> Option<Vec<RegionData>> {
        let ticket = self.latest.begin();
        let data = self.load(keys).await;
        self.latest.accept(ticket, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use cvd_core::MetadataResolver;

    const METADATA: &str = r#"{
        "Italy": { "name": "Italy", "geoId": "IT", "population": 60000000, "file": "data/italy.csv" },
        "Spain": { "name": "Spain", "geoId": "ES", "file": "data/spain.csv" }
    }"#;

    const ITALY: &str = "dateRep,cases,deaths\n\
                         01/04/2020,10,1\n\
                         03/04/2020,5,0\n";

    fn loader(source: Rc<FakeSource>) -> RegionLoader<Rc<FakeSource>> {
        let resolver = Rc::new(MetadataResolver::from_json(METADATA).unwrap());
        RegionLoader::new(
            RegionFetcher::new(source, resolver),
            RegionConfigTable::builtin(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, 3).unwrap()
    }

    #[tokio::test]
    async fn partial_fetch_failure_leaves_other_regions_intact() {
        let source = Rc::new(
            FakeSource::new()
                .with_file("data/italy.csv", ITALY)
                .with_failure("data/spain.csv"),
        );
        let loader = loader(source);
        let data = loader
            .load(&[RegionKey::from("Italy"), RegionKey::from("Spain")])
            .await;

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].info.display_name, "Italy");
        assert!(!data[0].failed());
        assert_eq!(data[0].series.len(), 3);

        assert!(data[1].failed());
        assert!(data[1].series.is_empty());

        let config = AlignConfig {
            day_interval: 2,
            ..AlignConfig::default()
        };
        let italy = data[0].align(&config, today());
        let spain = data[1].align(&config, today());
        assert!(!italy.is_empty());
        assert_eq!(italy.last_y(), 15.0);
        assert!(spain.data.iter().all(|p| p.y == 0.0));
    }

    #[tokio::test]
    async fn normalized_series_are_cached() {
        let source = Rc::new(FakeSource::new().with_file("data/italy.csv", ITALY));
        let loader = loader(Rc::clone(&source));
        let keys = [RegionKey::from("Italy"), RegionKey::from("Italy")];

        let first = loader.load(&keys).await;
        assert_eq!(first.len(), 1);
        let second = loader.load(&keys).await;
        assert!(Rc::ptr_eq(&first[0].series, &second[0].series));
        assert_eq!(source.calls("data/italy.csv"), 1);

        loader.invalidate(&RegionKey::from("Italy"));
        loader.load(&keys).await;
        assert_eq!(source.calls("data/italy.csv"), 2);
    }

    #[tokio::test]
    async fn superseded_request_is_discarded() {
        let source = Rc::new(
            FakeSource::new()
                .with_file("data/italy.csv", ITALY)
                .with_file("data/spain.csv", "dateRep,cases,deaths\n01/04/2020,3,0\n")
                .yielding(),
        );
        let loader = loader(source);
        let italy = [RegionKey::from("Italy")];
        let spain = [RegionKey::from("Spain")];

        let (old, new) = futures::join!(loader.load_latest(&italy), loader.load_latest(&spain));
        assert!(old.is_none());
        let new = new.unwrap();
        assert_eq!(new[0].info.key, RegionKey::from("Spain"));
    }
}
