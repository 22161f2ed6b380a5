use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

use crate::error::Result;

/// Separator between hierarchy levels in a region key.
pub const REGION_SEPARATOR: &str = ".regions.";

/// Maximum hierarchy depth supported: country, region, sub-region.
pub const MAX_REGION_DEPTH: usize = 3;

/// A dot-delimited hierarchical region identifier, e.g. `"Brazil.regions.RS"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn new(key: impl Into<String>) -> Self {
        RegionKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hierarchy segments, country first.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split(REGION_SEPARATOR).collect()
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// The country segment.
    pub fn country(&self) -> &str {
        self.0.split(REGION_SEPARATOR).next().unwrap_or(&self.0)
    }

    /// The last segment, which is what sub-region rows are matched against.
    pub fn id(&self) -> &str {
        self.0.rsplit(REGION_SEPARATOR).next().unwrap_or(&self.0)
    }

    pub fn is_country(&self) -> bool {
        !self.0.contains(REGION_SEPARATOR)
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionKey {
    fn from(value: &str) -> Self {
        RegionKey::new(value)
    }
}

impl From<String> for RegionKey {
    fn from(value: String) -> Self {
        RegionKey(value)
    }
}

/// One CSV row as delivered by a source file: column name to raw string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow(HashMap<String, String>);

impl RawRow {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RawRow(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Trimmed value of a column; empty cells read as missing.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Numeric value of a column. Missing or malformed cells yield `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Parse a CSV body with a header line into rows.
    ///
    /// Records that fail to parse are skipped; a body whose header cannot be
    /// read is an error.
    pub fn parse_csv(body: &str) -> Result<Vec<RawRow>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers = rdr.headers()?.clone();

        let mut rows = Vec::new();
        let mut skipped = 0u32;
        for result in rdr.records() {
            let record = match result {
                Ok(r) => r,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            rows.push(RawRow(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.trim().to_string(), v.to_string()))
                    .collect(),
            ));
        }
        if skipped > 0 {
            log::warn!("skipped {} unreadable CSV records", skipped);
        }
        Ok(rows)
    }
}
