//! Region-family configuration: which columns and date format a country's
//! files use, and whether their values are daily increments or running totals.
//!
//! The table is keyed by country id. Lookups that find no override use the
//! default entry for the region's level (country file or sub-region file).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CovidError, Result};
use crate::metadata::RegionInfo;

/// How a source file reports a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSemantics {
    /// Each row holds that day's new count.
    Incremental,
    /// Each row holds the running total to date.
    Cumulative,
}

/// Fully resolved column layout for one family of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub date_column: String,
    /// chrono format string, e.g. `%d/%m/%Y`
    pub date_format: String,
    pub cases_column: String,
    pub deaths_column: String,
    pub semantics: ValueSemantics,
}

impl FamilyConfig {
    /// Country-level files: ECDC layout with daily increments.
    pub fn country_default() -> Self {
        FamilyConfig {
            date_column: "dateRep".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            cases_column: "cases".to_string(),
            deaths_column: "deaths".to_string(),
            semantics: ValueSemantics::Incremental,
        }
    }

    /// Sub-region files: ISO dates with running totals.
    pub fn subregion_default() -> Self {
        FamilyConfig {
            date_column: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            cases_column: "cases".to_string(),
            deaths_column: "deaths".to_string(),
            semantics: ValueSemantics::Cumulative,
        }
    }

    fn with_override(mut self, o: &FamilyOverride) -> Self {
        if let Some(c) = &o.date_column {
            self.date_column = c.clone();
        }
        if let Some(f) = &o.date_format {
            self.date_format = f.clone();
        }
        if let Some(c) = &o.cases_column {
            self.cases_column = c.clone();
        }
        if let Some(c) = &o.deaths_column {
            self.deaths_column = c.clone();
        }
        if let Some(s) = o.semantics {
            self.semantics = s;
        }
        self
    }
}

/// Partial layout; unset fields fall back to the level default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyOverride {
    pub date_column: Option<String>,
    pub date_format: Option<String>,
    pub cases_column: Option<String>,
    pub deaths_column: Option<String>,
    pub semantics: Option<ValueSemantics>,
}

/// Overrides for one country, split by file level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryOverride {
    /// Applies to the country's own file.
    pub country: FamilyOverride,
    /// Applies to every sub-region file of the country.
    pub regions: FamilyOverride,
}

/// Explicit dispatch table from country id to file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfigTable {
    pub country_default: FamilyConfig,
    pub subregion_default: FamilyConfig,
    pub overrides: BTreeMap<String, CountryOverride>,
}

impl Default for RegionConfigTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RegionConfigTable {
    /// Table with the known per-country overrides.
    pub fn builtin() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "Brazil".to_string(),
            CountryOverride {
                country: FamilyOverride::default(),
                regions: FamilyOverride {
                    cases_column: Some("confirmed".to_string()),
                    ..FamilyOverride::default()
                },
            },
        );
        RegionConfigTable {
            country_default: FamilyConfig::country_default(),
            subregion_default: FamilyConfig::subregion_default(),
            overrides,
        }
    }

    /// Builtin table extended with overrides from a JSON object keyed by
    /// country id. Entries in the JSON replace builtin entries for the same
    /// country.
    pub fn from_json(json: &str) -> Result<Self> {
        let extra: BTreeMap<String, CountryOverride> = serde_json::from_str(json)?;
        let mut table = Self::builtin();
        for (country, o) in extra {
            if country.trim().is_empty() {
                return Err(CovidError::InvalidConfig(
                    "empty country id in region config".to_string(),
                ));
            }
            table.overrides.insert(country, o);
        }
        Ok(table)
    }

    /// Resolve the layout for a region.
    pub fn family_for(&self, info: &RegionInfo) -> FamilyConfig {
        let country = info.key.country();
        let o = self.overrides.get(country);
        if info.is_country {
            let base = self.country_default.clone();
            match o {
                Some(o) => base.with_override(&o.country),
                None => base,
            }
        } else {
            let base = self.subregion_default.clone();
            match o {
                Some(o) => base.with_override(&o.regions),
                None => base,
            }
        }
    }
}

/// Column that names the sub-region in rows of the given place type.
///
/// Sibling sub-regions share one file; rows are matched by reading the column
/// for their `place_type` and comparing it with the region id.
pub fn place_type_column(place_type: &str) -> Option<&'static str> {
    match place_type {
        "state" => Some("state"),
        "city" => Some("city"),
        "county" => Some("county"),
        "autonomous_community" | "country" | "nhsr" | "utla" | "health_board" | "lgd" => {
            Some("region")
        }
        _ => None,
    }
}
