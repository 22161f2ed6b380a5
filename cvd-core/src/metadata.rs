//! Region metadata: the remote metadata document and the resolver that turns
//! a [`RegionKey`] into display information.
//!
//! Document shape (JSON):
//!
//! ```text
//! { "Brazil": { "name": "Brazil", "geoId": "BR", "population": 211049519,
//!               "file": "data/brazil.csv",
//!               "regions": { "RS": { "name": "Rio_Grande_do_Sul",
//!                                     "parent": "Brazil",
//!                                     "place_type": "state",
//!                                     "file": "data/brazil/states.csv" } } } }
//! ```

use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap, collections::HashMap};

use crate::error::Result;
use crate::region::{RegionKey, MAX_REGION_DEPTH, REGION_SEPARATOR};

/// A node of the metadata document: a country or one of its sub-regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataNode {
    pub name: String,
    #[serde(rename = "geoId", alias = "geo_id")]
    pub geo_id: Option<String>,
    pub population: Option<f64>,
    pub parent: Option<String>,
    pub place_type: Option<String>,
    pub file: Option<String>,
    pub regions: BTreeMap<String, MetadataNode>,
}

/// The whole metadata document keyed by country id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataTree(pub BTreeMap<String, MetadataNode>);

impl MetadataTree {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The country node and the node addressed by `key`.
    fn lookup(&self, key: &RegionKey) -> Option<(&MetadataNode, &MetadataNode)> {
        let segments = key.segments();
        if segments.len() > MAX_REGION_DEPTH {
            return None;
        }
        let (first, rest) = segments.split_first()?;
        let country = self.0.get(*first)?;
        let mut node = country;
        for segment in rest {
            node = node.regions.get(*segment)?;
        }
        Some((country, node))
    }

    /// Every addressable key in the document, parents before children.
    pub fn keys(&self) -> Vec<RegionKey> {
        fn walk(prefix: &str, node: &MetadataNode, depth: usize, out: &mut Vec<RegionKey>) {
            out.push(RegionKey::new(prefix));
            if depth >= MAX_REGION_DEPTH {
                return;
            }
            for (id, child) in &node.regions {
                let key = format!("{}{}{}", prefix, REGION_SEPARATOR, id);
                walk(&key, child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        for (id, node) in &self.0 {
            walk(id, node, 1, &mut out);
        }
        out
    }
}

/// Display metadata for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInfo {
    pub key: RegionKey,
    pub id: String,
    pub display_name: String,
    pub name: String,
    pub flag: Option<String>,
    pub is_country: bool,
    pub parent: Option<String>,
    pub place_type: Option<String>,
    pub file: Option<String>,
    pub population: Option<f64>,
}

impl RegionInfo {
    /// Synthetic info for a key that is not in the document; the raw key
    /// doubles as the display name.
    pub fn fallback(key: &RegionKey) -> Self {
        RegionInfo {
            key: key.clone(),
            id: key.id().to_string(),
            display_name: key.to_string(),
            name: key.to_string(),
            flag: None,
            is_country: key.is_country(),
            parent: None,
            place_type: None,
            file: None,
            population: None,
        }
    }
}

/// Turn an ECDC/ISO alpha-2 code into its flag emoji.
pub fn flag_emoji(geo_id: &str) -> Option<String> {
    let code = match geo_id.trim().to_ascii_uppercase().as_str() {
        // ECDC uses these instead of ISO codes
        "UK" => "GB".to_string(),
        "EL" => "GR".to_string(),
        other => other.to_string(),
    };
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    code.bytes()
        .map(|b| char::from_u32(0x1F1E6 + (b - b'A') as u32))
        .collect()
}

fn humanize(name: &str) -> String {
    name.replace('_', " ")
}

/// Resolves region keys against a metadata document, memoizing per key for
/// the lifetime of the resolver.
#[derive(Debug, Default)]
pub struct MetadataResolver {
    tree: MetadataTree,
    memo: RefCell<HashMap<RegionKey, RegionInfo>>,
}

impl MetadataResolver {
    pub fn new(tree: MetadataTree) -> Self {
        MetadataResolver {
            tree,
            memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(MetadataTree::from_json(json)?))
    }

    pub fn tree(&self) -> &MetadataTree {
        &self.tree
    }

    /// Resolve a key. Unknown or too-deep keys get [`RegionInfo::fallback`].
    pub fn resolve(&self, key: &RegionKey) -> RegionInfo {
        if let Some(info) = self.memo.borrow().get(key) {
            return info.clone();
        }
        let info = match self.tree.lookup(key) {
            Some((country, node)) => Self::build_info(key, country, node),
            None => {
                log::warn!("region {} not found in metadata, using fallback", key);
                RegionInfo::fallback(key)
            }
        };
        self.memo.borrow_mut().insert(key.clone(), info.clone());
        info
    }

    fn build_info(key: &RegionKey, country: &MetadataNode, node: &MetadataNode) -> RegionInfo {
        let is_country = key.is_country();
        let name = if node.name.is_empty() {
            key.id().to_string()
        } else {
            node.name.clone()
        };
        let display_name = match (&node.parent, is_country) {
            (Some(parent), false) => format!("{}, {}", humanize(&name), humanize(parent)),
            _ => humanize(&name),
        };
        RegionInfo {
            key: key.clone(),
            id: key.id().to_string(),
            display_name,
            name,
            flag: country.geo_id.as_deref().and_then(flag_emoji),
            is_country,
            parent: node.parent.clone(),
            place_type: node.place_type.clone(),
            file: node.file.clone(),
            population: node.population,
        }
    }

    /// Number of memoized entries.
    pub fn memoized(&self) -> usize {
        self.memo.borrow().len()
    }
}
