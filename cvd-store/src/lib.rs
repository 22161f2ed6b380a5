//! Persisted key-value cache for fetched data.
//!
//! Entries are JSON values stored gzip-compressed in SQLite under namespaced
//! keys (`covid19-tools.<kind>.<name>`). Each entry remembers when it was
//! saved; reads report whether it is still fresh under the store's TTL so
//! callers can refetch, and fall back to a stale entry when the refetch fails.
//!
//! # Usage
//!
//! ```rust
//! use cvd_store::{namespaced_key, Store};
//!
//! let store = Store::open_in_memory().unwrap();
//! let key = namespaced_key("metadata", "v1");
//! store.put(&key, &vec![1, 2, 3]).unwrap();
//! let entry = store.get::<Vec<i32>>(&key).unwrap().unwrap();
//! assert!(entry.fresh);
//! assert_eq!(entry.value, vec![1, 2, 3]);
//! ```

mod codec;
mod entries;
pub mod schema;

use chrono::Duration;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub use entries::Entry;

/// Prefix shared by every key the tools write.
pub const KEY_NAMESPACE: &str = "covid19-tools";

/// Default freshness window.
pub const DEFAULT_TTL_MINUTES: i64 = 120;

/// Build a namespaced key, e.g. `covid19-tools.file.data/brazil.csv`.
pub fn namespaced_key(kind: &str, name: &str) -> String {
    format!("{}.{}.{}", KEY_NAMESPACE, kind, name)
}

/// Default on-disk location: the platform cache directory.
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "inf-covid19", "covid19-tools")
        .map(|dirs| dirs.cache_dir().join("cache.sqlite3"))
}

/// SQLite-backed cache.
///
/// Cheaply cloneable (via `Rc`); clones share the same connection. Intended
/// for single-threaded use alongside the fetcher.
#[derive(Clone)]
pub struct Store {
    conn: Rc<RefCell<Connection>>,
    ttl: Duration,
}

impl Store {
    /// Open (or create) a store file, creating parent directories as needed.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        log::info!("store: opened {}", path.display());
        Self::with_connection(conn)
    }

    /// A store that lives only as long as the process.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
