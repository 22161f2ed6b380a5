//! Reading and writing entries.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::{codec, Store};

/// A stored value with its age.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub value: T,
    pub saved_at: DateTime<Utc>,
    /// Saved within the store's TTL at read time.
    pub fresh: bool,
}

impl Store {
    /// Save a value under `key`, replacing any previous entry.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        self.put_at(key, value, Utc::now())
    }

    pub fn put_at<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        saved_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_vec(value)?;
        let packed = codec::compress(&json)?;
        let conn = self.conn.borrow();
        conn.execute(
            "INSERT OR REPLACE INTO entries (key, saved_at, value) VALUES (?1, ?2, ?3)",
            params![key, saved_at.timestamp_millis(), packed],
        )?;
        log::debug!(
            "store: saved {} ({} bytes, {} compressed)",
            key,
            json.len(),
            packed.len()
        );
        Ok(())
    }

    /// Read an entry, judging freshness against the current time.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<Entry<T>>> {
        self.get_at(key, Utc::now())
    }

    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Entry<T>>> {
        let conn = self.conn.borrow();
        let row: Option<(i64, Vec<u8>)> = conn
            .query_row(
                "SELECT saved_at, value FROM entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((saved_millis, packed)) = row else {
            return Ok(None);
        };

        let saved_at = DateTime::<Utc>::from_timestamp_millis(saved_millis)
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp for {}", key))?;
        let value: T = serde_json::from_slice(&codec::decompress(&packed)?)?;
        Ok(Some(Entry {
            value,
            saved_at,
            fresh: now - saved_at <= self.ttl,
        }))
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<bool> {
        let conn = self.conn.borrow();
        let n = conn.execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    /// Delete every entry; returns how many were removed.
    pub fn clear(&self) -> anyhow::Result<usize> {
        let conn = self.conn.borrow();
        Ok(conn.execute("DELETE FROM entries", [])?)
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare("SELECT key FROM entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
