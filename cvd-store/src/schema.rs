//! SQL schema for the persisted cache.

/// Returns the schema as a single batch string.
///
/// One table, `entries`: a namespaced key, the save time in epoch
/// milliseconds, and the gzip-compressed JSON value.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS entries (
        key TEXT PRIMARY KEY,
        saved_at INTEGER NOT NULL,
        value BLOB NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_entries_saved_at ON entries(saved_at);
    "#
}
