//! `metadata`: resolved region information as JSON.

use cvd_core::RegionKey;
use std::io::Write;

use crate::session::{parse_keys, Session};

/// Print the resolved info of each key, or of every key in the document when
/// none is given. Unknown keys resolve to their fallback info.
pub fn run_metadata(session: &Session, keys: &[String], out: &mut impl Write) -> anyhow::Result<()> {
    let keys: Vec<RegionKey> = if keys.is_empty() {
        session.resolver().tree().keys()
    } else {
        parse_keys(keys)
    };
    let infos: Vec<_> = keys.iter().map(|k| session.resolver().resolve(k)).collect();
    serde_json::to_writer_pretty(&mut *out, &infos)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::session;

    #[tokio::test]
    async fn prints_every_key_without_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path()).await;

        let mut out = Vec::new();
        run_metadata(&session, &[], &mut out).unwrap();
        let infos: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let keys: Vec<&str> = infos
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["Brazil", "Brazil.regions.RS", "Italy"]);

        let mut out = Vec::new();
        run_metadata(&session, &["Brazil.regions.RS".to_string()], &mut out).unwrap();
        let infos: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(infos[0]["displayName"], "Rio Grande do Sul, Brazil");
    }
}
