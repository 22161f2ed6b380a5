//! `normalize`: normalized daily series as CSV.

use cvd_fetch::RegionData;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::session::{parse_keys, Session};

#[derive(Serialize)]
struct Record<'a> {
    region: &'a str,
    date: String,
    confirmed: f64,
    confirmed_daily: f64,
    deaths: f64,
    deaths_daily: f64,
}

pub async fn run_normalize(session: &Session, keys: &[String], output: Option<&Path>) -> anyhow::Result<()> {
    let data = session.load(&parse_keys(keys)).await;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let rows = write_csv(&data, file)?;
            info!("wrote {} rows to {}", rows, path.display());
        }
        None => {
            write_csv(&data, std::io::stdout().lock())?;
        }
    }
    Ok(())
}

/// One row per region and day; returns the number of data rows written.
pub fn write_csv(data: &[RegionData], out: impl Write) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut count = 0;
    for region in data {
        for row in region.series.iter() {
            writer.serialize(Record {
                region: region.info.key.as_str(),
                date: row.date.format("%Y-%m-%d").to_string(),
                confirmed: row.confirmed,
                confirmed_daily: row.confirmed_daily,
                deaths: row.deaths,
                deaths_daily: row.deaths_daily,
            })?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}
