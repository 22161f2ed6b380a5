//! `chart` and `project`: chart specs and projections from an options document.

use anyhow::Context;
use cvd_chart::builders::build_chart;
use cvd_chart::config::ProjectionConfig;
use cvd_chart::{project_regions, ChartConfig, ChartOptions, ChartSpec, ChartType};
use cvd_core::RegionKey;
use cvd_data::measures::SeriesSummary;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::session::{as_pairs, parse_keys, Session};

pub fn read_options(path: &Path) -> anyhow::Result<ChartOptions> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading options {}", path.display()))?;
    ChartOptions::from_json(&json).with_context(|| format!("parsing options {}", path.display()))
}

/// The options' selection followed by extra keys not already selected.
fn selection(options: &ChartOptions, extra: &[String]) -> Vec<RegionKey> {
    let mut keys = options.selected_regions.clone();
    for key in parse_keys(extra) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

pub async fn build_spec(session: &Session, options: &ChartOptions, extra: &[String]) -> anyhow::Result<ChartSpec> {
    let config = ChartConfig::from_options(options)?;
    let keys = selection(options, extra);
    info!("building {:?} chart for {} regions", options.chart_type, keys.len());
    let data = session.load(&keys).await;
    Ok(build_chart(&config, &as_pairs(&data), session.today()))
}

pub async fn run_chart(
    session: &Session,
    options_path: &Path,
    extra: &[String],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let options = read_options(options_path)?;
    let spec = build_spec(session, &options, extra).await?;
    let json = spec.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("wrote chart to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionOutput {
    pub points: Vec<ProjectedRegion>,
    pub stress: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectedRegion {
    pub name: String,
    pub key: RegionKey,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SeriesSummary>,
}

/// Project the selected regions whatever chart kind the options name.
pub async fn project(session: &Session, options: &ChartOptions, extra: &[String]) -> anyhow::Result<ProjectionOutput> {
    let options = ChartOptions {
        chart_type: ChartType::Projection,
        ..options.clone()
    };
    let ChartConfig::Projection(config) = ChartConfig::from_options(&options)? else {
        anyhow::bail!("options do not describe a projection");
    };
    let keys = selection(&options, extra);
    let data = session.load(&keys).await;
    Ok(projection_output(&data, &config))
}

fn projection_output(data: &[cvd_fetch::RegionData], config: &ProjectionConfig) -> ProjectionOutput {
    let (series, stress) = project_regions(&as_pairs(data), config);
    ProjectionOutput {
        points: series
            .into_iter()
            .map(|s| ProjectedRegion {
                name: s.point.name,
                key: s.point.key,
                x: s.point.x,
                y: s.point.y,
                summary: s.summary,
            })
            .collect(),
        stress,
    }
}

pub async fn run_project(
    session: &Session,
    options_path: &Path,
    extra: &[String],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let options = read_options(options_path)?;
    let output = project(session, &options, extra).await?;
    match output.stress {
        Some(stress) => info!("projected {} regions, stress {:.4}", output.points.len(), stress),
        None => info!("projected {} regions", output.points.len()),
    }
    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::session;

    #[tokio::test]
    async fn chart_from_options_document() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path()).await;
        let options = ChartOptions::from_json(
            r#"{"chartType": "line", "dayInterval": 4, "selectedCountries": {"Italy": true, "Brazil": false}}"#,
        )
        .unwrap();

        let spec = build_spec(&session, &options, &["Brazil".to_string()]).await.unwrap();
        assert_eq!(spec.chart_type, "line");
        let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Brazil", "Italy"]);
        assert_eq!(spec.series[1].data.len(), 5);
        assert_eq!(spec.series[1].data[4].y, 165.0);
    }

    #[tokio::test]
    async fn chart_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path()).await;
        let options_path = dir.path().join("options.json");
        std::fs::write(&options_path, r#"{"selectedRegions": ["Italy"]}"#).unwrap();
        let out = dir.path().join("chart.json");
        run_chart(&session, &options_path, &[], Some(&out)).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["type"], "heatmap");
        assert_eq!(json["series"][0]["key"], "Italy");
    }

    #[tokio::test]
    async fn umap_needs_more_regions_than_neighbors() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path()).await;
        let options = ChartOptions::from_json(
            r#"{"projectionType": "umap", "neighbors": 5, "selectedRegions": ["Italy", "Brazil"]}"#,
        )
        .unwrap();
        let output = project(&session, &options, &[]).await.unwrap();
        assert!(output.points.is_empty());
        assert!(output.stress.is_none());

        let tsne = ChartOptions {
            projection_type: cvd_projection::ProjectionType::Tsne,
            ..options
        };
        let output = project(&session, &tsne, &[]).await.unwrap();
        assert_eq!(output.points.len(), 2);
        assert_eq!(output.points[0].key, RegionKey::from("Italy"));
        assert_eq!(output.points[1].summary.as_ref().unwrap().total, 550.0);
    }
}
