//! ASEAN Health - command line entry point
//!
//! Usage: `asean-health [config.json]`

use anyhow::{Context, Result};
use asean_health::charts::{export_json, StaticChartRenderer};
use asean_health::data::IsoRegionTable;
use asean_health::stats::Derived;
use asean_health::{DashboardConfig, Pipeline};
use log::{info, warn};
use std::fs;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => DashboardConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config {path}"))?,
        None => DashboardConfig::default(),
    };

    let pipeline = Pipeline::new(config, IsoRegionTable)?;
    let data = pipeline.run().context("Dashboard pipeline failed")?;
    let config = pipeline.config();

    for summary in &data.summaries {
        info!(
            "{} {}: mean {:.2}, max {} ({:.2}), min {} ({:.2})",
            summary.indicator,
            summary.year,
            summary.mean,
            summary.max.country,
            summary.max.value,
            summary.min.country,
            summary.min.value
        );
    }
    for (rank, record) in data.snapshot.records.iter().enumerate() {
        let improvement = match record.derived.map(|d| d.efficiency_improvement_pct) {
            Some(Derived::Defined(v)) => format!("{v:.1}%"),
            Some(Derived::Undefined(reason)) => format!("undefined ({reason:?})"),
            None => "not computed".to_string(),
        };
        info!("#{} {}: efficiency improvement {improvement}", rank + 1, record.country);
    }

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let json_path = config.output_dir.join("dashboard.json");
    export_json(&data, &json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!("Wrote {}", json_path.display());

    if config.render_charts {
        match StaticChartRenderer::render_all(&data, &config.output_dir) {
            Ok(paths) => info!("Rendered {} charts", paths.len()),
            Err(e) => warn!("Chart rendering failed: {e}"),
        }
    }

    Ok(())
}
