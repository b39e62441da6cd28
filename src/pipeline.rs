//! Dashboard Pipeline
//! Loader → Reshaper / Snapshot Merger → Derived Metrics → summaries, as one pass.

use crate::config::{ConfigError, DashboardConfig};
use crate::data::{
    resolve_regions, CountryYearRecord, DataLoader, IndicatorTable, LoadError, ProcessorError,
    RegionResolver, Reshaper, SnapshotMerger, SnapshotSet,
};
use crate::stats::{DerivedMetrics, IndicatorSummary, StatsCalculator, TrendLine, YearlyMean};
use log::info;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a run. Row-scoped problems never surface here; they
/// stay in [`DashboardData`] as missing values, undefined markers or exclusions.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Processing failed: {0}")]
    Processing(#[from] ProcessorError),
}

/// Everything the presentation layer consumes.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub long_form: Vec<CountryYearRecord>,
    pub snapshot: SnapshotSet,
    pub summaries: Vec<IndicatorSummary>,
    pub yearly_means: Vec<YearlyMean>,
    pub trend_lines: Vec<TrendLine>,
}

pub struct Pipeline<R: RegionResolver> {
    config: DashboardConfig,
    resolver: R,
}

impl<R: RegionResolver> Pipeline<R> {
    pub fn new(config: DashboardConfig, resolver: R) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Load both sources from disk and run the full computation.
    pub fn run(&self) -> Result<DashboardData, PipelineError> {
        let (health, mortality) = DataLoader::load_sources(&self.config)?;
        self.run_tables(&health, &mortality)
    }

    /// Run everything after loading on already-built tables.
    pub fn run_tables(
        &self,
        health: &IndicatorTable,
        mortality: &IndicatorTable,
    ) -> Result<DashboardData, PipelineError> {
        let regions = resolve_regions(&self.resolver, &self.config.countries);

        let long_form = Reshaper::join_long(health, mortality, &regions)?;

        let mut snapshot =
            SnapshotMerger::merge(health, mortality, self.config.snapshot_years(), &regions)?;
        DerivedMetrics::apply(&mut snapshot);

        let summaries = StatsCalculator::snapshot_summaries(&snapshot);
        let yearly_means = StatsCalculator::yearly_means(&long_form);
        let trend_lines = StatsCalculator::trend_lines(&long_form);

        info!(
            "Pipeline complete: {} long-form records, {} snapshot rows, {} trend lines",
            long_form.len(),
            snapshot.len(),
            trend_lines.len()
        );

        Ok(DashboardData {
            long_form,
            snapshot,
            summaries,
            yearly_means,
            trend_lines,
        })
    }
}
