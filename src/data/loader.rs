//! CSV Data Loader Module
//! Reads the two indicator CSV files with Polars and restricts them to the allow-list.

use crate::config::{DashboardConfig, YearRange};
use crate::data::records::Indicator;
use crate::data::table::{IndicatorTable, SchemaError};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Failed to load CSV {}: {source}", path.display())]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Schema error in {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// Loads wide indicator tables from CSV.
pub struct DataLoader;

impl DataLoader {
    /// Load one indicator CSV restricted to `countries` and `years`.
    pub fn load_indicator(
        path: &Path,
        indicator: Indicator,
        countries: &[String],
        years: YearRange,
    ) -> Result<IndicatorTable, LoadError> {
        if !path.is_file() {
            return Err(LoadError::SourceNotFound(path.to_path_buf()));
        }

        let raw = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoadError::CsvError {
                path: path.to_path_buf(),
                source,
            })?;

        let table = IndicatorTable::from_frame(indicator, &raw, countries, years).map_err(
            |source| LoadError::Schema {
                path: path.to_path_buf(),
                source,
            },
        )?;

        info!(
            "Loaded {indicator} from {}: {} of {} source rows kept",
            path.display(),
            table.len(),
            raw.height()
        );
        for country in countries {
            if !table.countries().iter().any(|c| c == country.trim()) {
                warn!("{indicator}: {country} is not present in {}", path.display());
            }
        }

        Ok(table)
    }

    /// Load the health spending and infant mortality tables named in `config`.
    pub fn load_sources(
        config: &DashboardConfig,
    ) -> Result<(IndicatorTable, IndicatorTable), LoadError> {
        let health = Self::load_indicator(
            &config.health_csv,
            Indicator::HealthSpending,
            &config.countries,
            config.years,
        )?;
        let mortality = Self::load_indicator(
            &config.mortality_csv,
            Indicator::InfantMortality,
            &config.countries,
            config.years,
        )?;
        Ok((health, mortality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn allow(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = DataLoader::load_indicator(
            Path::new("/nonexistent/health.csv"),
            Indicator::HealthSpending,
            &allow(&["Laos"]),
            YearRange::new(2000, 2001),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound(_)));
    }

    #[test]
    fn test_missing_country_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.csv");
        fs::write(&path, "nation,2000,2001\nLaos,1.0,2.0\n").unwrap();

        let err = DataLoader::load_indicator(
            &path,
            Indicator::HealthSpending,
            &allow(&["Laos"]),
            YearRange::new(2000, 2001),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema {
                source: SchemaError::MissingCountryColumn,
                ..
            }
        ));
    }

    #[test]
    fn test_load_filters_rows_and_keeps_bad_cells_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mortality.csv");
        fs::write(
            &path,
            "country,2000,2001\nLaos,80.5,abc\nJapan,3.0,2.9\nMalaysia,,9.1\n",
        )
        .unwrap();

        let table = DataLoader::load_indicator(
            &path,
            Indicator::InfantMortality,
            &allow(&["Malaysia", "Laos", "Vietnam"]),
            YearRange::new(2000, 2001),
        )
        .unwrap();

        assert_eq!(table.countries(), vec!["Malaysia", "Laos"]);
        assert_eq!(table.value("Laos", 2000), Some(80.5));
        assert_eq!(table.value("Laos", 2001), None);
        assert_eq!(table.value("Malaysia", 2000), None);
        assert_eq!(table.value("Malaysia", 2001), Some(9.1));
    }
}
