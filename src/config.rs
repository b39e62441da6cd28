//! Dashboard Configuration Module
//! Country allow-list, year range and source file locations.

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The eight ASEAN members covered by the source indicator tables.
pub const DEFAULT_COUNTRIES: [&str; 8] = [
    "Cambodia",
    "Indonesia",
    "Laos",
    "Malaysia",
    "Myanmar",
    "Philippines",
    "Singapore",
    "Thailand",
];

pub const DEFAULT_FIRST_YEAR: i32 = 1995;
pub const DEFAULT_LAST_YEAR: i32 = 2010;
/// Upper bound on the number of year columns a run may declare.
pub const MAX_YEAR_SPAN: usize = 500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Country list is empty")]
    NoCountries,
    #[error("Year range {start}..={end} is inverted")]
    InvertedYearRange { start: i32, end: i32 },
    #[error("Snapshot year {year} is outside {start}..={end}")]
    SnapshotOutOfRange { year: i32, start: i32, end: i32 },
    #[error("Year range {start}..={end} spans more than {max} years")]
    YearRangeTooWide { start: i32, end: i32, max: usize },
}

/// Inclusive range of years, one wide-table column per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR)
    }
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn iter(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        self.iter().contains(&year)
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (i64::from(self.end) - i64::from(self.start) + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a pipeline run needs to know up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub countries: Vec<String>,
    pub years: YearRange,
    /// Explicit (first, last) comparison years. Defaults to the range bounds.
    pub snapshot_years: Option<(i32, i32)>,
    pub health_csv: PathBuf,
    pub mortality_csv: PathBuf,
    pub output_dir: PathBuf,
    pub render_charts: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            years: YearRange::default(),
            snapshot_years: None,
            health_csv: PathBuf::from("health_spending.csv"),
            mortality_csv: PathBuf::from("infant_mortality.csv"),
            output_dir: PathBuf::from("output"),
            render_charts: true,
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config file. Relative paths inside it are resolved
    /// against the directory holding the file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text)?;

        if let Some(base) = path.parent() {
            config.health_csv = resolve_relative(base, &config.health_csv);
            config.mortality_csv = resolve_relative(base, &config.mortality_csv);
            config.output_dir = resolve_relative(base, &config.output_dir);
        }

        Ok(config)
    }

    /// The (first, last) pair compared by the snapshot merger.
    pub fn snapshot_years(&self) -> (i32, i32) {
        self.snapshot_years
            .unwrap_or((self.years.start, self.years.end))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countries.is_empty() {
            return Err(ConfigError::NoCountries);
        }
        if self.years.is_empty() {
            return Err(ConfigError::InvertedYearRange {
                start: self.years.start,
                end: self.years.end,
            });
        }
        if self.years.len() > MAX_YEAR_SPAN {
            return Err(ConfigError::YearRangeTooWide {
                start: self.years.start,
                end: self.years.end,
                max: MAX_YEAR_SPAN,
            });
        }

        let (first, last) = self.snapshot_years();
        for year in [first, last] {
            if !self.years.contains(year) {
                return Err(ConfigError::SnapshotOutOfRange {
                    year,
                    start: self.years.start,
                    end: self.years.end,
                });
            }
        }

        Ok(())
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
