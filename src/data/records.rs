//! Pipeline record types shared by the reshaper, merger and calculators.

use crate::stats::DerivedFields;
use serde::Serialize;
use std::fmt;

pub const COUNTRY_COLUMN: &str = "country";
pub const YEAR_COLUMN: &str = "year";

/// The two indicator tables the dashboard is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    HealthSpending,
    InfantMortality,
}

impl Indicator {
    /// Column name used for this indicator in long-form frames.
    pub fn column_name(&self) -> &'static str {
        match self {
            Indicator::HealthSpending => "health_spending",
            Indicator::InfantMortality => "infant_mortality",
        }
    }

    /// Axis label used on charts.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::HealthSpending => "Health spending (% of GDP)",
            Indicator::InfantMortality => "Infant mortality (per 1,000 live births)",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One joined (country, year) row of the long-form sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryYearRecord {
    pub country: String,
    pub year: i32,
    pub health_spending: Option<f64>,
    pub infant_mortality: Option<f64>,
    pub region_code: Option<String>,
}

/// Before/after comparison row for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRecord {
    pub country: String,
    pub region_code: Option<String>,
    pub health_first: f64,
    pub health_last: f64,
    pub mortality_first: f64,
    pub mortality_last: f64,
    /// Attached by the derived-metrics calculator.
    pub derived: Option<DerivedFields>,
}

impl SnapshotRecord {
    pub fn value(&self, indicator: Indicator, last: bool) -> f64 {
        match (indicator, last) {
            (Indicator::HealthSpending, false) => self.health_first,
            (Indicator::HealthSpending, true) => self.health_last,
            (Indicator::InfantMortality, false) => self.mortality_first,
            (Indicator::InfantMortality, true) => self.mortality_last,
        }
    }
}

/// Why a country did not make it into the snapshot set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingHealthRow,
    MissingMortalityRow,
    MissingValue { indicator: Indicator, year: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub country: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Snapshot comparison rows plus the countries that were dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSet {
    pub first_year: i32,
    pub last_year: i32,
    pub records: Vec<SnapshotRecord>,
    pub excluded: Vec<Exclusion>,
}

impl SnapshotSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, country: &str) -> Option<&SnapshotRecord> {
        self.records.iter().find(|r| r.country == country)
    }
}
