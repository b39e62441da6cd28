//! Wide Indicator Table Module
//! One row per allow-listed country, one Float64 column per year.

use crate::config::YearRange;
use crate::data::records::{Indicator, COUNTRY_COLUMN};
use log::{debug, warn};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("missing \"country\" column")]
    MissingCountryColumn,
    #[error("missing column for year {0}")]
    MissingYearColumn(i32),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Country-indexed wide table for a single indicator.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    indicator: Indicator,
    years: YearRange,
    df: DataFrame,
}

impl IndicatorTable {
    /// Restrict a raw frame to the allow-list and the declared year columns.
    ///
    /// Rows keep allow-list order. Year cells are cast non-strictly, so
    /// malformed or blank values become null instead of failing the load.
    /// A country listed twice in the source keeps its first row, and a
    /// country named twice in the allow-list is kept once.
    pub fn from_frame(
        indicator: Indicator,
        raw: &DataFrame,
        countries: &[String],
        years: YearRange,
    ) -> Result<Self, SchemaError> {
        let country_name = raw
            .get_column_names()
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(COUNTRY_COLUMN))
            .map(|name| name.to_string())
            .ok_or(SchemaError::MissingCountryColumn)?;

        let year_names: HashMap<String, String> = raw
            .get_column_names()
            .iter()
            .map(|name| (name.trim().to_string(), name.to_string()))
            .collect();

        let mut year_columns: Vec<Column> = Vec::new();
        for year in years.iter() {
            let name = year_names
                .get(&year.to_string())
                .ok_or(SchemaError::MissingYearColumn(year))?;
            year_columns.push(raw.column(name)?.cast(&DataType::Float64)?);
        }
        let year_values = year_columns
            .iter()
            .map(|c| c.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        let country_col = raw.column(&country_name)?.cast(&DataType::String)?;
        let country_ca = country_col.str()?;

        let mut first_row: HashMap<&str, usize> = HashMap::new();
        for (i, name) in country_ca.into_iter().enumerate() {
            let Some(name) = name.map(str::trim) else {
                continue;
            };
            if first_row.contains_key(name) {
                warn!("{indicator}: duplicate row for {name}, keeping the first one");
                continue;
            }
            first_row.insert(name, i);
        }

        let mut kept_countries: Vec<String> = Vec::new();
        let mut kept_rows: Vec<usize> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for country in countries {
            if !seen.insert(country.trim()) {
                debug!("{indicator}: {country} is listed more than once, ignoring repeat");
                continue;
            }
            match first_row.get(country.trim()) {
                Some(&row) => {
                    kept_countries.push(country.trim().to_string());
                    kept_rows.push(row);
                }
                None => debug!("{indicator}: no row for allow-listed country {country}"),
            }
        }

        let mut columns = vec![Column::new(COUNTRY_COLUMN.into(), kept_countries)];
        for (year, values) in years.iter().zip(year_values) {
            let picked: Vec<Option<f64>> = kept_rows
                .iter()
                .map(|&row| values.get(row).filter(|v| !v.is_nan()))
                .collect();
            columns.push(Column::new(year.to_string().into(), picked));
        }

        Ok(Self {
            indicator,
            years,
            df: DataFrame::new(columns)?,
        })
    }

    /// Build a table from in-memory rows, one value slot per year in `years`.
    /// Short rows are padded with missing values.
    pub fn from_rows<S: AsRef<str>>(
        indicator: Indicator,
        years: YearRange,
        rows: &[(S, Vec<Option<f64>>)],
    ) -> Result<Self, SchemaError> {
        let countries: Vec<String> = rows.iter().map(|(c, _)| c.as_ref().to_string()).collect();

        let mut columns = vec![Column::new(COUNTRY_COLUMN.into(), countries.clone())];
        for (j, year) in years.iter().enumerate() {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|(_, vals)| vals.get(j).copied().flatten())
                .collect();
            columns.push(Column::new(year.to_string().into(), values));
        }

        let raw = DataFrame::new(columns)?;
        Self::from_frame(indicator, &raw, &countries, years)
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Number of country rows.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Countries present, in allow-list order.
    pub fn countries(&self) -> Vec<String> {
        self.df
            .column(COUNTRY_COLUMN)
            .ok()
            .and_then(|col| col.str().ok())
            .map(|ca| ca.into_iter().flatten().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Value for a single cell; `None` when the country, the year or the
    /// value itself is missing.
    pub fn value(&self, country: &str, year: i32) -> Option<f64> {
        let row = self.countries().iter().position(|c| c == country)?;
        self.df
            .column(&year.to_string())
            .ok()?
            .f64()
            .ok()?
            .get(row)
    }
}
