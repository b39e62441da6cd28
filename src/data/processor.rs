//! Data Processor Module
//! Wide-to-long reshaping (melt) and the (country, year) indicator join.

use crate::data::records::{CountryYearRecord, Indicator, COUNTRY_COLUMN, YEAR_COLUMN};
use crate::data::region::{region_code, RegionMap};
use crate::data::table::IndicatorTable;
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Expected a {expected} table, got {found}")]
    IndicatorMismatch {
        expected: Indicator,
        found: Indicator,
    },
    #[error("Snapshot year {0} is not a column of the indicator tables")]
    SnapshotYearOutOfRange(i32),
}

/// Reshapes wide indicator tables into long form and joins them.
pub struct Reshaper;

impl Reshaper {
    /// Transform a wide table to long format.
    ///
    /// Output columns: ["country", "year", <indicator column>], country-major
    /// then year-ascending. Missing cells stay null.
    pub fn melt(table: &IndicatorTable) -> Result<DataFrame, ProcessorError> {
        let df = table.frame();
        let country_ca = df.column(COUNTRY_COLUMN)?.str()?;

        let year_cols = table
            .years()
            .iter()
            .map(|year| Ok((year, df.column(&year.to_string())?.f64()?)))
            .collect::<PolarsResult<Vec<_>>>()?;

        let capacity = df.height() * year_cols.len();
        let mut countries: Vec<String> = Vec::with_capacity(capacity);
        let mut years: Vec<i32> = Vec::with_capacity(capacity);
        let mut values: Vec<Option<f64>> = Vec::with_capacity(capacity);

        for (i, country) in country_ca.into_iter().enumerate() {
            let Some(country) = country else {
                continue;
            };
            for (year, ca) in &year_cols {
                countries.push(country.to_string());
                years.push(*year);
                values.push(ca.get(i));
            }
        }

        let long = DataFrame::new(vec![
            Column::new(COUNTRY_COLUMN.into(), countries),
            Column::new(YEAR_COLUMN.into(), years),
            Column::new(table.indicator().column_name().into(), values),
        ])?;

        Ok(long)
    }

    /// Melt both tables and inner-join them on (country, year).
    ///
    /// A pair missing from either side is dropped. Rows come back in the
    /// health table's country order, then by year.
    pub fn join_long(
        health: &IndicatorTable,
        mortality: &IndicatorTable,
        regions: &RegionMap,
    ) -> Result<Vec<CountryYearRecord>, ProcessorError> {
        expect_indicator(health, Indicator::HealthSpending)?;
        expect_indicator(mortality, Indicator::InfantMortality)?;

        let keys = [col(COUNTRY_COLUMN), col(YEAR_COLUMN)];
        let joined = Self::melt(health)?
            .lazy()
            .join(
                Self::melt(mortality)?.lazy(),
                keys.clone(),
                keys,
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;

        let countries = joined.column(COUNTRY_COLUMN)?.str()?;
        let years = joined.column(YEAR_COLUMN)?.i32()?;
        let health_ca = joined
            .column(Indicator::HealthSpending.column_name())?
            .f64()?;
        let mortality_ca = joined
            .column(Indicator::InfantMortality.column_name())?
            .f64()?;

        let mut records: Vec<CountryYearRecord> = countries
            .into_iter()
            .zip(years)
            .zip(health_ca)
            .zip(mortality_ca)
            .filter_map(|(((country, year), h), m)| {
                let (country, year) = (country?, year?);
                Some(CountryYearRecord {
                    country: country.to_string(),
                    year,
                    health_spending: h,
                    infant_mortality: m,
                    region_code: region_code(regions, country),
                })
            })
            .collect();

        let rank = country_rank(health);
        records.sort_by_key(|r| (rank.get(&r.country).copied().unwrap_or(usize::MAX), r.year));

        let expected = health.len() * health.years().len();
        if records.len() < expected {
            debug!(
                "Long-form join dropped {} (country, year) pairs without mortality rows",
                expected - records.len()
            );
        }
        info!("Joined long-form sequence: {} records", records.len());

        Ok(records)
    }
}

pub(crate) fn expect_indicator(
    table: &IndicatorTable,
    expected: Indicator,
) -> Result<(), ProcessorError> {
    if table.indicator() == expected {
        Ok(())
    } else {
        Err(ProcessorError::IndicatorMismatch {
            expected,
            found: table.indicator(),
        })
    }
}

/// Position of each country in the table's (allow-list) order.
pub(crate) fn country_rank(table: &IndicatorTable) -> HashMap<String, usize> {
    table
        .countries()
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect()
}
