//! Snapshot Merger Module
//! Extracts the first and last year of each table and joins them per country.

use crate::data::processor::{country_rank, expect_indicator, ProcessorError};
use crate::data::records::{
    Exclusion, ExclusionReason, Indicator, SnapshotRecord, SnapshotSet, COUNTRY_COLUMN,
};
use crate::data::region::{region_code, RegionMap};
use crate::data::table::IndicatorTable;
use log::{info, warn};
use polars::prelude::*;

const HEALTH_FIRST: &str = "health_first";
const HEALTH_LAST: &str = "health_last";
const MORTALITY_FIRST: &str = "mortality_first";
const MORTALITY_LAST: &str = "mortality_last";

/// Builds the per-country before/after comparison set.
pub struct SnapshotMerger;

impl SnapshotMerger {
    /// Inner-join the `(first, last)` columns of both tables on country.
    ///
    /// Countries without a row in either table, or with any of the four
    /// snapshot values missing, are left out of `records` and listed in
    /// `excluded`.
    pub fn merge(
        health: &IndicatorTable,
        mortality: &IndicatorTable,
        (first, last): (i32, i32),
        regions: &RegionMap,
    ) -> Result<SnapshotSet, ProcessorError> {
        expect_indicator(health, Indicator::HealthSpending)?;
        expect_indicator(mortality, Indicator::InfantMortality)?;
        for year in [first, last] {
            if !health.years().contains(year) || !mortality.years().contains(year) {
                return Err(ProcessorError::SnapshotYearOutOfRange(year));
            }
        }

        let joined = Self::select_years(health, first, last, HEALTH_FIRST, HEALTH_LAST)
            .join(
                Self::select_years(mortality, first, last, MORTALITY_FIRST, MORTALITY_LAST),
                [col(COUNTRY_COLUMN)],
                [col(COUNTRY_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;

        let mut excluded = Self::missing_rows(health, mortality);

        let countries = joined.column(COUNTRY_COLUMN)?.str()?;
        let health_first = joined.column(HEALTH_FIRST)?.f64()?;
        let health_last = joined.column(HEALTH_LAST)?.f64()?;
        let mortality_first = joined.column(MORTALITY_FIRST)?.f64()?;
        let mortality_last = joined.column(MORTALITY_LAST)?.f64()?;

        let mut records = Vec::with_capacity(joined.height());
        for i in 0..joined.height() {
            let Some(country) = countries.get(i) else {
                continue;
            };

            let cells = [
                (Indicator::HealthSpending, first, health_first.get(i)),
                (Indicator::HealthSpending, last, health_last.get(i)),
                (Indicator::InfantMortality, first, mortality_first.get(i)),
                (Indicator::InfantMortality, last, mortality_last.get(i)),
            ];
            if let Some(&(indicator, year, _)) = cells.iter().find(|(_, _, v)| v.is_none()) {
                excluded.push(Exclusion {
                    country: country.to_string(),
                    reason: ExclusionReason::MissingValue { indicator, year },
                });
                continue;
            }

            records.push(SnapshotRecord {
                country: country.to_string(),
                region_code: region_code(regions, country),
                health_first: cells[0].2.unwrap_or_default(),
                health_last: cells[1].2.unwrap_or_default(),
                mortality_first: cells[2].2.unwrap_or_default(),
                mortality_last: cells[3].2.unwrap_or_default(),
                derived: None,
            });
        }

        let rank = country_rank(health);
        let position = |country: &str| rank.get(country).copied().unwrap_or(usize::MAX);
        records.sort_by_key(|r| position(&r.country));
        excluded.sort_by_key(|e| position(&e.country));

        for exclusion in &excluded {
            warn!(
                "Snapshot {first}-{last}: excluding {} ({:?})",
                exclusion.country, exclusion.reason
            );
        }
        info!(
            "Snapshot {first}-{last}: {} countries with complete data, {} excluded",
            records.len(),
            excluded.len()
        );

        Ok(SnapshotSet {
            first_year: first,
            last_year: last,
            records,
            excluded,
        })
    }

    fn select_years(
        table: &IndicatorTable,
        first: i32,
        last: i32,
        first_alias: &str,
        last_alias: &str,
    ) -> LazyFrame {
        table.frame().clone().lazy().select([
            col(COUNTRY_COLUMN),
            col(first.to_string()).alias(first_alias),
            col(last.to_string()).alias(last_alias),
        ])
    }

    /// Countries that have a row in only one of the two tables.
    fn missing_rows(health: &IndicatorTable, mortality: &IndicatorTable) -> Vec<Exclusion> {
        let health_countries = health.countries();
        let mortality_countries = mortality.countries();

        let no_mortality = health_countries
            .iter()
            .filter(|c| !mortality_countries.contains(c))
            .map(|c| Exclusion {
                country: c.clone(),
                reason: ExclusionReason::MissingMortalityRow,
            });
        let no_health = mortality_countries
            .iter()
            .filter(|c| !health_countries.contains(c))
            .map(|c| Exclusion {
                country: c.clone(),
                reason: ExclusionReason::MissingHealthRow,
            });

        no_mortality.chain(no_health).collect()
    }
}
