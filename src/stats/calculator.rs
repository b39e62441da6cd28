//! Statistics Calculator Module
//! Summary scalars per snapshot year, regional yearly means and per-year trend lines.

use crate::data::{CountryYearRecord, Indicator, SnapshotSet};
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// A country together with its value, for max/min reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryValue {
    pub country: String,
    pub value: f64,
}

/// Mean, maximum and minimum of one indicator in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub indicator: Indicator,
    pub year: i32,
    pub count: usize,
    pub mean: f64,
    pub max: CountryValue,
    pub min: CountryValue,
}

/// Regional average of both indicators for a single year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyMean {
    pub year: i32,
    pub health_spending: Option<f64>,
    pub infant_mortality: Option<f64>,
}

/// Least-squares line of infant mortality against health spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub year: i32,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl TrendLine {
    pub fn predict(&self, health_spending: f64) -> f64 {
        self.intercept + self.slope * health_spending
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summaries of both indicators at both snapshot years, over the
    /// countries that made it into the snapshot set.
    pub fn snapshot_summaries(set: &SnapshotSet) -> Vec<IndicatorSummary> {
        let mut summaries = Vec::with_capacity(4);
        for indicator in [Indicator::HealthSpending, Indicator::InfantMortality] {
            for (year, last) in [(set.first_year, false), (set.last_year, true)] {
                let values: Vec<(&str, f64)> = set
                    .records
                    .iter()
                    .map(|r| (r.country.as_str(), r.value(indicator, last)))
                    .collect();
                if let Some(summary) = Self::summarize(indicator, year, &values) {
                    summaries.push(summary);
                }
            }
        }
        summaries
    }

    /// `None` for an empty slice. Ties for max/min go to the first country.
    pub fn summarize(
        indicator: Indicator,
        year: i32,
        values: &[(&str, f64)],
    ) -> Option<IndicatorSummary> {
        let (first_country, first_value) = *values.first()?;
        let mut max = (first_country, first_value);
        let mut min = (first_country, first_value);
        for &(country, value) in &values[1..] {
            if value > max.1 {
                max = (country, value);
            }
            if value < min.1 {
                min = (country, value);
            }
        }

        Some(IndicatorSummary {
            indicator,
            year,
            count: values.len(),
            mean: values.iter().map(|(_, v)| *v).mean(),
            max: CountryValue {
                country: max.0.to_string(),
                value: max.1,
            },
            min: CountryValue {
                country: min.0.to_string(),
                value: min.1,
            },
        })
    }

    /// Per-year mean of each indicator, skipping missing values.
    pub fn yearly_means(records: &[CountryYearRecord]) -> Vec<YearlyMean> {
        let mut by_year: BTreeMap<i32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for record in records {
            let entry = by_year.entry(record.year).or_default();
            if let Some(h) = record.health_spending {
                entry.0.push(h);
            }
            if let Some(m) = record.infant_mortality {
                entry.1.push(m);
            }
        }

        by_year
            .into_iter()
            .map(|(year, (health, mortality))| YearlyMean {
                year,
                health_spending: mean_of(&health),
                infant_mortality: mean_of(&mortality),
            })
            .collect()
    }

    /// Fit one trend line per year, in parallel. Years with fewer than two
    /// complete points, or with no spread in spending, get no line.
    pub fn trend_lines(records: &[CountryYearRecord]) -> Vec<TrendLine> {
        let mut by_year: BTreeMap<i32, Vec<(f64, f64)>> = BTreeMap::new();
        for record in records {
            if let (Some(h), Some(m)) = (record.health_spending, record.infant_mortality) {
                by_year.entry(record.year).or_default().push((h, m));
            }
        }

        let years: Vec<(i32, Vec<(f64, f64)>)> = by_year.into_iter().collect();
        let mut lines: Vec<TrendLine> = years
            .par_iter()
            .filter_map(|(year, points)| Self::fit_trend(*year, points))
            .collect();
        lines.sort_by_key(|l| l.year);
        lines
    }

    /// Ordinary least squares of y on x.
    pub fn fit_trend(year: i32, points: &[(f64, f64)]) -> Option<TrendLine> {
        if points.len() < 2 {
            return None;
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let var_x = xs.iter().variance();
        if var_x == 0.0 || !var_x.is_finite() {
            return None;
        }
        let var_y = ys.iter().variance();
        let cov = xs.iter().covariance(ys.iter());

        let slope = cov / var_x;
        let intercept = ys.iter().mean() - slope * xs.iter().mean();
        let r_squared = if var_y == 0.0 {
            1.0
        } else {
            (cov * cov) / (var_x * var_y)
        };

        Some(TrendLine {
            year,
            slope,
            intercept,
            r_squared,
            n: points.len(),
        })
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SnapshotRecord;

    const EPS: f64 = 1e-9;

    fn long(country: &str, year: i32, h: Option<f64>, m: Option<f64>) -> CountryYearRecord {
        CountryYearRecord {
            country: country.to_string(),
            year,
            health_spending: h,
            infant_mortality: m,
            region_code: None,
        }
    }

    #[test]
    fn test_summarize_reports_mean_max_min() {
        let summary = StatsCalculator::summarize(
            Indicator::HealthSpending,
            1995,
            &[("Laos", 2.0), ("Thailand", 6.0), ("Malaysia", 1.0), ("Myanmar", 6.0)],
        )
        .unwrap();

        assert_eq!(summary.count, 4);
        assert!((summary.mean - 3.75).abs() < EPS);
        assert_eq!(summary.max.country, "Thailand");
        assert_eq!(summary.min.country, "Malaysia");
        assert!(StatsCalculator::summarize(Indicator::HealthSpending, 1995, &[]).is_none());
    }

    #[test]
    fn test_snapshot_summaries_cover_both_years() {
        let set = SnapshotSet {
            first_year: 1995,
            last_year: 2010,
            records: vec![
                SnapshotRecord {
                    country: "Cambodia".to_string(),
                    region_code: None,
                    health_first: 4.0,
                    health_last: 2.0,
                    mortality_first: 86.6,
                    mortality_last: 37.0,
                    derived: None,
                },
                SnapshotRecord {
                    country: "Singapore".to_string(),
                    region_code: None,
                    health_first: 3.0,
                    health_last: 4.0,
                    mortality_first: 4.0,
                    mortality_last: 2.2,
                    derived: None,
                },
            ],
            excluded: Vec::new(),
        };

        let summaries = StatsCalculator::snapshot_summaries(&set);
        assert_eq!(summaries.len(), 4);

        let health_2010 = summaries
            .iter()
            .find(|s| s.indicator == Indicator::HealthSpending && s.year == 2010)
            .unwrap();
        assert_eq!(health_2010.max.country, "Singapore");
        assert!((health_2010.mean - 3.0).abs() < EPS);

        let mortality_1995 = summaries
            .iter()
            .find(|s| s.indicator == Indicator::InfantMortality && s.year == 1995)
            .unwrap();
        assert_eq!(mortality_1995.max.country, "Cambodia");
        assert_eq!(mortality_1995.min.country, "Singapore");
    }

    #[test]
    fn test_yearly_means_skip_missing_values() {
        let records = vec![
            long("Laos", 2000, Some(2.0), Some(70.0)),
            long("Thailand", 2000, None, Some(20.0)),
            long("Laos", 2001, None, None),
        ];

        let means = StatsCalculator::yearly_means(&records);
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].year, 2000);
        assert_eq!(means[0].health_spending, Some(2.0));
        assert!((means[0].infant_mortality.unwrap() - 45.0).abs() < EPS);
        assert_eq!(means[1].health_spending, None);
        assert_eq!(means[1].infant_mortality, None);
    }

    #[test]
    fn test_fit_trend_recovers_exact_line() {
        let line = StatsCalculator::fit_trend(2000, &[(1.0, 90.0), (2.0, 80.0), (4.0, 60.0)])
            .unwrap();
        assert!((line.slope + 10.0).abs() < EPS);
        assert!((line.intercept - 100.0).abs() < EPS);
        assert!((line.r_squared - 1.0).abs() < EPS);
        assert!((line.predict(3.0) - 70.0).abs() < EPS);
        assert_eq!(line.n, 3);
    }

    #[test]
    fn test_trend_lines_skip_degenerate_years() {
        let records = vec![
            long("Laos", 2000, Some(1.0), Some(90.0)),
            long("Thailand", 2000, Some(3.0), Some(70.0)),
            long("Laos", 2001, Some(2.0), Some(85.0)),
            long("Thailand", 2001, Some(2.0), Some(65.0)),
            long("Laos", 2002, Some(2.0), None),
            long("Thailand", 2002, Some(2.5), Some(60.0)),
        ];

        let lines = StatsCalculator::trend_lines(&records);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].year, 2000);
        assert!((lines[0].slope + 10.0).abs() < EPS);
    }
}
