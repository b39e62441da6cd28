//! Derived Metrics Module
//! Percent change, efficiency ratio and efficiency improvement per snapshot row.

use crate::data::{SnapshotRecord, SnapshotSet};
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// Why a derived value could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Percent change against a zero starting value.
    ZeroBaseline,
    ZeroMortality,
    ZeroSpending,
    /// An input this value depends on is itself undefined.
    MissingInput,
    NonFinite,
}

/// A full-precision derived value or an explicit undefined marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Derived {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl Derived {
    /// Wrap a computed value; NaN and infinities become `Undefined(NonFinite)`.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Derived::Defined(value)
        } else {
            Derived::Undefined(UndefinedReason::NonFinite)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Derived::Defined(v) => Some(*v),
            Derived::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Derived::Defined(_))
    }
}

/// Fields attached to a snapshot record by [`DerivedMetrics::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFields {
    pub health_change: f64,
    pub health_change_pct: Derived,
    pub mortality_change: f64,
    pub mortality_change_pct: Derived,
    pub efficiency_first: Derived,
    pub efficiency_last: Derived,
    pub efficiency_improvement_pct: Derived,
}

pub struct DerivedMetrics;

impl DerivedMetrics {
    pub fn change(first: f64, last: f64) -> f64 {
        last - first
    }

    /// `(last - first) / first * 100`, undefined for a zero baseline.
    pub fn change_pct(first: f64, last: f64) -> Derived {
        if first == 0.0 {
            return Derived::Undefined(UndefinedReason::ZeroBaseline);
        }
        Derived::from_value(Self::change(first, last) / first * 100.0)
    }

    /// `(1 / mortality) * 100 / health_spending`.
    pub fn efficiency(mortality: f64, health_spending: f64) -> Derived {
        if mortality == 0.0 {
            return Derived::Undefined(UndefinedReason::ZeroMortality);
        }
        if health_spending == 0.0 {
            return Derived::Undefined(UndefinedReason::ZeroSpending);
        }
        Derived::from_value((1.0 / mortality) * 100.0 / health_spending)
    }

    /// `(last / first - 1) * 100` over two efficiency values.
    pub fn improvement_pct(first: Derived, last: Derived) -> Derived {
        match (first, last) {
            (Derived::Defined(f), _) if f == 0.0 => {
                Derived::Undefined(UndefinedReason::ZeroBaseline)
            }
            (Derived::Defined(f), Derived::Defined(l)) => Derived::from_value((l / f - 1.0) * 100.0),
            _ => Derived::Undefined(UndefinedReason::MissingInput),
        }
    }

    pub fn compute(record: &SnapshotRecord) -> DerivedFields {
        let efficiency_first = Self::efficiency(record.mortality_first, record.health_first);
        let efficiency_last = Self::efficiency(record.mortality_last, record.health_last);

        DerivedFields {
            health_change: Self::change(record.health_first, record.health_last),
            health_change_pct: Self::change_pct(record.health_first, record.health_last),
            mortality_change: Self::change(record.mortality_first, record.mortality_last),
            mortality_change_pct: Self::change_pct(record.mortality_first, record.mortality_last),
            efficiency_first,
            efficiency_last,
            efficiency_improvement_pct: Self::improvement_pct(efficiency_first, efficiency_last),
        }
    }

    /// Attach derived fields to every record, then order the set by
    /// efficiency improvement.
    pub fn apply(set: &mut SnapshotSet) {
        for record in &mut set.records {
            let fields = Self::compute(record);
            if let Derived::Undefined(reason) = fields.efficiency_improvement_pct {
                debug!(
                    "{}: efficiency improvement undefined ({reason:?})",
                    record.country
                );
            }
            record.derived = Some(fields);
        }
        Self::sort_by_improvement(&mut set.records);
    }

    /// Descending by efficiency improvement. Undefined values, and records
    /// without derived fields, go last; ties keep their order.
    pub fn sort_by_improvement(records: &mut [SnapshotRecord]) {
        let key = |r: &SnapshotRecord| {
            r.derived
                .as_ref()
                .and_then(|d| d.efficiency_improvement_pct.value())
        };
        records.sort_by(|a, b| match (key(a), key(b)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn record(country: &str, health: (f64, f64), mortality: (f64, f64)) -> SnapshotRecord {
        SnapshotRecord {
            country: country.to_string(),
            region_code: None,
            health_first: health.0,
            health_last: health.1,
            mortality_first: mortality.0,
            mortality_last: mortality.1,
            derived: None,
        }
    }

    #[test]
    fn test_change_and_change_pct() {
        assert!((DerivedMetrics::change(5.0, 6.0) - 1.0).abs() < EPS);
        let pct = DerivedMetrics::change_pct(5.0, 6.0).value().unwrap();
        assert!((pct - 20.0).abs() < EPS);
    }

    #[test]
    fn test_efficiency() {
        let eff = DerivedMetrics::efficiency(10.0, 5.0).value().unwrap();
        assert!((eff - 2.0).abs() < EPS);
        assert_eq!(
            DerivedMetrics::efficiency(0.0, 5.0),
            Derived::Undefined(UndefinedReason::ZeroMortality)
        );
        assert_eq!(
            DerivedMetrics::efficiency(10.0, 0.0),
            Derived::Undefined(UndefinedReason::ZeroSpending)
        );
    }

    #[test]
    fn test_zero_baseline_is_undefined_not_infinite() {
        let fields = DerivedMetrics::compute(&record("Laos", (0.0, 2.0), (70.0, 60.0)));
        assert_eq!(
            fields.health_change_pct,
            Derived::Undefined(UndefinedReason::ZeroBaseline)
        );
        assert!((fields.health_change - 2.0).abs() < EPS);
        assert_eq!(
            fields.efficiency_first,
            Derived::Undefined(UndefinedReason::ZeroSpending)
        );
        assert_eq!(
            fields.efficiency_improvement_pct,
            Derived::Undefined(UndefinedReason::MissingInput)
        );
    }

    #[test]
    fn test_improvement_pct() {
        let pct = DerivedMetrics::improvement_pct(Derived::Defined(2.0), Derived::Defined(3.0));
        assert!((pct.value().unwrap() - 50.0).abs() < EPS);
        assert_eq!(
            DerivedMetrics::improvement_pct(Derived::Defined(0.0), Derived::Defined(3.0)),
            Derived::Undefined(UndefinedReason::ZeroBaseline)
        );
        assert_eq!(
            DerivedMetrics::improvement_pct(
                Derived::Defined(2.0),
                Derived::Undefined(UndefinedReason::ZeroMortality)
            ),
            Derived::Undefined(UndefinedReason::MissingInput)
        );
    }

    #[test]
    fn test_non_finite_values_are_flagged() {
        assert_eq!(
            Derived::from_value(f64::INFINITY),
            Derived::Undefined(UndefinedReason::NonFinite)
        );
        assert_eq!(
            Derived::from_value(f64::NAN),
            Derived::Undefined(UndefinedReason::NonFinite)
        );
    }

    #[test]
    fn test_apply_sorts_descending_with_undefined_last() {
        let mut set = SnapshotSet {
            first_year: 1995,
            last_year: 2010,
            records: vec![
                record("ZeroSpend", (0.0, 2.0), (50.0, 40.0)),
                record("Small", (2.0, 2.0), (50.0, 40.0)),
                record("Large", (2.0, 1.0), (50.0, 25.0)),
            ],
            excluded: Vec::new(),
        };

        DerivedMetrics::apply(&mut set);

        let order: Vec<&str> = set.records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["Large", "Small", "ZeroSpend"]);
        assert!(set.records.iter().all(|r| r.derived.is_some()));

        let small = set.get("Small").unwrap().derived.unwrap();
        assert!((small.efficiency_improvement_pct.value().unwrap() - 25.0).abs() < 1e-6);
    }
}
