//! Stats module - derived metrics, summaries and trend lines

mod calculator;
mod derived;

pub use calculator::{CountryValue, IndicatorSummary, StatsCalculator, TrendLine, YearlyMean};
pub use derived::{Derived, DerivedFields, DerivedMetrics, UndefinedReason};
