//! Static Chart Renderer
//! Draws the dashboard charts to PNG with plotters.
//!
//! Charts:
//! 1. Efficiency improvement by country (bar chart, best first)
//! 2. Infant mortality over the year range (one line per country)
//! 3. Health spending vs infant mortality for a snapshot year, with its trend line

use crate::charts::RenderError;
use crate::data::{CountryYearRecord, Indicator, SnapshotRecord};
use crate::pipeline::DashboardData;
use crate::stats::TrendLine;
use log::{info, warn};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const FONT: &str = "sans-serif";

const BAR_COLOR: RGBColor = RGBColor(91, 155, 213);
const TREND_COLOR: RGBColor = RGBColor(237, 125, 49);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    EfficiencyBars,
    MortalityLines,
    SpendingScatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::EfficiencyBars,
        ChartKind::MortalityLines,
        ChartKind::SpendingScatter,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::EfficiencyBars => "efficiency_improvement.png",
            ChartKind::MortalityLines => "infant_mortality_trend.png",
            ChartKind::SpendingScatter => "spending_vs_mortality.png",
        }
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart into `out_dir`, returning the written paths.
    /// A chart with nothing to draw is skipped with a warning.
    pub fn render_all(data: &DashboardData, out_dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        let mut written = Vec::new();
        let (first, last) = (data.snapshot.first_year, data.snapshot.last_year);

        for chart in ChartKind::ALL {
            let path = out_dir.join(chart.file_name());
            let result = match chart {
                ChartKind::EfficiencyBars => {
                    Self::render_efficiency_bars(&data.snapshot.records, first, last, &path)
                }
                ChartKind::MortalityLines => Self::render_mortality_lines(&data.long_form, &path),
                ChartKind::SpendingScatter => {
                    Self::render_scatter(&data.long_form, &data.trend_lines, last, &path)
                }
            };

            match result {
                Ok(()) => {
                    info!("Wrote {}", path.display());
                    written.push(path);
                }
                Err(RenderError::NoData(what)) => {
                    warn!("Skipping {}: no {what} to plot", chart.file_name())
                }
                Err(e) => return Err(e),
            }
        }

        Ok(written)
    }

    /// Bar chart of efficiency improvement; rows with an undefined value are left out.
    pub fn render_efficiency_bars(
        records: &[SnapshotRecord],
        first: i32,
        last: i32,
        path: &Path,
    ) -> Result<(), RenderError> {
        let bars: Vec<(String, f64)> = records
            .iter()
            .filter_map(|r| {
                let value = r.derived.as_ref()?.efficiency_improvement_pct.value()?;
                Some((display_name(&r.country, r.region_code.as_deref()), value))
            })
            .collect();
        if bars.is_empty() {
            return Err(RenderError::NoData("efficiency improvement"));
        }

        let (y_min, y_max) = padded_range(bars.iter().map(|(_, v)| *v).chain([0.0]));
        let labels: Vec<String> = bars.iter().map(|(l, _)| l.clone()).collect();
        let x_max = bars.len() as f64 - 0.5;

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Efficiency improvement {first}-{last} (%)"),
                (FONT, 24),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..x_max, y_min..y_max)
            .map_err(draw_err)?;

        let label_for = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&label_for)
            .y_desc("%")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
                let x = i as f64;
                let (low, high) = if *v >= 0.0 { (0.0, *v) } else { (*v, 0.0) };
                Rectangle::new([(x - 0.35, low), (x + 0.35, high)], BAR_COLOR.filled())
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// One infant-mortality line per country; missing years break nothing,
    /// they are simply not plotted.
    pub fn render_mortality_lines(
        records: &[CountryYearRecord],
        path: &Path,
    ) -> Result<(), RenderError> {
        let series = series_by_country(records, |r| r.infant_mortality);
        if series.is_empty() {
            return Err(RenderError::NoData("infant mortality values"));
        }

        let year_min = records.iter().map(|r| r.year).min().unwrap_or_default();
        let year_max = records.iter().map(|r| r.year).max().unwrap_or_default();
        let (_, y_max) = padded_range(
            series
                .iter()
                .flat_map(|(_, points)| points.iter().map(|p| p.1))
                .chain([0.0]),
        );

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Infant mortality rate by country", (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(year_min..year_max + 1, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc(Indicator::InfantMortality.label())
            .draw()
            .map_err(draw_err)?;

        for (i, (label, points)) in series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(LineSeries::new(points.iter().copied(), &color))
                .map_err(draw_err)?
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Scatter of spending against mortality for `year`, plus that year's
    /// trend line when one was fitted.
    pub fn render_scatter(
        records: &[CountryYearRecord],
        trend_lines: &[TrendLine],
        year: i32,
        path: &Path,
    ) -> Result<(), RenderError> {
        let points: Vec<(String, f64, f64)> = records
            .iter()
            .filter(|r| r.year == year)
            .filter_map(|r| {
                Some((
                    display_name(&r.country, r.region_code.as_deref()),
                    r.health_spending?,
                    r.infant_mortality?,
                ))
            })
            .collect();
        if points.is_empty() {
            return Err(RenderError::NoData("complete (spending, mortality) pairs"));
        }

        let (x_min, x_max) = padded_range(points.iter().map(|p| p.1));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p.2));

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Health spending vs infant mortality, {year}"),
                (FONT, 24),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(Indicator::HealthSpending.label())
            .y_desc(Indicator::InfantMortality.label())
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|(_, x, y)| Circle::new((*x, *y), 5, BAR_COLOR.filled())),
            )
            .map_err(draw_err)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|(label, x, y)| Text::new(label.clone(), (*x, *y), (FONT, 13).into_font())),
            )
            .map_err(draw_err)?;

        if let Some(line) = trend_lines.iter().find(|l| l.year == year) {
            chart
                .draw_series(LineSeries::new(
                    [(x_min, line.predict(x_min)), (x_max, line.predict(x_max))],
                    TREND_COLOR.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(format!("Trend (R² = {:.2})", line.r_squared))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &TREND_COLOR));

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Country label with its region code when one was resolved.
fn display_name(country: &str, region_code: Option<&str>) -> String {
    match region_code {
        Some(code) => format!("{country} ({code})"),
        None => country.to_string(),
    }
}

/// Min/max of `values` widened by 10% on each side; never an empty range.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return (0.0, 1.0);
    }
    let pad = if max > min {
        (max - min) * 0.1
    } else {
        max.abs().max(1.0) * 0.1
    };
    (min - pad, max + pad)
}

/// (label, [(year, value)]) per country, in first-seen order.
fn series_by_country<F>(records: &[CountryYearRecord], value: F) -> Vec<(String, Vec<(i32, f64)>)>
where
    F: Fn(&CountryYearRecord) -> Option<f64>,
{
    let mut series: Vec<(String, Vec<(i32, f64)>)> = Vec::new();
    let mut current: Option<&str> = None;
    for record in records {
        let Some(v) = value(record) else {
            continue;
        };
        if current != Some(record.country.as_str()) {
            current = Some(record.country.as_str());
            series.push((
                display_name(&record.country, record.region_code.as_deref()),
                Vec::new(),
            ));
        }
        if let Some((_, points)) = series.last_mut() {
            points.push((record.year, v));
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, year: i32, m: Option<f64>, code: Option<&str>) -> CountryYearRecord {
        CountryYearRecord {
            country: country.to_string(),
            year,
            health_spending: Some(1.0),
            infant_mortality: m,
            region_code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_display_name_tolerates_missing_code() {
        assert_eq!(display_name("Laos", Some("LAO")), "Laos (LAO)");
        assert_eq!(display_name("Atlantis", None), "Atlantis");
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert!((lo + 1.0).abs() < 1e-9);
        assert!((hi - 11.0).abs() < 1e-9);
        let (lo, hi) = padded_range([5.0, f64::NAN].into_iter());
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn test_series_by_country_skips_missing_points() {
        let records = vec![
            record("Laos", 2000, Some(80.0), Some("LAO")),
            record("Laos", 2001, None, Some("LAO")),
            record("Laos", 2002, Some(70.0), Some("LAO")),
            record("Atlantis", 2000, None, None),
            record("Atlantis", 2001, Some(5.0), None),
        ];

        let series = series_by_country(&records, |r| r.infant_mortality);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "Laos (LAO)");
        assert_eq!(series[0].1, vec![(2000, 80.0), (2002, 70.0)]);
        assert_eq!(series[1].0, "Atlantis");
        assert_eq!(series[1].1, vec![(2001, 5.0)]);
    }

    #[test]
    fn test_empty_bars_report_no_data() {
        let dir = std::env::temp_dir().join("asean_health_no_bars.png");
        let err = StaticChartRenderer::render_efficiency_bars(&[], 1995, 2010, &dir).unwrap_err();
        assert!(matches!(err, RenderError::NoData(_)));
    }

    #[test]
    fn test_axis_labels_come_from_indicators() {
        assert_eq!(
            Indicator::InfantMortality.label(),
            "Infant mortality (per 1,000 live births)"
        );
        assert_ne!(
            Indicator::HealthSpending.label(),
            Indicator::HealthSpending.column_name()
        );
    }
}
