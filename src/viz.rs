//! Chart rendering with Plotters and console summaries

use crate::kpi::{CategoryProfit, DashboardKpis, MonthlySales};
use crate::model::{RfmReport, Segment};
use anyhow::Context;
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::ops::Range;
use std::path::{Path, PathBuf};

const GOLD: RGBColor = RGBColor(212, 175, 55);
const SILVER: RGBColor = RGBColor(150, 150, 150);
const BRONZE: RGBColor = RGBColor(205, 127, 50);

fn segment_color(segment: Segment) -> RGBColor {
    match segment {
        Segment::Gold => GOLD,
        Segment::Silver => SILVER,
        Segment::Bronze => BRONZE,
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Axis range covering `values` with a small margin; `0..1` when empty
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad)..(max + pad)
}

/// Same as `padded_range` but always includes zero, for bar baselines
fn range_with_zero(values: impl Iterator<Item = f64>) -> Range<f64> {
    let range = padded_range(values.chain(std::iter::once(0.0)));
    range.start.min(0.0)..range.end.max(0.0)
}

/// `base` with `suffix` appended to its file stem, as an SVG path
pub fn sibling_path(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dashboard".to_string());
    base.with_file_name(format!("{}{}.svg", stem, suffix))
}

/// Scatter plot of Recency vs Monetary, coloured by segment
///
/// # Arguments
/// * `report` - Segmentation result
/// * `output_path` - Where to write the SVG
/// * `plot_title` - Optional chart title
pub fn create_segment_scatter(
    report: &RfmReport,
    output_path: &Path,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title = plot_title.unwrap_or("Recency vs Monetary Value by Segment");

    let x_range = padded_range(report.customers.values().map(|c| c.recency_days as f64));
    let y_range = padded_range(report.customers.values().map(|c| to_f64(c.monetary)));

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Recency (days)")
        .y_desc("Monetary")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for segment in Segment::ALL {
        let color = segment_color(segment);
        let points: Vec<(f64, f64)> = report
            .customers
            .values()
            .filter(|c| c.segment == segment)
            .map(|c| (c.recency_days as f64, to_f64(c.monetary)))
            .collect();

        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?
            .label(segment.label())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    tracing::debug!(path = %output_path.display(), "Wrote segment scatter");
    Ok(())
}

/// Line chart of sales per month
pub fn create_monthly_sales_chart(
    series: &[MonthlySales],
    output_path: &Path,
) -> crate::Result<()> {
    let y_range = range_with_zero(series.iter().map(|m| to_f64(m.sales)));
    let x_range = -0.5..(series.len().max(1) as f64 - 0.5);

    let root = SVGBackend::new(output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sales Trends Over Time", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    let month_label = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        series
            .get(idx as usize)
            .map(|m| m.month_end.format("%Y-%m").to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Sales")
        .x_labels(series.len().clamp(1, 12))
        .x_label_formatter(&month_label)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, to_f64(m.sales)))
        .collect();

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))?;

    root.present()
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    tracing::debug!(path = %output_path.display(), "Wrote monthly sales chart");
    Ok(())
}

/// Bar chart of profit per product category
pub fn create_category_profit_chart(
    series: &[CategoryProfit],
    output_path: &Path,
) -> crate::Result<()> {
    let y_range = range_with_zero(series.iter().map(|c| to_f64(c.profit)));
    let x_range = -0.5..(series.len().max(1) as f64 - 0.5);

    let root = SVGBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Profit by Product Category", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    let category_label = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        series
            .get(idx as usize)
            .map(|c| c.category.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Product Category")
        .y_desc("Profit")
        .x_labels(series.len().max(1))
        .x_label_formatter(&category_label)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(series.iter().enumerate().map(|(i, c)| {
        let x = i as f64;
        let color = Palette99::pick(i);
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, to_f64(c.profit))], color.filled())
    }))?;

    root.present()
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    tracing::debug!(path = %output_path.display(), "Wrote category profit chart");
    Ok(())
}

pub fn print_kpis(kpis: &DashboardKpis) {
    println!("\n=== Sales KPIs ===");
    println!("Total Revenue:    ${:.0}", kpis.total_revenue);
    println!("Total Profit:     ${:.0}", kpis.total_profit);
    match kpis.average_order_value {
        Some(aov) => println!("Avg. Order Value: ${:.2}", aov),
        None => println!("Avg. Order Value: n/a"),
    }
    println!("Order lines:      {}", kpis.order_lines);
}

/// Print tier sizes, boundaries and the top spenders
pub fn print_segment_statistics(report: &RfmReport) {
    println!("\n=== Customer Segments ===");
    if let Some(snapshot) = report.snapshot {
        println!("Snapshot date: {}", snapshot);
    }
    if let Some(q) = report.quartiles {
        println!("Spend quartiles: p25 = {:.2}, p75 = {:.2}", q.p25, q.p75);
    }

    let total = report.customers.len();
    println!("Segmented customers: {}", total);
    for (segment, count) in report.segment_counts() {
        let percentage = if total == 0 {
            0.0
        } else {
            (count as f64 / total as f64) * 100.0
        };
        println!("  {:<22} {:>6} ({:.1}%)", segment.label(), count, percentage);
    }
    if !report.undated.is_empty() {
        println!("Excluded (no valid order date): {}", report.undated.len());
    }

    let mut top: Vec<_> = report.customers.iter().collect();
    top.sort_by(|a, b| b.1.monetary.cmp(&a.1.monetary).then_with(|| a.0.cmp(b.0)));

    println!("\nTop customers by spend:");
    println!("  {:<28} | Recency | Frequency | Monetary   | Segment", "Customer");
    println!("  {:-<28}-|---------|-----------|------------|--------", "");
    for (name, c) in top.into_iter().take(10) {
        println!(
            "  {:<28} | {:7} | {:9} | {:10.2} | {}",
            name, c.recency_days, c.frequency, c.monetary, c.segment
        );
    }
}

/// Write all three charts next to `base_output_path` and print the summaries
///
/// Produces `<base>.svg`, `<base>_trend.svg` and `<base>_category.svg`.
pub fn generate_dashboard_report(
    kpis: &DashboardKpis,
    monthly: &[MonthlySales],
    categories: &[CategoryProfit],
    report: &RfmReport,
    base_output_path: &Path,
) -> crate::Result<Vec<PathBuf>> {
    let scatter_path = sibling_path(base_output_path, "");
    let trend_path = sibling_path(base_output_path, "_trend");
    let category_path = sibling_path(base_output_path, "_category");

    create_segment_scatter(report, &scatter_path, None)?;
    create_monthly_sales_chart(monthly, &trend_path)?;
    create_category_profit_chart(categories, &category_path)?;

    print_kpis(kpis);
    print_segment_statistics(report);

    Ok(vec![scatter_path, trend_path, category_path])
}
