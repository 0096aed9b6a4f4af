//! TierForge: sales dashboard with RFM segmentation
//!
//! This is the main entrypoint that orchestrates data loading, filtering,
//! aggregation, segmentation and chart rendering.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::time::Instant;
use tierforge::{
    available_regions, compute_kpis, load_transactions, monthly_sales, profit_by_category, viz,
    Args, RfmAnalyzer, Transaction,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        println!("TierForge - Sales Dashboard & RFM Segmentation");
        println!("==============================================\n");
    }

    // Check if in classification mode
    if let Some(spend) = args.parse_classify_spend()? {
        run_classification_mode(&args, spend)?;
    } else {
        run_full_pipeline(&args)?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the input file and apply the region selection
fn load_filtered(args: &Args) -> Result<Vec<Transaction>> {
    let loaded = load_transactions(&args.input, &args.load_options())
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if loaded.skipped_rows > 0 {
        tracing::warn!(skipped = loaded.skipped_rows, "Dropped malformed rows");
    }
    if args.verbose {
        println!("Loaded {} order lines", loaded.transactions.len());
        println!("Regions available: {:?}", available_regions(&loaded.transactions));
    }

    let selection = args.region_filter().apply(&loaded.transactions);
    tracing::info!(rows = selection.len(), "Order lines after region filter");
    Ok(selection)
}

/// Report the tier a hypothetical spend would land in
fn run_classification_mode(args: &Args, spend: Decimal) -> Result<()> {
    println!("=== Classification Mode ===");
    println!("Input spend: {}", spend);

    let start_time = Instant::now();
    let transactions = load_filtered(args)?;
    let report = RfmAnalyzer::new(args.rfm_config()).analyze(&transactions)?;

    let quartiles = report
        .quartiles
        .context("No customers could be segmented; quartiles are undefined")?;
    let segment = quartiles.classify(spend);

    println!("\n✓ Predicted Segment: {}", segment.label());
    println!("  Processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("\nSegment boundaries over {} customers:", report.customers.len());
    println!("  Bronze: spend <= {:.2}", quartiles.p25);
    println!("  Gold:   spend >= {:.2}", quartiles.p75);

    Ok(())
}

/// Run the full dashboard pipeline
fn run_full_pipeline(args: &Args) -> Result<()> {
    println!("=== Sales Dashboard ===\n");

    let start_time = Instant::now();

    // Step 1: Load and filter
    if args.verbose {
        println!("Step 1: Loading data");
        println!("  Input file: {}", args.input.display());
    }
    let transactions = load_filtered(args)?;
    println!("✓ Data loaded: {} order lines", transactions.len());

    // Step 2: KPIs and chart series
    if args.verbose {
        println!("\nStep 2: Computing KPIs and chart series");
    }
    let kpis = compute_kpis(&transactions)?;
    let monthly = monthly_sales(&transactions)?;
    let categories = profit_by_category(&transactions)?;

    // Step 3: RFM segmentation
    if args.verbose {
        println!("\nStep 3: Segmenting customers");
        println!("  Recency policy: {:?}", args.recency_policy);
    }
    let segment_start = Instant::now();
    let report = RfmAnalyzer::new(args.rfm_config()).analyze(&transactions)?;
    println!("✓ Segmented {} customers", report.customers.len());
    if args.verbose {
        println!("  Segmentation time: {:.3}s", segment_start.elapsed().as_secs_f64());
    }

    // Step 4: Charts and summaries
    let written =
        viz::generate_dashboard_report(&kpis, &monthly, &categories, &report, &args.output)?;

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(json_path, json)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        println!("\nSegments written to: {}", json_path.display());
    }

    println!("\n=== Dashboard Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    for path in written {
        println!("Chart saved to: {}", path.display());
    }

    Ok(())
}
