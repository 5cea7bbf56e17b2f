//! Shipment Statistics Report
//!
//! Loads the same inputs as the map viewer and prints the joined data as a
//! console table, so a data problem can be spotted without opening a window.
//!
//! Run: ./target/release/shipment_stats --shipments data.csv --boundaries us-states.json

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use state_shipment_map::join::{enrich, merge, unmatched_codes};
use state_shipment_map::labels::{place_label, Placement};
use state_shipment_map::loader::{self, DEFAULT_BOUNDARIES_PATH, DEFAULT_SHIPMENTS_PATH};
use state_shipment_map::models::MergedRow;

#[derive(Parser, Debug)]
#[command(name = "shipment_stats")]
#[command(about = "Print per-state shipment counts, shares and label placement")]
struct Args {
    /// Shipment table (.csv, .xlsx, .xls, .ods)
    #[arg(long, default_value = DEFAULT_SHIPMENTS_PATH)]
    shipments: PathBuf,

    /// State boundaries GeoJSON
    #[arg(long, default_value = DEFAULT_BOUNDARIES_PATH)]
    boundaries: PathBuf,
}

fn placement_name(row: &MergedRow) -> &'static str {
    match place_label(row).map(|label| label.placement) {
        Some(Placement::Centroid) => "centroid",
        Some(Placement::Leader) => "leader",
        None => "-",
    }
}

/// Rows with a count, largest first; ties keep boundary order
fn served_rows(rows: &[MergedRow]) -> Vec<&MergedRow> {
    let mut served: Vec<&MergedRow> = rows.iter().filter(|r| r.shipment_count.is_some()).collect();
    served.sort_by(|a, b| b.shipment_count.cmp(&a.shipment_count));
    served
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let records = loader::load_shipments(&args.shipments)?;
    let record_count = records.len();
    let shipments = enrich(records);
    let features = loader::load_boundaries(&args.boundaries)?;
    let rows = merge(features, &shipments);

    let served = served_rows(&rows);
    let total: i64 = served.iter().filter_map(|r| r.shipment_count).sum();

    println!("\n{}", "=".repeat(60));
    println!("  SHIPMENT DISTRIBUTION BY STATE");
    println!("{}", "=".repeat(60));

    println!("\nINPUTS");
    println!("{}", "-".repeat(40));
    println!("  Shipment rows:     {:>8}", record_count);
    println!("  Boundaries:        {:>8}", rows.len());
    println!("  States served:     {:>8}", served.len());
    println!("  Total shipments:   {:>8}", total);

    println!("\nSTATES BY SHIPMENT COUNT");
    println!("{}", "-".repeat(60));
    println!("  {:4} {:16} {:>8} {:>7}  {:9} {}", "Code", "State", "Count", "Share", "Label", "");
    println!("  {}", "-".repeat(56));
    for row in &served {
        let count = row.shipment_count.unwrap_or_default();
        let share = row
            .shipment_share
            .map(|s| format!("{:.1}%", s * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let pct = if total > 0 { count as f64 / total as f64 * 100.0 } else { 0.0 };
        let bar: String = "#".repeat((pct / 2.0) as usize);
        println!(
            "  {:4} {:16} {:>8} {:>7}  {:9} {}",
            row.state_code.as_deref().unwrap_or("?"),
            row.state_name,
            count,
            share,
            placement_name(row),
            bar
        );
    }

    let unmatched = unmatched_codes(&shipments, &rows);
    println!("\nSHIPMENT CODES WITH NO BOUNDARY");
    println!("{}", "-".repeat(40));
    if unmatched.is_empty() {
        println!("  (none)");
    }
    for code in &unmatched {
        println!("  {}", code);
    }

    println!("\nBOUNDARIES WITH NO SHIPMENTS");
    println!("{}", "-".repeat(40));
    let unserved: Vec<&str> = rows
        .iter()
        .filter(|r| r.shipment_count.is_none())
        .map(|r| r.state_name.as_str())
        .collect();
    if unserved.is_empty() {
        println!("  (none)");
    }
    for name in &unserved {
        println!("  {}", name);
    }

    println!("\n{}", "=".repeat(60));
    println!();

    Ok(())
}
