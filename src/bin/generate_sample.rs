//! Sample shipment table generator
//!
//! Writes a CSV with one row per state (`state,shipments,share`) that the
//! map viewer and `shipment_stats` can read directly. Counts are random but
//! reproducible with `--seed`, and a fraction of states can be left out so
//! the unfilled-state path gets exercised.
//!
//! Usage:
//!   cargo run --bin generate_sample -- [OPTIONS]
//!
//! Options:
//!   --seed <N>          Random seed for reproducibility (optional)
//!   --drop-rate <F>     Probability of omitting a state (default: 0.1)
//!   --max-count <N>     Largest count a state can get (default: 5000)
//!   --output <PATH>     Output CSV path (default: shipments.csv)

use anyhow::{ensure, Context, Result};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use state_shipment_map::state_names::state_codes;

#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Generate a random per-state shipment table")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Probability of leaving a state out (0.0 - 1.0)
    #[arg(long, default_value = "0.1")]
    drop_rate: f64,

    /// Largest shipment count for a single state
    #[arg(long, default_value = "5000")]
    max_count: u32,

    /// Output CSV path
    #[arg(long, default_value = "shipments.csv")]
    output: PathBuf,
}

#[derive(Debug, Serialize, PartialEq)]
struct SampleRow {
    state: &'static str,
    shipments: u32,
    share: f64,
}

/// Draw a count for every kept state, then fill in shares of the kept total
fn generate_rows(rng: &mut impl Rng, drop_rate: f64, max_count: u32) -> Vec<SampleRow> {
    let mut rows = Vec::new();
    for state in state_codes() {
        if rng.gen_bool(drop_rate) {
            continue;
        }
        rows.push(SampleRow {
            state,
            shipments: rng.gen_range(1..=max_count),
            share: 0.0,
        });
    }

    let total: u64 = rows.iter().map(|r| u64::from(r.shipments)).sum();
    if total > 0 {
        for row in &mut rows {
            row.share = f64::from(row.shipments) / total as f64;
        }
    }
    rows
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    ensure!(
        (0.0..=1.0).contains(&args.drop_rate),
        "--drop-rate must be between 0 and 1, got {}",
        args.drop_rate
    );
    ensure!(args.max_count > 0, "--max-count must be positive");

    println!("🔧 Sample Shipment Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output:       {}", args.output.display());
    println!("Drop rate:    {:.1}%", args.drop_rate * 100.0);
    println!("Max count:    {}", args.max_count);
    if let Some(seed) = args.seed {
        println!("Random seed:  {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let rows = generate_rows(&mut rng, args.drop_rate, args.max_count);

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let total: u64 = rows.iter().map(|r| u64::from(r.shipments)).sum();
    info!("Wrote {} rows to {}", rows.len(), args.output.display());

    println!("✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("States written:   {:>8}", rows.len());
    println!("States dropped:   {:>8}", state_codes().len() - rows.len());
    println!("Total shipments:  {:>8}", total);

    Ok(())
}
