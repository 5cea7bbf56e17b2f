use anyhow::Result;
use clap::Parser;
use state_shipment_map::app::{MapApp, WINDOW_TITLE};
use state_shipment_map::scene::MapScene;
use state_shipment_map::{join, loader};
use std::path::PathBuf;
use tracing::info;

/// Interactive map of shipments per US state
#[derive(Parser, Debug)]
#[command(name = "state_shipment_map")]
#[command(about = "Show shipment counts and shares per US state on an interactive map")]
struct Args {
    /// Shipment table (.xlsx, .xls, .ods or .csv)
    #[arg(long, default_value = loader::DEFAULT_SHIPMENTS_PATH)]
    shipments: PathBuf,

    /// US state boundaries as GeoJSON
    #[arg(long, default_value = loader::DEFAULT_BOUNDARIES_PATH)]
    boundaries: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let args = Args::parse();

    let shipments = loader::load_shipments(&args.shipments)?;
    let boundaries = loader::load_boundaries(&args.boundaries)?;

    let shipments = join::enrich(shipments);
    let rows = join::merge(boundaries, &shipments);
    let scene = MapScene::build(&rows);
    info!(
        "Built map with {} regions and {} labels",
        scene.regions.len(),
        scene.labels.len()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(MapApp::new(scene)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;

    info!("Window closed");
    Ok(())
}
