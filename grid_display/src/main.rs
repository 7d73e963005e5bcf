// main.rs - Live viewer: runs the engine in the background and paints its events

use anyhow::{Result, anyhow};
use clap::Parser;
use conway_dist::cli::RunArgs;
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{error, info};

mod ui;

use ui::LiveView;

fn main() -> Result<()> {
    init_tracing();
    let args = RunArgs::parse();
    let params = args.params();
    let store = args.store()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let (events_tx, events) = mpsc::channel(args.event_capacity);
    let (keys_tx, keys) = mpsc::channel(10);
    runtime.spawn(async move {
        match conway_dist::run(params, store, events_tx, keys).await {
            Ok(turns) => info!(turns, "simulation finished"),
            Err(err) => error!(%err, "simulation failed"),
        }
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([860.0, 960.0]),
        ..Default::default()
    };

    let view = LiveView::new(params, events, keys_tx, runtime);
    eframe::run_native(
        "Distributed Game of Life",
        options,
        Box::new(move |_cc| Box::new(view)),
    )
    .map_err(|err| anyhow!("viewer failed: {err}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
