// main.rs - Headless runner: keys from stdin, events to the log

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Parser;
use conway_dist::Event;
use conway_dist::cli::RunArgs;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = RunArgs::parse();
    let params = args.params();
    let store = args.store()?;

    let (events_tx, events) = mpsc::channel(args.event_capacity);
    let (keys_tx, keys) = mpsc::channel(10);
    spawn_stdin_keys(keys_tx);
    let observer = tokio::spawn(observe(events));

    info!("type p (pause/resume), s (snapshot) or q (quit) followed by enter");
    let turns = conway_dist::run(params, store, events_tx, keys)
        .await
        .context("simulation failed")?;
    observer.await?;
    info!(turns, "done");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Blocking stdin lives on its own thread so it never holds up runtime shutdown.
fn spawn_stdin_keys(keys: mpsc::Sender<char>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for key in line.chars().filter(|c| !c.is_whitespace()) {
                if keys.blocking_send(key).is_err() {
                    return;
                }
            }
        }
    });
}

async fn observe(mut events: mpsc::Receiver<Event>) {
    while let Some(event) = events.recv().await {
        match &event {
            Event::CellFlipped { completed_turns, cell } => trace!(completed_turns, %cell, "cell flipped"),
            Event::TurnComplete { completed_turns } => debug!(completed_turns, "turn complete"),
            other => info!(completed_turns = other.completed_turns(), "{other}"),
        }
    }
}
