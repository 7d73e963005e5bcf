//! Distributed Conway's Game of Life on a torus.
//!
//! Each turn the board is split into row bands, one per worker task; the
//! distributor waits for every band before swapping boards. Key presses pause,
//! resume, snapshot or quit the run, and a reporter publishes the population
//! every two seconds. Everything an observer needs arrives on the event stream.
//!
//! ```no_run
//! use conway_dist::{Params, PgmStore};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> Result<(), conway_dist::GolError> {
//! let params = Params { image_width: 64, image_height: 64, turns: 100, threads: 8 };
//! let (events_tx, mut events) = mpsc::channel(1000);
//! let (_keys_tx, keys) = mpsc::channel(10);
//! tokio::spawn(async move { while let Some(event) = events.recv().await { println!("{event}"); } });
//! conway_dist::run(params, PgmStore::new("images", "out"), events_tx, keys).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod control;
pub mod distributor;
pub mod error;
pub mod event;
pub mod grid;
pub mod io;
pub mod params;
pub mod patterns;
pub mod rule;
pub mod worker;

use tokio::sync::mpsc;

pub use control::Control;
pub use distributor::Distributor;
pub use error::GolError;
pub use event::{Event, EventSink, State};
pub use grid::{ALIVE, Cell, DEAD, Grid};
pub use io::{BoardStore, IoHandle, MemoryStore, PgmStore};
pub use params::Params;

/// Load the `<W>x<H>` board from `store`, then play it out.
///
/// Key codes arriving on `keys` are interpreted by a listener task that
/// outlives the run if its key source stays open. The event stream is closed
/// when this returns `Ok`; the value is the number of completed turns.
pub async fn run<S: BoardStore>(
    params: Params,
    store: S,
    events: mpsc::Sender<Event>,
    keys: mpsc::Receiver<char>,
) -> Result<usize, GolError> {
    params.validate()?;
    let io = IoHandle::spawn(store);
    let world = io.read_grid(&params).await?;

    let (control_tx, control_rx) = mpsc::channel(16);
    tokio::spawn(control::listen_keys(keys, control_tx));

    Distributor::new(params, world, EventSink::new(events), io, control_rx)
        .run()
        .await
}
