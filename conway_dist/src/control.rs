// control.rs - Key-press interrupts and the periodic population reporter

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::event::{Event, EventSink};
use crate::grid::Grid;

pub const KEY_PAUSE: char = 'p';
pub const KEY_QUIT: char = 'q';
pub const KEY_SNAPSHOT: char = 's';

/// Requests observed by the coordinator between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    Quit,
    Snapshot,
}

/// Where the key listener is: pressing `p` toggles between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Listening,
    Paused,
}

/// Transition table for the key listener.
pub fn interpret(state: ListenerState, key: char) -> (ListenerState, Option<Control>) {
    use ListenerState::*;
    match (state, key) {
        (Listening, KEY_PAUSE) => (Paused, Some(Control::Pause)),
        (Paused, KEY_PAUSE)    => (Listening, Some(Control::Resume)),
        (_, KEY_QUIT)          => (state, Some(Control::Quit)),
        (_, KEY_SNAPSHOT)      => (state, Some(Control::Snapshot)),
        _                      => (state, None),
    }
}

/// Turn key codes into control requests until either side goes away.
pub async fn listen_keys(mut keys: mpsc::Receiver<char>, control: mpsc::Sender<Control>) {
    let mut state = ListenerState::Listening;
    while let Some(key) = keys.recv().await {
        let (next, request) = interpret(state, key);
        state = next;
        match request {
            Some(request) => {
                info!(?request, key = %key.escape_debug(), "key press");
                if control.send(request).await.is_err() {
                    break;
                }
            }
            None => debug!(key = %key.escape_debug(), "ignoring key"),
        }
    }
    debug!("key listener finished");
}

/// What the coordinator publishes after each turn. Readers never mutate it.
#[derive(Debug, Clone)]
pub struct Progress {
    pub completed_turns: usize,
    pub world: Arc<Grid>,
}

/// Periodic `AliveCellsCount` reports, stopped explicitly at shutdown.
pub struct Reporter {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Reporter {
    pub fn spawn(progress: watch::Receiver<Progress>, events: EventSink, period: Duration) -> Self {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(report(progress, events, period, stopped));
        Self { stop, task }
    }

    pub async fn stop(self) -> Result<(), JoinError> {
        let _ = self.stop.send(());
        self.task.await
    }
}

async fn report(
    progress: watch::Receiver<Progress>,
    events: EventSink,
    period: Duration,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = ticker.tick() => {
                let Progress { completed_turns, world } = progress.borrow().clone();
                let cells_count = world.alive_count();
                debug!(completed_turns, cells_count, "population report");
                events.send(Event::AliveCellsCount { completed_turns, cells_count }).await;
            }
        }
    }
}
