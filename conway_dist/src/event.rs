// event.rs - Notifications sent to observers

use std::fmt;
use tokio::sync::mpsc;

use crate::grid::Cell;

/// Lifecycle state announced through [`Event::StateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Paused,
    Executing,
    Quitting,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Paused => "Paused",
            State::Executing => "Executing",
            State::Quitting => "Quitting",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A cell changed state during turn `completed_turns` (turn 0 is the loaded board).
    CellFlipped { completed_turns: usize, cell: Cell },
    TurnComplete { completed_turns: usize },
    AliveCellsCount { completed_turns: usize, cells_count: usize },
    ImageOutputComplete { completed_turns: usize, filename: String },
    FinalTurnComplete { completed_turns: usize, alive: Vec<Cell> },
    StateChange { completed_turns: usize, new_state: State },
}

impl Event {
    pub fn completed_turns(&self) -> usize {
        match self {
            Event::CellFlipped { completed_turns, .. }
            | Event::TurnComplete { completed_turns }
            | Event::AliveCellsCount { completed_turns, .. }
            | Event::ImageOutputComplete { completed_turns, .. }
            | Event::FinalTurnComplete { completed_turns, .. }
            | Event::StateChange { completed_turns, .. } => *completed_turns,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CellFlipped { cell, .. } => write!(f, "Cell flipped at {cell}"),
            Event::TurnComplete { completed_turns } => write!(f, "Turn {completed_turns} complete"),
            Event::AliveCellsCount { cells_count, .. } => write!(f, "Alive cells {cells_count}"),
            Event::ImageOutputComplete { filename, .. } => write!(f, "File {filename} output done"),
            Event::FinalTurnComplete { alive, .. } => write!(f, "Final turn complete, {} alive", alive.len()),
            Event::StateChange { new_state, .. } => write!(f, "{new_state}"),
        }
    }
}

/// Sending half of the ordered event stream.
///
/// Cloned into workers and the reporter; the stream closes once the coordinator
/// calls [`EventSink::close`] and every clone has been dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Waits for capacity. A gone observer is not an error for the engine.
    pub async fn send(&self, event: Event) {
        if self.tx.send(event).await.is_err() {
            tracing::trace!("event observer dropped; discarding event");
        }
    }

    pub fn close(self) {
        drop(self.tx);
    }
}
