// distributor.rs - Turn coordinator: drives workers, reacts to control requests

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::control::{Control, Progress, Reporter};
use crate::error::GolError;
use crate::event::{Event, EventSink, State};
use crate::grid::Grid;
use crate::io::IoHandle;
use crate::params::{Params, REPORT_INTERVAL};
use crate::worker::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Quitting,
    Terminated,
}

/// Owns the board and the turn counter for one run.
pub struct Distributor {
    params: Params,
    world: Arc<Grid>,
    turn: usize,
    state: RunState,
    events: EventSink,
    io: IoHandle,
    control: mpsc::Receiver<Control>,
    progress: watch::Sender<Progress>,
    report_interval: Duration,
}

impl Distributor {
    pub fn new(
        params: Params,
        world: Grid,
        events: EventSink,
        io: IoHandle,
        control: mpsc::Receiver<Control>,
    ) -> Self {
        let world = Arc::new(world);
        let (progress, _) = watch::channel(Progress { completed_turns: 0, world: Arc::clone(&world) });
        Self {
            params,
            world,
            turn: 0,
            state: RunState::Running,
            events,
            io,
            control,
            progress,
            report_interval: REPORT_INTERVAL,
        }
    }

    pub fn with_report_interval(mut self, period: Duration) -> Self {
        self.report_interval = period;
        self
    }

    /// Read-only view of the turn counter and current board.
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Run until the turn limit or a quit request, then shut down and close
    /// the event stream. Returns the number of completed turns.
    pub async fn run(mut self) -> Result<usize, GolError> {
        for cell in self.world.alive_cells() {
            self.events.send(Event::CellFlipped { completed_turns: 0, cell }).await;
        }

        let mut pool = WorkerPool::spawn(self.params.image_height, self.params.workers(), &self.events);
        let reporter = Reporter::spawn(self.progress.subscribe(), self.events.clone(), self.report_interval);
        info!(
            width = self.params.image_width,
            height = self.params.image_height,
            turns = self.params.turns,
            workers = pool.bands().len(),
            "starting simulation"
        );

        while self.turn < self.params.turns {
            match self.state {
                RunState::Running => match self.control.try_recv() {
                    Ok(request) => self.handle(request).await?,
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => self.advance(&mut pool).await?,
                },
                RunState::Paused => match self.control.recv().await {
                    Some(request) => self.handle(request).await?,
                    None => {
                        warn!("command source closed while paused; resuming");
                        self.enter(RunState::Running).await;
                    }
                },
                RunState::Quitting | RunState::Terminated => break,
            }
        }

        let interrupted = self.state == RunState::Quitting;
        self.events
            .send(Event::FinalTurnComplete { completed_turns: self.turn, alive: self.world.alive_cells() })
            .await;
        if !interrupted {
            self.snapshot().await?;
        }

        // Any pending snapshot must reach the output sink before shutting down
        self.io.check_idle().await?;
        pool.shutdown().await?;
        reporter.stop().await?;

        self.state = RunState::Terminated;
        self.events
            .send(Event::StateChange { completed_turns: self.turn, new_state: State::Quitting })
            .await;
        info!(completed_turns = self.turn, interrupted, "simulation finished");
        self.events.close();
        Ok(self.turn)
    }

    async fn handle(&mut self, request: Control) -> Result<(), GolError> {
        match (self.state, request) {
            (RunState::Running, Control::Pause) => self.enter(RunState::Paused).await,
            (RunState::Paused, Control::Resume) => self.enter(RunState::Running).await,
            (_, Control::Quit) => {
                info!(turn = self.turn, "quit requested");
                self.snapshot().await?;
                self.state = RunState::Quitting;
            }
            (_, Control::Snapshot) => self.snapshot().await?,
            (state, request) => debug!(?state, ?request, "ignoring control request"),
        }
        Ok(())
    }

    async fn enter(&mut self, state: RunState) {
        self.state = state;
        let new_state = match state {
            RunState::Paused => State::Paused,
            RunState::Running => State::Executing,
            RunState::Quitting | RunState::Terminated => State::Quitting,
        };
        info!(turn = self.turn, %new_state, "state change");
        self.events.send(Event::StateChange { completed_turns: self.turn, new_state }).await;
    }

    /// One full turn: dispatch bands, wait for all of them, swap boards.
    async fn advance(&mut self, pool: &mut WorkerPool) -> Result<(), GolError> {
        let next = pool.step(&self.world, self.turn + 1).await?;
        self.world = Arc::new(next);
        self.turn += 1;
        self.progress.send_replace(Progress { completed_turns: self.turn, world: Arc::clone(&self.world) });
        debug!(turn = self.turn, "turn complete");
        self.events.send(Event::TurnComplete { completed_turns: self.turn }).await;
        Ok(())
    }

    /// Hand the current board to the output sink and wait until it is written.
    async fn snapshot(&mut self) -> Result<(), GolError> {
        let filename = self.params.output_name(self.turn);
        self.io.write_grid(filename.clone(), &self.world)?;
        self.io.check_idle().await?;
        self.events
            .send(Event::ImageOutputComplete { completed_turns: self.turn, filename })
            .await;
        Ok(())
    }
}
