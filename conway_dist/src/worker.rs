// worker.rs - Row-band workers and the per-turn barrier

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::trace;

use crate::error::GolError;
use crate::event::{Event, EventSink};
use crate::grid::{Cell, Grid};
use crate::rule;

/// Rows `[start_y, end_y)` across the full width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start_y: usize,
    pub end_y: usize,
}

impl Band {
    pub fn rows(&self) -> usize {
        self.end_y - self.start_y
    }
}

/// Split `height` rows into exactly `workers` bands of `height / workers` rows,
/// the last band absorbing the remainder. `workers` is clamped to `1..=height`.
pub fn partition(height: usize, workers: usize) -> Vec<Band> {
    let workers = workers.clamp(1, height.max(1));
    let block = height / workers;
    (0..workers)
        .map(|i| Band {
            start_y: i * block,
            end_y: if i + 1 == workers { height } else { (i + 1) * block },
        })
        .collect()
}

/// Next generation of `band`, emitting a flip for every cell that changes.
pub async fn compute_band(world: &Grid, band: Band, turn: usize, events: &EventSink) -> Vec<u8> {
    let width = world.width();
    let mut out = Vec::with_capacity(band.rows() * width);
    for y in band.start_y..band.end_y {
        for x in 0..width {
            let next = rule::next_state(world, x, y);
            if next != world.get(x, y) {
                events.send(Event::CellFlipped { completed_turns: turn, cell: Cell::new(x, y) }).await;
            }
            out.push(next);
        }
        tokio::task::yield_now().await;  // Cooperative yielding between rows
    }
    out
}

struct Job {
    turn: usize,
    band: Band,
    world: Arc<Grid>,
}

struct BandDone {
    band: Band,
    cells: Vec<u8>,
}

async fn run_worker(id: usize, mut jobs: mpsc::Receiver<Job>, done: mpsc::Sender<BandDone>, events: EventSink) {
    while let Some(job) = jobs.recv().await {
        let cells = compute_band(&job.world, job.band, job.turn, &events).await;
        trace!(worker = id, turn = job.turn, start_y = job.band.start_y, "band done");
        if done.send(BandDone { band: job.band, cells }).await.is_err() {
            break;
        }
    }
}

/// Fixed set of long-lived workers, one per band. Each turn every worker gets
/// its band of the shared read-only board and answers exactly once.
pub struct WorkerPool {
    bands: Vec<Band>,
    jobs: Vec<mpsc::Sender<Job>>,
    done: mpsc::Receiver<BandDone>,
    workers: JoinSet<()>,
}

impl WorkerPool {
    pub fn spawn(height: usize, workers: usize, events: &EventSink) -> Self {
        let bands = partition(height, workers);
        let (done_tx, done) = mpsc::channel(bands.len());
        let mut set = JoinSet::new();
        let mut jobs = Vec::with_capacity(bands.len());
        for id in 0..bands.len() {
            let (tx, rx) = mpsc::channel(1);
            set.spawn(run_worker(id, rx, done_tx.clone(), events.clone()));
            jobs.push(tx);
        }
        Self { bands, jobs, done, workers: set }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Compute turn `turn` from `world`. Returns only after every band has
    /// reported back; the stitched board is never observed partially.
    pub async fn step(&mut self, world: &Arc<Grid>, turn: usize) -> Result<Grid, GolError> {
        for (tx, &band) in self.jobs.iter().zip(&self.bands) {
            let job = Job { turn, band, world: Arc::clone(world) };
            tx.send(job).await.map_err(|_| GolError::WorkerLost)?;
        }

        let mut next = Grid::new(world.width(), world.height());
        let mut remaining = self.bands.len();
        while remaining > 0 {
            tokio::select! {
                Some(done) = self.done.recv() => {
                    next.write_rows(done.band.start_y, &done.cells);
                    remaining -= 1;
                }
                // Workers only exit on shutdown, so any exit here is a failure
                Some(joined) = self.workers.join_next() => {
                    joined?;
                    return Err(GolError::WorkerLost);
                }
                else => return Err(GolError::WorkerLost),
            }
        }
        Ok(next)
    }

    /// Close every job queue and join the workers.
    pub async fn shutdown(mut self) -> Result<(), GolError> {
        self.jobs.clear();
        while let Some(joined) = self.workers.join_next().await {
            joined?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ALIVE;
    use crate::patterns;

    fn sink() -> (EventSink, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(4096);
        (EventSink::new(tx), rx)
    }

    #[test]
    fn bands_cover_every_row_exactly_once() {
        for height in 1..=17 {
            for workers in 1..=height {
                let bands = partition(height, workers);
                assert_eq!(bands.len(), workers);
                assert_eq!(bands[0].start_y, 0);
                assert_eq!(bands[workers - 1].end_y, height);
                for pair in bands.windows(2) {
                    assert_eq!(pair[0].end_y, pair[1].start_y);
                    assert!(pair[0].rows() > 0);
                }
            }
        }
    }

    #[test]
    fn last_band_absorbs_the_remainder() {
        assert_eq!(
            partition(10, 3),
            vec![
                Band { start_y: 0, end_y: 3 },
                Band { start_y: 3, end_y: 6 },
                Band { start_y: 6, end_y: 10 },
            ]
        );
    }

    #[test]
    fn more_workers_than_rows_is_clamped() {
        assert_eq!(partition(3, 8).len(), 3);
    }

    #[tokio::test]
    async fn band_placement_does_not_change_the_result() {
        let world = Arc::new(patterns::random_grid(32, 20, 7));
        let (events, mut rx) = sink();

        let mut single = WorkerPool::spawn(20, 1, &events);
        let expected = single.step(&world, 1).await.expect("single band");
        single.shutdown().await.expect("shutdown");

        for workers in [2, 3, 7, 20] {
            let mut pool = WorkerPool::spawn(20, workers, &events);
            assert_eq!(pool.bands().len(), workers);
            let next = pool.step(&world, 1).await.expect("banded");
            assert_eq!(next, expected, "{workers} workers disagree with one");
            pool.shutdown().await.expect("shutdown");
        }

        drop(events);
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test]
    async fn flips_match_the_cells_that_changed() {
        let world = Arc::new(patterns::random_grid(16, 16, 3));
        let (events, mut rx) = sink();
        let mut pool = WorkerPool::spawn(16, 4, &events);
        let next = pool.step(&world, 9).await.expect("step");
        pool.shutdown().await.expect("shutdown");
        drop(events);

        let mut flipped = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                Event::CellFlipped { completed_turns, cell } => {
                    assert_eq!(completed_turns, 9);
                    flipped.push(cell);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        flipped.sort();

        let mut changed = Vec::new();
        let mut unchanged = 0;
        for y in 0..16 {
            for x in 0..16 {
                if world.get(x, y) != next.get(x, y) {
                    changed.push(Cell::new(x, y));
                } else {
                    unchanged += 1;
                }
            }
        }
        changed.sort();
        assert_eq!(flipped, changed);
        assert_eq!(flipped.len() + unchanged, 16 * 16);
        assert!(next.cells().iter().all(|&c| c == ALIVE || c == 0));
    }
}
