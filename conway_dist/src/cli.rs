// cli.rs - Command-line configuration shared by the binaries

use std::path::PathBuf;

use clap::Parser;

use crate::io::{IoError, PgmStore, SeededStore};
use crate::params::{DEFAULT_EVENT_CAPACITY, Params};
use crate::patterns;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Conway's Game of Life on a torus, computed by a pool of row-band workers")]
pub struct RunArgs {
    /// Board width in cells
    #[arg(long, default_value_t = 512)]
    pub width: usize,

    /// Board height in cells
    #[arg(long, default_value_t = 512)]
    pub height: usize,

    /// Number of turns to play
    #[arg(long, default_value_t = 10_000_000)]
    pub turns: usize,

    /// Worker tasks, each owning one band of rows
    #[arg(short, long, default_value_t = 8)]
    pub threads: usize,

    /// Directory holding `<W>x<H>.pgm` input images
    #[arg(long, default_value = "images")]
    pub images: PathBuf,

    /// Directory snapshots are written to
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Start from a built-in pattern (e.g. glider, pulsar, random) instead of an image
    #[arg(long)]
    pub pattern: Option<String>,

    /// Seed for `--pattern random`
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Events buffered before the engine waits for the observer
    #[arg(long, default_value_t = DEFAULT_EVENT_CAPACITY)]
    pub event_capacity: usize,
}

impl RunArgs {
    pub fn params(&self) -> Params {
        Params {
            image_width: self.width,
            image_height: self.height,
            turns: self.turns,
            threads: self.threads,
        }
    }

    /// PGM files on disk, optionally with the input board replaced by a pattern.
    pub fn store(&self) -> Result<SeededStore<PgmStore>, IoError> {
        let params = self.params();
        params.validate()?;
        let store = SeededStore::new(PgmStore::new(&self.images, &self.out));
        let Some(name) = self.pattern.as_deref() else {
            return Ok(store);
        };
        let grid = if name.eq_ignore_ascii_case("random") {
            patterns::random_grid(self.width, self.height, self.seed)
        } else {
            patterns::find(name)
                .ok_or_else(|| IoError::UnknownPattern(name.to_string()))?
                .centred(self.width, self.height)
        };
        Ok(store.seed(params.input_name(), &grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BoardStore;
    use crate::params::ParamsError;

    #[test]
    fn defaults_and_overrides_parse() {
        let args = RunArgs::parse_from(["conway_dist"]);
        assert_eq!(args.params(), Params { image_width: 512, image_height: 512, turns: 10_000_000, threads: 8 });
        assert_eq!(args.event_capacity, DEFAULT_EVENT_CAPACITY);

        let args = RunArgs::parse_from([
            "conway_dist", "--width", "16", "--height", "8", "--turns", "3", "-t", "2",
        ]);
        assert_eq!(args.params(), Params { image_width: 16, image_height: 8, turns: 3, threads: 2 });
    }

    #[test]
    fn pattern_seeds_the_input_board() {
        let args = RunArgs::parse_from(["conway_dist", "--width", "8", "--height", "8", "--pattern", "Glider"]);
        let cells = args.store().expect("store").load("8x8", 8, 8).expect("seeded board");
        assert_eq!(cells.iter().filter(|&&c| c == crate::grid::ALIVE).count(), 5);

        let args = RunArgs::parse_from(["conway_dist", "--pattern", "spaceship"]);
        assert!(matches!(args.store(), Err(IoError::UnknownPattern(_))));
    }

    #[test]
    fn empty_board_is_rejected_before_seeding() {
        for size in [["--width", "0", "--height", "8"], ["--width", "8", "--height", "0"]] {
            let argv = ["conway_dist"].into_iter().chain(size).chain(["--pattern", "glider"]);
            let args = RunArgs::parse_from(argv);
            assert!(matches!(args.store(), Err(IoError::Params(ParamsError::EmptyImage { .. }))));
        }
        let args = RunArgs::parse_from(["conway_dist", "--width", "0", "--pattern", "random"]);
        assert!(matches!(args.store(), Err(IoError::Params(_))));
    }
}
