// params.rs - Per-run configuration

use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Interval between population reports.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(2);
/// Default capacity of the event channel handed to observers.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Immutable run configuration: board size, turn limit and worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub image_width: usize,
    pub image_height: usize,
    pub turns: usize,
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },
    #[error("at least one worker thread is required")]
    NoThreads,
}

impl Params {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ParamsError::EmptyImage { width: self.image_width, height: self.image_height });
        }
        if self.threads == 0 {
            return Err(ParamsError::NoThreads);
        }
        Ok(())
    }

    /// Worker count actually used: one band needs at least one row.
    pub fn workers(&self) -> usize {
        if self.threads > self.image_height {
            warn!(
                threads = self.threads,
                height = self.image_height,
                "more workers than rows; clamping to the image height"
            );
            self.image_height
        } else {
            self.threads
        }
    }

    /// Name of the input image, `<W>x<H>`.
    pub fn input_name(&self) -> String {
        format!("{}x{}", self.image_width, self.image_height)
    }

    /// Name of a snapshot taken at `turn`, `<W>x<H>x<T>`.
    pub fn output_name(&self, turn: usize) -> String {
        format!("{}x{}x{}", self.image_width, self.image_height, turn)
    }
}
