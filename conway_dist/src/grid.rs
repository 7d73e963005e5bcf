// grid.rs - Toroidal grid types for Conway's Game of Life

use std::fmt;
use thiserror::Error;

pub const ALIVE: u8 = 255;                            // Live cell value, as stored in PGM images
pub const DEAD: u8 = 0;                               // Dead cell value

/// A cell coordinate: `x` indexes the width, `y` the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed-size board stored row-major. Every byte is either `ALIVE` or `DEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

/// Reasons a byte buffer cannot become a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("expected {expected} cell bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("cell byte {index} is {value}, must be 0 or 255")]
    Value { index: usize, value: u8 },
}

impl Grid {
    /// An all-dead board.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![DEAD; width * height] }
    }

    /// Build a board from `width * height` row-major bytes.
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Result<Self, GridError> {
        if cells.len() != width * height {
            return Err(GridError::Length { expected: width * height, actual: cells.len() });
        }
        if let Some((index, &value)) = cells.iter().enumerate().find(|&(_, &v)| v != ALIVE && v != DEAD) {
            return Err(GridError::Value { index, value });
        }
        Ok(Self { width, height, cells })
    }

    /// Build a board with the given cells alive. Coordinates wrap.
    pub fn from_alive(width: usize, height: usize, alive: &[Cell]) -> Self {
        let mut grid = Self::new(width, height);
        for cell in alive {
            grid.set(cell.x, cell.y, ALIVE);
        }
        grid
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn cells(&self) -> &[u8] { &self.cells }

    /// Toroidal read: any coordinate is folded back onto the board.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[(y % self.height) * self.width + (x % self.width)]
    }

    /// Read with signed offsets from `(x, y)`, wrapping at every edge.
    pub fn neighbour(&self, x: usize, y: usize, dx: isize, dy: isize) -> u8 {
        let nx = (x as isize + dx).rem_euclid(self.width as isize) as usize;
        let ny = (y as isize + dy).rem_euclid(self.height as isize) as usize;
        self.cells[ny * self.width + nx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        let index = (y % self.height) * self.width + (x % self.width);
        self.cells[index] = value;
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == ALIVE
    }

    /// Overwrite rows starting at `start_y` with a band computed elsewhere.
    pub fn write_rows(&mut self, start_y: usize, band: &[u8]) {
        let start = start_y * self.width;
        self.cells[start..start + band.len()].copy_from_slice(band);
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    /// Live cells in row-major order (y over height, x over width).
    pub fn alive_cells(&self) -> Vec<Cell> {
        let mut alive = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[y * self.width + x] == ALIVE {
                    alive.push(Cell::new(x, y));
                }
            }
        }
        alive
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            for &c in row {
                f.write_str(if c == ALIVE { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_wrap_around_every_edge() {
        let grid = Grid::from_alive(4, 3, &[Cell::new(0, 0), Cell::new(3, 2)]);
        assert_eq!(grid.get(4, 3), ALIVE);
        assert_eq!(grid.neighbour(0, 0, -1, -1), ALIVE);
        assert_eq!(grid.neighbour(3, 2, 1, 1), ALIVE);
        assert_eq!(grid.neighbour(1, 1, 0, 0), DEAD);
    }

    #[test]
    fn rejects_wrong_length_and_intermediate_values() {
        assert_eq!(
            Grid::from_cells(2, 2, vec![0; 3]),
            Err(GridError::Length { expected: 4, actual: 3 })
        );
        assert_eq!(
            Grid::from_cells(2, 2, vec![0, 255, 7, 0]),
            Err(GridError::Value { index: 2, value: 7 })
        );
    }

    #[test]
    fn alive_cells_scan_non_square_boards_row_major() {
        let grid = Grid::from_alive(5, 2, &[Cell::new(4, 1), Cell::new(1, 0), Cell::new(3, 0)]);
        assert_eq!(grid.alive_cells(), vec![Cell::new(1, 0), Cell::new(3, 0), Cell::new(4, 1)]);
        assert_eq!(grid.alive_count(), 3);
    }

    #[test]
    fn band_rows_copy_back_in_place() {
        let source = Grid::from_alive(3, 4, &[Cell::new(0, 1), Cell::new(2, 2)]);
        let mut target = Grid::new(3, 4);
        target.write_rows(1, &source.cells()[3..9]);
        assert_eq!(target, source);
    }
}
