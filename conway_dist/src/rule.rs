// rule.rs - Conway's rule over the eight toroidal neighbours

use crate::grid::{ALIVE, DEAD, Grid};

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Number of live cells among the eight neighbours of `(x, y)`, in `0..=8`.
pub fn live_neighbours(grid: &Grid, x: usize, y: usize) -> u8 {
    // Cells are 0 or 255, so the raw sum divided by 255 is the live count
    let sum: u32 = NEIGHBOURS
        .iter()
        .map(|&(dx, dy)| u32::from(grid.neighbour(x, y, dx, dy)))
        .sum();
    (sum / u32::from(ALIVE)) as u8
}

/// State of `(x, y)` in the next generation.
pub fn next_state(grid: &Grid, x: usize, y: usize) -> u8 {
    let current_alive = grid.get(x, y) == ALIVE;
    match (current_alive, live_neighbours(grid, x, y)) {
        (true, 2) | (true, 3) => ALIVE,   // Survival
        (false, 3)            => ALIVE,   // Birth
        _                     => DEAD,    // Death or stays dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn counts_wrap_across_corners() {
        // Every other corner of a 4x4 board touches (0, 0) through the wrap
        let grid = Grid::from_alive(4, 4, &[Cell::new(3, 3), Cell::new(3, 0), Cell::new(0, 3)]);
        assert_eq!(live_neighbours(&grid, 0, 0), 3);
        assert_eq!(next_state(&grid, 0, 0), ALIVE);
    }

    #[test]
    fn lonely_and_crowded_cells_die() {
        let lonely = Grid::from_alive(3, 3, &[Cell::new(1, 1)]);
        assert_eq!(next_state(&lonely, 1, 1), DEAD);

        let crowded = Grid::from_alive(
            5, 5,
            &[Cell::new(2, 2), Cell::new(1, 1), Cell::new(2, 1), Cell::new(3, 1), Cell::new(1, 2)],
        );
        assert_eq!(live_neighbours(&crowded, 2, 2), 4);
        assert_eq!(next_state(&crowded, 2, 2), DEAD);
    }

    #[test]
    fn blinker_centre_survives_and_ends_are_born() {
        let grid = Grid::from_alive(5, 5, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)]);
        assert_eq!(next_state(&grid, 2, 2), ALIVE);
        assert_eq!(next_state(&grid, 2, 1), ALIVE);
        assert_eq!(next_state(&grid, 2, 3), ALIVE);
        assert_eq!(next_state(&grid, 1, 2), DEAD);
    }
}
