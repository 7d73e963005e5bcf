// patterns.rs - Seed boards: classic patterns and a deterministic random fill

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::grid::{ALIVE, DEAD, Grid};

/// Live cells as `(x, y)` offsets from the pattern's top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (1, 0), (2, 0)],
    },
    Pattern {
        name: "Toad",
        cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (2, 0), (3, 0), (4, 0), (8, 0), (9, 0), (10, 0),
            (0, 2), (5, 2), (7, 2), (12, 2),
            (0, 3), (5, 3), (7, 3), (12, 3),
            (0, 4), (5, 4), (7, 4), (12, 4),
            (2, 5), (3, 5), (4, 5), (8, 5), (9, 5), (10, 5),
            // Bottom half (mirrored)
            (2, 7), (3, 7), (4, 7), (8, 7), (9, 7), (10, 7),
            (0, 8), (5, 8), (7, 8), (12, 8),
            (0, 9), (5, 9), (7, 9), (12, 9),
            (0, 10), (5, 10), (7, 10), (12, 10),
            (2, 12), (3, 12), (4, 12), (8, 12), (9, 12), (10, 12),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (0, 4), (1, 4), (0, 5), (1, 5),
            (10, 4), (10, 5), (10, 6), (11, 3), (11, 7), (12, 2), (12, 8),
            (13, 2), (13, 8), (14, 5), (15, 3), (15, 7), (16, 4), (16, 5),
            (16, 6), (17, 5), (20, 2), (20, 3), (20, 4), (21, 2), (21, 3),
            (21, 4), (22, 1), (22, 5), (24, 0), (24, 1), (24, 5), (24, 6),
            (34, 2), (34, 3), (35, 2), (35, 3),
        ],
    },
];

impl Pattern {
    /// Bounding box as `(width, height)`.
    pub fn extent(&self) -> (usize, usize) {
        let w = self.cells.iter().map(|&(x, _)| x + 1).max().unwrap_or(0);
        let h = self.cells.iter().map(|&(_, y)| y + 1).max().unwrap_or(0);
        (w, h)
    }

    /// Set the pattern's cells alive with its top-left corner at `(x0, y0)`. Wraps at the edges.
    pub fn place(&self, grid: &mut Grid, x0: usize, y0: usize) {
        for &(x, y) in self.cells {
            grid.set(x0 + x, y0 + y, ALIVE);
        }
    }

    /// A fresh board with the pattern centred on it.
    pub fn centred(&self, width: usize, height: usize) -> Grid {
        let (w, h) = self.extent();
        let mut grid = Grid::new(width, height);
        self.place(&mut grid, width.saturating_sub(w) / 2, height.saturating_sub(h) / 2);
        grid
    }
}

/// Look a pattern up by name, ignoring case, spaces and dashes.
pub fn find(name: &str) -> Option<&'static Pattern> {
    let key = normalise(name);
    PATTERNS.iter().find(|p| normalise(p.name) == key)
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Roughly a third of the cells alive, reproducible from `seed_value`.
pub fn random_grid(width: usize, height: usize, seed_value: u32) -> Grid {
    let mut hasher = DefaultHasher::new();
    seed_value.hash(&mut hasher);
    let mut seed = hasher.finish();

    let mut grid = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            grid.set(x, y, if (seed >> 16) % 3 == 0 { ALIVE } else { DEAD });
        }
    }
    grid
}
