//! The global grid in row-major order, and the ways to seed one.

use rand::RngCore;
use rand::SeedableRng;

use super::block::{ALIVE, DEAD};
use super::config::MIN_SIDE;
use super::error::{TorusError, TorusResult};

/// A square `side`×`side` grid of cells, row-major, each 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    side: usize,
    cells: Vec<u8>,
}

impl Grid {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: vec![DEAD; side * side],
        }
    }

    /// Wrap existing row-major cells, checking size and cell states.
    pub fn from_cells(side: usize, cells: Vec<u8>) -> TorusResult<Self> {
        if cells.len() != side * side {
            return Err(TorusError::CellCount {
                expected: side * side,
                got: cells.len(),
            });
        }
        if let Some((index, &value)) = cells.iter().enumerate().find(|&(_, &c)| c > ALIVE) {
            return Err(TorusError::InvalidCell { index, value });
        }
        Ok(Self { side, cells })
    }

    /// Cells produced by the engine itself, already known to be valid.
    pub(crate) fn from_layout(side: usize, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), side * side);
        Self { side, cells }
    }

    /// Build from `(row, col)` live cells. Every coordinate must lie inside
    /// the grid.
    pub fn from_live(side: usize, live: &[(usize, usize)]) -> TorusResult<Self> {
        let mut grid = Self::new(side);
        for &(row, col) in live {
            if row >= side || col >= side {
                return Err(TorusError::CellOutOfRange { row, col, side });
            }
            grid.set(row, col, true);
        }
        Ok(grid)
    }

    /// Random grid where each cell is live with probability `density`.
    pub fn random(side: usize, density: f64, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let threshold = (u64::MAX as f64 * density.clamp(0.0, 1.0)) as u64;
        let cells = (0..side * side)
            .map(|_| if rng.next_u64() <= threshold { ALIVE } else { DEAD })
            .collect();
        Self { side, cells }
    }

    /// Empty grid with a glider near the top-left corner, heading down-right.
    pub fn with_glider(side: usize) -> TorusResult<Self> {
        if side < MIN_SIDE {
            return Err(TorusError::GridTooSmall { side });
        }
        Self::from_live(side, &[(1, 3), (2, 1), (2, 3), (3, 2), (3, 3)])
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    /// Panics if `(row, col)` is outside the grid.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)] == ALIVE
    }

    /// Panics if `(row, col)` is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let index = self.index(row, col);
        self.cells[index] = if alive { ALIVE } else { DEAD };
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.side && col < self.side,
            "cell ({row}, {col}) is outside a {0}x{0} grid",
            self.side
        );
        row * self.side + col
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    /// Live cells as `(row, col)` in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == ALIVE)
            .map(|(i, _)| (i / self.side, i % self.side))
            .collect()
    }
}
