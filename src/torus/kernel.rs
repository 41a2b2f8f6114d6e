//! Local update kernel for one block.
//!
//! Builds a padded `(edge + 2)`×`(edge + 2)` copy of the block with the halo
//! written into its outer ring, then computes every interior cell from that
//! snapshot into a fresh block. The padded copy is never written during the
//! pass, so no cell sees a neighbor's next-generation state.

use super::block::{ALIVE, Block, DEAD, HaloPacket};

/// B3/S23: a live cell survives with 2 or 3 live neighbors, a dead cell is
/// born with exactly 3.
#[inline(always)]
pub fn next_state(alive: bool, live_neighbors: u8) -> u8 {
    match (alive, live_neighbors) {
        (true, 2) | (_, 3) => ALIVE,
        _ => DEAD,
    }
}

/// A block plus its one-cell halo ring. Scratch for a single update.
pub struct PaddedBlock {
    width: usize,
    cells: Vec<u8>,
}

impl PaddedBlock {
    pub fn new(block: &Block, halo: &HaloPacket) -> Self {
        let edge = block.edge();
        let width = edge + 2;
        let last = width - 1;
        let mut cells = vec![DEAD; width * width];

        cells[0] = halo.up_left;
        cells[last] = halo.up_right;
        cells[last * width] = halo.down_left;
        cells[last * width + last] = halo.down_right;

        cells[1..=edge].copy_from_slice(&halo.up);
        cells[last * width + 1..last * width + 1 + edge].copy_from_slice(&halo.down);

        let src = block.cells();
        for r in 0..edge {
            let row = (r + 1) * width;
            cells[row] = halo.left[r];
            cells[row + 1..row + 1 + edge].copy_from_slice(&src[r * edge..(r + 1) * edge]);
            cells[row + last] = halo.right[r];
        }

        Self { width, cells }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell at padded coordinates; `(1, 1)` is the block's top-left cell.
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    /// Live cells among the 8 neighbors of padded cell `(row, col)`.
    #[inline(always)]
    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let w = self.width;
        let above = &self.cells[(row - 1) * w + col - 1..(row - 1) * w + col + 2];
        let below = &self.cells[(row + 1) * w + col - 1..(row + 1) * w + col + 2];
        above.iter().sum::<u8>()
            + below.iter().sum::<u8>()
            + self.cells[row * w + col - 1]
            + self.cells[row * w + col + 1]
    }
}

/// Advance `block` one generation given the halo received for it.
pub fn update(block: &Block, halo: &HaloPacket) -> Block {
    let edge = block.edge();
    debug_assert_eq!(halo.up.len(), edge);
    debug_assert_eq!(halo.down.len(), edge);
    debug_assert_eq!(halo.left.len(), edge);
    debug_assert_eq!(halo.right.len(), edge);

    let padded = PaddedBlock::new(block, halo);
    let mut next = Vec::with_capacity(edge * edge);
    for row in 1..=edge {
        for col in 1..=edge {
            let alive = padded.get(row, col) == ALIVE;
            next.push(next_state(alive, padded.live_neighbors(row, col)));
        }
    }
    Block::new(edge, next)
}
