//! Conversion between the global row-major grid and the block layout.
//!
//! ```text
//!   [ 0  1  2  3            block 0   block 1   block 2     block 3
//!     4  5  6  7     <->  [ 0 1 4 5   2 3 6 7   8 9 12 13   10 11 14 15 ]
//!     8  9 10 11
//!    12 13 14 15 ]
//! ```
//!
//! In the block layout every block is contiguous and row-major, and blocks are
//! ordered left-to-right, top-to-bottom, so block `u` is exactly the cells of
//! unit `u`. The index transforms assume `side % edge == 0`.

use super::block::Block;
use super::config::Partition;
use super::grid::Grid;

/// Reorder a row-major `side`×`side` grid into concatenated `edge`×`edge` blocks.
pub fn to_block_layout<T: Copy>(cells: &[T], side: usize, edge: usize) -> Vec<T> {
    debug_assert_eq!(cells.len(), side * side);
    debug_assert!(edge > 0 && side % edge == 0);

    let mut out = cells.to_vec();
    for (i, &cell) in cells.iter().enumerate() {
        let row = i / side;
        let col = i % side;
        let block_row = row / edge;
        let block_col = col / edge;

        let block_offset = edge * (block_row * side + block_col * edge);
        let in_block = edge * (row % edge) + col % edge;

        out[block_offset + in_block] = cell;
    }
    out
}

/// Inverse of [`to_block_layout`].
pub fn to_global_layout<T: Copy>(cells: &[T], side: usize, edge: usize) -> Vec<T> {
    debug_assert_eq!(cells.len(), side * side);
    debug_assert!(edge > 0 && side % edge == 0);

    let block_len = edge * edge;
    let blocks_per_row = side / edge;

    let mut out = cells.to_vec();
    for (i, &cell) in cells.iter().enumerate() {
        let block = i / block_len;
        let block_row = block / blocks_per_row;
        let block_col = block % blocks_per_row;

        let in_block = i % block_len;
        let row = block_row * edge + in_block / edge;
        let col = block_col * edge + in_block % edge;

        out[row * side + col] = cell;
    }
    out
}

/// Split a global grid into one block per unit, in unit order.
pub fn scatter(grid: &Grid, partition: &Partition) -> Vec<Block> {
    debug_assert_eq!(grid.side(), partition.side);
    to_block_layout(grid.cells(), partition.side, partition.edge)
        .chunks_exact(partition.block_len())
        .map(|cells| Block::new(partition.edge, cells.to_vec()))
        .collect()
}

/// Reassemble blocks given in unit order into the global grid.
pub fn gather<'a, I>(blocks: I, partition: &Partition) -> Grid
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut concatenated = Vec::with_capacity(partition.grid_len());
    for block in blocks {
        concatenated.extend_from_slice(block.cells());
    }
    debug_assert_eq!(concatenated.len(), partition.grid_len());
    let cells = to_global_layout(&concatenated, partition.side, partition.edge);
    Grid::from_layout(partition.side, cells)
}
