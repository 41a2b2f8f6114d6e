//! Halo synchronization for the pooled schedule.
//!
//! Two phases per generation: every unit publishes its `BorderData`, then each
//! unit gathers its halo from its neighbors' published borders. Borders are
//! read-only during the gather, so all units see the same prior generation.

use rayon::prelude::*;

use super::block::{Block, BorderData, HaloAssembler, HaloPacket};
use super::error::TorusResult;
use super::topology::{Direction, NeighborSet, UnitId};

/// Gather the halo for one unit from the published borders of all units.
///
/// Slot `d` is filled with the piece of neighbor `d` that faces back toward
/// this unit, which is the same assignment the message protocol uses. Fails
/// with `MalformedHalo` if a neighbor's borders do not match `edge`.
pub fn gather_halo(
    unit: UnitId,
    edge: usize,
    neighbors: &NeighborSet,
    borders: &[BorderData],
) -> TorusResult<HaloPacket> {
    let mut assembler = HaloAssembler::new(unit, edge);
    for direction in Direction::ALL {
        let source = &borders[neighbors[direction].index()];
        assembler.insert(direction, source.facing(direction.reverse()))?;
    }
    Ok(assembler.finish())
}

/// Advance every block one generation on the current rayon pool.
pub fn step_blocks(blocks: &[Block], topology: &[NeighborSet]) -> TorusResult<Vec<Block>> {
    debug_assert_eq!(blocks.len(), topology.len());
    let borders: Vec<BorderData> = blocks.par_iter().map(Block::borders).collect();

    blocks
        .par_iter()
        .zip(topology.par_iter())
        .enumerate()
        .map(|(unit, (block, neighbors))| {
            let halo = gather_halo(UnitId(unit), block.edge(), neighbors, &borders)?;
            Ok(super::kernel::update(block, &halo))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::error::TorusError;
    use crate::torus::topology::neighbor_table;

    #[test]
    fn single_unit_gathers_its_own_opposite_borders() {
        // 0 1 2
        // 3 4 5
        // 6 7 8
        let block = Block::new(3, (0..9).collect());
        let borders = vec![block.borders()];
        let topology = neighbor_table(1);
        let halo = gather_halo(UnitId(0), 3, &topology[0], &borders).unwrap();

        assert_eq!(halo.up, vec![6, 7, 8]);
        assert_eq!(halo.down, vec![0, 1, 2]);
        assert_eq!(halo.left, vec![2, 5, 8]);
        assert_eq!(halo.right, vec![0, 3, 6]);
        assert_eq!(halo.up_left, 8);
        assert_eq!(halo.up_right, 6);
        assert_eq!(halo.down_left, 2);
        assert_eq!(halo.down_right, 0);
    }

    #[test]
    fn four_units_gather_from_the_right_neighbors() {
        // Unit u's block is filled with u + 1 so every halo cell names its source.
        let blocks: Vec<Block> = (0..4u8).map(|u| Block::new(2, vec![u + 1; 4])).collect();
        let borders: Vec<BorderData> = blocks.iter().map(Block::borders).collect();
        let topology = neighbor_table(4);

        // On a 2×2 torus unit 0's straight neighbors are 2 (up/down) and
        // 1 (left/right); all diagonals are 3.
        let halo = gather_halo(UnitId(0), 2, &topology[0], &borders).unwrap();
        assert_eq!(halo.up, vec![3, 3]);
        assert_eq!(halo.down, vec![3, 3]);
        assert_eq!(halo.left, vec![2, 2]);
        assert_eq!(halo.right, vec![2, 2]);
        assert_eq!(
            [halo.up_left, halo.up_right, halo.down_left, halo.down_right],
            [4, 4, 4, 4]
        );
    }

    #[test]
    fn mismatched_borders_are_reported_not_dropped() {
        // Unit 1 publishes 3-cell edges into a partition of 2-cell blocks.
        let blocks = vec![Block::empty(2), Block::empty(3), Block::empty(2), Block::empty(2)];
        let borders: Vec<BorderData> = blocks.iter().map(Block::borders).collect();
        let topology = neighbor_table(4);

        let err = gather_halo(UnitId(0), 2, &topology[0], &borders).unwrap_err();
        assert_eq!(
            err,
            TorusError::MalformedHalo {
                unit: UnitId(0),
                slot: Direction::Left
            }
        );
        assert!(step_blocks(&blocks, &topology).is_err());
    }
}
