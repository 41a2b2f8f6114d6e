//! Block storage and the data that crosses block boundaries.
//!
//! - `Block`: one unit's `edge`×`edge` region, row-major, cells are 0 or 1
//! - `BorderData`: the four edges and four corner cells of a block
//! - `HaloPacket`: the one-cell ring gathered from 8 neighbors before compute

use super::error::{TorusError, TorusResult};
use super::topology::{Direction, UnitId};

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

/// One unit's square sub-region of the global grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    edge: usize,
    cells: Vec<u8>,
}

impl Block {
    pub fn new(edge: usize, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), edge * edge);
        Self { edge, cells }
    }

    pub fn empty(edge: usize) -> Self {
        Self::new(edge, vec![DEAD; edge * edge])
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.edge + col]
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    /// Extract the four edges and four corners of the current state.
    pub fn borders(&self) -> BorderData {
        let e = self.edge;
        let cells = &self.cells;
        BorderData {
            top: cells[..e].to_vec(),
            bottom: cells[e * e - e..].to_vec(),
            left: (0..e).map(|r| cells[r * e]).collect(),
            right: (0..e).map(|r| cells[r * e + e - 1]).collect(),
            up_left: cells[0],
            up_right: cells[e - 1],
            down_left: cells[e * e - e],
            down_right: cells[e * e - 1],
        }
    }
}

/// One piece of border state, as sent to a single neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Border {
    Edge(Vec<u8>),
    Corner(u8),
}

/// Pre-extracted border rows/columns and corner cells of one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderData {
    pub top: Vec<u8>,
    pub bottom: Vec<u8>,
    pub left: Vec<u8>,
    pub right: Vec<u8>,
    pub up_left: u8,
    pub up_right: u8,
    pub down_left: u8,
    pub down_right: u8,
}

impl BorderData {
    /// The piece of this block that faces `direction`, i.e. what the neighbor
    /// in that direction needs.
    pub fn facing(&self, direction: Direction) -> Border {
        match direction {
            Direction::UpLeft => Border::Corner(self.up_left),
            Direction::Up => Border::Edge(self.top.clone()),
            Direction::UpRight => Border::Corner(self.up_right),
            Direction::Left => Border::Edge(self.left.clone()),
            Direction::Right => Border::Edge(self.right.clone()),
            Direction::DownLeft => Border::Corner(self.down_left),
            Direction::Down => Border::Edge(self.bottom.clone()),
            Direction::DownRight => Border::Corner(self.down_right),
        }
    }
}

/// One-cell halo around a block, received from its 8 neighbors.
///
/// `up`/`down` run left to right, `left`/`right` run top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HaloPacket {
    pub up: Vec<u8>,
    pub down: Vec<u8>,
    pub left: Vec<u8>,
    pub right: Vec<u8>,
    pub up_left: u8,
    pub up_right: u8,
    pub down_left: u8,
    pub down_right: u8,
}

impl HaloPacket {
    /// An all-dead halo, i.e. a block surrounded by empty space.
    pub fn dead(edge: usize) -> Self {
        Self {
            up: vec![DEAD; edge],
            down: vec![DEAD; edge],
            left: vec![DEAD; edge],
            right: vec![DEAD; edge],
            ..Self::default()
        }
    }
}

/// Collects the 8 slots of a `HaloPacket` as they arrive, in any order.
pub struct HaloAssembler {
    unit: UnitId,
    edge: usize,
    slots: [Option<Border>; 8],
    filled: usize,
}

impl HaloAssembler {
    pub fn new(unit: UnitId, edge: usize) -> Self {
        Self {
            unit,
            edge,
            slots: Default::default(),
            filled: 0,
        }
    }

    /// Store `border` in `slot`. Rejects a second value for the same slot and
    /// a payload whose shape does not fit the slot.
    pub fn insert(&mut self, slot: Direction, border: Border) -> TorusResult<()> {
        let fits = match &border {
            Border::Corner(_) => slot.is_corner(),
            Border::Edge(cells) => !slot.is_corner() && cells.len() == self.edge,
        };
        if !fits {
            return Err(TorusError::MalformedHalo {
                unit: self.unit,
                slot,
            });
        }
        let entry = &mut self.slots[slot.index()];
        if entry.is_some() {
            return Err(TorusError::DuplicateHalo {
                unit: self.unit,
                slot,
            });
        }
        *entry = Some(border);
        self.filled += 1;
        Ok(())
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Build the packet. Must only be called once `is_complete()` holds.
    pub fn finish(self) -> HaloPacket {
        debug_assert!(self.is_complete());
        let mut halo = HaloPacket::dead(self.edge);
        for (direction, slot) in Direction::ALL.into_iter().zip(self.slots) {
            match (direction, slot) {
                (Direction::UpLeft, Some(Border::Corner(v))) => halo.up_left = v,
                (Direction::UpRight, Some(Border::Corner(v))) => halo.up_right = v,
                (Direction::DownLeft, Some(Border::Corner(v))) => halo.down_left = v,
                (Direction::DownRight, Some(Border::Corner(v))) => halo.down_right = v,
                (Direction::Up, Some(Border::Edge(v))) => halo.up = v,
                (Direction::Down, Some(Border::Edge(v))) => halo.down = v,
                (Direction::Left, Some(Border::Edge(v))) => halo.left = v,
                (Direction::Right, Some(Border::Edge(v))) => halo.right = v,
                _ => unreachable!("slot shape is checked on insert"),
            }
        }
        halo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(edge: usize) -> Block {
        Block::new(edge, (0..(edge * edge) as u8).collect())
    }

    #[test]
    fn borders_of_three_by_three() {
        // 0 1 2
        // 3 4 5
        // 6 7 8
        let borders = numbered(3).borders();
        assert_eq!(borders.top, vec![0, 1, 2]);
        assert_eq!(borders.bottom, vec![6, 7, 8]);
        assert_eq!(borders.left, vec![0, 3, 6]);
        assert_eq!(borders.right, vec![2, 5, 8]);
        assert_eq!(
            (borders.up_left, borders.up_right, borders.down_left, borders.down_right),
            (0, 2, 6, 8)
        );
    }

    #[test]
    fn single_cell_block_is_all_corners() {
        let borders = Block::new(1, vec![ALIVE]).borders();
        for direction in Direction::ALL {
            let piece = borders.facing(direction);
            match piece {
                Border::Corner(v) => assert_eq!(v, ALIVE),
                Border::Edge(v) => assert_eq!(v, vec![ALIVE]),
            }
        }
    }

    #[test]
    fn assembler_fills_packet_in_any_order() {
        let mut assembler = HaloAssembler::new(UnitId(0), 2);
        for direction in Direction::ALL.into_iter().rev() {
            let border = if direction.is_corner() {
                Border::Corner(direction.index() as u8)
            } else {
                Border::Edge(vec![direction.index() as u8; 2])
            };
            assembler.insert(direction, border).unwrap();
        }
        assert!(assembler.is_complete());
        let halo = assembler.finish();
        assert_eq!(halo.up_left, 0);
        assert_eq!(halo.up, vec![1, 1]);
        assert_eq!(halo.up_right, 2);
        assert_eq!(halo.left, vec![3, 3]);
        assert_eq!(halo.right, vec![4, 4]);
        assert_eq!(halo.down_left, 5);
        assert_eq!(halo.down, vec![6, 6]);
        assert_eq!(halo.down_right, 7);
    }

    #[test]
    fn assembler_rejects_duplicates_and_bad_shapes() {
        let mut assembler = HaloAssembler::new(UnitId(3), 4);
        assembler.insert(Direction::Up, Border::Edge(vec![0; 4])).unwrap();
        assert_eq!(
            assembler.insert(Direction::Up, Border::Edge(vec![0; 4])),
            Err(TorusError::DuplicateHalo {
                unit: UnitId(3),
                slot: Direction::Up
            })
        );
        assert_eq!(
            assembler.insert(Direction::Down, Border::Edge(vec![0; 3])),
            Err(TorusError::MalformedHalo {
                unit: UnitId(3),
                slot: Direction::Down
            })
        );
        assert_eq!(
            assembler.insert(Direction::UpLeft, Border::Edge(vec![0; 4])),
            Err(TorusError::MalformedHalo {
                unit: UnitId(3),
                slot: Direction::UpLeft
            })
        );
        assert!(!assembler.is_complete());
    }
}
