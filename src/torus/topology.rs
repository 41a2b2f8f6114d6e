//! Unit identities and neighbor addressing on the √P×√P torus.
//!
//! Units are numbered row-major: `row = id / per_side`, `col = id % per_side`.
//! Rows grow downward, so `Up` is the row above.

use std::fmt;
use std::ops::Index;

/// Identity of one compute unit, in `[0, P)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

impl UnitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// `(row, col)` of this unit on a torus with `per_side` units per row.
    #[inline]
    pub fn position(self, per_side: usize) -> (usize, usize) {
        (self.0 / per_side, self.0 % per_side)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 8 cardinal and intercardinal directions for neighbor addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    UpLeft    = 0, // (row-1, col-1)
    Up        = 1, // (row-1, col)
    UpRight   = 2, // (row-1, col+1)
    Left      = 3, // (row, col-1)
    Right     = 4, // (row, col+1)
    DownLeft  = 5, // (row+1, col-1)
    Down      = 6, // (row+1, col)
    DownRight = 7, // (row+1, col+1)
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::UpLeft,   Direction::Up,   Direction::UpRight,
        Direction::Left,                      Direction::Right,
        Direction::DownLeft, Direction::Down, Direction::DownRight,
    ];

    /// The `(row, col)` offset for this direction.
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::UpLeft    => (-1, -1),
            Direction::Up        => (-1, 0),
            Direction::UpRight   => (-1, 1),
            Direction::Left      => (0, -1),
            Direction::Right     => (0, 1),
            Direction::DownLeft  => (1, -1),
            Direction::Down      => (1, 0),
            Direction::DownRight => (1, 1),
        }
    }

    /// The reverse direction. A border piece sent toward `d` lands in the
    /// receiver's `d.reverse()` halo slot.
    #[inline]
    pub const fn reverse(self) -> Direction {
        match self {
            Direction::UpLeft    => Direction::DownRight,
            Direction::Up        => Direction::Down,
            Direction::UpRight   => Direction::DownLeft,
            Direction::Left      => Direction::Right,
            Direction::Right     => Direction::Left,
            Direction::DownLeft  => Direction::UpRight,
            Direction::Down      => Direction::Up,
            Direction::DownRight => Direction::UpLeft,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }
}

/// The eight neighbors of one unit, indexed by `Direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborSet([UnitId; 8]);

impl NeighborSet {
    #[inline]
    pub fn get(&self, direction: Direction) -> UnitId {
        self.0[direction.index()]
    }

    /// `(direction, neighbor)` pairs in `Direction::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, UnitId)> + '_ {
        Direction::ALL.iter().map(move |&d| (d, self.get(d)))
    }
}

impl Index<Direction> for NeighborSet {
    type Output = UnitId;

    #[inline]
    fn index(&self, direction: Direction) -> &UnitId {
        &self.0[direction.index()]
    }
}

/// Exact integer square root, or `None` if `n` is not a perfect square.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    let root = n.isqrt();
    (root * root == n).then_some(root)
}

/// Derive the eight neighbors of `unit` on a wrapped torus of `total_units`.
///
/// `total_units` must be a perfect square and `unit < total_units`; both are
/// checked once at startup by `TorusConfig::validate`.
pub fn neighbors(unit: UnitId, total_units: usize) -> NeighborSet {
    debug_assert!(unit.index() < total_units);
    let per_side = total_units.isqrt();
    debug_assert_eq!(per_side * per_side, total_units, "unit count must be square");

    let (row, col) = unit.position(per_side);
    let last = per_side - 1;

    // Each axis wraps on its own; diagonals compose the two.
    let up_row = if row > 0 { row - 1 } else { last };
    let down_row = if row < last { row + 1 } else { 0 };
    let left_col = if col > 0 { col - 1 } else { last };
    let right_col = if col < last { col + 1 } else { 0 };

    let at = |r: usize, c: usize| UnitId(r * per_side + c);

    NeighborSet([
        at(up_row, left_col),
        at(up_row, col),
        at(up_row, right_col),
        at(row, left_col),
        at(row, right_col),
        at(down_row, left_col),
        at(down_row, col),
        at(down_row, right_col),
    ])
}

/// Neighbor sets for every unit, indexed by `UnitId::index`.
pub fn neighbor_table(total_units: usize) -> Vec<NeighborSet> {
    (0..total_units)
        .map(|u| neighbors(UnitId(u), total_units))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn via_offsets(unit: UnitId, total: usize, direction: Direction) -> UnitId {
        let per_side = total.isqrt() as isize;
        let (row, col) = unit.position(per_side as usize);
        let (dr, dc) = direction.offset();
        let r = (row as isize + dr).rem_euclid(per_side);
        let c = (col as isize + dc).rem_euclid(per_side);
        UnitId((r * per_side + c) as usize)
    }

    #[test]
    fn corner_unit_of_four_by_four_wraps_on_both_axes() {
        let n = neighbors(UnitId(0), 16);
        assert_eq!(n[Direction::UpLeft], UnitId(15));
        assert_eq!(n[Direction::Up], UnitId(12));
        assert_eq!(n[Direction::UpRight], UnitId(13));
        assert_eq!(n[Direction::Left], UnitId(3));
        assert_eq!(n[Direction::Right], UnitId(1));
        assert_eq!(n[Direction::DownLeft], UnitId(7));
        assert_eq!(n[Direction::Down], UnitId(4));
        assert_eq!(n[Direction::DownRight], UnitId(5));

        let n = neighbors(UnitId(15), 16);
        assert_eq!(n[Direction::DownRight], UnitId(0));
        assert_eq!(n[Direction::Down], UnitId(3));
        assert_eq!(n[Direction::Right], UnitId(12));
        assert_eq!(n[Direction::UpRight], UnitId(8));
        assert_eq!(n[Direction::DownLeft], UnitId(2));
    }

    #[test]
    fn edge_units_wrap_on_one_axis_only() {
        // Top row, middle column.
        let n = neighbors(UnitId(1), 9);
        assert_eq!(n[Direction::Up], UnitId(7));
        assert_eq!(n[Direction::UpLeft], UnitId(6));
        assert_eq!(n[Direction::UpRight], UnitId(8));
        assert_eq!(n[Direction::DownLeft], UnitId(3));

        // Right column, middle row.
        let n = neighbors(UnitId(5), 9);
        assert_eq!(n[Direction::Right], UnitId(3));
        assert_eq!(n[Direction::UpRight], UnitId(0));
        assert_eq!(n[Direction::DownRight], UnitId(6));
        assert_eq!(n[Direction::Left], UnitId(4));
    }

    #[test]
    fn single_unit_is_its_own_neighbor() {
        let n = neighbors(UnitId(0), 1);
        for (_, unit) in n.iter() {
            assert_eq!(unit, UnitId(0));
        }
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        for per_side in 1..=6 {
            let total = per_side * per_side;
            for u in 0..total {
                let unit = UnitId(u);
                let n = neighbors(unit, total);
                for direction in Direction::ALL {
                    let other = n[direction];
                    assert_eq!(
                        neighbors(other, total)[direction.reverse()],
                        unit,
                        "P={total} unit {u} {direction:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn matches_offset_arithmetic() {
        for per_side in 1..=7 {
            let total = per_side * per_side;
            for u in 0..total {
                let n = neighbors(UnitId(u), total);
                for direction in Direction::ALL {
                    assert_eq!(n[direction], via_offsets(UnitId(u), total, direction));
                }
            }
        }
    }

    #[test]
    fn exact_sqrt_rejects_non_squares() {
        assert_eq!(exact_sqrt(0), Some(0));
        assert_eq!(exact_sqrt(1), Some(1));
        assert_eq!(exact_sqrt(16), Some(4));
        assert_eq!(exact_sqrt(8), None);
        assert_eq!(exact_sqrt(15), None);
    }
}
