//! Runtime configuration, validated once at startup into a `Partition`.

use std::time::Duration;

use super::error::{TorusError, TorusResult};
use super::topology::exact_sqrt;

/// Smallest supported grid side.
pub const MIN_SIDE: usize = 8;

const DEFAULT_SIDE: usize = 32;
const DEFAULT_UNITS: usize = 4;
const DEFAULT_GENERATIONS: u64 = 500;
const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// How units are scheduled onto threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Schedule {
    /// One OS thread per unit, halos exchanged as messages, one gate per
    /// generation.
    #[default]
    Threads,
    /// Two-phase publish/gather on a rayon pool.
    Pool,
}

/// Where per-generation state goes during `TorusLife::run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Gather all blocks into one global grid for a single display.
    #[default]
    Gathered,
    /// Hand each unit's own block to the display, one call per unit.
    PerUnit,
    /// Display nothing.
    Silent,
}

/// Configuration for a TorusLife run.
///
/// Use `TorusConfig::default()` for the defaults below, or customise individual
/// knobs via the builder methods.
#[derive(Clone, Debug)]
pub struct TorusConfig {
    /// Side `N` of the square global grid.
    pub side: usize,
    /// Number of units `P`; must be a perfect square.
    pub units: usize,
    /// Rounds driven by `TorusLife::run`.
    pub generations: u64,
    pub schedule: Schedule,
    pub delivery: Delivery,
    /// Pause after each displayed generation. `None` runs flat out.
    pub frame_delay: Option<Duration>,
    /// Longest wait for a single halo message. Kernel time is not bounded.
    pub exchange_timeout: Duration,
    /// Threads in the rayon pool used by `Schedule::Pool`.
    /// `None` means rayon's default.
    pub thread_count: Option<usize>,
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            side: DEFAULT_SIDE,
            units: DEFAULT_UNITS,
            generations: DEFAULT_GENERATIONS,
            schedule: Schedule::default(),
            delivery: Delivery::default(),
            frame_delay: None,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
            thread_count: None,
        }
    }
}

impl TorusConfig {
    pub fn side(mut self, side: usize) -> Self {
        self.side = side;
        self
    }

    pub fn units(mut self, units: usize) -> Self {
        self.units = units;
        self
    }

    pub fn generations(mut self, generations: u64) -> Self {
        self.generations = generations;
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Check the grid/unit combination and derive the partition.
    pub fn validate(&self) -> TorusResult<Partition> {
        let per_side = match exact_sqrt(self.units) {
            Some(root) if root > 0 => root,
            _ => return Err(TorusError::InvalidTopology { units: self.units }),
        };
        if self.side < MIN_SIDE {
            return Err(TorusError::GridTooSmall { side: self.side });
        }
        // With P square, N divisible by √P is the same as N²/P being a
        // perfect square.
        if self.side % per_side != 0 {
            return Err(TorusError::InvalidGridSize {
                side: self.side,
                per_side,
            });
        }
        Ok(Partition {
            side: self.side,
            units: self.units,
            per_side,
            edge: self.side / per_side,
        })
    }
}

/// A validated split of an `N`×`N` grid over `P` units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Global grid side `N`.
    pub side: usize,
    /// Unit count `P`.
    pub units: usize,
    /// Units per torus row, `√P`.
    pub per_side: usize,
    /// Block side `E = N / √P`.
    pub edge: usize,
}

impl Partition {
    #[inline]
    pub fn block_len(&self) -> usize {
        self.edge * self.edge
    }

    #[inline]
    pub fn grid_len(&self) -> usize {
        self.side * self.side
    }

    /// Unit owning global cell `(row, col)`.
    #[inline]
    pub fn owner(&self, row: usize, col: usize) -> usize {
        (row / self.edge) * self.per_side + col / self.edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let partition = TorusConfig::default().validate().unwrap();
        assert_eq!(
            partition,
            Partition {
                side: 32,
                units: 4,
                per_side: 2,
                edge: 16
            }
        );
        assert_eq!(partition.block_len(), 256);
        assert_eq!(partition.grid_len(), 1024);
    }

    #[test]
    fn edge_length_follows_units() {
        // 9x9 on 9 units -> 3x3 blocks, 32x32 on 16 units -> 8x8 blocks.
        let p = TorusConfig::default().side(9).units(9).validate().unwrap();
        assert_eq!(p.edge, 3);
        let p = TorusConfig::default().side(32).units(16).validate().unwrap();
        assert_eq!(p.edge, 8);
        assert_eq!(p.owner(9, 17), 6);
    }

    #[test]
    fn rejects_non_square_unit_counts() {
        for units in [0, 2, 3, 8, 12] {
            assert_eq!(
                TorusConfig::default().units(units).validate(),
                Err(TorusError::InvalidTopology { units })
            );
        }
    }

    #[test]
    fn rejects_small_and_indivisible_grids() {
        assert_eq!(
            TorusConfig::default().side(7).units(1).validate(),
            Err(TorusError::GridTooSmall { side: 7 })
        );
        assert_eq!(
            TorusError::GridTooSmall { side: 7 }.to_string(),
            format!("grid side 7 is below the minimum of {MIN_SIDE}")
        );
        assert_eq!(
            TorusConfig::default().side(11).units(4).validate(),
            Err(TorusError::InvalidGridSize {
                side: 11,
                per_side: 2
            })
        );
        assert_eq!(
            TorusConfig::default().side(16).units(9).validate(),
            Err(TorusError::InvalidGridSize {
                side: 16,
                per_side: 3
            })
        );
    }

    #[test]
    fn zero_frame_delay_means_none() {
        let config = TorusConfig::default().frame_delay(Duration::ZERO);
        assert_eq!(config.frame_delay, None);
        let config = TorusConfig::default().frame_delay(Duration::from_millis(100));
        assert_eq!(config.frame_delay, Some(Duration::from_millis(100)));
    }
}
