//! Error types for the torus engine.
//!
//! Startup errors come out of `TorusConfig::validate` and grid construction.
//! Communication errors are fatal to the whole run: one missing halo value
//! corrupts a border for good, so nothing is retried.

use thiserror::Error;

use super::config::MIN_SIDE;
use super::topology::{Direction, UnitId};

/// Errors raised while validating a run or exchanging halos.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TorusError {
    /// The unit count is zero or not a perfect square.
    #[error("unit count {units} is not a perfect square")]
    InvalidTopology { units: usize },

    /// The grid side is below the supported minimum.
    #[error("grid side {side} is below the minimum of {min}", min = MIN_SIDE)]
    GridTooSmall { side: usize },

    /// The grid side cannot be split evenly across the units on one torus row.
    #[error("grid side {side} is not divisible by {per_side} units per side")]
    InvalidGridSize { side: usize, per_side: usize },

    /// A seeded grid does not hold `side * side` cells.
    #[error("grid holds {got} cells, expected {expected}")]
    CellCount { expected: usize, got: usize },

    /// A seeded grid holds a state other than 0 or 1.
    #[error("cell {index} has state {value}, expected 0 or 1")]
    InvalidCell { index: usize, value: u8 },

    /// A live cell was placed outside the grid.
    #[error("cell ({row}, {col}) lies outside a {side}x{side} grid")]
    CellOutOfRange { row: usize, col: usize, side: usize },

    /// No halo message arrived in time.
    #[error("unit {unit} timed out waiting for halo data")]
    ExchangeTimeout { unit: UnitId },

    /// A unit tried to send to a unit that is not one of its neighbors.
    #[error("unit {unit} has no link to unit {peer}")]
    UnknownPeer { unit: UnitId, peer: UnitId },

    /// A peer's queue was closed mid-run.
    #[error("unit {unit} lost its connection to a peer")]
    PeerDisconnected { unit: UnitId },

    /// A halo message was stamped with the wrong generation.
    #[error("unit {unit} expected generation {expected} halo, got generation {got}")]
    OutOfStep { unit: UnitId, expected: u64, got: u64 },

    /// A halo message came from a unit that is not the neighbor for its slot.
    #[error("unit {unit} received {slot:?} halo from unit {from}, which is not its {slot:?} neighbor")]
    MisroutedHalo {
        unit: UnitId,
        slot: Direction,
        from: UnitId,
    },

    /// A halo payload does not fit its slot (corner vs edge, or edge length).
    #[error("unit {unit} received a malformed {slot:?} halo")]
    MalformedHalo { unit: UnitId, slot: Direction },

    /// The same halo slot was filled twice in one generation.
    #[error("unit {unit} received {slot:?} halo twice")]
    DuplicateHalo { unit: UnitId, slot: Direction },

    /// The unit was cancelled because another participant failed.
    #[error("unit {unit} aborted")]
    Aborted { unit: UnitId },

    /// The unit's thread panicked.
    #[error("unit {unit} panicked")]
    UnitPanicked { unit: UnitId },

    /// The rayon pool for the pooled schedule could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

pub type TorusResult<T> = Result<T, TorusError>;
