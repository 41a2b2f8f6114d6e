//! TorusLife engine internals and public API.

pub mod block;
mod config;
mod engine;
mod error;
pub mod exchange;
mod grid;
pub mod kernel;
pub mod layout;
pub mod render;
mod runtime;
pub mod sync;
pub mod topology;

pub use block::{Block, BorderData, HaloPacket};
pub use config::{Delivery, MIN_SIDE, Partition, Schedule, TorusConfig};
pub use engine::TorusLife;
pub use error::{TorusError, TorusResult};
pub use grid::Grid;
pub use render::{AnsiRenderer, LedPrinter, NullRenderer, Palette, Renderer};
pub use topology::{Direction, NeighborSet, UnitId, neighbors};
