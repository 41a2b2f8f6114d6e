//! Conway's Game of Life (B3/S23) on an N×N torus, partitioned across a
//! √P×√P torus of compute units that exchange halos every generation.

pub mod torus;
pub use torus::{Grid, TorusConfig, TorusError, TorusLife};
