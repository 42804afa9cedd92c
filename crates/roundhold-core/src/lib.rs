//! Deterministic combat kernel.
//!
//! The one module that must produce byte-identical results on independent
//! hosts: the server runs it headlessly to settle a round, clients run the
//! same code against the same snapshot to animate it. It is pure — no clocks,
//! no I/O, no ambient randomness. All motion is driven by integer tick counts
//! and a fixed `sim_dt`; all iteration follows the snapshot's insertion
//! order; tower targeting breaks ties by master-list index.

mod grid;
mod state;
mod tower;
mod unit;

pub use crate::grid::{CellState, PlacementGrid};
pub use crate::state::{CombatState, SimError};
pub use crate::tower::SimTower;
pub use crate::unit::SimUnit;
