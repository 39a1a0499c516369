//! Step functions run by the engine around the main subsystems.
//!
//! Like the subsystems they take the store (and grid) explicitly and own no
//! state of their own.

pub mod occupancy;
pub mod pickups;
pub mod snapshot;
