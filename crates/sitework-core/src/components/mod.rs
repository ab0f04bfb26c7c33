//! Component definitions for the resource ledger's ECS world.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in the ledger and reservation code.

mod common;
mod equipment;
mod people;

pub use common::*;
pub use equipment::*;
pub use people::*;
