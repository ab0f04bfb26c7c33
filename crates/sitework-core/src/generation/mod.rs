//! Generation - procedural creation of a starting company.

mod names;
mod roster;

pub use names::*;
pub use roster::*;
