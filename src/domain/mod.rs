//! Domain layer - MAAS records and port definitions
//!
//! This module defines the typed node records and the core traits (ports)
//! that adapters implement, following hexagonal architecture principles.

pub mod node;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use node::*;
pub use ports::*;
