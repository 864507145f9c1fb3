//! Allocation Module
//!
//! Assigns a node's tagged drives to OSD data and journal roles.

pub mod assigner;

pub use assigner::*;
