//! Lifecycle Module
//!
//! Serial commissioning and deployment of MAAS nodes.

pub mod orchestrator;
pub mod wait;

pub use orchestrator::*;
pub use wait::*;
