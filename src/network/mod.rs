//! Network Module
//!
//! Role network topology resolution and interface link mode planning.

pub mod link_mode;
pub mod topology;

pub use link_mode::*;
pub use topology::*;
