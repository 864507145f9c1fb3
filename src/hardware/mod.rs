//! Hardware Module
//!
//! Drive classification and OSD device role assignment.

pub mod allocation;
pub mod classification;

pub use allocation::*;
pub use classification::*;
