//! Hardware Classification Module
//!
//! Classifies nodes as storage nodes or clients and their spare drives as
//! OSD data or journal devices.

pub mod classifier;

pub use classifier::*;
