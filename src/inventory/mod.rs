//! Inventory Module
//!
//! Builds the Ansible dynamic inventory from MAAS node snapshots.

pub mod builder;
pub mod document;
pub mod tags;

pub use builder::*;
pub use document::*;
pub use tags::*;
