//! Ansible Dynamic Inventory Document
//!
//! The JSON layout expected from an Ansible inventory script's `--list`
//! call: one object per group plus `_meta.hostvars`.

use crate::error::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level key holding host variables
pub const META_KEY: &str = "_meta";

/// Variables of one host or group
pub type Vars = BTreeMap<String, Value>;

/// An inventory group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleGroup {
    /// Member hostnames in snapshot order
    pub hosts: Vec<String>,
    pub vars: Vars,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryMeta {
    /// Hostname -> host variables
    pub hostvars: BTreeMap<String, Vars>,
}

/// Complete inventory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryDocument {
    /// Role name -> group
    pub groups: BTreeMap<String, RoleGroup>,
    pub meta: InventoryMeta,
}

impl InventoryDocument {
    pub fn group(&self, role: &str) -> Option<&RoleGroup> {
        self.groups.get(role)
    }

    pub fn host_vars(&self, hostname: &str) -> Option<&Vars> {
        self.meta.hostvars.get(hostname)
    }
}

impl Serialize for InventoryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len() + 1))?;
        for (role, group) in &self.groups {
            map.serialize_entry(role, group)?;
        }
        map.serialize_entry(META_KEY, &self.meta)?;
        map.end()
    }
}

/// Render any output structure as key-sorted, 2-space indented JSON
pub fn render_json<T: Serialize>(data: &T) -> Result<String> {
    // serde_json's default map type is ordered, so a round-trip through
    // `Value` sorts keys at every level
    let value = serde_json::to_value(data)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
