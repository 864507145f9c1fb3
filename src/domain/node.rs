//! MAAS Node Records
//!
//! Typed views over the node, interface and block device records returned by
//! the MAAS 1.0 API. Records are validated once at the deserialization
//! boundary so the resolvers never see missing keys.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// `used_for` value MAAS reports for a drive with no partitions or filesystem
pub const UNUSED_DRIVE: &str = "Unused";

fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Node Status
// =============================================================================

/// Lifecycle state of a node as reported by `substatus_name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
    New,
    Commissioning,
    Ready,
    Allocated,
    Deploying,
    Deployed,
    Other(String),
}

impl From<String> for NodeStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "New" => NodeStatus::New,
            "Commissioning" => NodeStatus::Commissioning,
            "Ready" => NodeStatus::Ready,
            "Allocated" => NodeStatus::Allocated,
            "Deploying" => NodeStatus::Deploying,
            "Deployed" => NodeStatus::Deployed,
            _ => NodeStatus::Other(s),
        }
    }
}

impl From<NodeStatus> for String {
    fn from(status: NodeStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::New => write!(f, "New"),
            NodeStatus::Commissioning => write!(f, "Commissioning"),
            NodeStatus::Ready => write!(f, "Ready"),
            NodeStatus::Allocated => write!(f, "Allocated"),
            NodeStatus::Deploying => write!(f, "Deploying"),
            NodeStatus::Deployed => write!(f, "Deployed"),
            NodeStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

// =============================================================================
// Link Mode
// =============================================================================

/// How MAAS configures an interface link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    Dhcp,
    Static,
    Auto,
    LinkUp,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::Dhcp => "dhcp",
            LinkMode::Static => "static",
            LinkMode::Auto => "auto",
            LinkMode::LinkUp => "link_up",
        }
    }

    /// Whether a link reported with `mode` already uses this mode
    pub fn matches(&self, mode: &str) -> bool {
        mode.eq_ignore_ascii_case(self.as_str())
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LinkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dhcp" => Ok(LinkMode::Dhcp),
            "static" => Ok(LinkMode::Static),
            "auto" => Ok(LinkMode::Auto),
            "link_up" => Ok(LinkMode::LinkUp),
            other => Err(Error::Configuration(format!("unknown link mode: {}", other))),
        }
    }
}

// =============================================================================
// Network Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub fabric: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: u64,
    pub cidr: String,
    pub vlan: Vlan,
}

/// One address configuration of an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mode: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Absent for links that are only brought up
    #[serde(default)]
    pub subnet: Option<Subnet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mac_address: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub resource_uri: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddress {
    pub mac_address: String,
}

// =============================================================================
// Block Device
// =============================================================================

/// A physical block device attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// Stable `/dev/disk/by-id` path, missing on some virtual disks
    #[serde(default)]
    pub id_path: Option<String>,
    pub resource_uri: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub used_for: String,
}

impl BlockDevice {
    /// Path handed to the storage deployment tooling
    pub fn device_path(&self) -> String {
        match &self.id_path {
            Some(path) if !path.is_empty() => path.clone(),
            _ => format!("/dev/{}", self.name),
        }
    }

    pub fn is_unused(&self) -> bool {
        self.used_for == UNUSED_DRIVE
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

// =============================================================================
// Node
// =============================================================================

/// Snapshot of a MAAS node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub system_id: String,
    pub hostname: String,
    #[serde(rename = "tag_names", default)]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub power_type: String,
    #[serde(rename = "osystem", default, deserialize_with = "nullable_string")]
    pub os: String,
    #[serde(rename = "distro_series", default, deserialize_with = "nullable_string")]
    pub os_release: String,
    #[serde(rename = "macaddress_set", default)]
    pub mac_addresses: Vec<MacAddress>,
    #[serde(default)]
    pub pxe_mac: Option<MacAddress>,
    #[serde(rename = "interface_set", default)]
    pub interfaces: Vec<Interface>,
    #[serde(rename = "physicalblockdevice_set", default)]
    pub block_devices: Vec<BlockDevice>,
    #[serde(rename = "substatus_name")]
    pub status: NodeStatus,
}

impl Node {
    /// Decode and validate a raw node record
    pub fn from_record(record: serde_json::Value) -> Result<Self> {
        let hint = record
            .get("system_id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();

        let node: Node = serde_json::from_value(record)
            .map_err(|e| Error::MalformedRecord(format!("node {}: {}", hint, e)))?;
        node.validate()?;
        Ok(node)
    }

    pub fn validate(&self) -> Result<()> {
        if self.system_id.is_empty() {
            return Err(Error::MalformedRecord("node with empty system_id".into()));
        }
        if self.hostname.is_empty() {
            return Err(Error::MalformedRecord(format!(
                "node {} has an empty hostname",
                self.system_id
            )));
        }
        Ok(())
    }

    /// First MAC address of the node
    pub fn primary_mac(&self) -> Option<&str> {
        self.mac_addresses.first().map(|m| m.mac_address.as_str())
    }

    /// All assigned IP addresses, sorted
    pub fn ip_addresses(&self) -> Vec<String> {
        let mut ips: Vec<String> = self
            .interfaces
            .iter()
            .flat_map(|iface| iface.links.iter())
            .filter_map(|link| link.ip_address.clone())
            .collect();
        ips.sort();
        ips
    }

    pub fn unused_devices(&self) -> impl Iterator<Item = &BlockDevice> {
        self.block_devices.iter().filter(|blk| blk.is_unused())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
