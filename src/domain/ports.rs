//! Domain Ports - Core trait definitions for the toolkit
//!
//! These traits define the boundaries between the inventory/lifecycle logic
//! and external systems. Adapters implement these traits to provide concrete
//! functionality.

use super::node::{LinkMode, Node};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Provisioning API Port
// =============================================================================

/// Port for the MAAS provisioning service
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// List all nodes as raw records
    async fn list_node_records(&self) -> Result<Vec<serde_json::Value>>;

    /// List all nodes as validated snapshots
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list_node_records()
            .await?
            .into_iter()
            .map(Node::from_record)
            .collect()
    }

    /// Fetch the current state of one node
    async fn get_node(&self, system_id: &str) -> Result<Node>;

    /// List tag names starting with `prefix`
    async fn list_tags(&self, prefix: &str) -> Result<Vec<String>>;

    /// List nodes carrying a tag
    async fn nodes_for_tag(&self, tag: &str) -> Result<Vec<Node>>;

    /// Add or remove a tag on a set of nodes
    async fn tag_nodes(&self, system_ids: &[String], tag: &str, remove: bool) -> Result<()>;

    /// Add or remove a tag on a block device
    async fn tag_drive(&self, drive_uri: &str, tag: &str, remove: bool) -> Result<()>;

    /// Update node fields
    async fn update_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()>;

    /// Start commissioning a node
    async fn commission_node(&self, system_id: &str) -> Result<()>;

    /// Allocate nodes to the API user
    async fn acquire_nodes(&self, system_ids: &[String]) -> Result<()>;

    /// Start deploying an allocated node
    async fn start_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()>;

    /// Link an interface to a subnet with the given mode
    async fn link_subnet(&self, iface_uri: &str, subnet_id: u64, mode: LinkMode) -> Result<()>;

    /// Remove a link from an interface
    async fn unlink_subnet(&self, iface_uri: &str, link_id: u64) -> Result<()>;
}

// =============================================================================
// Host Key Scanner Port
// =============================================================================

/// Port for retrieving SSH host keys
#[async_trait]
pub trait HostKeyScanner: Send + Sync {
    /// Return the RSA host key (`ssh-rsa AAAA...`) served at `ip`, if any
    async fn scan(&self, ip: &str, hostname: &str) -> Result<Option<String>>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ProvisioningApiRef = Arc<dyn ProvisioningApi>;
pub type HostKeyScannerRef = Arc<dyn HostKeyScanner>;
