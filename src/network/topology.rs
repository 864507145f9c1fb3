//! Role Network Topology
//!
//! Derives the ceph-ansible network variables of a role from the interface
//! links of its nodes. Variables are only produced when every node in the
//! role agrees on the fabric layout; a partial answer would misconfigure the
//! nodes that disagree.

use crate::config::NetworkConfig;
use crate::domain::node::Node;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Role whose group variables carry the monitor interface
pub const MONS_ROLE: &str = "mons";

/// Role whose group variables carry the cluster network
pub const OSDS_ROLE: &str = "osds";

// =============================================================================
// Fabric Map
// =============================================================================

/// Subnet and interface a node uses on one fabric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricEndpoint {
    pub cidr: String,
    pub iface_name: String,
}

/// Fabric name -> endpoint
pub type FabricMap = BTreeMap<String, FabricEndpoint>;

/// Map each fabric a node is linked to onto its subnet and interface.
///
/// A later link on the same fabric replaces an earlier one.
pub fn fabric_map(node: &Node) -> FabricMap {
    let mut map = FabricMap::new();
    for iface in &node.interfaces {
        for subnet in iface.links.iter().filter_map(|link| link.subnet.as_ref()) {
            map.insert(
                subnet.vlan.fabric.clone(),
                FabricEndpoint {
                    cidr: subnet.cidr.clone(),
                    iface_name: iface.name.clone(),
                },
            );
        }
    }
    map
}

// =============================================================================
// Role Network
// =============================================================================

/// Network variables of a role; all fields absent when the role has no
/// consistent, well-known network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_network: Option<String>,
}

impl RoleNetwork {
    pub fn is_empty(&self) -> bool {
        self.public_network.is_none()
            && self.monitor_interface.is_none()
            && self.cluster_network.is_none()
    }

    /// Group variables for the inventory
    pub fn vars(&self) -> BTreeMap<String, Value> {
        let mut vars = BTreeMap::new();
        if let Some(v) = &self.public_network {
            vars.insert("public_network".to_string(), Value::from(v.as_str()));
        }
        if let Some(v) = &self.monitor_interface {
            vars.insert("monitor_interface".to_string(), Value::from(v.as_str()));
        }
        if let Some(v) = &self.cluster_network {
            vars.insert("cluster_network".to_string(), Value::from(v.as_str()));
        }
        vars
    }
}

// =============================================================================
// Topology Resolver
// =============================================================================

/// Resolves role network variables from node interface data
#[derive(Debug, Clone)]
pub struct TopologyResolver {
    public_fabric: String,
    cluster_fabric: String,
}

impl TopologyResolver {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            public_fabric: config.public_fabric.clone(),
            cluster_fabric: config.cluster_fabric.clone(),
        }
    }

    /// Resolve the network variables of `role`.
    ///
    /// Returns an empty [`RoleNetwork`] when the role has no nodes, when the
    /// first node is not on the public fabric, or when any two nodes disagree.
    /// Fails with [`Error::ClusterFabricMissing`] when an `osds` role is
    /// consistent but not linked to the cluster fabric.
    pub fn resolve_role_vars(&self, role: &str, nodes: &[&Node]) -> Result<RoleNetwork> {
        let Some((first, rest)) = nodes.split_first() else {
            return Ok(RoleNetwork::default());
        };

        let reference = fabric_map(first);
        let Some(public) = reference.get(&self.public_fabric) else {
            debug!(
                role,
                hostname = %first.hostname,
                fabric = %self.public_fabric,
                "Role has no public fabric"
            );
            return Ok(RoleNetwork::default());
        };

        if let Some(odd) = rest.iter().find(|node| fabric_map(node) != reference) {
            info!(
                role,
                reference = %first.hostname,
                mismatch = %odd.hostname,
                "Nodes disagree on fabric layout, omitting role network variables"
            );
            return Ok(RoleNetwork::default());
        }

        let mut network = RoleNetwork {
            public_network: Some(public.cidr.clone()),
            ..Default::default()
        };

        if role == MONS_ROLE {
            network.monitor_interface = Some(public.iface_name.clone());
        }

        if role == OSDS_ROLE {
            let cluster = reference.get(&self.cluster_fabric).ok_or_else(|| {
                Error::ClusterFabricMissing {
                    role: role.to_string(),
                    fabric: self.cluster_fabric.clone(),
                }
            })?;
            network.cluster_network = Some(cluster.cidr.clone());
        }

        Ok(network)
    }
}
