//! Inventory Builder
//!
//! Turns a MAAS node snapshot into an Ansible inventory: role groups from
//! node tags, group network variables from the topology resolver, and host
//! variables with OSD device assignments.

use super::document::{InventoryDocument, RoleGroup, Vars};
use crate::config::{Config, InventoryConfig, TagConfig};
use crate::domain::node::Node;
use crate::domain::ports::ProvisioningApi;
use crate::error::Result;
use crate::hardware::allocation::DeviceRoleAssigner;
use crate::network::topology::TopologyResolver;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Builds inventory documents from node snapshots
#[derive(Debug, Clone)]
pub struct InventoryBuilder {
    tags: TagConfig,
    inventory: InventoryConfig,
    assigner: DeviceRoleAssigner,
    resolver: TopologyResolver,
}

impl InventoryBuilder {
    pub fn new(config: &Config) -> Self {
        Self {
            tags: config.tags.clone(),
            inventory: config.inventory.clone(),
            assigner: DeviceRoleAssigner::new(&config.tags),
            resolver: TopologyResolver::new(&config.network),
        }
    }

    /// Fetch a fresh snapshot and build the inventory from it
    pub async fn fetch(&self, api: &dyn ProvisioningApi) -> Result<InventoryDocument> {
        let nodes = api.list_nodes().await?;
        info!(nodes = nodes.len(), "Fetched node snapshot");
        self.build(&nodes)
    }

    /// Role names selected by a node's tags
    pub fn roles_of<'a>(&self, node: &'a Node) -> Vec<&'a str> {
        node.tags
            .iter()
            .filter_map(|tag| self.tags.role_of(tag))
            .collect()
    }

    /// Build the inventory for a snapshot
    pub fn build(&self, nodes: &[Node]) -> Result<InventoryDocument> {
        let mut members: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
        for node in nodes {
            for role in self.roles_of(node) {
                members.entry(role).or_default().push(node);
            }
        }

        let mut doc = InventoryDocument::default();

        for (role, role_nodes) in &members {
            let mut vars = Vars::new();
            vars.insert(
                "ansible_user".to_string(),
                Value::from(self.inventory.remote_user.as_str()),
            );
            vars.extend(self.resolver.resolve_role_vars(role, role_nodes)?.vars());

            debug!(role, hosts = role_nodes.len(), "Built role group");
            doc.groups.insert(
                role.to_string(),
                RoleGroup {
                    hosts: role_nodes.iter().map(|n| n.hostname.clone()).collect(),
                    vars,
                },
            );
        }

        for node in nodes.iter().filter(|n| !self.roles_of(n).is_empty()) {
            doc.meta
                .hostvars
                .insert(node.hostname.clone(), self.host_vars(node));
        }

        info!(
            groups = doc.groups.len(),
            hosts = doc.meta.hostvars.len(),
            "Built inventory"
        );
        Ok(doc)
    }

    fn host_vars(&self, node: &Node) -> Vars {
        let mut vars = Vars::new();
        if let Some(mac) = node.primary_mac() {
            vars.insert("mac_address".to_string(), Value::from(mac));
        }
        vars.insert("system_id".to_string(), Value::from(node.system_id.as_str()));
        vars.insert("power_type".to_string(), Value::from(node.power_type.as_str()));
        vars.insert("os".to_string(), Value::from(node.os.as_str()));
        vars.insert("os_release".to_string(), Value::from(node.os_release.as_str()));

        if let Some(assignment) = self.assigner.assign_node(node) {
            vars.insert(
                self.inventory.data_devices_key.clone(),
                Value::from(assignment.data),
            );
            vars.insert(
                self.inventory.journal_devices_key.clone(),
                Value::from(assignment.journal),
            );
        }
        vars
    }
}
