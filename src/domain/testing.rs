//! In-memory MAAS fake and record builders shared by unit tests

use super::node::*;
use super::ports::{HostKeyScanner, ProvisioningApi};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

// =============================================================================
// Record Builders
// =============================================================================

pub(crate) struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn new(system_id: &str, hostname: &str) -> Self {
        Self {
            node: Node {
                system_id: system_id.to_string(),
                hostname: hostname.to_string(),
                tags: BTreeSet::new(),
                power_type: "ipmi".to_string(),
                os: "ubuntu".to_string(),
                os_release: "jammy".to_string(),
                mac_addresses: vec![MacAddress {
                    mac_address: format!("52:54:00:00:00:{:02x}", system_id.len()),
                }],
                pxe_mac: None,
                interfaces: Vec::new(),
                block_devices: Vec::new(),
                status: NodeStatus::New,
            },
        }
    }

    pub fn status(mut self, status: NodeStatus) -> Self {
        self.node.status = status;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.node.tags.insert(tag.to_string());
        self
    }

    pub fn pxe_mac(mut self, mac: &str) -> Self {
        self.node.pxe_mac = Some(MacAddress {
            mac_address: mac.to_string(),
        });
        self
    }

    pub fn iface(mut self, name: &str, mac: &str, links: Vec<Link>) -> Self {
        self.node.interfaces.push(Interface {
            name: name.to_string(),
            mac_address: mac.to_string(),
            resource_uri: format!(
                "/MAAS/api/1.0/nodes/{}/interfaces/{}/",
                self.node.system_id, name
            ),
            links,
        });
        self
    }

    pub fn drive(mut self, name: &str, tags: &[&str], size_gib: u64, used_for: &str) -> Self {
        self.node.block_devices.push(BlockDevice {
            name: name.to_string(),
            id_path: Some(format!("/dev/disk/by-id/{}", name)),
            resource_uri: format!(
                "/MAAS/api/1.0/nodes/{}/blockdevices/{}/",
                self.node.system_id, name
            ),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            size_bytes: size_gib << 30,
            used_for: used_for.to_string(),
        });
        self
    }

    pub fn build(self) -> Node {
        self.node
    }
}

pub(crate) fn link(id: u64, mode: &str, ip: Option<&str>, fabric: &str, cidr: &str) -> Link {
    Link {
        id,
        mode: mode.to_string(),
        ip_address: ip.map(str::to_string),
        subnet: Some(Subnet {
            id: id * 10,
            cidr: cidr.to_string(),
            vlan: Vlan {
                fabric: fabric.to_string(),
            },
        }),
    }
}

// =============================================================================
// Fake MAAS
// =============================================================================

#[derive(Default)]
struct FakeState {
    nodes: Vec<Node>,
    calls: Vec<String>,
    pending: HashMap<String, VecDeque<NodeStatus>>,
    stuck: HashSet<String>,
    failing: Vec<String>,
}

/// Records every call and walks nodes through transitions on successive polls
#[derive(Default)]
pub(crate) struct FakeMaas {
    state: Mutex<FakeState>,
}

impl FakeMaas {
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        let fake = Self::default();
        fake.state.lock().nodes = nodes;
        fake
    }

    /// Actions on this node never change its state
    pub fn stick(&self, system_id: &str) {
        self.state.lock().stuck.insert(system_id.to_string());
    }

    /// Calls whose log entry starts with `prefix` fail with a server error
    pub fn fail_on(&self, prefix: &str) {
        self.state.lock().failing.push(prefix.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Calls other than state polls
    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("get:"))
            .collect()
    }

    pub fn status_of(&self, system_id: &str) -> Option<NodeStatus> {
        let state = self.state.lock();
        state
            .nodes
            .iter()
            .find(|n| n.system_id == system_id)
            .map(|n| n.status.clone())
    }

    fn record(&self, call: String) -> Result<()> {
        let mut state = self.state.lock();
        let failed = state.failing.iter().any(|p| call.starts_with(p.as_str()));
        state.calls.push(call.clone());
        if failed {
            return Err(Error::Server {
                status: 500,
                message: format!("injected failure: {}", call),
            });
        }
        Ok(())
    }

    fn schedule(&self, system_id: &str, steps: &[NodeStatus]) {
        let mut state = self.state.lock();
        if state.stuck.contains(system_id) {
            return;
        }
        state
            .pending
            .insert(system_id.to_string(), steps.iter().cloned().collect());
    }
}

#[async_trait]
impl ProvisioningApi for FakeMaas {
    async fn list_node_records(&self) -> Result<Vec<serde_json::Value>> {
        self.record("list_nodes".into())?;
        let nodes = self.state.lock().nodes.clone();
        nodes
            .into_iter()
            .map(|n| serde_json::to_value(n).map_err(Error::from))
            .collect()
    }

    async fn get_node(&self, system_id: &str) -> Result<Node> {
        self.record(format!("get:{}", system_id))?;
        let mut state = self.state.lock();
        let next = state
            .pending
            .get_mut(system_id)
            .and_then(|steps| steps.pop_front());
        let node = state
            .nodes
            .iter_mut()
            .find(|n| n.system_id == system_id)
            .ok_or_else(|| Error::Server {
                status: 404,
                message: format!("no node {}", system_id),
            })?;
        if let Some(status) = next {
            node.status = status;
        }
        Ok(node.clone())
    }

    async fn list_tags(&self, prefix: &str) -> Result<Vec<String>> {
        self.record(format!("list_tags:{}", prefix))?;
        let state = self.state.lock();
        let tags: BTreeSet<String> = state
            .nodes
            .iter()
            .flat_map(|n| n.tags.iter())
            .filter(|t| t.starts_with(prefix))
            .cloned()
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn nodes_for_tag(&self, tag: &str) -> Result<Vec<Node>> {
        self.record(format!("nodes_for_tag:{}", tag))?;
        let state = self.state.lock();
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.has_tag(tag))
            .cloned()
            .collect())
    }

    async fn tag_nodes(&self, system_ids: &[String], tag: &str, remove: bool) -> Result<()> {
        let op = if remove { "remove" } else { "add" };
        self.record(format!("tag_nodes:{}:{}:{}", tag, op, system_ids.join(",")))
    }

    async fn tag_drive(&self, drive_uri: &str, tag: &str, remove: bool) -> Result<()> {
        let op = if remove { "remove" } else { "add" };
        self.record(format!("tag_drive:{}:{}:{}", drive_uri, tag, op))
    }

    async fn update_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        let params: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.record(format!("update:{}:{}", system_id, params.join(",")))
    }

    async fn commission_node(&self, system_id: &str) -> Result<()> {
        self.record(format!("commission:{}", system_id))?;
        self.schedule(
            system_id,
            &[NodeStatus::Commissioning, NodeStatus::Commissioning, NodeStatus::Ready],
        );
        Ok(())
    }

    async fn acquire_nodes(&self, system_ids: &[String]) -> Result<()> {
        self.record(format!("acquire:{}", system_ids.join(",")))?;
        for id in system_ids {
            self.schedule(id, &[NodeStatus::Allocated]);
        }
        Ok(())
    }

    async fn start_node(&self, system_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.record(format!("start:{}:{}", system_id, rendered.join(",")))?;
        self.schedule(system_id, &[NodeStatus::Deploying, NodeStatus::Deployed]);
        Ok(())
    }

    async fn link_subnet(&self, iface_uri: &str, subnet_id: u64, mode: LinkMode) -> Result<()> {
        self.record(format!("link:{}:{}:{}", iface_uri, subnet_id, mode))
    }

    async fn unlink_subnet(&self, iface_uri: &str, link_id: u64) -> Result<()> {
        self.record(format!("unlink:{}:{}", iface_uri, link_id))
    }
}

// =============================================================================
// Fake Scanner
// =============================================================================

/// Serves fixed keys per IP
#[derive(Default)]
pub(crate) struct FakeScanner {
    keys: HashMap<String, String>,
    scanned: Mutex<Vec<String>>,
}

impl FakeScanner {
    pub fn with_key(mut self, ip: &str, key: &str) -> Self {
        self.keys.insert(ip.to_string(), key.to_string());
        self
    }

    pub fn scanned(&self) -> Vec<String> {
        self.scanned.lock().clone()
    }
}

#[async_trait]
impl HostKeyScanner for FakeScanner {
    async fn scan(&self, ip: &str, hostname: &str) -> Result<Option<String>> {
        self.scanned.lock().push(format!("{},{}", ip, hostname));
        Ok(self.keys.get(ip).cloned())
    }
}
