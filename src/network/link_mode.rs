//! Interface Link Mode
//!
//! Tells MAAS how to configure the non-PXE interfaces of nodes, e.g. switch
//! every secondary interface to DHCP before deployment.

use crate::domain::node::{LinkMode, Node};
use crate::domain::ports::ProvisioningApi;
use crate::error::Result;
use tracing::{info, warn};

// =============================================================================
// Link Changes
// =============================================================================

/// One API call needed to bring a link to the target mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChange {
    /// Link the interface to the subnet with a new mode
    Link {
        iface_uri: String,
        subnet_id: u64,
        mode: LinkMode,
    },
    /// Drop the link so the interface is only brought up
    Unlink { iface_uri: String, link_id: u64 },
}

/// Changes for one interface of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePlan {
    pub hostname: String,
    pub iface_name: String,
    pub changes: Vec<LinkChange>,
    /// Links that need a new mode but have no subnet to link to
    pub unlinkable: Vec<u64>,
}

// =============================================================================
// Link Mode Planner
// =============================================================================

/// Plans and applies link mode changes
#[derive(Debug, Clone, Copy)]
pub struct LinkModePlanner {
    mode: LinkMode,
}

impl LinkModePlanner {
    pub fn new(mode: LinkMode) -> Self {
        Self { mode }
    }

    /// Changes for every non-PXE interface of `node` whose links use another mode
    pub fn plan(&self, node: &Node) -> Vec<InterfacePlan> {
        let pxe_mac = node.pxe_mac.as_ref().map(|m| m.mac_address.as_str());

        node.interfaces
            .iter()
            .filter(|iface| Some(iface.mac_address.as_str()) != pxe_mac)
            .filter_map(|iface| {
                let mut changes = Vec::new();
                let mut unlinkable = Vec::new();

                for link in iface.links.iter().filter(|l| !self.mode.matches(&l.mode)) {
                    match (self.mode, &link.subnet) {
                        (LinkMode::LinkUp, _) => changes.push(LinkChange::Unlink {
                            iface_uri: iface.resource_uri.clone(),
                            link_id: link.id,
                        }),
                        (mode, Some(subnet)) => changes.push(LinkChange::Link {
                            iface_uri: iface.resource_uri.clone(),
                            subnet_id: subnet.id,
                            mode,
                        }),
                        (_, None) => unlinkable.push(link.id),
                    }
                }

                (!changes.is_empty() || !unlinkable.is_empty()).then(|| InterfacePlan {
                    hostname: node.hostname.clone(),
                    iface_name: iface.name.clone(),
                    changes,
                    unlinkable,
                })
            })
            .collect()
    }

    /// Apply the plan for every node.
    ///
    /// A failing interface is logged and skipped; the remaining interfaces are
    /// still processed. An interface with a link that has no subnet counts as
    /// failed. Returns the number of interfaces that failed.
    pub async fn apply(&self, api: &dyn ProvisioningApi, nodes: &[Node]) -> usize {
        let mut failed = 0;

        for node in nodes {
            for iface in self.plan(node) {
                info!(
                    hostname = %iface.hostname,
                    iface = %iface.iface_name,
                    mode = %self.mode,
                    "Setting interface link mode"
                );
                if let Err(e) = apply_changes(api, &iface.changes).await {
                    warn!(
                        hostname = %iface.hostname,
                        iface = %iface.iface_name,
                        mode = %self.mode,
                        error = %e,
                        "Failed to set link mode"
                    );
                    failed += 1;
                } else if !iface.unlinkable.is_empty() {
                    warn!(
                        hostname = %iface.hostname,
                        iface = %iface.iface_name,
                        mode = %self.mode,
                        links = ?iface.unlinkable,
                        "Links without a subnet were not switched"
                    );
                    failed += 1;
                }
            }
        }

        failed
    }
}

async fn apply_changes(api: &dyn ProvisioningApi, changes: &[LinkChange]) -> Result<()> {
    for change in changes {
        match change {
            LinkChange::Link {
                iface_uri,
                subnet_id,
                mode,
            } => api.link_subnet(iface_uri, *subnet_id, *mode).await?,
            LinkChange::Unlink { iface_uri, link_id } => {
                api.unlink_subnet(iface_uri, *link_id).await?
            }
        }
    }
    Ok(())
}
