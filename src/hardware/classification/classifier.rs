//! Node Classifier
//!
//! Splits nodes into storage nodes and clients by whether they have spare
//! drives, and sorts the spare drives into OSD data and journal devices by
//! size. The result is a tag plan that is then applied through MAAS.

use crate::config::TagConfig;
use crate::domain::node::Node;
use crate::domain::ports::ProvisioningApi;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

const GIB: u64 = 1 << 30;

// =============================================================================
// Tag Plan
// =============================================================================

/// Tags to apply, grouped per tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagPlan {
    /// Node tag -> system IDs
    pub node_tags: BTreeMap<String, Vec<String>>,
    /// Drive tag -> block device resource URIs
    pub drive_tags: BTreeMap<String, Vec<String>>,
}

impl TagPlan {
    pub fn is_empty(&self) -> bool {
        self.node_tags.is_empty() && self.drive_tags.is_empty()
    }

    pub fn drive_count(&self) -> usize {
        self.drive_tags.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Node Classifier
// =============================================================================

/// Builds and applies the storage/client tag plan
#[derive(Debug, Clone)]
pub struct NodeClassifier {
    tags: TagConfig,
    /// Drives at least this large hold OSD data, smaller ones journals
    data_size_threshold_bytes: u64,
}

impl NodeClassifier {
    /// Create a classifier; a zero threshold makes every spare drive a data drive
    pub fn new(tags: TagConfig, data_size_threshold_gib: u64) -> Self {
        Self {
            tags,
            data_size_threshold_bytes: data_size_threshold_gib.saturating_mul(GIB),
        }
    }

    /// Compute the tags for a node snapshot
    pub fn plan(&self, nodes: &[Node]) -> TagPlan {
        let mut plan = TagPlan::default();

        for node in nodes {
            let spare: Vec<_> = node.unused_devices().collect();

            if spare.is_empty() {
                debug!(hostname = %node.hostname, "No spare drives, classifying as client");
                plan.node_tags
                    .entry(self.tags.clients.clone())
                    .or_default()
                    .push(node.system_id.clone());
                continue;
            }

            debug!(
                hostname = %node.hostname,
                drives = spare.len(),
                "Spare drives found, classifying as storage node"
            );
            plan.node_tags
                .entry(self.tags.osds.clone())
                .or_default()
                .push(node.system_id.clone());

            for drive in spare {
                let tag = if drive.size_bytes >= self.data_size_threshold_bytes {
                    &self.tags.osd_data
                } else {
                    &self.tags.osd_journal
                };
                plan.drive_tags
                    .entry(tag.clone())
                    .or_default()
                    .push(drive.resource_uri.clone());
            }
        }

        plan
    }

    /// Apply (or with `remove`, revert) a tag plan, stopping at the first failure
    pub async fn apply(
        &self,
        api: &dyn ProvisioningApi,
        plan: &TagPlan,
        remove: bool,
    ) -> Result<()> {
        let verb = if remove { "Removing" } else { "Adding" };

        for (tag, system_ids) in &plan.node_tags {
            info!(tag = %tag, nodes = system_ids.len(), "{} node tag", verb);
            api.tag_nodes(system_ids, tag, remove).await?;
        }

        for (tag, drives) in &plan.drive_tags {
            info!(tag = %tag, drives = drives.len(), "{} drive tag", verb);
            for drive_uri in drives {
                api.tag_drive(drive_uri, tag, remove).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{FakeMaas, NodeBuilder};
    use crate::error::Error;
    use assert_matches::assert_matches;

    fn nodes() -> Vec<Node> {
        vec![
            NodeBuilder::new("n1", "storage-01")
                .drive("sda", &[], 240, "MBR partitioned")
                .drive("sdb", &[], 4000, "Unused")
                .drive("nvme0n1", &[], 400, "Unused")
                .build(),
            NodeBuilder::new("n2", "client-01")
                .drive("sda", &[], 240, "MBR partitioned")
                .build(),
            NodeBuilder::new("n3", "storage-02")
                .drive("sdb", &[], 4000, "Unused")
                .build(),
        ]
    }

    #[test]
    fn test_plan_without_threshold() {
        let classifier = NodeClassifier::new(TagConfig::default(), 0);
        let plan = classifier.plan(&nodes());

        assert_eq!(plan.node_tags["ansible_osds"], vec!["n1", "n3"]);
        assert_eq!(plan.node_tags["ansible_clients"], vec!["n2"]);
        assert_eq!(plan.drive_tags["ansible_osd_data"].len(), 3);
        assert!(!plan.drive_tags.contains_key("ansible_osd_journal"));
    }

    #[test]
    fn test_plan_splits_by_size() {
        let classifier = NodeClassifier::new(TagConfig::default(), 1000);
        let plan = classifier.plan(&nodes());

        assert_eq!(
            plan.drive_tags["ansible_osd_data"],
            vec![
                "/MAAS/api/1.0/nodes/n1/blockdevices/sdb/",
                "/MAAS/api/1.0/nodes/n3/blockdevices/sdb/"
            ]
        );
        assert_eq!(
            plan.drive_tags["ansible_osd_journal"],
            vec!["/MAAS/api/1.0/nodes/n1/blockdevices/nvme0n1/"]
        );
        assert_eq!(plan.drive_count(), 3);
    }

    #[test]
    fn test_plan_empty_snapshot() {
        let classifier = NodeClassifier::new(TagConfig::default(), 0);
        assert!(classifier.plan(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_apply_tags_nodes_then_drives() {
        let api = FakeMaas::default();
        let classifier = NodeClassifier::new(TagConfig::default(), 1000);
        let plan = classifier.plan(&nodes());

        classifier.apply(&api, &plan, false).await.unwrap();

        assert_eq!(
            api.actions(),
            vec![
                "tag_nodes:ansible_clients:add:n2",
                "tag_nodes:ansible_osds:add:n1,n3",
                "tag_drive:/MAAS/api/1.0/nodes/n1/blockdevices/sdb/:ansible_osd_data:add",
                "tag_drive:/MAAS/api/1.0/nodes/n3/blockdevices/sdb/:ansible_osd_data:add",
                "tag_drive:/MAAS/api/1.0/nodes/n1/blockdevices/nvme0n1/:ansible_osd_journal:add",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_remove_stops_on_failure() {
        let api = FakeMaas::default();
        api.fail_on("tag_nodes:ansible_osds");
        let classifier = NodeClassifier::new(TagConfig::default(), 0);
        let plan = classifier.plan(&nodes());

        let err = classifier.apply(&api, &plan, true).await.unwrap_err();

        assert_matches!(err, Error::Server { status: 500, .. });
        assert_eq!(
            api.actions(),
            vec![
                "tag_nodes:ansible_clients:remove:n2",
                "tag_nodes:ansible_osds:remove:n1,n3",
            ]
        );
    }
}
