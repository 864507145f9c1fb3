//! Tag membership listing

use crate::domain::ports::ProvisioningApi;
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Hostnames carrying each tag that starts with `prefix`
pub async fn tag_members(
    api: &dyn ProvisioningApi,
    prefix: &str,
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut members = BTreeMap::new();

    for tag in api.list_tags(prefix).await? {
        let hosts: Vec<String> = api
            .nodes_for_tag(&tag)
            .await?
            .into_iter()
            .map(|n| n.hostname)
            .collect();
        debug!(tag = %tag, hosts = hosts.len(), "Listed tag members");
        members.insert(tag, hosts);
    }

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{FakeMaas, NodeBuilder};

    #[tokio::test]
    async fn test_tag_members() {
        let api = FakeMaas::with_nodes(vec![
            NodeBuilder::new("n1", "osd-01").tag("ansible_osds").tag("virtual").build(),
            NodeBuilder::new("n2", "osd-02").tag("ansible_osds").build(),
            NodeBuilder::new("n3", "mon-01").tag("ansible_mons").build(),
        ]);

        let members = tag_members(&api, "ansible_").await.unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members["ansible_osds"], vec!["osd-01", "osd-02"]);
        assert_eq!(members["ansible_mons"], vec!["mon-01"]);
        assert_eq!(
            api.calls(),
            vec![
                "list_tags:ansible_",
                "nodes_for_tag:ansible_mons",
                "nodes_for_tag:ansible_osds",
            ]
        );
    }
}
