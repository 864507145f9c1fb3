//! SSH Host Key Refresh
//!
//! Re-deployed nodes come back with new host keys. This module fetches the
//! current RSA key of every node and rewrites the local known_hosts file.

pub mod keyscan;
pub mod known_hosts;

pub use keyscan::*;
pub use known_hosts::*;

use crate::domain::ports::{HostKeyScanner, ProvisioningApi};
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Refresh known_hosts for every node.
///
/// Returns hostname -> RSA key, `None` for nodes that served no key on any
/// of their addresses.
pub async fn update_ssh_keys(
    api: &dyn ProvisioningApi,
    scanner: &dyn HostKeyScanner,
    known_hosts: &Path,
) -> Result<BTreeMap<String, Option<String>>> {
    let nodes = api.list_nodes().await?;
    let mut keys = BTreeMap::new();

    for node in &nodes {
        let ips = node.ip_addresses();
        let mut key = None;
        for ip in &ips {
            if let Some(found) = scanner.scan(ip, &node.hostname).await? {
                key = Some(found);
                break;
            }
        }

        if key.is_none() {
            warn!(hostname = %node.hostname, addresses = ips.len(), "No SSH host key found");
        }
        update_known_hosts(known_hosts, &node.hostname, &ips, key.as_deref()).await?;
        keys.insert(node.hostname.clone(), key);
    }

    info!(
        nodes = keys.len(),
        with_key = keys.values().filter(|k| k.is_some()).count(),
        "Refreshed SSH host keys"
    );
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{link, FakeMaas, FakeScanner, NodeBuilder};

    #[tokio::test]
    async fn test_update_ssh_keys() {
        let up = NodeBuilder::new("n1", "node-01")
            .iface(
                "eth0",
                "m1",
                vec![link(1, "dhcp", Some("10.40.0.21"), "fabric-0", "10.40.0.0/24")],
            )
            .iface(
                "eth1",
                "m2",
                vec![link(2, "auto", Some("10.0.0.21"), "client_net", "10.0.0.0/24")],
            )
            .build();
        let down = NodeBuilder::new("n2", "node-02")
            .iface(
                "eth0",
                "m3",
                vec![link(3, "dhcp", Some("10.40.0.22"), "fabric-0", "10.40.0.0/24")],
            )
            .build();
        let api = FakeMaas::with_nodes(vec![up, down]);
        let scanner = FakeScanner::default().with_key("10.40.0.21", "ssh-rsa KEY1");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, "node-02 ssh-rsa STALE\n").unwrap();

        let keys = update_ssh_keys(&api, &scanner, &path).await.unwrap();

        assert_eq!(keys.get("node-01"), Some(&Some("ssh-rsa KEY1".to_string())));
        assert_eq!(keys.get("node-02"), Some(&None));
        // sorted addresses, scanning stops at the first key
        assert_eq!(
            scanner.scanned(),
            vec!["10.0.0.21,node-01", "10.40.0.21,node-01", "10.40.0.22,node-02"]
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "node-01,10.0.0.21 ssh-rsa KEY1\nnode-01,10.40.0.21 ssh-rsa KEY1\n"
        );
    }
}
