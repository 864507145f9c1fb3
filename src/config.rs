//! Toolkit Configuration
//!
//! A single configuration record built once per invocation and handed to
//! every component. Values come from defaults, an optional YAML file and
//! finally command-line/environment overrides applied by the binaries.

use crate::error::{Error, Result};
use crate::inventory::META_KEY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// MAAS Connection
// =============================================================================

/// How to reach the MAAS region controller
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaasConfig {
    /// Region controller host
    pub host: String,
    /// Full API URL (derived from `host` when unset)
    pub api_url: Option<String>,
    /// API key as `consumer_key:token_key:token_secret`
    pub token: Option<String>,
    /// MAAS user owning the API key
    pub user: String,
    /// Shell user for fetching the API key over SSH
    pub shell_user: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for MaasConfig {
    fn default() -> Self {
        Self {
            host: "10.40.0.2".to_string(),
            api_url: None,
            token: None,
            user: "root".to_string(),
            shell_user: "ubuntu".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl MaasConfig {
    /// API URL, explicit or derived from the host
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:5240/MAAS/api/1.0", self.host),
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Tag names used for roles and drive classification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Prefix marking a node tag as an inventory role
    pub role_prefix: String,
    /// Drive tag for OSD data devices
    pub osd_data: String,
    /// Drive tag for OSD journal devices
    pub osd_journal: String,
    /// Node tag for storage nodes
    pub osds: String,
    /// Node tag for nodes without spare drives
    pub clients: String,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            role_prefix: "ansible_".to_string(),
            osd_data: "ansible_osd_data".to_string(),
            osd_journal: "ansible_osd_journal".to_string(),
            osds: "ansible_osds".to_string(),
            clients: "ansible_clients".to_string(),
        }
    }
}

impl TagConfig {
    /// Role name for a node tag, if the tag selects a role.
    ///
    /// `_meta` is reserved for host variables in the inventory document.
    pub fn role_of<'a>(&self, tag: &'a str) -> Option<&'a str> {
        if tag == self.osd_data || tag == self.osd_journal {
            return None;
        }
        tag.strip_prefix(self.role_prefix.as_str())
            .filter(|role| !role.is_empty() && *role != META_KEY)
    }
}

// =============================================================================
// Network
// =============================================================================

/// Fabric names identifying the well-known networks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Fabric carrying client (public) traffic
    pub public_fabric: String,
    /// Fabric carrying replication (cluster) traffic
    pub cluster_fabric: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            public_fabric: "client_net".to_string(),
            cluster_fabric: "cluster_net".to_string(),
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Inventory output settings; key names must match ceph-ansible variables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Remote login account set on every group
    pub remote_user: String,
    /// Host variable holding OSD data devices
    pub data_devices_key: String,
    /// Host variable holding OSD journal devices
    pub journal_devices_key: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            remote_user: "ubuntu".to_string(),
            data_devices_key: "devices".to_string(),
            journal_devices_key: "raw_journal_devices".to_string(),
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Polling behaviour of the lifecycle orchestrator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Interval between state polls
    pub poll_interval_secs: u64,
    /// Interval between polls while waiting for allocation
    pub allocate_poll_interval_secs: u64,
    /// Maximum time to wait for a single transition
    pub wait_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            allocate_poll_interval_secs: 3,
            wait_timeout_secs: 3600,
        }
    }
}

impl LifecycleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn allocate_poll_interval(&self) -> Duration {
        Duration::from_secs(self.allocate_poll_interval_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

// =============================================================================
// SSH
// =============================================================================

/// Known-hosts refresh settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// known_hosts file to rewrite
    pub known_hosts: PathBuf,
    /// ssh-keyscan timeout per address
    pub keyscan_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            known_hosts: home.join(".ssh").join("known_hosts"),
            keyscan_timeout_secs: 10,
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub maas: MaasConfig,
    pub tags: TagConfig,
    pub network: NetworkConfig,
    pub inventory: InventoryConfig,
    pub lifecycle: LifecycleConfig,
    pub ssh: SshConfig,
}

impl Config {
    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Reject settings the components cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.tags.role_prefix.is_empty() {
            return Err(Error::Configuration("tags.role_prefix must not be empty".into()));
        }
        if self.tags.osd_data == self.tags.osd_journal {
            return Err(Error::Configuration(format!(
                "data and journal drive tags must differ (both are {})",
                self.tags.osd_data
            )));
        }
        if self.network.public_fabric.is_empty() {
            return Err(Error::Configuration("network.public_fabric must not be empty".into()));
        }
        if self.lifecycle.poll_interval_secs == 0
            || self.lifecycle.allocate_poll_interval_secs == 0
        {
            return Err(Error::Configuration("poll intervals must be at least one second".into()));
        }
        if self.lifecycle.wait_timeout_secs == 0 {
            return Err(Error::Configuration("lifecycle.wait_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_api_url() {
        let config = Config::default();
        assert_eq!(config.maas.api_url(), "http://10.40.0.2:5240/MAAS/api/1.0");

        let maas = MaasConfig {
            api_url: Some("http://maas.lab:5240/MAAS/api/1.0/".into()),
            ..Default::default()
        };
        assert_eq!(maas.api_url(), "http://maas.lab:5240/MAAS/api/1.0");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(concat!(
            "maas:\n  host: 192.168.10.2\n",
            "network:\n  cluster_fabric: replication\n",
            "lifecycle:\n  wait_timeout_secs: 900\n",
        ))
        .unwrap();

        assert_eq!(config.maas.host, "192.168.10.2");
        assert_eq!(config.maas.user, "root");
        assert_eq!(config.network.public_fabric, "client_net");
        assert_eq!(config.network.cluster_fabric, "replication");
        assert_eq!(config.lifecycle.wait_timeout(), Duration::from_secs(900));
        assert_eq!(config.lifecycle.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.inventory.journal_devices_key, "raw_journal_devices");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = Config::from_yaml("lifecycle:\n  poll_interval_secs: 0\n").unwrap_err();
        assert_matches!(err, Error::Configuration(_));
    }

    #[test]
    fn test_role_of() {
        let tags = TagConfig::default();
        assert_eq!(tags.role_of("ansible_mons"), Some("mons"));
        assert_eq!(tags.role_of("ansible_osds"), Some("osds"));
        assert_eq!(tags.role_of("ansible_osd_data"), None);
        assert_eq!(tags.role_of("ansible_osd_journal"), None);
        assert_eq!(tags.role_of("ansible_"), None);
        assert_eq!(tags.role_of("ansible__meta"), None);
        assert_eq!(tags.role_of("ansible__metal"), Some("_metal"));
        assert_eq!(tags.role_of("virtual"), None);
    }
}
