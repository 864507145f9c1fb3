//! MAAS Inventory - Ansible inventory and serial provisioning for MAAS
//!
//! Turns the nodes of a MAAS-managed Ceph cluster into an Ansible dynamic
//! inventory and drives them one at a time through commissioning and
//! deployment.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │               maas-inventory / maas-tools (CLI)                   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────────┐   │
//! │  │    Inventory     │  │    Lifecycle     │  │  SSH host-key  │   │
//! │  │     Builder      │  │   Orchestrator   │  │    refresh     │   │
//! │  └────────┬─────────┘  └────────┬─────────┘  └───────┬────────┘   │
//! │  ┌────────┴─────────┐  ┌────────┴─────────┐          │            │
//! │  │ DeviceRole       │  │ Topology         │          │            │
//! │  │ Assigner         │  │ Resolver         │          │            │
//! │  └──────────────────┘  └──────────────────┘          │            │
//! ├──────────────────────────────────┬───────────────────┴────────────┤
//! │      ProvisioningApi (port)      │    HostKeyScanner (port)       │
//! ├──────────────────────────────────┼────────────────────────────────┤
//! │     MaasClient (REST + OAuth)    │       ssh-keyscan              │
//! └──────────────────────────────────┴────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Node records and the ports to external systems
//! - [`hardware`]: OSD device role assignment and drive classification
//! - [`network`]: Role network topology and interface link modes
//! - [`inventory`]: Ansible dynamic inventory documents
//! - [`lifecycle`]: Serial commissioning and deployment
//! - [`client`]: MAAS REST API client
//! - [`cli`]: Command line options shared by the binaries
//! - [`ssh`]: known_hosts refresh
//! - [`config`]: Toolkit configuration
//! - [`error`]: Error types and handling

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod inventory;
pub mod lifecycle;
pub mod logging;
pub mod network;
pub mod ssh;

// Re-export commonly used types
pub use client::{ApiKey, MaasClient};

pub use config::{
    Config, InventoryConfig, LifecycleConfig, MaasConfig, NetworkConfig, SshConfig, TagConfig,
};

pub use domain::node::{BlockDevice, Interface, Link, LinkMode, Node, NodeStatus, Subnet};

pub use domain::ports::{HostKeyScanner, HostKeyScannerRef, ProvisioningApi, ProvisioningApiRef};

pub use error::{Error, Result};

pub use hardware::{assign, DeviceAssignment, DeviceRoleAssigner, NodeClassifier, TagPlan};

pub use inventory::{render_json, InventoryBuilder, InventoryDocument, RoleGroup};

pub use lifecycle::{LifecycleOrchestrator, LifecycleReport, WaitPolicy, DEFAULT_KERNEL};

pub use network::{LinkModePlanner, RoleNetwork, TopologyResolver};

pub use ssh::{update_ssh_keys, SshKeyscan};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
