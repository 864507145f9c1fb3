//! Serial Lifecycle Orchestrator
//!
//! Drives nodes through commissioning and deployment strictly one at a time:
//! the next node's first action is only issued after the previous node
//! reached its target state.

use super::wait::{wait_for_status, WaitPolicy};
use crate::config::LifecycleConfig;
use crate::domain::node::{Node, NodeStatus};
use crate::domain::ports::ProvisioningApiRef;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Kernel requested on deployment when none is given
pub const DEFAULT_KERNEL: &str = "hwe-x";

// =============================================================================
// Report
// =============================================================================

/// One node that reached its target state
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutcome {
    pub system_id: String,
    pub hostname: String,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of a serial batch
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    pub action: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Nodes in processing order
    pub completed: Vec<NodeOutcome>,
    /// Nodes left alone because they were not in the initial state
    pub skipped: usize,
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Debug, Clone)]
enum Action {
    Commission,
    Deploy { params: BTreeMap<String, String> },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Commission => "commission",
            Action::Deploy { .. } => "deploy",
        }
    }
}

/// Serial commission/deploy driver
pub struct LifecycleOrchestrator {
    api: ProvisioningApiRef,
    poll: WaitPolicy,
    allocate: WaitPolicy,
    cancel: CancellationToken,
    only: Option<String>,
}

impl LifecycleOrchestrator {
    pub fn new(
        api: ProvisioningApiRef,
        config: &LifecycleConfig,
        cancel: CancellationToken,
    ) -> Self {
        let poll = WaitPolicy {
            interval: config.poll_interval(),
            timeout: config.wait_timeout(),
        };
        let allocate = WaitPolicy {
            interval: config.allocate_poll_interval(),
            timeout: config.wait_timeout(),
        };
        Self::with_policies(api, poll, allocate, cancel)
    }

    /// Build with explicit wait policies for state changes and allocation
    pub fn with_policies(
        api: ProvisioningApiRef,
        poll: WaitPolicy,
        allocate: WaitPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            poll,
            allocate,
            cancel,
            only: None,
        }
    }

    /// Restrict the batch to a single node
    pub fn only(mut self, system_id: impl Into<String>) -> Self {
        self.only = Some(system_id.into());
        self
    }

    /// Commission every `New` node, waiting for each to become `Ready`
    pub async fn commission_all(&self) -> Result<LifecycleReport> {
        self.serial_apply(Action::Commission, NodeStatus::New, NodeStatus::Ready)
            .await
    }

    /// Allocate and deploy every `Ready` node, waiting for each to become
    /// `Deployed`
    pub async fn deploy_all(
        &self,
        os_release: Option<&str>,
        kernel: &str,
    ) -> Result<LifecycleReport> {
        let mut params = BTreeMap::new();
        if let Some(release) = os_release {
            params.insert("distro_series".to_string(), release.to_string());
        }
        params.insert("hwe_kernel".to_string(), kernel.to_string());

        self.serial_apply(
            Action::Deploy { params },
            NodeStatus::Ready,
            NodeStatus::Deployed,
        )
        .await
    }

    async fn serial_apply(
        &self,
        action: Action,
        initial: NodeStatus,
        target: NodeStatus,
    ) -> Result<LifecycleReport> {
        let started_at = Utc::now();
        let snapshot = self.api.list_nodes().await?;
        let total = snapshot.len();

        let pending: Vec<Node> = snapshot
            .into_iter()
            .filter(|n| n.status == initial)
            .filter(|n| self.only.as_deref().map_or(true, |id| n.system_id == id))
            .collect();

        info!(
            action = action.name(),
            initial = %initial,
            target = %target,
            nodes = pending.len(),
            "Starting serial batch"
        );

        let mut completed = Vec::with_capacity(pending.len());
        for node in &pending {
            let node_started = Utc::now();
            info!(
                action = action.name(),
                system_id = %node.system_id,
                hostname = %node.hostname,
                "Processing node"
            );

            if let Err(e) = self.run(&action, node, &target).await {
                warn!(
                    action = action.name(),
                    system_id = %node.system_id,
                    hostname = %node.hostname,
                    error = %e,
                    "Aborting batch"
                );
                return Err(e);
            }

            info!(system_id = %node.system_id, state = %target, "Node reached target state");
            completed.push(NodeOutcome {
                system_id: node.system_id.clone(),
                hostname: node.hostname.clone(),
                state: target.to_string(),
                started_at: node_started,
                finished_at: Utc::now(),
            });
        }

        Ok(LifecycleReport {
            action: action.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            skipped: total - completed.len(),
            completed,
        })
    }

    async fn run(&self, action: &Action, node: &Node, target: &NodeStatus) -> Result<()> {
        let api = self.api.as_ref();
        let system_id = node.system_id.as_str();

        match action {
            Action::Commission => {
                api.commission_node(system_id).await?;
            }
            Action::Deploy { params } => {
                api.acquire_nodes(&[node.system_id.clone()]).await?;
                wait_for_status(api, system_id, &NodeStatus::Allocated, self.allocate, &self.cancel)
                    .await?;
                api.start_node(system_id, params).await?;
            }
        }

        wait_for_status(api, system_id, target, self.poll, &self.cancel).await
    }
}
