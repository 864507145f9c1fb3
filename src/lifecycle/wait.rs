//! Bounded, cancellable polling of node state

use crate::domain::node::NodeStatus;
use crate::domain::ports::ProvisioningApi;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often and how long to poll
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Poll `system_id` until it reports `wanted`.
///
/// Fails with `LifecycleTimeout` once `policy.timeout` has elapsed and with
/// `Cancelled` as soon as `cancel` fires. API errors are returned unchanged.
pub async fn wait_for_status(
    api: &dyn ProvisioningApi,
    system_id: &str,
    wanted: &NodeStatus,
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    let started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                system_id: system_id.to_string(),
            });
        }

        let node = api.get_node(system_id).await?;
        debug!(system_id, state = %node.status, wanted = %wanted, "Polled node state");
        if &node.status == wanted {
            return Ok(());
        }

        let waited = started.elapsed();
        if waited >= policy.timeout {
            return Err(Error::LifecycleTimeout {
                system_id: system_id.to_string(),
                wanted: wanted.to_string(),
                last: node.status.to_string(),
                waited_secs: waited.as_secs(),
            });
        }

        let pause = policy.interval.min(policy.timeout - waited);
        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled {
                    system_id: system_id.to_string(),
                });
            }
            _ = sleep(pause) => {}
        }
    }
}
