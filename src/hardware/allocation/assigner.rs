//! OSD Device Role Assignment
//!
//! Pairs every OSD data device with a journal device. When there are fewer
//! journal devices than data devices the journals are handed out round-robin,
//! so ceph-ansible partitions each journal device once per OSD it serves.

use crate::config::TagConfig;
use crate::domain::node::Node;
use serde::Serialize;
use tracing::{debug, warn};

// =============================================================================
// Assignment Result
// =============================================================================

/// Data devices and the journal device backing each of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAssignment {
    /// OSD data devices
    pub data: Vec<String>,
    /// Journal device per data device, position-aligned with `data`
    pub journal: Vec<String>,
}

/// Balance journal devices across data devices.
///
/// Returns `None` when the node has neither data nor journal devices.
/// Otherwise `journal` is either empty (no journals given) or exactly as long
/// as `data`.
pub fn assign(data: Vec<String>, journal: Vec<String>) -> Option<DeviceAssignment> {
    let data_count = data.len();
    let journal_count = journal.len();

    if data_count == 0 && journal_count == 0 {
        return None;
    }

    let journal = if journal_count == 0 || journal_count == data_count {
        journal
    } else if journal_count < data_count {
        // ceil(D/J) repetitions of the journal list, truncated to D entries
        journal.iter().cycle().take(data_count).cloned().collect()
    } else {
        journal.into_iter().take(data_count).collect()
    };

    Some(DeviceAssignment { data, journal })
}

// =============================================================================
// Device Role Assigner
// =============================================================================

/// Resolves a node's tagged block devices into an OSD assignment
#[derive(Debug, Clone)]
pub struct DeviceRoleAssigner {
    data_tag: String,
    journal_tag: String,
}

impl DeviceRoleAssigner {
    pub fn new(tags: &TagConfig) -> Self {
        Self {
            data_tag: tags.osd_data.clone(),
            journal_tag: tags.osd_journal.clone(),
        }
    }

    /// Assign roles to the node's devices, keeping MAAS device order
    pub fn assign_node(&self, node: &Node) -> Option<DeviceAssignment> {
        let mut data = Vec::new();
        let mut journal = Vec::new();

        for blk in &node.block_devices {
            let is_data = blk.has_tag(&self.data_tag);
            let is_journal = blk.has_tag(&self.journal_tag);

            if is_data && is_journal {
                warn!(
                    hostname = %node.hostname,
                    device = %blk.device_path(),
                    "Device tagged as both data and journal, using it as data"
                );
            }

            if is_data {
                data.push(blk.device_path());
            } else if is_journal {
                journal.push(blk.device_path());
            }
        }

        if data.is_empty() && !journal.is_empty() {
            warn!(
                hostname = %node.hostname,
                journals = journal.len(),
                "Journal devices without data devices are ignored"
            );
        }

        let assignment = assign(data, journal);
        if let Some(a) = &assignment {
            debug!(
                hostname = %node.hostname,
                data = a.data.len(),
                journal = a.journal.len(),
                "Assigned OSD devices"
            );
        }
        assignment
    }
}
