//! Record of remote resources allocated during a run.
//!
//! Nothing is ever deleted automatically; the ledger is what an operator
//! needs to clean up by hand after a failed run.

use std::fmt;

use serde::Serialize;

use crate::domain::linode::{ConfigProfileId, DiskId, NodeId};
use crate::domain::plan::DiskRole;

/// Resources created so far, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceLedger {
    pub node: Option<NodeId>,
    pub disks: Vec<(DiskRole, DiskId)>,
    pub config_profile: Option<ConfigProfileId>,
}

impl ResourceLedger {
    pub fn record_node(&mut self, id: NodeId) {
        self.node = Some(id);
    }

    pub fn record_disk(&mut self, role: DiskRole, id: DiskId) {
        self.disks.push((role, id));
    }

    pub fn record_config_profile(&mut self, id: ConfigProfileId) {
        self.config_profile = Some(id);
    }

    /// Disk ids in creation order.
    #[must_use]
    pub fn disk_ids(&self) -> Vec<DiskId> {
        self.disks.iter().map(|(_, id)| *id).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.disks.is_empty() && self.config_profile.is_none()
    }
}

impl fmt::Display for ResourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no resources allocated");
        }
        let mut parts = Vec::new();
        if let Some(node) = self.node {
            parts.push(format!("linode {node}"));
        }
        for (role, id) in &self.disks {
            parts.push(format!("disk {id} ({role})"));
        }
        if let Some(config) = self.config_profile {
            parts.push(format!("config {config}"));
        }
        write!(f, "allocated: {}", parts.join(", "))
    }
}
