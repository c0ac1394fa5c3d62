//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::{
    ConfigProfile, ConfigProfileRequest, Disk, DiskId, DiskRequest, Node, NodeId, NodeRequest,
    NodeType, RawConfig,
};

// ── Compute Port ──────────────────────────────────────────────────────────────

/// The remote compute provider: Linodes, their disks and config profiles.
///
/// Every call may take arbitrarily long and the provider is eventually
/// consistent: a created resource is usually not usable until its status
/// settles, which callers observe by polling.
#[allow(async_fn_in_trait)]
pub trait ComputeService {
    /// Look up a Linode type (plan) by id.
    async fn node_type(&self, id: &str) -> Result<NodeType>;
    /// Create an empty Linode.
    async fn create_node(&self, request: &NodeRequest<'_>) -> Result<Node>;
    /// Fetch the current state of a Linode.
    async fn get_node(&self, id: NodeId) -> Result<Node>;
    /// List a Linode's disks in provider order.
    async fn list_disks(&self, node: NodeId) -> Result<Vec<Disk>>;
    /// Create a disk on a Linode.
    async fn create_disk(&self, node: NodeId, request: &DiskRequest<'_>) -> Result<Disk>;
    /// Fetch the current state of a disk.
    async fn get_disk(&self, node: NodeId, disk: DiskId) -> Result<Disk>;
    /// Create a configuration profile on a Linode.
    async fn create_config_profile(
        &self,
        node: NodeId,
        request: &ConfigProfileRequest<'_>,
    ) -> Result<ConfigProfile>;
    /// Reboot a Linode into rescue mode with `disks` attached as sda, sdb, ...
    async fn rescue(&self, node: NodeId, disks: &[DiskId]) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a "still waiting" notice while polling.
    fn wait(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading the configuration file.
pub trait ConfigStore {
    /// Read and parse the configuration.
    fn load(&self) -> Result<RawConfig>;
    /// Location of the configuration, for messages.
    fn path(&self) -> PathBuf;
}
