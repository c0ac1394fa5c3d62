//! Application service: provision a Linode and boot it into rescue mode.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All I/O is routed through injected port traits.
//!
//! Every step depends on the one before it: the Linode must be stable before
//! disks can be attached, all disks must be ready before the config profile
//! can reference them, and the profile must exist before the rescue reboot.
//! Nothing runs concurrently and nothing is rolled back on failure.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::{ComputeService, ProgressReporter};
use crate::application::services::poll::{PollPolicy, wait_until};
use crate::domain::plan::{BOOT_KERNEL, disk_layout, verify_disk_list};
use crate::domain::{
    ConfigProfileId, ConfigProfileRequest, DeviceMap, DiskId, DiskRequest, DiskRole, DiskSpec,
    DiskStatus, Helpers, NodeId, NodeRequest, NodeStatus, ProvisioningPlan, ResourceLedger,
};

/// Delay after creating the config profile before touching the Linode again.
pub const DEFAULT_PROFILE_SETTLE: Duration = Duration::from_secs(3);

/// Timing knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub node_poll: PollPolicy,
    pub disk_poll: PollPolicy,
    pub profile_settle: Duration,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            node_poll: PollPolicy::default(),
            disk_poll: PollPolicy::default(),
            profile_settle: DEFAULT_PROFILE_SETTLE,
        }
    }
}

/// The steps of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProvisionStep {
    CheckNodeType,
    CreateNode,
    WaitNode,
    CreateDisk(DiskRole),
    WaitDisk(DiskRole),
    CreateConfigProfile,
    SettleConfigProfile,
    WaitNodeAfterConfig,
    CollectDisks,
    RescueBoot,
    ReadAddresses,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckNodeType => f.write_str("checking Linode type"),
            Self::CreateNode => f.write_str("creating Linode"),
            Self::WaitNode => f.write_str("waiting for Linode"),
            Self::CreateDisk(role) => write!(f, "creating {role} disk"),
            Self::WaitDisk(role) => write!(f, "waiting for {role} disk"),
            Self::CreateConfigProfile => f.write_str("creating config profile"),
            Self::SettleConfigProfile => f.write_str("settling config profile"),
            Self::WaitNodeAfterConfig => f.write_str("waiting for Linode after config profile"),
            Self::CollectDisks => f.write_str("collecting disks"),
            Self::RescueBoot => f.write_str("rebooting into rescue mode"),
            Self::ReadAddresses => f.write_str("reading IP addresses"),
        }
    }
}

/// A run that stopped part-way. `ledger` lists what is left on the account.
#[derive(Debug, Error)]
#[error("{step} failed ({ledger})")]
pub struct ProvisionError {
    pub step: ProvisionStep,
    pub ledger: ResourceLedger,
    #[source]
    pub source: anyhow::Error,
}

/// A Linode waiting in rescue mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningResult {
    pub node_id: NodeId,
    pub label: String,
    pub disks: Vec<DiskId>,
    pub config_profile: ConfigProfileId,
    pub ipv4: Vec<String>,
    pub ipv6: Option<String>,
}

/// Provision a Linode per `plan` and reboot it into rescue mode.
///
/// # Errors
///
/// Returns `ProvisionError` naming the failed step and every resource
/// created before it. Created resources are never deleted.
pub async fn provision(
    api: &impl ComputeService,
    plan: &ProvisioningPlan,
    options: &ProvisionOptions,
    reporter: &impl ProgressReporter,
) -> Result<ProvisioningResult, ProvisionError> {
    let mut run = Run {
        api,
        reporter,
        options,
        ledger: ResourceLedger::default(),
    };
    run.execute(plan).await
}

struct Run<'a, A, R> {
    api: &'a A,
    reporter: &'a R,
    options: &'a ProvisionOptions,
    ledger: ResourceLedger,
}

impl<A: ComputeService, R: ProgressReporter> Run<'_, A, R> {
    async fn execute(&mut self, plan: &ProvisioningPlan) -> Result<ProvisioningResult, ProvisionError> {
        use ProvisionStep as Step;

        // Reject undersized types before anything is allocated.
        let node_type = self
            .api
            .node_type(&plan.node_type)
            .await
            .map_err(|e| self.failed(Step::CheckNodeType, e))?;
        disk_layout(&plan.node_type, node_type.disk)
            .map_err(|e| self.failed(Step::CheckNodeType, e))?;

        self.reporter
            .step(&format!("Creating Linode -> {}", plan.node_label));
        let node = self
            .api
            .create_node(&NodeRequest {
                node_type: &plan.node_type,
                region: &plan.region,
                label: &plan.node_label,
                group: plan.node_group.as_deref(),
            })
            .await
            .map_err(|e| self.failed(Step::CreateNode, e))?;
        self.ledger.record_node(node.id);
        tracing::info!(node_id = %node.id, capacity = node.specs.disk, "linode created");

        // The created Linode's capacity is authoritative for the system disk.
        let layout = disk_layout(&plan.node_type, node.specs.disk)
            .map_err(|e| self.failed(Step::CreateNode, e))?;

        self.reporter.step("Making disks");
        self.wait_for_node(node.id, Step::WaitNode).await?;
        for spec in layout {
            self.create_disk(node.id, spec).await?;
        }

        self.reporter.step("Creating config profile");
        let devices = self.current_disks(node.id, Step::CreateConfigProfile).await?;
        let devices =
            DeviceMap::from_disks(&devices).map_err(|e| self.failed(Step::CreateConfigProfile, e))?;
        let profile = self
            .api
            .create_config_profile(
                node.id,
                &ConfigProfileRequest {
                    kernel: BOOT_KERNEL,
                    label: &plan.config_profile_label,
                    devices,
                    helpers: Helpers::all_disabled(),
                },
            )
            .await
            .map_err(|e| self.failed(Step::CreateConfigProfile, e))?;
        self.ledger.record_config_profile(profile.id);
        tracing::info!(node_id = %node.id, config_id = %profile.id, "config profile created");
        self.settle_config_profile().await;

        self.wait_for_node(node.id, Step::WaitNodeAfterConfig).await?;

        let disks = self.current_disks(node.id, Step::CollectDisks).await?;
        self.reporter.step(&format!(
            "Rebooting into rescue mode with the following disks: [{}]",
            disks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.api
            .rescue(node.id, &disks)
            .await
            .map_err(|e| self.failed(Step::RescueBoot, e))?;
        tracing::info!(node_id = %node.id, "rescue boot requested");

        let node = self
            .api
            .get_node(node.id)
            .await
            .map_err(|e| self.failed(Step::ReadAddresses, e))?;
        self.reporter
            .success(&format!("Linode {} is booting into rescue mode", node.label));

        Ok(ProvisioningResult {
            node_id: node.id,
            label: node.label,
            disks,
            config_profile: profile.id,
            ipv4: node.ipv4,
            ipv6: node.ipv6,
        })
    }

    async fn wait_for_node(&self, node: NodeId, step: ProvisionStep) -> Result<(), ProvisionError> {
        let api = self.api;
        wait_until(
            "Linode",
            &NodeStatus::STABLE,
            &self.options.node_poll,
            self.reporter,
            || async move { api.get_node(node).await.map(|n| n.status) },
        )
        .await
        .map_err(|e| self.failed(step, e))?;
        Ok(())
    }

    async fn create_disk(&mut self, node: NodeId, spec: DiskSpec) -> Result<(), ProvisionError> {
        let role = spec.role;
        self.reporter
            .step(&format!("Creating {} disk", role.label().to_lowercase()));
        let disk = self
            .api
            .create_disk(
                node,
                &DiskRequest {
                    size: spec.size,
                    label: role.label(),
                    filesystem: spec.filesystem,
                },
            )
            .await
            .map_err(|e| self.failed(ProvisionStep::CreateDisk(role), e))?;
        self.ledger.record_disk(role, disk.id);
        tracing::info!(node_id = %node, disk_id = %disk.id, size = spec.size, %role, "disk created");

        let api = self.api;
        let disk_id = disk.id;
        wait_until(
            &format!("disk '{}'", role.device()),
            &[DiskStatus::Ready],
            &self.options.disk_poll,
            self.reporter,
            || async move { api.get_disk(node, disk_id).await.map(|d| d.status) },
        )
        .await
        .map_err(|e| self.failed(ProvisionStep::WaitDisk(role), e))?;
        Ok(())
    }

    /// Disk ids as the provider lists them; must match this run's disks in order.
    async fn current_disks(
        &self,
        node: NodeId,
        step: ProvisionStep,
    ) -> Result<Vec<DiskId>, ProvisionError> {
        let listed: Vec<DiskId> = self
            .api
            .list_disks(node)
            .await
            .map_err(|e| self.failed(step, e))?
            .into_iter()
            .map(|d| d.id)
            .collect();
        verify_disk_list(&self.ledger.disk_ids(), &listed).map_err(|e| self.failed(step, e))?;
        Ok(listed)
    }

    /// Let the provider apply the new config profile.
    ///
    /// Config profiles have no status to poll, so this is a fixed delay and
    /// readiness is never confirmed. A `wait_until` on the profile belongs
    /// here if the API ever exposes one.
    async fn settle_config_profile(&self) {
        tracing::debug!(delay = ?self.options.profile_settle, "settling config profile");
        tokio::time::sleep(self.options.profile_settle).await;
    }

    fn failed(&self, step: ProvisionStep, err: impl Into<anyhow::Error>) -> ProvisionError {
        let source = err.into();
        tracing::error!(%step, ledger = %self.ledger, error = %source, "provisioning aborted");
        ProvisionError {
            step,
            ledger: self.ledger.clone(),
            source,
        }
    }
}
