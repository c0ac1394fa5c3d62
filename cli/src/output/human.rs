//! Human-readable terminal renderer.

use crate::application::services::provision::{ProvisionError, ProvisioningResult};
use crate::domain::ProvisioningPlan;
use crate::domain::plan::{BOOT_KERNEL, DiskSpec};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the addresses of a Linode waiting in rescue mode.
    ///
    /// Printed even in quiet mode: the addresses are the point of the run.
    pub fn render_result(&self, result: &ProvisioningResult) {
        println!();
        for line in address_report(result) {
            println!("{line}");
        }
        if !self.ctx.quiet {
            println!();
            self.ctx.kv("Linode:", &format!("{} ({})", result.label, result.node_id));
            self.ctx.kv("Config profile:", &result.config_profile.to_string());
        }
    }

    /// Render a resolved plan and, when a capacity was given, its disks.
    pub fn render_plan(&self, plan: &ProvisioningPlan, layout: Option<&[DiskSpec]>) {
        self.ctx.header("Linode");
        self.ctx.kv("Type:  ", &plan.node_type);
        self.ctx.kv("Region:", &plan.region);
        self.ctx.kv("Label: ", &plan.node_label);
        self.ctx
            .kv("Group: ", plan.node_group.as_deref().unwrap_or("(none)"));
        self.ctx.header("Config profile");
        self.ctx.kv("Label: ", &plan.config_profile_label);
        self.ctx.kv("Kernel:", BOOT_KERNEL);
        self.ctx.kv("Helpers:", "all disabled");
        if let Some(layout) = layout {
            self.ctx.header("Disks");
            for disk in layout {
                self.ctx.kv(
                    &format!("{}:", disk.role.device()),
                    &format!("{}, {} MB, raw", disk.role, disk.size),
                );
            }
        } else {
            self.ctx
                .info("Pass --capacity <MB> to preview the disk layout.");
        }
    }

    /// Render a failed run: the step, and what was left on the account.
    pub fn render_failure(&self, failure: &ProvisionError) {
        self.ctx.error(&format!("Provisioning stopped while {}.", failure.step));
        if failure.ledger.is_empty() {
            self.ctx.error("No resources were created.");
            return;
        }
        self.ctx.error("These resources were left in place and must be removed by hand:");
        if let Some(node) = failure.ledger.node {
            self.ctx.error(&format!("  linode {node}"));
        }
        for (role, id) in &failure.ledger.disks {
            self.ctx.error(&format!("  disk {id} ({role})"));
        }
        if let Some(config) = failure.ledger.config_profile {
            self.ctx.error(&format!("  config profile {config}"));
        }
    }
}

/// The address block printed after a successful run.
#[must_use]
pub fn address_report(result: &ProvisioningResult) -> Vec<String> {
    let mut lines = vec!["Linode's IP addresses:".to_string()];
    lines.extend(result.ipv4.iter().map(|address| format!("IPv4 -> {address}")));
    lines.push(format!(
        "IPv6 -> {}",
        result.ipv6.as_deref().unwrap_or("(not yet assigned)")
    ));
    lines
}
