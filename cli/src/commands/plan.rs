//! `linode-prep plan`: resolve the configuration without touching the provider.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::config_service::load_plan;
use crate::domain::plan::disk_layout;
use crate::output::json;

/// Arguments for the plan command.
#[derive(Args, Default)]
pub struct PlanArgs {
    /// Linode API token (overrides `api-token` in the config file)
    #[arg(long, env = "LINODE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Preview the disk layout for this Linode disk capacity, in MB
    #[arg(long, value_name = "MB")]
    pub capacity: Option<u64>,
}

/// Run `linode-prep plan`.
///
/// # Errors
///
/// Returns an error if the configuration is unreadable or incomplete, or if
/// `--capacity` is too small for the fixed disks.
pub fn run(args: &PlanArgs, app: &AppContext) -> Result<()> {
    let resolved = load_plan(&app.config, args.token.as_deref(), Utc::now())?;
    let plan = &resolved.plan;
    let layout = args
        .capacity
        .map(|capacity| disk_layout(&plan.node_type, capacity))
        .transpose()?;

    if app.is_json() {
        println!("{}", json::format_plan(plan, layout.as_ref().map(|l| &l[..]))?);
    } else {
        app.renderer().render_plan(plan, layout.as_ref().map(|l| &l[..]));
    }
    Ok(())
}
