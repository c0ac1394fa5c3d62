//! `linode-prep create`: provision a Linode and boot it into rescue mode.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ComputeService, ConfigStore, ProgressReporter};
use crate::application::services::config_service::load_plan;
use crate::application::services::poll::PollPolicy;
use crate::application::services::provision::{
    DEFAULT_PROFILE_SETTLE, ProvisionOptions, ProvisioningResult, provision,
};
use crate::domain::Credentials;
use crate::infra::linode::{DEFAULT_API_URL, LinodeClient};
use crate::output::json;

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Linode API token (overrides `api-token` in the config file)
    #[arg(long, env = "LINODE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Linode API base URL
    #[arg(long, env = "LINODE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Give up waiting on a Linode or disk after this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Give up waiting on a Linode or disk after this many status checks
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Pause after creating the config profile, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_PROFILE_SETTLE.as_secs())]
    pub settle: u64,
}

impl CreateArgs {
    /// Poll ceilings and delays for this run.
    #[must_use]
    pub fn options(&self) -> ProvisionOptions {
        let poll = PollPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_max_wait(self.max_wait.map(Duration::from_secs));
        ProvisionOptions {
            node_poll: poll,
            disk_poll: poll,
            profile_settle: Duration::from_secs(self.settle),
        }
    }
}

/// Run `linode-prep create`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any provisioning step
/// fails. A provisioning failure is a `ProvisionError` carrying the
/// resources left on the account.
pub async fn run(args: &CreateArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    let result = execute(
        &app.config,
        |credentials| LinodeClient::new(credentials.clone(), &args.api_url),
        args.token.as_deref(),
        &args.options(),
        &reporter,
    )
    .await?;

    if app.is_json() {
        println!("{}", json::format_result(&result)?);
    } else {
        app.renderer().render_result(&result);
    }
    Ok(())
}

/// Load the plan, connect, and provision.
///
/// The configuration is fully resolved before `connect` is called, so an
/// invalid file never reaches the provider.
///
/// # Errors
///
/// Returns the first configuration, connection or provisioning error.
pub async fn execute<A, F>(
    store: &impl ConfigStore,
    connect: F,
    token_override: Option<&str>,
    options: &ProvisionOptions,
    reporter: &impl ProgressReporter,
) -> Result<ProvisioningResult>
where
    A: ComputeService,
    F: FnOnce(&Credentials) -> Result<A>,
{
    let resolved = load_plan(store, token_override, Utc::now())?;
    let api = connect(&resolved.credentials)?;
    let result = provision(&api, &resolved.plan, options, reporter).await?;
    Ok(result)
}
