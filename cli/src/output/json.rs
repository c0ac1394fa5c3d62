//! JSON output helpers for `--json` mode.

use anyhow::{Context, Result};

use crate::application::services::provision::{ProvisionError, ProvisioningResult};
use crate::domain::ProvisioningPlan;
use crate::domain::plan::DiskSpec;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "...",
///   "step": "...",
///   "allocated": { ... }
/// }
/// ```
/// `step` and `allocated` are present only for provisioning failures.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(err: &anyhow::Error) -> Result<String> {
    let mut obj = serde_json::json!({
        "error": true,
        "message": format!("{err:#}"),
        "code": error_code(err),
    });
    if let Some(failure) = err.downcast_ref::<ProvisionError>() {
        obj["step"] = serde_json::Value::String(failure.step.to_string());
        obj["allocated"] =
            serde_json::to_value(&failure.ledger).context("JSON serialization failed")?;
    }
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for an error.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    use crate::application::services::poll::PollError;
    use crate::domain::ConfigError;

    if err.downcast_ref::<ConfigError>().is_some() {
        return "CONFIG_ERROR";
    }
    match err.downcast_ref::<ProvisionError>() {
        Some(failure) => match failure.source.downcast_ref::<PollError>() {
            Some(PollError::TimedOut { .. }) => "TIMEOUT",
            _ if failure.source.downcast_ref::<ConfigError>().is_some() => "CONFIG_ERROR",
            _ => "PROVISION_FAILED",
        },
        None => "ERROR",
    }
}

/// Format the result of a successful run.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_result(result: &ProvisioningResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("JSON serialization failed")
}

/// Format a resolved plan for `plan --json`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_plan(plan: &ProvisioningPlan, layout: Option<&[DiskSpec]>) -> Result<String> {
    let obj = serde_json::json!({
        "plan": plan,
        "disks": layout,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
