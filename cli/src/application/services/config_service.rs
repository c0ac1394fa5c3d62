//! Application service: configuration use-cases.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::application::ports::ConfigStore;
use crate::domain::config::{ResolvedConfig, resolve};

/// Load the configuration and resolve it into credentials and a plan.
///
/// Runs before any provider call: a missing setting never leaves resources
/// behind.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a required
/// setting is missing (`ConfigError`).
pub fn load_plan(
    store: &impl ConfigStore,
    token_override: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ResolvedConfig> {
    let raw = store.load()?;
    let resolved = resolve(raw, token_override, now)
        .with_context(|| format!("invalid configuration in {}", store.path().display()))?;
    tracing::debug!(plan = ?resolved.plan, "configuration resolved");
    Ok(resolved)
}
