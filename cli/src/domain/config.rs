//! Domain types and validators for the provisioning configuration.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::plan::ProvisioningPlan;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_NODE_TYPE: &str = "g6-nanode-1";
pub const DEFAULT_REGION: &str = "us-east";

pub const KEY_API_TOKEN: &str = "api-token";
pub const KEY_CONFIG_PROFILE_LABEL: &str = "linode.config_profile.label";

// ── Config schema ────────────────────────────────────────────────────────────

/// The configuration file as written by the user (`config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    #[serde(rename = "api-token")]
    pub api_token: Option<String>,
    pub linode: LinodeConfig,
}

/// The `linode:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinodeConfig {
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub region: Option<String>,
    pub label: Option<String>,
    pub group: Option<String>,
    pub config_profile: ConfigProfileConfig,
}

/// The `linode.config_profile:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigProfileConfig {
    pub label: Option<String>,
}

// ── Resolved config ──────────────────────────────────────────────────────────

/// Personal access token for the Linode API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Validated configuration: everything needed before the first API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub plan: ProvisioningPlan,
}

/// Resolve defaults and check required settings.
///
/// `token_override` (from `--token` / `LINODE_TOKEN`) wins over `api-token`.
/// The default label is the Unix timestamp of `now`.
///
/// # Errors
///
/// Returns `ConfigError::MissingKey` when the API token or the config
/// profile label is missing or blank.
pub fn resolve(
    raw: RawConfig,
    token_override: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ResolvedConfig, ConfigError> {
    let token = non_blank(token_override.map(str::to_string))
        .or_else(|| non_blank(raw.api_token))
        .ok_or(ConfigError::MissingKey { key: KEY_API_TOKEN })?;

    let linode = raw.linode;
    let config_profile_label =
        non_blank(linode.config_profile.label).ok_or(ConfigError::MissingKey {
            key: KEY_CONFIG_PROFILE_LABEL,
        })?;

    let plan = ProvisioningPlan {
        node_type: non_blank(linode.node_type).unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
        region: non_blank(linode.region).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        node_label: non_blank(linode.label).unwrap_or_else(|| now.timestamp().to_string()),
        node_group: non_blank(linode.group),
        config_profile_label,
    };

    Ok(ResolvedConfig {
        credentials: Credentials::new(token),
        plan,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
