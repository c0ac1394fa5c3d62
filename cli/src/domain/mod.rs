//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod ledger;
pub mod linode;
pub mod plan;

pub use config::{Credentials, RawConfig, ResolvedConfig};
pub use error::{ConfigError, LayoutError};
pub use ledger::ResourceLedger;
pub use linode::{
    ConfigProfile, ConfigProfileId, ConfigProfileRequest, DeviceMap, Disk, DiskId, DiskRequest,
    DiskStatus, Filesystem, Helpers, Node, NodeId, NodeRequest, NodeStatus, NodeType,
};
pub use plan::{DiskRole, DiskSpec, ProvisioningPlan};
