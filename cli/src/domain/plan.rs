//! The provisioning plan and the fixed disk layout.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::fmt;

use serde::Serialize;

use crate::domain::error::{ConfigError, LayoutError};
use crate::domain::linode::{DiskId, Filesystem};

// ── Constants ────────────────────────────────────────────────────────────────

/// Kernel the config profile boots: GRUB 2 from the system disk.
pub const BOOT_KERNEL: &str = "linode/grub2";

/// Size of the boot and swap disks, in MB.
pub const AUX_DISK_SIZE: u64 = 256;

/// Capacity reserved for the boot and swap disks, in MB.
pub const RESERVED_CAPACITY: u64 = 2 * AUX_DISK_SIZE;

// ── Plan ─────────────────────────────────────────────────────────────────────

/// Everything one provisioning run needs, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningPlan {
    pub node_type: String,
    pub region: String,
    pub node_label: String,
    /// Display group; `None` when not configured.
    pub node_group: Option<String>,
    /// Never empty.
    pub config_profile_label: String,
}

// ── Disk layout ──────────────────────────────────────────────────────────────

/// The role of each disk created on the Linode, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiskRole {
    Boot,
    Swap,
    System,
}

impl DiskRole {
    /// All roles, in the order the disks are created and attached.
    pub const ORDER: [DiskRole; 3] = [DiskRole::Boot, DiskRole::Swap, DiskRole::System];

    /// Disk label sent to the provider.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boot => "Boot",
            Self::Swap => "Swap",
            Self::System => "System",
        }
    }

    /// Device slot the disk ends up in.
    #[must_use]
    pub const fn device(self) -> &'static str {
        match self {
            Self::Boot => "sda",
            Self::Swap => "sdb",
            Self::System => "sdc",
        }
    }
}

impl fmt::Display for DiskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Size and format of one disk to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiskSpec {
    pub role: DiskRole,
    /// Size in MB.
    pub size: u64,
    pub filesystem: Filesystem,
}

/// Size of the system disk for a Linode with `capacity` MB of disk.
///
/// # Errors
///
/// Returns `ConfigError::InsufficientCapacity` when `capacity` does not
/// exceed the space reserved for the boot and swap disks.
pub fn system_disk_size(node_type: &str, capacity: u64) -> Result<u64, ConfigError> {
    match capacity.checked_sub(RESERVED_CAPACITY) {
        Some(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InsufficientCapacity {
            node_type: node_type.to_string(),
            capacity,
            reserved: RESERVED_CAPACITY,
        }),
    }
}

/// The three disks for a Linode with `capacity` MB of disk, in creation order.
///
/// # Errors
///
/// Returns `ConfigError::InsufficientCapacity` when the system disk would be empty.
pub fn disk_layout(node_type: &str, capacity: u64) -> Result<[DiskSpec; 3], ConfigError> {
    let system = system_disk_size(node_type, capacity)?;
    Ok(DiskRole::ORDER.map(|role| DiskSpec {
        role,
        size: match role {
            DiskRole::Boot | DiskRole::Swap => AUX_DISK_SIZE,
            DiskRole::System => system,
        },
        filesystem: Filesystem::Raw,
    }))
}

/// Check the provider's disk list against the disks this run created.
///
/// The list must hold exactly the created disks, in creation order: the
/// device slots are assigned from it, so Boot has to come back first.
///
/// # Errors
///
/// Returns `LayoutError::UnexpectedDisks` if a disk is missing, extra, or
/// out of order.
pub fn verify_disk_list(created: &[DiskId], listed: &[DiskId]) -> Result<(), LayoutError> {
    if created == listed {
        Ok(())
    } else {
        Err(LayoutError::UnexpectedDisks {
            expected: created.to_vec(),
            found: listed.to_vec(),
        })
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
