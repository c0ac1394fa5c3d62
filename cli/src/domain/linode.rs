//! Linode resource types as observed through the provider API.
//!
//! Pure data: no I/O, no async. The same types are (de)serialized by the
//! HTTP adapter, so field names follow the Linode v4 API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::LayoutError;

// ── Identifiers ──────────────────────────────────────────────────────────────

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Linode instance id.
    NodeId
);
numeric_id!(
    /// Disk id, unique across the account.
    DiskId
);
numeric_id!(
    /// Configuration profile id.
    ConfigProfileId
);

// ── Statuses ─────────────────────────────────────────────────────────────────

/// Linode instance status.
///
/// The provider's vocabulary is open-ended; only `running` and `offline` are
/// treated as stable; anything unrecognised is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeStatus {
    Running,
    Offline,
    Booting,
    Rebooting,
    ShuttingDown,
    Provisioning,
    Other(String),
}

impl NodeStatus {
    /// Statuses that allow disks and configs to be attached.
    pub const STABLE: [NodeStatus; 2] = [NodeStatus::Offline, NodeStatus::Running];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Offline => "offline",
            Self::Booting => "booting",
            Self::Rebooting => "rebooting",
            Self::ShuttingDown => "shutting_down",
            Self::Provisioning => "provisioning",
            Self::Other(s) => s,
        }
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        Self::STABLE.contains(self)
    }
}

impl From<String> for NodeStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "running" => Self::Running,
            "offline" => Self::Offline,
            "booting" => Self::Booting,
            "rebooting" => Self::Rebooting,
            "shutting_down" => Self::ShuttingDown,
            "provisioning" => Self::Provisioning,
            _ => Self::Other(s),
        }
    }
}

impl From<NodeStatus> for String {
    fn from(s: NodeStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disk status. `ready` is the only terminal state this tool waits for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiskStatus {
    Ready,
    NotReady,
    Deleting,
    Other(String),
}

impl DiskStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::NotReady => "not ready",
            Self::Deleting => "deleting",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DiskStatus {
    fn from(s: String) -> Self {
        // Exact match: "not ready" must never count as "ready".
        match s.as_str() {
            "ready" => Self::Ready,
            "not ready" => Self::NotReady,
            "deleting" => Self::Deleting,
            _ => Self::Other(s),
        }
    }
}

impl From<DiskStatus> for String {
    fn from(s: DiskStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Entities ─────────────────────────────────────────────────────────────────

/// A Linode instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub status: NodeStatus,
    pub specs: NodeSpecs,
    #[serde(default)]
    pub ipv4: Vec<String>,
    /// SLAAC address, assigned by the provider some time after creation.
    #[serde(default)]
    pub ipv6: Option<String>,
}

/// Hardware allocation of a Linode instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpecs {
    /// Total disk capacity in MB.
    pub disk: u64,
}

/// A Linode type (plan), e.g. `g6-nanode-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: String,
    /// Disk capacity in MB.
    pub disk: u64,
}

/// A disk attached to a Linode instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: DiskId,
    pub label: String,
    pub status: DiskStatus,
    /// Size in MB.
    pub size: u64,
    pub filesystem: Filesystem,
}

/// A configuration profile (boot settings) of a Linode instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProfile {
    pub id: ConfigProfileId,
    pub label: String,
}

/// Disk filesystem. Only `raw` is created by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filesystem {
    Raw,
    Swap,
    Ext3,
    Ext4,
    Initrd,
}

// ── Requests ─────────────────────────────────────────────────────────────────

/// Body of an instance creation request. No image is given, so the Linode
/// is created empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRequest<'a> {
    #[serde(rename = "type")]
    pub node_type: &'a str,
    pub region: &'a str,
    pub label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'a str>,
}

/// Body of a disk creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskRequest<'a> {
    pub size: u64,
    pub label: &'a str,
    pub filesystem: Filesystem,
}

/// Body of a configuration profile creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigProfileRequest<'a> {
    pub kernel: &'a str,
    pub label: &'a str,
    pub devices: DeviceMap,
    pub helpers: Helpers,
}

/// Boot helpers applied by the provider when a config profile boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Helpers {
    pub distro: bool,
    pub modules_dep: bool,
    pub network: bool,
    pub devtmpfs_automount: bool,
    /// Inverted on the wire: `true` turns the updatedb helper off.
    pub updatedb_disabled: bool,
}

impl Helpers {
    /// Every helper switched off: the encrypted installer owns the boot chain.
    #[must_use]
    pub const fn all_disabled() -> Self {
        Self {
            distro: false,
            modules_dep: false,
            network: false,
            devtmpfs_automount: false,
            updatedb_disabled: true,
        }
    }

    /// Returns `true` when no helper would run at boot.
    #[must_use]
    pub const fn none_enabled(&self) -> bool {
        !self.distro
            && !self.modules_dep
            && !self.network
            && !self.devtmpfs_automount
            && self.updatedb_disabled
    }
}

// ── Device slots ─────────────────────────────────────────────────────────────

/// Block device slots in the order the provider exposes them to the guest.
pub const DEVICE_SLOTS: [&str; 7] = ["sda", "sdb", "sdc", "sdd", "sde", "sdf", "sdg"];

/// One populated device slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSlot {
    pub disk_id: DiskId,
}

/// Disks assigned to device slots, `sda` first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMap(BTreeMap<String, DeviceSlot>);

impl DeviceMap {
    /// Assign `disks` to consecutive slots starting at `sda`.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::TooManyDevices` if there are more disks than slots.
    pub fn from_disks(disks: &[DiskId]) -> Result<Self, LayoutError> {
        if disks.len() > DEVICE_SLOTS.len() {
            return Err(LayoutError::TooManyDevices {
                count: disks.len(),
                slots: DEVICE_SLOTS.len(),
            });
        }
        Ok(Self(
            DEVICE_SLOTS
                .iter()
                .zip(disks)
                .map(|(slot, id)| ((*slot).to_string(), DeviceSlot { disk_id: *id }))
                .collect(),
        ))
    }

    /// Disk ids in slot order.
    #[must_use]
    pub fn disk_ids(&self) -> Vec<DiskId> {
        // BTreeMap order matches slot order for sda..sdg.
        self.0.values().map(|slot| slot.disk_id).collect()
    }

    #[must_use]
    pub fn get(&self, slot: &str) -> Option<DiskId> {
        self.0.get(slot).map(|s| s.disk_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
