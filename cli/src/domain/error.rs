//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::linode::DiskId;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while turning the configuration file into a run plan.
///
/// Every variant is detected before a resource is created, except
/// `InsufficientCapacity` when the provider reports less disk on the created
/// Linode than its type advertised.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {key}\n\nAdd it to your config file and try again.")]
    MissingKey { key: &'static str },

    #[error(
        "Linode type '{node_type}' has {capacity} MB of disk, but the boot and swap disks \
         reserve {reserved} MB.\n\nChoose a larger type with linode.type."
    )]
    InsufficientCapacity {
        node_type: String,
        capacity: u64,
        reserved: u64,
    },
}

// ── Disk layout errors ────────────────────────────────────────────────────────

/// Errors raised when the provider's disk list does not match what the run created.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error(
        "provider lists disks [{}] but this run created [{}], in that order",
        join(found),
        join(expected)
    )]
    UnexpectedDisks {
        expected: Vec<DiskId>,
        found: Vec<DiskId>,
    },

    #[error("{count} disks do not fit in the {slots} available device slots")]
    TooManyDevices { count: usize, slots: usize },
}

fn join(ids: &[DiskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
