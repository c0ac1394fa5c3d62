//! Command implementations

pub mod create;
pub mod plan;
pub mod version;
