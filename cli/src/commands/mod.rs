//! Command implementations

pub mod fleet;
pub mod plan;
pub mod provision;
pub mod serve;
pub mod version;
