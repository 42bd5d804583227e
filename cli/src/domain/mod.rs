//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod credentials;
pub mod error;
pub mod fleet;
pub mod install_plan;
pub mod target;

pub use config::{InstallKey, OpsConfig};
pub use credentials::Credentials;
pub use error::{ConfigError, OpsError, OpsResult, PlanError};
pub use fleet::{FleetAction, FleetPolicy, NewServer, NewUser, ServerTemplate};
pub use install_plan::{InstallPlan, InstallProfile, RenderedPlan};
pub use target::RemoteTarget;
