//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: control-plane HTTP calls,
//! SSH sessions, environment and file configuration.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands`, `crate::server` or `crate::output` are
//! forbidden.

pub mod config;
pub mod control_plane;
pub mod progress;
pub mod ssh;
