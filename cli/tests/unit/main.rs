//! Unit tests for ptero-ops
//!
//! These tests use in-memory fakes for the control plane and the remote
//! shell and run fast without network I/O.

mod fleet_service;
