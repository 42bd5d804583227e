//! Integration tests for ptero-ops
//!
//! These tests drive the HTTP gateway, the real HTTP control-plane client
//! against a local mock panel, and the compiled binary.

mod router_tests;
