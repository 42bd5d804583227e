//! Tests for the fleet application service, driven through `execute` with an
//! in-memory control plane.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ptero_common::{FleetRequest, RuntimeState};
use ptero_ops::application::services::fleet::prune::OWNER_TOKEN_REQUIRED;
use ptero_ops::application::services::fleet::wipe::{INVALID_CONFIRM, WIPE_MESSAGE};
use ptero_ops::application::services::fleet::{FleetOutcome, execute};
use ptero_ops::domain::credentials::MISSING_CREDENTIALS;
use ptero_ops::domain::{FleetPolicy, OpsError};
use serde_json::{Value, json};

use crate::helpers::{FakeConnector, FakePanel, HOST, admin_only_request, request};

async fn run(panel: &FakePanel, req: &FleetRequest) -> Result<FleetOutcome, OpsError> {
    run_with(panel, req, &FleetPolicy::default()).await
}

async fn run_with(
    panel: &FakePanel,
    req: &FleetRequest,
    policy: &FleetPolicy,
) -> Result<FleetOutcome, OpsError> {
    let connector = FakeConnector {
        panel: panel.clone(),
    };
    execute(&connector, req, policy).await
}

fn to_json(outcome: &FleetOutcome) -> Value {
    serde_json::to_value(outcome).unwrap()
}

// ── Request validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_host_is_auth_error_before_any_call() {
    let panel = FakePanel::new();
    let req = FleetRequest {
        host: None,
        ..request("get_stats", Value::Null)
    };

    let err = run(&panel, &req).await.unwrap_err();

    assert_eq!(err, OpsError::Auth(MISSING_CREDENTIALS.into()));
    assert_eq!(panel.connects(), 0);
    assert!(panel.calls().is_empty());
}

#[tokio::test]
async fn test_credentials_are_checked_before_action_name() {
    let panel = FakePanel::new();
    let req = FleetRequest {
        ptla: Some("   ".into()),
        ..request("reboot_everything", Value::Null)
    };

    let err = run(&panel, &req).await.unwrap_err();

    assert!(matches!(err, OpsError::Auth(_)));
}

#[tokio::test]
async fn test_unknown_action_is_rejected_without_calls() {
    let panel = FakePanel::new();

    let err = run(&panel, &request("reboot_everything", Value::Null))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Action unknown: reboot_everything");
    assert!(matches!(err, OpsError::UnknownAction(_)));
    assert_eq!(panel.connects(), 0);
}

#[tokio::test]
async fn test_malformed_payload_is_validation_error() {
    let panel = FakePanel::new().with_user(1, "admin", true);

    let err = run(&panel, &request("delete_user", json!("not-an-object")))
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::Validation(_)));
    assert!(panel.mutations().is_empty());
}

// ── Inventory ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_connection_performs_exactly_one_read() {
    let panel = FakePanel::new().with_user(1, "admin", true);

    let outcome = run(&panel, &admin_only_request("check_connection", Value::Null))
        .await
        .unwrap();

    assert_eq!(
        to_json(&outcome),
        json!({"status": "connected", "msg": format!("Connected to {HOST}")})
    );
    assert_eq!(panel.calls(), ["list_users"]);
}

#[tokio::test]
async fn test_get_stats_returns_users_and_servers_verbatim() {
    let panel = FakePanel::new()
        .with_user(1, "admin", true)
        .with_user(2, "alice", false)
        .with_server(10, "u-10", Some(RuntimeState::Running));

    let out = to_json(&run(&panel, &admin_only_request("get_stats", Value::Null)).await.unwrap());

    assert_eq!(out["users"].as_array().unwrap().len(), 2);
    assert_eq!(out["users"][1]["object"], "user");
    assert_eq!(out["users"][1]["attributes"]["username"], "alice");
    assert_eq!(out["servers"][0]["attributes"]["uuid"], "u-10");
    assert!(panel.mutations().is_empty());
}

#[tokio::test]
async fn test_get_stats_full_annotates_every_server_and_survives_one_failure() {
    let panel = FakePanel::new()
        .with_user(1, "admin", true)
        .with_server(10, "u-10", Some(RuntimeState::Running))
        .with_server(11, "u-11", Some(RuntimeState::Offline))
        .with_server(12, "u-12", None);

    let out = to_json(&run(&panel, &request("get_stats_full", Value::Null)).await.unwrap());

    let servers = out["servers"].as_array().unwrap();
    assert_eq!(servers.len(), 3);
    let states: Vec<&str> = servers
        .iter()
        .map(|s| s["runtime_state"].as_str().unwrap())
        .collect();
    assert_eq!(states, ["running", "offline", "error"]);
    assert_eq!(servers[0]["attributes"]["id"], 10);
    assert_eq!(out["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_stats_full_without_owner_token_reports_unknown() {
    let panel = FakePanel::new().with_server(10, "u-10", Some(RuntimeState::Running));

    let out = to_json(
        &run(&panel, &admin_only_request("get_stats_full", Value::Null))
            .await
            .unwrap(),
    );

    assert_eq!(out["servers"][0]["runtime_state"], "unknown");
    assert!(!panel.calls().iter().any(|c| c.starts_with("server_state")));
}

// ── Creation ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_user_then_get_stats_lists_user_and_server() {
    let panel = FakePanel::new().with_user(1, "admin", true);

    let created = run(
        &panel,
        &admin_only_request("create_user", json!({"username": "bob"})),
    )
    .await
    .unwrap();
    let FleetOutcome::Deployed(report) = created else {
        panic!("expected deploy report");
    };
    assert_eq!(report.user.attributes.username, "bob");
    assert_eq!(report.server.attributes.name, "bob-server");
    assert_eq!(report.server.attributes.owner_user_id, report.user.attributes.id);

    let out = to_json(&run(&panel, &admin_only_request("get_stats", Value::Null)).await.unwrap());
    let usernames: Vec<&str> = out["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["attributes"]["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"bob"));
    assert_eq!(out["servers"][0]["attributes"]["name"], "bob-server");
}

#[tokio::test]
async fn test_auto_deploy_generates_identity() {
    let panel = FakePanel::new();

    let out = to_json(
        &run(&panel, &admin_only_request("auto_deploy", Value::Null))
            .await
            .unwrap(),
    );

    let username = out["user"]["attributes"]["username"].as_str().unwrap();
    assert!(username.starts_with("user-"));
    assert_eq!(username.len(), "user-".len() + 8);
    assert_eq!(out["user"]["attributes"]["email"], format!("{username}@example.com"));
    assert_eq!(out["server"]["attributes"]["name"], format!("{username}-server"));
}

#[tokio::test]
async fn test_auto_deploy_server_failure_reports_orphaned_user() {
    let panel = FakePanel::new().failing_create_server();

    let err = run(&panel, &admin_only_request("auto_deploy", Value::Null))
        .await
        .unwrap_err();

    let OpsError::Upstream {
        message,
        status,
        detail,
    } = &err
    else {
        panic!("expected upstream error, got {err:?}");
    };
    assert_eq!(message, "Request failed with status code 422");
    assert_eq!(*status, Some(422));
    let detail = detail.as_ref().unwrap();
    assert_eq!(detail["stage"], "create_server");
    assert_eq!(detail["rolledBack"], false);
    assert_eq!(
        detail["upstream"],
        json!({"errors": [{"code": "ValidationException"}]})
    );

    let orphan = detail["orphanedUserId"].as_u64().unwrap();
    assert_eq!(panel.user_ids(), [orphan]);
    assert!(panel.server_ids().is_empty());
}

#[tokio::test]
async fn test_auto_deploy_rollback_removes_orphaned_user() {
    let panel = FakePanel::new().failing_create_server();
    let policy = FleetPolicy {
        rollback_orphaned_users: true,
        ..FleetPolicy::default()
    };

    let err = run_with(&panel, &admin_only_request("auto_deploy", Value::Null), &policy)
        .await
        .unwrap_err();

    assert_eq!(err.detail().unwrap()["rolledBack"], true);
    assert!(panel.user_ids().is_empty());
    assert!(panel.calls().iter().any(|c| c.starts_with("delete_user:")));
}

#[tokio::test]
async fn test_create_server_requires_name_and_owner() {
    let panel = FakePanel::new().with_user(3, "carol", false);

    let err = run(&panel, &admin_only_request("create_server", json!({"userId": 3})))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let out = to_json(
        &run(
            &panel,
            &admin_only_request("create_server", json!({"name": "mc", "userId": "3"})),
        )
        .await
        .unwrap(),
    );
    assert_eq!(out["attributes"]["name"], "mc");
    assert_eq!(out["attributes"]["user"], 3);
}

// ── Deletion ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_delete_round_trip_leaves_no_trace() {
    let panel = FakePanel::new().with_user(1, "admin", true);

    let out = to_json(
        &run(&panel, &admin_only_request("create_user", json!({"username": "frank"})))
            .await
            .unwrap(),
    );
    let user_id = out["user"]["attributes"]["id"].clone();
    let server_id = out["server"]["attributes"]["id"].clone();

    run(&panel, &admin_only_request("delete_server", json!({"id": server_id})))
        .await
        .unwrap();
    run(&panel, &admin_only_request("delete_user", json!({"id": user_id})))
        .await
        .unwrap();

    let stats = to_json(&run(&panel, &admin_only_request("get_stats", Value::Null)).await.unwrap());
    assert_eq!(stats["users"].as_array().unwrap().len(), 1);
    assert_eq!(stats["users"][0]["attributes"]["username"], "admin");
    assert_eq!(stats["servers"], json!([]));
}

#[tokio::test]
async fn test_delete_server_acknowledges_and_removes() {
    let panel = FakePanel::new().with_server(10, "u-10", None);

    let out = to_json(
        &run(&panel, &admin_only_request("delete_server", json!({"id": 10})))
            .await
            .unwrap(),
    );

    assert_eq!(out, json!({"success": true}));
    assert!(panel.server_ids().is_empty());
}

#[tokio::test]
async fn test_delete_user_missing_id_is_validation_error() {
    let panel = FakePanel::new().with_user(2, "alice", false);

    let err = run(&panel, &admin_only_request("delete_user", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::Validation(_)));
    assert!(panel.mutations().is_empty());
}

#[tokio::test]
async fn test_delete_user_upstream_failure_propagates_status() {
    let panel = FakePanel::new();

    let err = run(&panel, &admin_only_request("delete_user", json!({"id": 99})))
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::Upstream { status: Some(404), .. }));
}

// ── Prune ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_offline_deletes_offline_and_unreachable_keeps_running() {
    let panel = FakePanel::new()
        .with_server(1, "x", Some(RuntimeState::Offline))
        .with_server(2, "y", None)
        .with_server(3, "z", Some(RuntimeState::Running));

    let out = to_json(&run(&panel, &request("delete_offline", Value::Null)).await.unwrap());

    assert_eq!(out["msg"], "Scanned 3 servers, deleted 2 offline.");
    assert_eq!(out["deletedCount"], 2);
    assert_eq!(out["batch"]["succeeded"], 2);
    assert_eq!(out["batch"]["attempted"], 2);
    assert_eq!(panel.server_ids(), [3]);
    assert_eq!(panel.mutations(), ["delete_server:1", "delete_server:2"]);
}

#[tokio::test]
async fn test_delete_offline_can_keep_unreachable_servers() {
    let panel = FakePanel::new()
        .with_server(1, "x", Some(RuntimeState::Offline))
        .with_server(2, "y", None);
    let policy = FleetPolicy {
        treat_unknown_as_offline: false,
        ..FleetPolicy::default()
    };

    let out = to_json(
        &run_with(&panel, &request("delete_offline", Value::Null), &policy)
            .await
            .unwrap(),
    );

    assert_eq!(out["deletedCount"], 1);
    assert_eq!(out["unreachableKept"], 1);
    assert_eq!(panel.server_ids(), [2]);
}

#[tokio::test]
async fn test_delete_offline_respects_scan_limit() {
    let mut panel = FakePanel::new();
    for id in 1..=20 {
        panel = panel.with_server(id, &format!("u-{id}"), Some(RuntimeState::Offline));
    }

    let out = to_json(&run(&panel, &request("delete_offline", Value::Null)).await.unwrap());

    assert_eq!(out["scanned"], 15);
    assert_eq!(out["deletedCount"], 15);
    assert_eq!(panel.server_ids(), [16, 17, 18, 19, 20]);
}

#[tokio::test]
async fn test_delete_offline_records_failed_deletes_and_continues() {
    let panel = FakePanel::new()
        .with_server(1, "x", Some(RuntimeState::Offline))
        .with_server(2, "y", Some(RuntimeState::Offline))
        .failing_delete_server(1);

    let out = to_json(&run(&panel, &request("delete_offline", Value::Null)).await.unwrap());

    assert_eq!(out["deletedCount"], 1);
    assert_eq!(out["batch"]["errors"][0]["entityId"], 1);
    assert_eq!(panel.server_ids(), [1]);
}

#[tokio::test]
async fn test_delete_offline_requires_owner_token() {
    let panel = FakePanel::new().with_server(1, "x", Some(RuntimeState::Offline));

    let err = run(&panel, &admin_only_request("delete_offline", Value::Null))
        .await
        .unwrap_err();

    assert_eq!(err, OpsError::Validation(OWNER_TOKEN_REQUIRED.into()));
    assert!(panel.calls().is_empty());
}

// ── Wipe ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nuke_all_wrong_confirm_makes_zero_calls() {
    let panel = FakePanel::new()
        .with_user(1, "admin", true)
        .with_server(10, "u-10", None);

    for payload in [Value::Null, json!({"confirm": "confirm"}), json!({"confirm": "YES"})] {
        let err = run(&panel, &admin_only_request("nuke_all", payload))
            .await
            .unwrap_err();
        assert_eq!(err, OpsError::Validation(INVALID_CONFIRM.into()));
    }
    assert!(panel.calls().is_empty());
}

#[tokio::test]
async fn test_nuke_all_deletes_servers_then_non_admin_users() {
    let panel = FakePanel::new()
        .with_user(1, "admin", true)
        .with_user(2, "alice", false)
        .with_user(3, "bob", false)
        .with_server(10, "u-10", None)
        .with_server(11, "u-11", None)
        .failing_delete_server(11);

    let out = to_json(
        &run(&panel, &admin_only_request("nuke_all", json!({"confirm": "CONFIRM"})))
            .await
            .unwrap(),
    );

    assert_eq!(out["msg"], WIPE_MESSAGE);
    assert_eq!(out["servers"]["succeeded"], 1);
    assert_eq!(out["servers"]["errors"][0]["entityId"], 11);
    assert_eq!(out["users"]["succeeded"], 2);
    assert_eq!(out["skippedAdmins"], 1);
    assert_eq!(panel.user_ids(), [1]);
    assert_eq!(
        panel.mutations(),
        [
            "delete_server:10",
            "delete_server:11",
            "delete_user:2",
            "delete_user:3"
        ]
    );
}
