#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use uibridge_core::error::Result;
use uibridge_core::protocol::request::PermissionResponse;
use uibridge_gateway::collab::PermissionStore;

use support::{assert_quiet, next_frame, Harness, PASSWORD};

/// Permission store whose listing hits a bug.
struct BrokenPermissions;

#[async_trait]
impl PermissionStore for BrokenPermissions {
    async fn list(&self) -> Result<Vec<Value>> {
        panic!("storage bug")
    }

    async fn respond(&self, _response: PermissionResponse) -> Result<()> {
        Ok(())
    }

    async fn revoke(&self, _origin: &str, _specific_accounts: Option<Vec<String>>) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn get_network_replies_with_active_env() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"1","payload":{"type":"get-network"}}"#).await;

    let frame = next_frame(&mut rx).await;
    assert_eq!(
        frame,
        json!({"id": "1", "payload": {"type": "set-network", "network": {"env": "mainnet"}}})
    );
}

#[tokio::test]
async fn set_network_then_get_network_round_trips_selection() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"set-network","network":{"env":"customRpc","customRpcUrl":"http://localhost:9000"}}}"#,
    )
    .await;
    assert_eq!(next_frame(&mut rx).await["payload"], json!({"type": "done"}));

    h.send(&conn, r#"{"id":"2","payload":{"type":"get-network"}}"#).await;
    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["payload"]["network"]["customRpcUrl"], "http://localhost:9000");
}

#[tokio::test]
async fn disconnect_app_revokes_origin_and_replies_done() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.permissions.insert_pending("p1", "https://dapp.example");

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"permission-response","id":"p1","accounts":["0xa"],"allowed":true,"responseDate":"2024-01-01T00:00:00Z"}}"#,
    )
    .await;
    // fire-and-forget: no reply
    assert!(rx.try_recv().is_err());
    assert_eq!(h.backend.permissions.get("p1").unwrap()["allowed"], true);

    h.send(
        &conn,
        r#"{"id":"7","payload":{"type":"disconnect-app","origin":"https://dapp.example"}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "7", "payload": {"type": "done"}})
    );
    assert!(!h.backend.permissions.has_origin("https://dapp.example"));
}

#[tokio::test]
async fn disconnect_app_with_empty_account_list_revokes_everything() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.permissions.insert_pending("p1", "https://x");
    h.backend.permissions.insert_pending("p2", "https://other.example");

    h.send(
        &conn,
        r#"{"id":"2","payload":{"type":"disconnect-app","origin":"https://x","specificAccounts":[]}}"#,
    )
    .await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "2", "payload": {"type": "done"}})
    );
    assert!(!h.backend.permissions.has_origin("https://x"));
    assert!(h.backend.permissions.has_origin("https://other.example"));
}

#[tokio::test]
async fn disconnect_app_with_specific_accounts_keeps_the_rest() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.permissions.insert_pending("p1", "https://x");

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"permission-response","id":"p1","accounts":["0xa","0xb"],"allowed":true,"responseDate":"2024-01-01T00:00:00Z"}}"#,
    )
    .await;
    h.send(
        &conn,
        r#"{"id":"2","payload":{"type":"disconnect-app","origin":"https://x","specificAccounts":["0xa"]}}"#,
    )
    .await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "2", "payload": {"type": "done"}})
    );
    assert_eq!(
        h.backend.permissions.get("p1").unwrap()["accounts"],
        json!(["0xb"])
    );
}

#[tokio::test]
async fn panicking_collaborator_still_gets_a_correlated_reply() {
    let h = Harness::with_collaborators(|c| c.permissions = Arc::new(BrokenPermissions));
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"1","payload":{"type":"get-permission-requests"}}"#)
        .await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "1", "payload": {
            "error": true,
            "code": -1,
            "message": "internal: handler panicked: storage bug"
        }})
    );
    assert_eq!(h.metrics.faults.get(&[("fault", "INTERNAL")]), 1);
    assert!(!conn.is_initialized());

    h.send(&conn, r#"{"id":"2","payload":{"type":"get-network"}}"#).await;
    assert_eq!(next_frame(&mut rx).await["id"], "2");
}

#[tokio::test]
async fn panic_inside_spawned_dispatch_is_contained() {
    let h = Arc::new(Harness::with_collaborators(|c| {
        c.permissions = Arc::new(BrokenPermissions)
    }));
    let (conn, mut rx) = h.connect("ui-1");

    let task = {
        let h = Arc::clone(&h);
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            h.send(&conn, r#"{"id":"7","payload":{"type":"get-permission-requests"}}"#)
                .await
        })
    };

    assert!(task.await.is_ok());
    assert_eq!(next_frame(&mut rx).await["id"], "7");
}

#[tokio::test]
async fn fire_and_forget_ack_is_configurable() {
    let h = Harness::with_ack(true);
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.transactions.insert_pending("tx1", "https://dapp.example");

    h.send(
        &conn,
        r#"{"id":"3","payload":{"type":"transaction-request-response","txID":"tx1","approved":false}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "3", "payload": {"type": "done"}})
    );
    assert_eq!(h.backend.transactions.decision("tx1"), Some(false));
}

#[tokio::test]
async fn unknown_payload_becomes_unhandled_error() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"9","payload":{"type":"frobnicate"}}"#).await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "9", "payload": {
            "error": true,
            "code": -1,
            "message": "Unhandled message 9. (\"frobnicate\")"
        }})
    );
    assert_eq!(h.metrics.faults.get(&[("fault", "UNHANDLED")]), 1);
}

#[tokio::test]
async fn unknown_entity_type_fails_without_partial_data() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.entities.add_account(json!({"id": "a1"})).await;

    h.send(
        &conn,
        r#"{"id":"4","payload":{"type":"method-payload","method":"getStoredEntities","args":{"type":"wallets"}}}"#,
    )
    .await;

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["id"], "4");
    assert_eq!(
        frame["payload"],
        json!({"error": true, "code": -1, "message": "Unknown entity type wallets"})
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stored_entities_echo_the_requested_type() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend
        .entities
        .add_account_source(json!({"id": "s1", "isLocked": false}))
        .await;

    h.send(
        &conn,
        r#"{"id":"5","payload":{"type":"method-payload","method":"getStoredEntities","args":{"type":"accountSources"}}}"#,
    )
    .await;

    assert_eq!(
        next_frame(&mut rx).await["payload"],
        json!({
            "type": "method-payload",
            "method": "storedEntitiesResponse",
            "args": {"type": "accountSources", "entities": [{"id": "s1", "isLocked": false}]}
        })
    );
}

#[tokio::test]
async fn failed_migration_leaves_connection_usable() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(
        &conn,
        r#"{"id":"10","payload":{"type":"method-payload","method":"doStorageMigration","args":{"password":"nope"}}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "10", "payload": {"error": true, "code": -1, "message": "Wrong password"}})
    );

    h.send(
        &conn,
        r#"{"id":"11","payload":{"type":"method-payload","method":"getStorageMigrationStatus"}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await["payload"],
        json!({"type": "method-payload", "method": "storageMigrationStatus", "args": {"status": "required"}})
    );

    let ok = format!(
        r#"{{"id":"12","payload":{{"type":"method-payload","method":"doStorageMigration","args":{{"password":"{PASSWORD}"}}}}}}"#
    );
    h.send(&conn, &ok).await;
    assert_eq!(next_frame(&mut rx).await["payload"], json!({"type": "done"}));
}

#[tokio::test]
async fn invalid_payload_of_known_kind_is_reported() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"13","payload":{"type":"set-network"}}"#).await;

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["payload"]["error"], true);
    assert_eq!(frame["payload"]["code"], -1);
    let msg = frame["payload"]["message"].as_str().unwrap();
    assert!(msg.starts_with("invalid set-network payload"), "{msg}");
}

#[tokio::test]
async fn keyring_returns_value_or_done() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"1","payload":{"type":"keyring","method":"isLocked"}}"#).await;
    assert_eq!(
        next_frame(&mut rx).await["payload"],
        json!({"type": "keyring", "method": "isLocked", "return": true})
    );

    let unlock = format!(
        r#"{{"id":"2","payload":{{"type":"keyring","method":"unlock","args":{{"password":"{PASSWORD}"}}}}}}"#
    );
    h.send(&conn, &unlock).await;
    assert_eq!(next_frame(&mut rx).await["payload"], json!({"type": "done"}));
}

#[tokio::test]
async fn features_are_refreshed_before_reply() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"id":"1","payload":{"type":"get-features"}}"#).await;

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["payload"]["type"], "features-response");
    assert_eq!(frame["payload"]["attributes"]["network"], "mainnet");
    assert_eq!(h.backend.features.refreshes(), 1);
}

#[tokio::test]
async fn qredo_accept_then_reject_unknown_connection() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.qredo.insert_pending("r1", "q1", "https://custody.example");

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"qredo-connect","method":"getPendingRequest","args":{"requestID":"r1"}}}"#,
    )
    .await;
    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["payload"]["method"], "getPendingRequestResponse");
    assert_eq!(frame["payload"]["args"]["request"]["qredoID"], "q1");

    h.send(
        &conn,
        r#"{"id":"2","payload":{"type":"qredo-connect","method":"acceptQredoConnection","args":{"qredoID":"q1","password":"pw","accounts":[{"address":"0xa"}]}}}"#,
    )
    .await;
    let frame = next_frame(&mut rx).await;
    assert_eq!(
        frame["payload"]["args"]["accounts"],
        json!([{"address": "0xa", "qredoID": "q1"}])
    );

    h.send(
        &conn,
        r#"{"id":"3","payload":{"type":"qredo-connect","method":"rejectQredoConnection","args":{"qredoID":"q1"}}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await["payload"]["message"],
        "Qredo connection q1 not found"
    );
}

#[tokio::test]
async fn delegates_claim_their_method_payloads() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");
    h.backend.entities.add_account(json!({"id": "a1"})).await;
    h.backend
        .entities
        .add_account_source(json!({"id": "s1", "isLocked": false}))
        .await;

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"method-payload","method":"setAccountNickname","args":{"id":"a1","nickname":"main"}}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await,
        json!({"id": "1", "payload": {"type": "done"}})
    );
    assert_eq!(
        next_frame(&mut rx).await,
        json!({"payload": {"type": "method-payload", "method": "entitiesUpdated", "args": {"type": "accounts"}}})
    );

    h.send(
        &conn,
        r#"{"id":"2","payload":{"type":"method-payload","method":"lockAccountSourceOrAccount","args":{"id":"s1"}}}"#,
    )
    .await;
    assert_eq!(next_frame(&mut rx).await["id"], "2");
    assert_eq!(
        next_frame(&mut rx).await["payload"]["args"]["type"],
        "accountSources"
    );
    assert_eq!(h.metrics.messages.get(&[("route", "accounts")]), 1);
    assert_eq!(h.metrics.messages.get(&[("route", "account-sources")]), 1);
}

#[tokio::test]
async fn delegate_fault_is_contained() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(
        &conn,
        r#"{"id":"1","payload":{"type":"method-payload","method":"setAccountNickname","args":{"id":"ghost"}}}"#,
    )
    .await;
    assert_eq!(
        next_frame(&mut rx).await["payload"],
        json!({"error": true, "code": -1, "message": "Entity ghost not found"})
    );

    h.send(&conn, r#"{"id":"2","payload":{"type":"get-network"}}"#).await;
    assert_eq!(next_frame(&mut rx).await["id"], "2");
}

#[tokio::test]
async fn missing_id_reply_omits_id() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    h.send(&conn, r#"{"payload":{"type":"nope"}}"#).await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"payload": {
            "error": true,
            "code": -1,
            "message": "Unhandled message undefined. (\"nope\")"
        }})
    );
}

#[tokio::test]
async fn reply_after_close_is_dropped_not_fatal() {
    let h = Harness::new();
    let (conn, rx) = h.connect("ui-1");
    drop(rx);

    h.send(&conn, r#"{"id":"1","payload":{"type":"get-network"}}"#).await;

    assert_eq!(
        h.metrics.dropped_replies.get(&[("route", "get-network")]),
        1
    );
}

#[tokio::test]
async fn entities_updated_notification_reaches_ui() {
    let h = Harness::new();
    let (conn, mut rx) = h.connect("ui-1");

    conn.notify_entities_updated(uibridge_core::protocol::UiEntityType::AccountSources)
        .await;

    assert_eq!(
        next_frame(&mut rx).await,
        json!({"payload": {"type": "method-payload", "method": "entitiesUpdated", "args": {"type": "accountSources"}}})
    );
    assert_quiet(&mut rx).await;
}
