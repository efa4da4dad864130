//! Envelope framing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use uibridge_core::protocol::{Envelope, Push, Reply, UiEntityType};


#[test]
fn parse_envelope_without_id() {
    let v = vector_loader::load("push_without_id.json");
    let env = Envelope::decode(&v.frame_text()).unwrap();
    assert!(env.id.is_none());
    assert_eq!(env.id_for_display(), "undefined");
}

#[test]
fn payload_is_required() {
    let err = Envelope::decode(r#"{"id":"1"}"#).unwrap_err();
    assert_eq!(err.fault_kind().as_str(), "INVALID_PAYLOAD");
}

#[test]
fn reply_reuses_id_and_push_omits_it() {
    let reply = Envelope::reply(Some("42".into()), Reply::Done.into_payload());
    let text = reply.encode().unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&text).unwrap(),
        json!({"id": "42", "payload": {"type": "done"}})
    );

    let push = Envelope::push(Push::EntitiesUpdated(UiEntityType::AccountSources).into_payload());
    let text = push.encode().unwrap();
    assert!(!text.contains("\"id\""));
    assert!(text.contains("\"accountSources\""));
}
