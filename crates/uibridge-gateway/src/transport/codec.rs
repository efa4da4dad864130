//! Decode-once codec for the UI socket.
//!
//! - Text frames (and UTF-8 binary frames) => `Envelope`
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use uibridge_core::protocol::Envelope;

#[derive(Debug)]
pub enum Inbound {
    Envelope(Envelope),
    /// Frame that is not an envelope; there is no id to answer.
    Undecodable(String),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => envelope(&s),
        Message::Binary(b) => match std::str::from_utf8(&b) {
            Ok(s) => envelope(s),
            Err(e) => Inbound::Undecodable(format!("binary frame is not utf-8: {e}")),
        },
        Message::Ping(v) => Inbound::Ping(v),
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}

fn envelope(s: &str) -> Inbound {
    match Envelope::decode(s) {
        Ok(env) => Inbound::Envelope(env),
        Err(e) => Inbound::Undecodable(e.to_string()),
    }
}
