//! Realtime Channel Protocol
//!
//! Phoenix channel frames (JSON serializer, `vsn=1.0.0`) spoken by the hosted
//! realtime service. Pure encode/decode; the socket itself lives with the
//! platform transport.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};

use super::event::{ChangeEvent, ChangeFilter, ChangeKind, RowKey};
use crate::domain::Task;

const PHOENIX_TOPIC: &str = "phoenix";

/// One Phoenix frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

/// Decoded meaning of an incoming frame for one channel
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Change(ChangeEvent),
    Joined,
    JoinFailed(String),
    Closed(String),
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type", alias = "eventType")]
    kind: ChangeKind,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

/// Channel state for one `postgres_changes` subscription
#[derive(Debug)]
pub struct Channel {
    topic: String,
    filter: ChangeFilter,
    next_ref: Cell<u64>,
    join_ref: Cell<Option<u64>>,
    /// Access token the service last received
    sent_token: RefCell<Option<String>>,
}

impl Channel {
    pub fn new(channel: &str, filter: ChangeFilter) -> Self {
        Self {
            topic: format!("realtime:{}", channel),
            filter,
            next_ref: Cell::new(1),
            join_ref: Cell::new(None),
            sent_token: RefCell::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn make_ref(&self) -> u64 {
        let r = self.next_ref.get();
        self.next_ref.set(r + 1);
        r
    }

    fn encode(&self, topic: &str, event: &str, payload: Value, reference: u64) -> String {
        let frame = Frame {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            reference: Some(reference.to_string()),
            join_ref: self.join_ref.get().map(|r| r.to_string()),
        };
        // Frame holds only strings and a Value; serialization cannot fail
        serde_json::to_string(&frame).unwrap_or_default()
    }

    pub fn join_frame(&self, access_token: Option<&str>) -> String {
        let reference = self.make_ref();
        self.join_ref.set(Some(reference));
        *self.sent_token.borrow_mut() = access_token.map(str::to_string);
        let payload = json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": "*",
                    "schema": self.filter.schema,
                    "table": self.filter.table,
                    "filter": self.filter.row_filter(),
                }],
            },
            "access_token": access_token,
        });
        self.encode(&self.topic, "phx_join", payload, reference)
    }

    pub fn heartbeat_frame(&self) -> String {
        let reference = self.make_ref();
        let frame = Frame {
            topic: PHOENIX_TOPIC.to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: None,
        };
        serde_json::to_string(&frame).unwrap_or_default()
    }

    /// Frames due on a heartbeat tick. A token that changed since the last
    /// join or tick goes out first as an `access_token` frame.
    pub fn tick_frames(&self, access_token: Option<&str>) -> Vec<String> {
        let mut frames = Vec::with_capacity(2);
        if self.sent_token.borrow().as_deref() != access_token {
            if let Some(token) = access_token {
                frames.push(self.access_token_frame(token));
            }
            *self.sent_token.borrow_mut() = access_token.map(str::to_string);
        }
        frames.push(self.heartbeat_frame());
        frames
    }

    pub fn access_token_frame(&self, access_token: &str) -> String {
        let reference = self.make_ref();
        self.encode(&self.topic, "access_token", json!({ "access_token": access_token }), reference)
    }

    pub fn leave_frame(&self) -> String {
        let reference = self.make_ref();
        self.encode(&self.topic, "phx_leave", json!({}), reference)
    }

    /// Interpret a text frame received on the socket
    pub fn decode(&self, text: &str) -> Incoming {
        let frame: Frame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("[realtime] undecodable frame: {}", e);
                return Incoming::Ignored;
            }
        };
        if frame.topic != self.topic {
            return Incoming::Ignored;
        }

        match frame.event.as_str() {
            "postgres_changes" => decode_change(&frame.payload),
            "phx_reply" if is_join_reply(&frame, self.join_ref.get()) => {
                match frame.payload.get("status").and_then(Value::as_str) {
                    Some("ok") => Incoming::Joined,
                    _ => Incoming::JoinFailed(reason(&frame.payload["response"])),
                }
            }
            "system" => match frame.payload.get("status").and_then(Value::as_str) {
                Some("error") => Incoming::JoinFailed(reason(&frame.payload)),
                _ => Incoming::Ignored,
            },
            "phx_error" => Incoming::Closed("channel error".to_string()),
            "phx_close" => Incoming::Closed("channel closed".to_string()),
            _ => Incoming::Ignored,
        }
    }
}

fn is_join_reply(frame: &Frame, join_ref: Option<u64>) -> bool {
    match (frame.reference.as_deref(), join_ref) {
        (Some(r), Some(j)) => r == j.to_string(),
        _ => false,
    }
}

fn reason(value: &Value) -> String {
    ["reason", "message"].iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .unwrap_or("subscription rejected")
        .to_string()
}

fn decode_change(payload: &Value) -> Incoming {
    let data: ChangeData = match serde_json::from_value(payload["data"].clone()) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("[realtime] malformed change payload: {}", e);
            return Incoming::Ignored;
        }
    };

    let new = data.record
        .filter(|r| r.as_object().map(|o| !o.is_empty()).unwrap_or(false))
        .map(serde_json::from_value::<Task>)
        .transpose();
    let old = data.old_record
        .filter(|r| r.as_object().map(|o| !o.is_empty()).unwrap_or(false))
        .map(serde_json::from_value::<RowKey>)
        .transpose();

    match (new, old) {
        (Ok(new), Ok(old)) => Incoming::Change(ChangeEvent { kind: data.kind, new, old }),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("[realtime] change row did not match the task schema: {}", e);
            Incoming::Ignored
        }
    }
}
