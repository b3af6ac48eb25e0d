//! Locklink Shared Protocol Types
//!
//! This crate provides the wire types, frame codec, and response
//! interpretation shared between the Locklink dispatcher and any tooling
//! that speaks the lock protocol.

pub mod codec;
pub mod interpret;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in whole seconds since Unix epoch
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Protocol parameters for the lock command exchange
pub mod protocol {
    /// Device family tag carried in every envelope
    pub const DEVICE_TYPE: &str = "yfn03";

    /// Fixed two-character frame header
    pub const FRAME_HEADER: &str = "HD";

    /// Trailing frame byte. Named "checksum" upstream but never computed
    /// from frame content; treated here as an opaque terminator.
    pub const FRAME_TERMINATOR: char = 'W';

    /// Minimum structurally valid frame: header + code + terminator
    pub const MIN_FRAME_LEN: usize = 5;

    /// Envelope command kind for control operations (unlock, test)
    pub const CMD_KIND_CONTROL: &str = "0";

    /// Envelope command kind for status queries
    pub const CMD_KIND_QUERY: &str = "1";

    /// Command code of the unlock/test control frame
    pub const UNLOCK_CODE: &str = "2F";

    /// Body of the unlock/test control frame
    pub const UNLOCK_PAYLOAD: &str = "0454049024910010000000000000000000006EDA1000000007E";

    /// Command code of the status-query frame
    pub const STATUS_CODE: &str = "1F";

    /// Body of the status-query frame (all zeros)
    pub const STATUS_PAYLOAD: &str = "0000000000000000000000000000000000000000000000000000";

    /// Command code acknowledging a successful unlock
    pub const UNLOCK_ACK_CODE: &str = "2B";

    /// Request timeout for the single HTTP exchange, in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Progress increment per tick, in percent
    pub const PROGRESS_STEP: u8 = 10;
}

/// Outer JSON request object sent over HTTP, one per dispatch call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandEnvelope {
    /// Fixed protocol family tag
    #[serde(rename = "type")]
    pub device_type: String,
    /// Target device identifier, trimmed and non-empty
    pub mac: String,
    /// Server-side command family selector ("0" control, "1" query)
    pub cmd: String,
    /// Seconds since epoch at send time; best-effort uniqueness only
    pub sn: u64,
    /// Hex-encoded command frame
    pub info: String,
}

impl CommandEnvelope {
    /// Build an envelope for one dispatch call, stamping the sequence
    /// number from wall-clock time
    pub fn new(mac: impl Into<String>, cmd_kind: &str, raw_frame: impl Into<String>) -> Self {
        Self {
            device_type: protocol::DEVICE_TYPE.into(),
            mac: mac.into(),
            cmd: cmd_kind.into(),
            sn: now_secs(),
            info: raw_frame.into(),
        }
    }
}

/// Server reply body; `data` is absent or empty on no-op replies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub data: Vec<ReplyEntry>,
}

/// One entry of the reply `data` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyEntry {
    /// Raw command frame carried back from the device
    #[serde(default)]
    pub msg_info: String,
}

impl CommandReply {
    /// Parse a reply body, tolerating unknown fields
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// First frame-bearing entry, if the reply carries one
    pub fn first_frame(&self) -> Option<&str> {
        self.data
            .first()
            .map(|entry| entry.msg_info.as_str())
            .filter(|info| !info.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_wire_field_names() {
        let envelope = CommandEnvelope::new("869701070802882", protocol::CMD_KIND_CONTROL, "HD2FW");
        let json = serde_json::to_value(&envelope).expect("serialize failed");

        assert_eq!(json["type"], protocol::DEVICE_TYPE);
        assert_eq!(json["mac"], "869701070802882");
        assert_eq!(json["cmd"], "0");
        assert_eq!(json["info"], "HD2FW");
        assert!(json["sn"].is_u64());
    }

    #[test]
    fn test_reply_first_frame() {
        let reply =
            CommandReply::from_json(r#"{"data":[{"msg_info":"HD2B00W"}]}"#).expect("parse failed");
        assert_eq!(reply.first_frame(), Some("HD2B00W"));
    }

    #[test]
    fn test_reply_without_data_has_no_frame() {
        let empty = CommandReply::from_json(r#"{"data":[]}"#).expect("parse failed");
        assert_eq!(empty.first_frame(), None);

        let missing = CommandReply::from_json(r#"{"code":0}"#).expect("parse failed");
        assert_eq!(missing.first_frame(), None);

        let blank =
            CommandReply::from_json(r#"{"data":[{"msg_info":""}]}"#).expect("parse failed");
        assert_eq!(blank.first_frame(), None);
    }

    #[test]
    fn test_observed_frame_constants_are_valid_codec_input() {
        codec::encode(protocol::UNLOCK_CODE, protocol::UNLOCK_PAYLOAD).expect("unlock frame");
        codec::encode(protocol::STATUS_CODE, protocol::STATUS_PAYLOAD).expect("status frame");
    }
}
