//! Codec for the fixed-layout hex command frame
//!
//! Every frame is ASCII text of the form:
//! ```text
//! [ "HD" ][ 2 hex chars: command code ][ N hex chars: payload ][ "W" ]
//! ```
//!
//! The trailing byte is an opaque terminator: it is never derived from the
//! frame content, so decoding checks structural shape only and can never
//! detect payload corruption.

use thiserror::Error;

use crate::protocol::{FRAME_HEADER, FRAME_TERMINATOR, MIN_FRAME_LEN};

/// Errors rejecting encoder input before a frame is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidFrameInput {
    #[error("command code must be exactly 2 hex digits, got {0:?}")]
    CommandCode(String),

    #[error("payload must contain hex digits only")]
    Payload,
}

/// Errors rejecting a received frame at decode time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("missing HD header or frame too short: {0:?}")]
    BadHeader(String),
}

/// One decoded protocol frame, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Always the literal header (decode rejects anything else)
    pub header: String,
    /// Two hex chars identifying the operation or result
    pub command_code: String,
    /// Hex body between command code and terminator, possibly empty
    pub payload: String,
    /// Trailing marker char, `'W'` in all observed traffic
    pub terminator: char,
}

/// Encode a command frame from its code and payload
pub fn encode(command_code: &str, payload: &str) -> Result<String, InvalidFrameInput> {
    if command_code.len() != 2 || !command_code.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidFrameInput::CommandCode(command_code.to_string()));
    }
    if !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidFrameInput::Payload);
    }

    let mut frame = String::with_capacity(MIN_FRAME_LEN + payload.len());
    frame.push_str(FRAME_HEADER);
    frame.push_str(command_code);
    frame.push_str(payload);
    frame.push(FRAME_TERMINATOR);
    Ok(frame)
}

/// Decode a raw string into a [`CommandFrame`]
///
/// Rejects structural shape only: non-ASCII input, a missing header, or a
/// frame too short to hold header + code + terminator. The terminator is
/// carried through as-is and never validated against the frame content.
pub fn decode(raw: &str) -> Result<CommandFrame, FrameError> {
    if !raw.is_ascii() || raw.len() < MIN_FRAME_LEN || !raw.starts_with(FRAME_HEADER) {
        return Err(FrameError::BadHeader(raw.to_string()));
    }

    let last = raw.len() - 1;
    Ok(CommandFrame {
        header: raw[..2].to_string(),
        command_code: raw[2..4].to_string(),
        payload: raw[4..last].to_string(),
        // last char is ASCII, checked above
        terminator: raw.as_bytes()[last] as char,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn test_encode_decode_roundtrip() {
        let raw = encode("2F", "0454AB").expect("encode failed");
        assert_eq!(raw, "HD2F0454ABW");

        let frame = decode(&raw).expect("decode failed");
        assert_eq!(frame.header, "HD");
        assert_eq!(frame.command_code, "2F");
        assert_eq!(frame.payload, "0454AB");
        assert_eq!(frame.terminator, 'W');
    }

    #[test]
    fn test_roundtrip_observed_frames() {
        let unlock =
            encode(protocol::UNLOCK_CODE, protocol::UNLOCK_PAYLOAD).expect("encode failed");
        assert_eq!(
            unlock,
            "HD2F0454049024910010000000000000000000006EDA1000000007EW"
        );

        let status =
            encode(protocol::STATUS_CODE, protocol::STATUS_PAYLOAD).expect("encode failed");
        assert_eq!(
            status,
            "HD1F0000000000000000000000000000000000000000000000000000W"
        );

        let frame = decode(&unlock).expect("decode failed");
        assert_eq!(frame.command_code, protocol::UNLOCK_CODE);
        assert_eq!(frame.payload, protocol::UNLOCK_PAYLOAD);
    }

    #[test]
    fn test_encode_empty_payload() {
        let raw = encode("2B", "").expect("encode failed");
        assert_eq!(raw, "HD2BW");

        let frame = decode(&raw).expect("decode failed");
        assert_eq!(frame.command_code, "2B");
        assert_eq!(frame.payload, "");
    }

    #[test]
    fn test_encode_rejects_bad_command_code() {
        assert_eq!(
            encode("2", "00"),
            Err(InvalidFrameInput::CommandCode("2".into()))
        );
        assert_eq!(
            encode("2FF", "00"),
            Err(InvalidFrameInput::CommandCode("2FF".into()))
        );
        assert_eq!(
            encode("G1", "00"),
            Err(InvalidFrameInput::CommandCode("G1".into()))
        );
    }

    #[test]
    fn test_encode_rejects_non_hex_payload() {
        assert_eq!(encode("2F", "00XY"), Err(InvalidFrameInput::Payload));
    }

    #[test]
    fn test_decode_rejects_wrong_header_or_short_input() {
        assert_eq!(decode("XYZW"), Err(FrameError::BadHeader("XYZW".into())));
        assert_eq!(decode("HD2W"), Err(FrameError::BadHeader("HD2W".into())));
        assert_eq!(decode(""), Err(FrameError::BadHeader(String::new())));
        assert_eq!(
            decode("hd2F00W"),
            Err(FrameError::BadHeader("hd2F00W".into()))
        );
    }

    #[test]
    fn test_decode_rejects_non_ascii() {
        assert!(matches!(decode("HD2F锁00W"), Err(FrameError::BadHeader(_))));
    }

    #[test]
    fn test_decode_accepts_any_terminator_shape() {
        // no checksum exists; decode carries the trailing byte through
        let frame = decode("HD2F00Z").expect("decode failed");
        assert_eq!(frame.terminator, 'Z');
    }
}
