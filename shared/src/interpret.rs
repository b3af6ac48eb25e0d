//! Mapping from decoded reply frames to semantic outcomes

use std::fmt;

use crate::codec::CommandFrame;
use crate::protocol;

/// Terminal result of one dispatch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command acknowledged by the device
    Completed { detail: String },
    /// Device reported a failure (no observed code maps here yet)
    Failed { reason: String },
    /// The network exchange exceeded the fixed timeout
    Timeout,
    /// HTTP or lower-level transport failure
    TransportError { detail: String },
    /// Well-formed HTTP reply with an undecodable or unrecognized payload
    MalformedResponse { detail: String },
}

impl DispatchOutcome {
    /// Whether this outcome represents a completed, non-error exchange
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Completed { detail } => write!(f, "success: {detail}"),
            DispatchOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            DispatchOutcome::Timeout => write!(f, "timed out"),
            DispatchOutcome::TransportError { detail } => write!(f, "transport error: {detail}"),
            DispatchOutcome::MalformedResponse { detail } => {
                write!(f, "malformed response: {detail}")
            }
        }
    }
}

/// Interpret a decoded reply frame
///
/// Closed table keyed on the command code; payload content is never
/// consulted. Unknown codes are surfaced as malformed, never as a silent
/// success.
pub fn interpret(frame: &CommandFrame) -> DispatchOutcome {
    match frame.command_code.as_str() {
        protocol::UNLOCK_ACK_CODE => DispatchOutcome::Completed {
            detail: "unlock acknowledged".into(),
        },
        protocol::UNLOCK_CODE => DispatchOutcome::Completed {
            detail: "control command completed".into(),
        },
        protocol::STATUS_CODE => DispatchOutcome::Completed {
            detail: "status query completed".into(),
        },
        code => DispatchOutcome::MalformedResponse {
            detail: format!("unrecognized command code {code}"),
        },
    }
}
