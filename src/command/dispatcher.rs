//! Command dispatcher - validates, sends, and resolves lock commands
//!
//! One dispatch call is one background task: emit a "sending" status, build
//! the envelope, tick progress concurrently, perform exactly one POST with a
//! fixed timeout, interpret the reply, and publish a single terminal outcome
//! through the sink channel. No retries; every failure is terminal and leaves
//! the dispatcher ready for the next call.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use locklink_shared::codec::{self, InvalidFrameInput};
use locklink_shared::interpret::{self, DispatchOutcome};
use locklink_shared::{protocol, CommandEnvelope, CommandReply};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::progress::ProgressReporter;
use crate::sink::{EventSender, Severity, SinkEvent};
use crate::transport::{CommandTransport, HttpReply, TransportFailure};

/// The three public lock operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Send the unlock control frame
    Unlock,
    /// Query the device status
    QueryStatus,
    /// Probe server reachability. Sends the same control frame as
    /// [`Operation::Unlock`], exactly as the observed protocol does; whether
    /// that reuse is intentional is an open question with the vendor.
    TestConnection,
}

impl Operation {
    /// Short human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Unlock => "unlock",
            Operation::QueryStatus => "query status",
            Operation::TestConnection => "test connection",
        }
    }

    /// Envelope command kind for this operation
    fn cmd_kind(&self) -> &'static str {
        match self {
            Operation::Unlock | Operation::TestConnection => protocol::CMD_KIND_CONTROL,
            Operation::QueryStatus => protocol::CMD_KIND_QUERY,
        }
    }

    /// Frame command code and payload for this operation
    fn frame_parts(&self) -> (&'static str, &'static str) {
        match self {
            Operation::Unlock | Operation::TestConnection => {
                (protocol::UNLOCK_CODE, protocol::UNLOCK_PAYLOAD)
            }
            Operation::QueryStatus => (protocol::STATUS_CODE, protocol::STATUS_PAYLOAD),
        }
    }
}

/// Errors surfaced synchronously, before any background work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("device MAC must be non-empty")]
    InvalidMac,

    #[error("a command for device {0} is already outstanding")]
    DeviceBusy(String),

    #[error("frame construction failed: {0}")]
    InvalidFrame(#[from] InvalidFrameInput),
}

/// Configuration for the command dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Cloud relay endpoint receiving command envelopes
    pub server_url: String,
    /// Bound on the single network exchange
    pub request_timeout: Duration,
    /// Delay between progress ticks
    pub progress_tick: Duration,
    /// Delay between the terminal outcome and the progress reset
    pub reset_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            server_url: "https://svr.yefiot.com/yefiot/v1/mqttpost/".into(),
            request_timeout: Duration::from_secs(protocol::REQUEST_TIMEOUT_SECS),
            progress_tick: Duration::from_millis(200),
            reset_delay: Duration::from_secs(1),
        }
    }
}

/// Handle to one in-flight dispatch call
///
/// The terminal outcome arrives through the sink channel, never through the
/// handle; awaiting it only observes completion of the background task.
#[derive(Debug)]
pub struct DispatchHandle {
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Wait for the background task to finish (outcome published, progress
    /// reset, per-device guard released)
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

/// Dispatches lock commands and publishes results through the sink channel
pub struct CommandDispatcher {
    config: DispatcherConfig,
    transport: Arc<dyn CommandTransport>,
    events: EventSender,
    /// Devices with an outstanding call, keyed by trimmed MAC
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl CommandDispatcher {
    /// Create a dispatcher posting events on `events`
    pub fn new(
        config: DispatcherConfig,
        transport: Arc<dyn CommandTransport>,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            transport,
            events,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Unlock the device
    pub fn unlock(&self, device_mac: &str) -> Result<DispatchHandle, DispatchError> {
        self.dispatch(Operation::Unlock, device_mac)
    }

    /// Query the device status
    pub fn query_status(&self, device_mac: &str) -> Result<DispatchHandle, DispatchError> {
        self.dispatch(Operation::QueryStatus, device_mac)
    }

    /// Probe server reachability for the device
    pub fn test_connection(&self, device_mac: &str) -> Result<DispatchHandle, DispatchError> {
        self.dispatch(Operation::TestConnection, device_mac)
    }

    /// Validate inputs and start one background dispatch task
    pub fn dispatch(
        &self,
        operation: Operation,
        device_mac: &str,
    ) -> Result<DispatchHandle, DispatchError> {
        let mac = device_mac.trim().to_string();
        if mac.is_empty() {
            return Err(DispatchError::InvalidMac);
        }

        let (code, payload) = operation.frame_parts();
        let raw_frame = codec::encode(code, payload)?;

        // One outstanding call per device; released by the background task
        if !self.in_flight_lock().insert(mac.clone()) {
            return Err(DispatchError::DeviceBusy(mac));
        }

        let config = self.config.clone();
        let transport = self.transport.clone();
        let events = self.events.clone();
        let in_flight = self.in_flight.clone();

        let task = tokio::spawn(async move {
            run_dispatch(operation, mac.clone(), raw_frame, config, transport, &events).await;
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&mac);
        });

        Ok(DispatchHandle { task })
    }

    fn in_flight_lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The background unit of work for one dispatch call
async fn run_dispatch(
    operation: Operation,
    mac: String,
    raw_frame: String,
    config: DispatcherConfig,
    transport: Arc<dyn CommandTransport>,
    events: &EventSender,
) {
    let _ = events.send(SinkEvent::Status {
        text: format!("sending {}", operation.label()),
        severity: Severity::Pending,
    });

    let envelope = CommandEnvelope::new(mac.clone(), operation.cmd_kind(), raw_frame);
    let _ = events.send(SinkEvent::Log(format!(
        "sending cmd={} mac={} sn={}",
        envelope.cmd, envelope.mac, envelope.sn
    )));
    info!(operation = operation.label(), mac = %mac, "dispatching command");

    // Tick progress concurrently with the network step; the ticker is
    // aborted once the exchange resolves so progress cannot trail the
    // operation. The last delivered value is tracked to keep the sequence
    // monotonic with no duplicate 100.
    let last_tick = Arc::new(AtomicU8::new(0));
    let reporter = ProgressReporter::new(config.progress_tick);
    let ticker = tokio::spawn({
        let events = events.clone();
        let last_tick = last_tick.clone();
        async move {
            reporter
                .run(move |value| {
                    last_tick.store(value, Ordering::SeqCst);
                    let _ = events.send(SinkEvent::Progress(value));
                })
                .await;
        }
    });

    // The single point of I/O fallibility
    let reply = timeout(
        config.request_timeout,
        transport.post(&config.server_url, &envelope),
    )
    .await;

    ticker.abort();
    let _ = ticker.await;

    let outcome = match reply {
        Err(_) => DispatchOutcome::Timeout,
        Ok(Err(TransportFailure::Timeout)) => DispatchOutcome::Timeout,
        Ok(Err(TransportFailure::Other(detail))) => DispatchOutcome::TransportError { detail },
        Ok(Ok(reply)) => resolve_reply(&reply),
    };

    // Ordering contract: last progress tick, then the terminal outcome,
    // then the delayed reset to zero
    if last_tick.load(Ordering::SeqCst) < 100 {
        let _ = events.send(SinkEvent::Progress(100));
    }

    let _ = events.send(SinkEvent::Log(format!(
        "{} finished: {outcome}",
        operation.label()
    )));
    let (text, severity) = describe(&outcome);
    let _ = events.send(SinkEvent::Status {
        text: text.to_string(),
        severity,
    });
    if outcome.is_success() {
        info!(operation = operation.label(), mac = %mac, %outcome, "command resolved");
    } else {
        warn!(operation = operation.label(), mac = %mac, %outcome, "command did not succeed");
    }
    let _ = events.send(SinkEvent::Outcome(outcome));

    sleep(config.reset_delay).await;
    let _ = events.send(SinkEvent::Progress(0));
}

/// Map a delivered HTTP reply to the terminal outcome
fn resolve_reply(reply: &HttpReply) -> DispatchOutcome {
    if !reply.is_success() {
        return DispatchOutcome::TransportError {
            detail: format!("http status {}", reply.status),
        };
    }

    let parsed = match CommandReply::from_json(&reply.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return DispatchOutcome::MalformedResponse {
                detail: format!("invalid json: {e}"),
            };
        }
    };

    let Some(raw_frame) = parsed.first_frame() else {
        return DispatchOutcome::MalformedResponse {
            detail: "no data".into(),
        };
    };

    match codec::decode(raw_frame) {
        Ok(frame) => interpret::interpret(&frame),
        Err(e) => DispatchOutcome::MalformedResponse {
            detail: e.to_string(),
        },
    }
}

/// Status line text and severity for an outcome
fn describe(outcome: &DispatchOutcome) -> (&'static str, Severity) {
    match outcome {
        DispatchOutcome::Completed { .. } => ("operation succeeded", Severity::Success),
        DispatchOutcome::Failed { .. } => ("operation failed", Severity::Error),
        DispatchOutcome::Timeout => ("connection timed out", Severity::Error),
        DispatchOutcome::TransportError { .. } => ("request failed", Severity::Error),
        DispatchOutcome::MalformedResponse { .. } => ("unexpected response", Severity::Warning),
    }
}
