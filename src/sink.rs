//! Channel boundary between background tasks and the presentation layer
//!
//! Background tasks never mutate presentation state. They post [`SinkEvent`]s
//! on an unbounded channel; the interactive context drains the channel and
//! forwards each event to its [`StatusSink`]. This is the only path by which
//! results cross into the interactive context.

use locklink_shared::interpret::DispatchOutcome;
use tokio::sync::mpsc;

/// Status label severity classes of the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Idle / informational
    Info,
    /// Operation in flight
    Pending,
    /// Completed without error
    Success,
    /// Degraded but not fatal (e.g. unrecognized reply)
    Warning,
    /// Operation failed
    Error,
}

/// Events posted by background tasks for the interactive context to drain
#[derive(Debug, Clone)]
pub enum SinkEvent {
    /// Replace the status line
    Status { text: String, severity: Severity },
    /// Append a log line
    Log(String),
    /// Progress bar value, 0..=100
    Progress(u8),
    /// Terminal result of one dispatch call, published exactly once
    Outcome(DispatchOutcome),
}

/// Presentation-owned receiver of status, log, progress, and outcome events
///
/// The core only pushes into this interface and never queries it.
pub trait StatusSink {
    fn on_status(&mut self, text: &str, severity: Severity);
    fn on_log(&mut self, line: &str);
    fn on_progress(&mut self, percent: u8);
    fn on_outcome(&mut self, outcome: &DispatchOutcome);
}

/// Sender half handed to background tasks
pub type EventSender = mpsc::UnboundedSender<SinkEvent>;

/// Receiver half owned by the interactive context
pub type EventReceiver = mpsc::UnboundedReceiver<SinkEvent>;

/// Create the event channel for one dispatcher
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Drain events on the interactive context until all senders are dropped
pub async fn pump_events(mut receiver: EventReceiver, sink: &mut (dyn StatusSink + Send)) {
    while let Some(event) = receiver.recv().await {
        deliver(event, sink);
    }
}

/// Forward one event to the sink
pub fn deliver(event: SinkEvent, sink: &mut dyn StatusSink) {
    match event {
        SinkEvent::Status { text, severity } => sink.on_status(&text, severity),
        SinkEvent::Log(line) => sink.on_log(&line),
        SinkEvent::Progress(percent) => sink.on_progress(percent),
        SinkEvent::Outcome(outcome) => sink.on_outcome(&outcome),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Sink that records every delivery in order, for assertions
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub statuses: Vec<(String, Severity)>,
        pub logs: Vec<String>,
        pub progress: Vec<u8>,
        pub outcomes: Vec<DispatchOutcome>,
    }

    impl StatusSink for RecordingSink {
        fn on_status(&mut self, text: &str, severity: Severity) {
            self.statuses.push((text.to_string(), severity));
        }

        fn on_log(&mut self, line: &str) {
            self.logs.push(line.to_string());
        }

        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn on_outcome(&mut self, outcome: &DispatchOutcome) {
            self.outcomes.push(outcome.clone());
        }
    }
}
