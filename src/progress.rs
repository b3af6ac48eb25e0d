//! Progress tick source for in-flight dispatch calls

use locklink_shared::protocol::PROGRESS_STEP;
use std::time::Duration;
use tokio::time::sleep;

/// Emits the bounded progress sequence `0, 10, ..., 100` on a background
/// task, one callback per value with a fixed delay between ticks.
///
/// Each `run` is an independent sequence with no state carried across runs.
/// The owning dispatch call aborts the ticker when the network step resolves
/// first, so progress never outlives the operation.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    tick_delay: Duration,
}

impl ProgressReporter {
    /// Create a reporter with the given inter-tick delay
    pub fn new(tick_delay: Duration) -> Self {
        Self { tick_delay }
    }

    /// Run one full tick sequence, invoking `on_tick` once per value
    pub async fn run<F>(&self, mut on_tick: F)
    where
        F: FnMut(u8),
    {
        let mut value: u8 = 0;
        loop {
            on_tick(value);
            if value >= 100 {
                break;
            }
            sleep(self.tick_delay).await;
            value = value.saturating_add(PROGRESS_STEP);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_sequence_in_order() {
        let reporter = ProgressReporter::new(Duration::from_millis(1));
        let mut seen = Vec::new();
        reporter.run(|value| seen.push(value)).await;

        assert_eq!(seen, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[tokio::test]
    async fn test_runs_are_independent() {
        let reporter = ProgressReporter::new(Duration::from_millis(1));

        let mut first = Vec::new();
        reporter.run(|value| first.push(value)).await;
        let mut second = Vec::new();
        reporter.run(|value| second.push(value)).await;

        assert_eq!(first, second);
        assert_eq!(second.first(), Some(&0));
        assert_eq!(second.last(), Some(&100));
    }
}
