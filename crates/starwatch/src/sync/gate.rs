//! The rate-limit budget gate.

use std::time::Duration;

use crate::remote::{RateBudget, ReleaseSource, Result};

use super::progress::{emit, ProgressCallback, SyncProgress};
use super::types::{BUDGET_PAUSE, DEFAULT_BUDGET_THRESHOLD};

/// Backoff policy guarding the remote call budget.
///
/// Before each repository, the fetch pass asks the gate for clearance. The
/// gate queries the remote budget; while `remaining` sits below the safety
/// threshold it sleeps a fixed pause and re-checks, looping until budget is
/// available again. The wait is deliberately uncancellable: a fetch pass is
/// an unattended batch job, killed externally if it must stop.
///
/// The gate belongs to the scheduler's control loop; stores and reconcilers
/// never wait on it.
#[derive(Debug, Clone)]
pub struct BudgetGate {
    threshold: u32,
    pause: Duration,
}

impl BudgetGate {
    /// Create a gate with the given budget floor.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            pause: BUDGET_PAUSE,
        }
    }

    /// Override the pause between re-checks.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// The configured budget floor.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Block until the remote budget clears the threshold. Returns the
    /// budget that cleared. Errors from the budget query itself propagate:
    /// without a readable budget the gate cannot protect anything.
    pub async fn acquire<R: ReleaseSource + ?Sized>(
        &self,
        source: &R,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<RateBudget> {
        loop {
            let budget = source.rate_budget().await?;
            if budget.remaining >= self.threshold {
                return Ok(budget);
            }

            tracing::info!(
                remaining = budget.remaining,
                threshold = self.threshold,
                reset_at = %budget.reset_at,
                pause_secs = self.pause.as_secs(),
                "rate budget low, pausing fetch pass"
            );
            emit(
                on_progress,
                SyncProgress::BudgetLow {
                    remaining: budget.remaining,
                    threshold: self.threshold,
                    reset_at: budget.reset_at,
                },
            );

            tokio::time::sleep(self.pause).await;
        }
    }
}

impl Default for BudgetGate {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::remote::{Release, ReleaseSource, TagMetadata};

    use super::*;

    /// Source whose budget answers are scripted per call.
    struct ScriptedBudget {
        calls: AtomicU32,
        remaining: Vec<u32>,
    }

    impl ScriptedBudget {
        fn new(remaining: Vec<u32>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                remaining,
            }
        }
    }

    #[async_trait]
    impl ReleaseSource for ScriptedBudget {
        async fn starred_repositories(&self, _user: &str) -> Result<Vec<String>> {
            unimplemented!("not used by the gate")
        }

        async fn latest_release(&self, _repository: &str) -> Result<Option<Release>> {
            unimplemented!("not used by the gate")
        }

        async fn tags(&self, _repository: &str) -> Result<Vec<String>> {
            unimplemented!("not used by the gate")
        }

        async fn tag_metadata(&self, _repository: &str, _tag: &str) -> Result<TagMetadata> {
            unimplemented!("not used by the gate")
        }

        async fn rate_budget(&self) -> Result<RateBudget> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let idx = n.min(self.remaining.len() - 1);
            Ok(RateBudget {
                limit: 5000,
                remaining: self.remaining[idx],
                reset_at: Utc::now(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_returns_immediately_with_budget_available() {
        let source = ScriptedBudget::new(vec![4000]);
        let gate = BudgetGate::new(1000);

        let budget = gate.acquire(&source, None).await.unwrap();
        assert_eq!(budget.remaining, 4000);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_parks_until_the_budget_recovers() {
        let source = ScriptedBudget::new(vec![10, 500, 2000]);
        let gate = BudgetGate::new(1000);

        let events: Arc<Mutex<Vec<SyncProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback =
            Box::new(move |event| events_capture.lock().unwrap().push(event));

        let budget = gate.acquire(&source, Some(&callback)).await.unwrap();
        assert_eq!(budget.remaining, 2000);
        // Two low readings, two parks, third reading clears.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            SyncProgress::BudgetLow { remaining: 10, .. }
        ));
    }
}
