use std::collections::HashSet;

use tokio::sync::Mutex;

/// Outcome of an emit attempt against the shared budget/dedupe state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Budget slot reserved and the URL recorded; the caller must emit.
    Committed,
    /// The URL was already emitted; discard silently.
    Duplicate,
    /// The results budget is met; discard.
    BudgetExhausted,
}

/// Shared dedupe/budget bookkeeping for one crawl run, the single arbiter of
/// uniqueness across concurrent handler invocations.
///
/// Enqueue-side and emit-side URLs are tracked separately: a DETAIL request
/// enqueued from a LIST page must still be able to emit its record under the
/// same normalized URL. Both membership-test-and-insert operations and the
/// saved-count increment run inside one critical section each, which narrows
/// the concurrent race to a budget overrun bounded by the number of in-flight
/// requests at the moment the threshold was crossed (an accepted soft limit).
#[derive(Debug)]
pub struct TraversalState {
    results_wanted: usize,
    dedupe: bool,
    inner: Mutex<StateInner>,
}

#[derive(Debug, Default)]
struct StateInner {
    enqueued: HashSet<String>,
    emitted: HashSet<String>,
    saved: usize,
}

impl TraversalState {
    pub fn new(results_wanted: usize, dedupe: bool) -> Self {
        Self {
            results_wanted,
            dedupe,
            inner: Mutex::new(StateInner::default()),
        }
    }

    pub async fn saved(&self) -> usize {
        self.inner.lock().await.saved
    }

    pub async fn remaining(&self) -> usize {
        let inner = self.inner.lock().await;
        self.results_wanted.saturating_sub(inner.saved)
    }

    pub async fn budget_met(&self) -> bool {
        self.inner.lock().await.saved >= self.results_wanted
    }

    /// Atomic membership-test-and-insert for the enqueue side. Returns true
    /// when the URL is new (always true with dedupe disabled).
    pub async fn try_mark_enqueued(&self, normalized: &str) -> bool {
        if !self.dedupe {
            return true;
        }
        let mut inner = self.inner.lock().await;
        inner.enqueued.insert(normalized.to_string())
    }

    /// Atomic budget-check, emit-dedupe and increment. The caller emits the
    /// record only on `Committed`.
    pub async fn try_commit(&self, normalized: &str) -> CommitOutcome {
        let mut inner = self.inner.lock().await;
        if inner.saved >= self.results_wanted {
            return CommitOutcome::BudgetExhausted;
        }
        if self.dedupe && !inner.emitted.insert(normalized.to_string()) {
            return CommitOutcome::Duplicate;
        }
        inner.saved += 1;
        CommitOutcome::Committed
    }
}
