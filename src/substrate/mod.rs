//! Interface boundary to the fetch-and-dispatch substrate and the result
//! sink. The core consumes these; their internals (retries, proxy and
//! session policy, persistence) belong to the collaborator behind them.

mod http;

pub use http::{HttpSubstrate, RunSummary};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::types::{CrawlRequest, JobRecord};

/// Work-queue half of the fetch substrate. Idempotency and ordering across
/// enqueues from concurrent handlers are the substrate's responsibility.
#[async_trait]
pub trait RequestQueue: Send + Sync {
    async fn enqueue(&self, request: CrawlRequest);
}

/// Receives each accepted record exactly once, in the order DETAIL pages
/// complete (not URL-discovery order).
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn emit(&self, record: JobRecord);
}

/// How the substrate's session policy should react to a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rate-limit or blocking signal; rotate the session aggressively.
    RotateSession,
    /// Anything else; mark the session degraded and move on.
    MarkDegraded,
}

/// Classify a fetch failure for the substrate's session policy. HTTP 403 and
/// 429 are blocking signals; everything else is a milder degradation. This is
/// an input to session rotation, not a control-flow decision of the core.
pub fn classify_failure(status: Option<u16>, error: &str) -> FailureKind {
    match status {
        Some(403) | Some(429) => FailureKind::RotateSession,
        _ if error.contains("403") || error.contains("429") => FailureKind::RotateSession,
        _ => FailureKind::MarkDegraded,
    }
}

/// In-memory sink collecting records in completion order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<JobRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<JobRecord> {
        self.records.lock().await.clone()
    }

    pub async fn take(&self) -> Vec<JobRecord> {
        std::mem::take(&mut *self.records.lock().await)
    }
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn emit(&self, record: JobRecord) {
        self.records.lock().await.push(record);
    }
}
