//! Default fetch substrate: a reqwest client behind a bounded worker pool.
//! Owns retries, User-Agent rotation and failure classification; hands every
//! fetched document to the traversal controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{classify_failure, FailureKind, RequestQueue, ResultSink};
use crate::core::config::CrawlerConfig;
use crate::core::error::CrawlError;
use crate::core::types::CrawlRequest;
use crate::traverse::TraversalController;

const MAX_FETCH_RETRIES: usize = 5;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

fn random_user_agent() -> &'static str {
    use rand::prelude::*;
    let mut rng = rand::rng();
    let index = rng.random_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

fn stealth_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Upgrade-Insecure-Requests", "1"),
        ("Cache-Control", "no-cache"),
    ]
}

/// Channel-backed work queue shared with the traversal controller. The
/// pending counter tracks enqueued-but-unfinished requests so the run loop
/// knows when the crawl has drained.
struct WorkQueue {
    tx: mpsc::UnboundedSender<CrawlRequest>,
    pending: Arc<AtomicUsize>,
}

#[async_trait]
impl RequestQueue for WorkQueue {
    async fn enqueue(&self, request: CrawlRequest) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("work queue closed, dropping request");
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records_saved: usize,
    pub total_duration_ms: u64,
}

pub struct HttpSubstrate {
    client: Client,
    config: CrawlerConfig,
}

impl HttpSubstrate {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            config: config.clone().clamped(),
        })
    }

    /// Run a full crawl: seed requests, a bounded worker pool fetching and
    /// dispatching to the traversal controller, records into `sink`.
    pub async fn run(&self, sink: Arc<dyn ResultSink>) -> Result<RunSummary> {
        let start = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let queue: Arc<dyn RequestQueue> = Arc::new(WorkQueue {
            tx,
            pending: Arc::clone(&pending),
        });
        let controller = Arc::new(TraversalController::new(
            self.config.clone(),
            Arc::clone(&queue),
            sink,
        ));
        for request in controller.seed_requests() {
            queue.enqueue(request).await;
        }

        let fetched = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let mut in_flight = FuturesUnordered::new();
        loop {
            if pending.load(Ordering::SeqCst) == 0 && in_flight.is_empty() {
                break;
            }
            let next_request = if in_flight.len() < self.config.max_concurrency {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(request) => Some(request),
                        None => break,
                    },
                    Some(_) = in_flight.next() => None,
                }
            } else {
                in_flight.next().await;
                None
            };
            if let Some(request) = next_request {
                in_flight.push(self.process(
                    Arc::clone(&controller),
                    request,
                    Arc::clone(&pending),
                    &fetched,
                    &failed,
                ));
            }
        }

        controller.log_run_summary().await;
        Ok(RunSummary {
            pages_fetched: fetched.load(Ordering::SeqCst),
            pages_failed: failed.load(Ordering::SeqCst),
            records_saved: controller.state().saved().await,
            total_duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn process(
        &self,
        controller: Arc<TraversalController>,
        request: CrawlRequest,
        pending: Arc<AtomicUsize>,
        fetched: &AtomicUsize,
        failed: &AtomicUsize,
    ) {
        match self.fetch_with_retries(&request.url).await {
            Ok(html) => {
                fetched.fetch_add(1, Ordering::SeqCst);
                if let Err(e) = controller.handle_page(&html, &request).await {
                    warn!("handler error for {}: {:#}", request.url, e);
                }
            }
            Err(e) => {
                // A failed fetch produced no document; no extraction runs.
                failed.fetch_add(1, Ordering::SeqCst);
                warn!("request failed: {} - {:#}", request.url, e);
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<String> {
        let mut last_error = anyhow!("no fetch attempts made");
        for attempt in 1..=MAX_FETCH_RETRIES {
            match self.fetch_once(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    match classify_failure(None, &e.to_string()) {
                        FailureKind::RotateSession => warn!(
                            "blocking signal from {} (attempt {}), rotating user agent",
                            url, attempt
                        ),
                        FailureKind::MarkDegraded => {
                            warn!("fetch error from {} (attempt {}): {:#}", url, attempt, e)
                        }
                    }
                    last_error = e;
                }
            }
        }
        Err(CrawlError::Fetch(last_error.to_string()).into())
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url).header("User-Agent", random_user_agent());
        for (name, value) in stealth_headers() {
            request = request.header(name, value);
        }
        if let Some(cookie) = self.config.cookie_header() {
            request = request.header("Cookie", cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("request error: {}", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("http status {}", status.as_u16()));
        }
        info!("fetched {} ({})", url, status.as_u16());
        response
            .text()
            .await
            .map_err(|e| anyhow!("body read error: {}", e))
    }
}
