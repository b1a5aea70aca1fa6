//! Traversal controller: the state machine governing LIST vs DETAIL page
//! handling, budget enforcement, dedupe bookkeeping and enqueue decisions.

mod delay;
mod state;

pub use delay::RequestDelay;
pub use state::{CommitOutcome, TraversalState};

use std::sync::Arc;

use anyhow::Result;
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::{CrawlerConfig, SITE_HOST};
use crate::core::error::CrawlError;
use crate::core::types::{CrawlRequest, JobLink, JobRecord, PageRole};
use crate::extract::JobExtractor;
use crate::links;
use crate::substrate::{RequestQueue, ResultSink};
use crate::urlnorm;
use crate::validate;

/// Phrases that mark a login-walled posting. Detection only; the record is
/// still emitted, flagged as degraded.
const GATING_PHRASES: &[&str] = &[
    "log in to view",
    "sign in to view",
    "join to view this job",
    "create a free account",
    "members only",
    "unlock & view this job",
];

pub struct TraversalController {
    config: CrawlerConfig,
    state: Arc<TraversalState>,
    extractor: JobExtractor,
    delay: RequestDelay,
    queue: Arc<dyn RequestQueue>,
    sink: Arc<dyn ResultSink>,
}

/// Everything a LIST page contributes, computed in one synchronous pass so
/// the parsed document never crosses an await point.
struct ListPlan {
    cards: Vec<JobRecord>,
    links: Vec<JobLink>,
    next_page: Option<String>,
}

impl TraversalController {
    pub fn new(
        config: CrawlerConfig,
        queue: Arc<dyn RequestQueue>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let config = config.clamped();
        let state = Arc::new(TraversalState::new(config.results_wanted, config.dedupe));
        let extractor = JobExtractor::from_config(&config);
        let delay = RequestDelay::new(config.min_delay_ms, config.max_delay_ms);
        Self {
            config,
            state,
            extractor,
            delay,
            queue,
            sink,
        }
    }

    pub fn state(&self) -> Arc<TraversalState> {
        Arc::clone(&self.state)
    }

    /// Initial LIST(1) requests from explicit seeds or a synthesized search
    /// URL.
    pub fn seed_requests(&self) -> Vec<CrawlRequest> {
        self.config.seed_requests()
    }

    /// Handle one fetched page. Invoked by the fetch substrate with the
    /// document body and the request's metadata; runs to completion apart
    /// from the jitter sleep at the start.
    pub async fn handle_page(&self, html: &str, request: &CrawlRequest) -> Result<()> {
        self.delay.apply().await;
        debug!(
            "handling {:?} page {}: {}",
            request.role, request.page_number, request.url
        );
        match request.role {
            PageRole::List => self.handle_list(html, request).await,
            PageRole::Detail => self.handle_detail(html, request).await,
        }
    }

    /// Log the run outcome. A run that emitted nothing gets a warning; the
    /// site structure may have changed.
    pub async fn log_run_summary(&self) {
        let saved = self.state.saved().await;
        if saved == 0 {
            warn!("no jobs were scraped; check whether the site structure has changed");
        } else {
            info!("crawl finished: {} jobs saved", saved);
        }
    }

    async fn handle_list(&self, html: &str, request: &CrawlRequest) -> Result<()> {
        let Ok(base) = Url::parse(&request.url) else {
            warn!("{}", CrawlError::MalformedUrl(request.url.clone()));
            return Ok(());
        };
        let plan = self.plan_list(html, &base, request.page_number);
        let found_any = !plan.cards.is_empty() || !plan.links.is_empty();
        if !found_any {
            info!("no job links found on page {}", request.page_number);
        }

        let mut newly_queued = 0usize;
        if !self.config.collect_details && !plan.cards.is_empty() {
            // Card data from the embedded payload is cleaner than anchor
            // scraping; prefer it for bare-record collection.
            for card in plan.cards {
                if self.state.budget_met().await {
                    break;
                }
                self.commit_record(card).await;
            }
        } else {
            let remaining = self.state.remaining().await;
            // Over-select against the outstanding budget to absorb later
            // duplicate or invalid detail pages.
            let cap = remaining.saturating_mul(self.config.link_slack_factor);
            let mut selected = 0usize;
            for link in plan.links {
                if selected >= cap {
                    break;
                }
                let normalized = urlnorm::normalize(&link.url);
                if !self.state.try_mark_enqueued(&normalized).await {
                    debug!("skipping already-seen link: {}", normalized);
                    continue;
                }
                selected += 1;
                if self.config.collect_details {
                    self.queue
                        .enqueue(CrawlRequest {
                            url: link.url.clone(),
                            role: PageRole::Detail,
                            page_number: request.page_number,
                        })
                        .await;
                    newly_queued += 1;
                } else {
                    self.commit_record(bare_record_from_link(&link, &normalized))
                        .await;
                }
            }
        }

        let page_budget_ok = request.page_number < self.config.max_pages;
        let continue_paging = page_budget_ok
            && found_any
            && if self.config.collect_details {
                newly_queued > 0
            } else {
                !self.state.budget_met().await
            };
        if continue_paging {
            if let Some(next_url) = plan.next_page {
                info!("enqueueing page {}: {}", request.page_number + 1, next_url);
                self.queue
                    .enqueue(CrawlRequest {
                        url: next_url,
                        role: PageRole::List,
                        page_number: request.page_number + 1,
                    })
                    .await;
            }
        } else {
            info!(
                "pagination stopped: saved={}/{}, page={}/{}",
                self.state.saved().await,
                self.config.results_wanted,
                request.page_number,
                self.config.max_pages
            );
        }
        Ok(())
    }

    fn plan_list(&self, html: &str, base: &Url, page_number: u32) -> ListPlan {
        let document = Html::parse_document(html);
        let cards = if self.config.collect_details {
            Vec::new()
        } else {
            self.extractor.extract_job_cards(&document)
        };
        let links = links::find_job_links(&document, base);
        let next_page = links::find_next_page(&document, base, page_number);
        ListPlan {
            cards,
            links,
            next_page,
        }
    }

    async fn handle_detail(&self, html: &str, request: &CrawlRequest) -> Result<()> {
        // Requests already in flight when the budget closed are no-ops.
        if self.state.budget_met().await {
            debug!("results budget already met, skipping {}", request.url);
            return Ok(());
        }
        let record = self.extract_detail(html, request);
        self.commit_record(record).await;
        Ok(())
    }

    fn extract_detail(&self, html: &str, request: &CrawlRequest) -> JobRecord {
        let document = Html::parse_document(html);
        let degraded = detect_login_wall(&document);
        if degraded {
            warn!(
                "login wall detected on {}, record may be incomplete",
                request.url
            );
        }
        let mut candidate = self
            .extractor
            .extract_job_posting(&document)
            .unwrap_or_default();
        self.extractor.fill_missing(&document, &mut candidate);
        JobRecord {
            title: candidate.title.unwrap_or_default(),
            url: urlnorm::normalize(&request.url),
            company: candidate.company,
            job_type: candidate.job_type,
            category: candidate.category,
            location: candidate.location,
            date_posted: candidate.date_posted,
            salary: candidate.salary,
            description_html: candidate.description_html,
            description_text: candidate.description_text,
            degraded,
            warnings: Vec::new(),
            source: SITE_HOST.to_string(),
        }
    }

    /// Validate, then atomically reserve a budget slot and emit.
    async fn commit_record(&self, mut record: JobRecord) {
        record.url = urlnorm::normalize(&record.url);
        let record = match validate::validate(record) {
            Ok(record) => record,
            Err(reason) => {
                warn!("dropping record: {}", reason);
                return;
            }
        };
        match self.state.try_commit(&record.url).await {
            CommitOutcome::Committed => {
                info!(
                    "saved job: {} ({}/{})",
                    record.title,
                    self.state.saved().await,
                    self.config.results_wanted
                );
                self.sink.emit(record).await;
            }
            CommitOutcome::Duplicate => {
                debug!("duplicate record discarded: {}", record.url);
            }
            CommitOutcome::BudgetExhausted => {
                debug!("results budget met, discarding: {}", record.url);
            }
        }
    }
}

fn detect_login_wall(document: &Html) -> bool {
    let text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    GATING_PHRASES.iter().any(|phrase| text.contains(phrase))
}

fn bare_record_from_link(link: &JobLink, normalized: &str) -> JobRecord {
    let text = link.text.trim();
    let title = if text.is_empty() {
        humanize_slug(normalized)
    } else {
        text.to_string()
    };
    JobRecord {
        title,
        url: normalized.to_string(),
        source: SITE_HOST.to_string(),
        ..JobRecord::default()
    }
}

/// Best-effort title from the URL slug when a link carries no text.
fn humanize_slug(url: &str) -> String {
    let slug = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let slug = slug.split('?').next().unwrap_or_default();
    slug.split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_slug_builds_a_readable_title() {
        assert_eq!(
            humanize_slug("https://remote.co/remote-jobs/senior-rust-engineer-819241"),
            "Senior Rust Engineer 819241"
        );
    }

    #[test]
    fn login_wall_detection_matches_gating_phrases() {
        let walled = Html::parse_document(
            "<html><body><p>Sign in to view this job listing.</p></body></html>",
        );
        assert!(detect_login_wall(&walled));
        let open = Html::parse_document("<html><body><p>Great job.</p></body></html>");
        assert!(!detect_login_wall(&open));
    }
}
