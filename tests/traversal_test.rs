//! Traversal scenarios: budgets, dedupe, pagination and bare-record mode.

use std::sync::Arc;

use async_trait::async_trait;
use job_scout::{
    CollectingSink, CrawlRequest, CrawlerConfig, PageRole, RequestQueue, TraversalController,
};
use tokio::sync::Mutex;

#[derive(Default)]
struct RecordingQueue {
    requests: Mutex<Vec<CrawlRequest>>,
}

impl RecordingQueue {
    async fn all(&self) -> Vec<CrawlRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl RequestQueue for RecordingQueue {
    async fn enqueue(&self, request: CrawlRequest) {
        self.requests.lock().await.push(request);
    }
}

fn quiet_config() -> CrawlerConfig {
    CrawlerConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
        ..CrawlerConfig::default()
    }
}

fn build(
    config: CrawlerConfig,
) -> (
    Arc<TraversalController>,
    Arc<RecordingQueue>,
    Arc<CollectingSink>,
) {
    let queue = Arc::new(RecordingQueue::default());
    let sink = Arc::new(CollectingSink::new());
    let controller = Arc::new(TraversalController::new(config, queue.clone(), sink.clone()));
    (controller, queue, sink)
}

fn list_request(page_number: u32) -> CrawlRequest {
    CrawlRequest {
        url: format!(
            "https://remote.co/remote-jobs/search?searchkeyword=rust{}",
            if page_number > 1 {
                format!("&page={}", page_number)
            } else {
                String::new()
            }
        ),
        role: PageRole::List,
        page_number,
    }
}

fn list_page_with_jobs(slugs: &[&str]) -> String {
    let anchors: String = slugs
        .iter()
        .map(|slug| format!(r#"<a href="/remote-jobs/{}">{}</a>"#, slug, slug))
        .collect();
    format!(
        r#"<html><head><link rel="next" href="/remote-jobs/search?searchkeyword=rust&page=99"></head>
        <body>{}</body></html>"#,
        anchors
    )
}

#[tokio::test]
async fn list_page_enqueues_details_and_next_page() {
    let (controller, queue, _sink) = build(quiet_config());
    let html = list_page_with_jobs(&["alpha-job-101", "beta-job-202"]);
    controller
        .handle_page(&html, &list_request(1))
        .await
        .unwrap();

    let requests = queue.all().await;
    let details: Vec<_> = requests
        .iter()
        .filter(|r| r.role == PageRole::Detail)
        .collect();
    let lists: Vec<_> = requests
        .iter()
        .filter(|r| r.role == PageRole::List)
        .collect();
    assert_eq!(details.len(), 2);
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].page_number, 2);
}

#[tokio::test]
async fn pagination_stops_at_max_pages() {
    let config = CrawlerConfig {
        max_pages: 2,
        ..quiet_config()
    };
    let (controller, queue, _sink) = build(config);
    // Page 2 has valid job links AND a valid next-page link; a page-3 LIST
    // request must still never be dispatched.
    let html = list_page_with_jobs(&["gamma-job-303", "delta-job-404"]);
    controller
        .handle_page(&html, &list_request(2))
        .await
        .unwrap();

    let requests = queue.all().await;
    assert!(requests.iter().any(|r| r.role == PageRole::Detail));
    assert!(!requests.iter().any(|r| r.role == PageRole::List));
}

#[tokio::test]
async fn repeated_list_pages_do_not_requeue_seen_links() {
    let config = CrawlerConfig {
        max_pages: 1,
        ..quiet_config()
    };
    let (controller, queue, _sink) = build(config);
    let html = list_page_with_jobs(&["epsilon-job-505"]);
    controller
        .handle_page(&html, &list_request(1))
        .await
        .unwrap();
    controller
        .handle_page(&html, &list_request(1))
        .await
        .unwrap();

    let details: Vec<_> = queue
        .all()
        .await
        .into_iter()
        .filter(|r| r.role == PageRole::Detail)
        .collect();
    assert_eq!(details.len(), 1);
}

#[tokio::test]
async fn bare_mode_emits_capped_by_results_budget() {
    let config = CrawlerConfig {
        collect_details: false,
        results_wanted: 2,
        ..quiet_config()
    };
    let (controller, queue, sink) = build(config);
    let html = list_page_with_jobs(&[
        "job-one-1",
        "job-two-2",
        "job-three-3",
        "job-four-4",
        "job-five-5",
    ]);
    controller
        .handle_page(&html, &list_request(1))
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 2);
    // Budget met; bare mode must not paginate further.
    assert!(!queue.all().await.iter().any(|r| r.role == PageRole::List));
    // Bare records still carry title and normalized url.
    assert_eq!(records[0].title, "job-one-1");
    assert!(records[0].url.ends_with("/remote-jobs/job-one-1"));
}

#[tokio::test]
async fn bare_mode_prefers_embedded_job_cards() {
    let config = CrawlerConfig {
        collect_details: false,
        ..quiet_config()
    };
    let (controller, _queue, sink) = build(config);
    let html = r#"<html><body>
        <script id="__NEXT_DATA__" type="application/json">{"props": {"pageProps": {"jobCardData": {"jobs": {"results": [
            {"slug": "senior-rust-engineer-819241", "title": "Senior Rust Engineer", "company": "Acme",
             "jobLocations": ["Remote"], "jobSchedules": ["Full-Time"], "salaryRange": "$120k+",
             "postedDate": "2026-02-11"},
            {"slug": "qa-analyst-771203", "title": "QA Analyst"}
        ]}}}}}</script>
        </body></html>"#;
    controller
        .handle_page(html, &list_request(1))
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Senior Rust Engineer");
    assert_eq!(records[0].company.as_deref(), Some("Acme"));
    assert_eq!(records[0].source, "remote.co");
    assert_eq!(records[1].title, "QA Analyst");
}

#[tokio::test]
async fn emitted_urls_are_unique_across_concurrent_details() {
    let config = CrawlerConfig {
        results_wanted: 10,
        ..quiet_config()
    };
    let (controller, _queue, sink) = build(config);

    let page = "<html><body><h1>Duplicated Role</h1></body></html>";
    // The same normalized URL reached via different raw URLs races to emit;
    // only one record may survive.
    let raw_urls = [
        "https://remote.co/remote-jobs/duplicated-role-42",
        "https://remote.co/remote-jobs/duplicated-role-42?utm_source=feed",
        "https://remote.co/remote-jobs/duplicated-role-42#apply",
    ];
    let mut handles = Vec::new();
    for url in raw_urls {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            controller
                .handle_page(
                    page,
                    &CrawlRequest {
                        url: url.to_string(),
                        role: PageRole::Detail,
                        page_number: 1,
                    },
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].url,
        "https://remote.co/remote-jobs/duplicated-role-42"
    );
}

#[tokio::test]
async fn concurrent_details_never_exceed_results_budget() {
    let config = CrawlerConfig {
        results_wanted: 2,
        ..quiet_config()
    };
    let (controller, _queue, sink) = build(config);

    let mut handles = Vec::new();
    for i in 0..6 {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            let html = format!("<html><body><h1>Role {}</h1></body></html>", i);
            controller
                .handle_page(
                    &html,
                    &CrawlRequest {
                        url: format!("https://remote.co/remote-jobs/role-{}", i),
                        role: PageRole::Detail,
                        page_number: 1,
                    },
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(sink.records().await.len() <= 2);
    assert_eq!(controller.state().saved().await, sink.records().await.len());
}

#[tokio::test]
async fn zero_link_list_page_stops_traversal() {
    let (controller, queue, sink) = build(quiet_config());
    let html = "<html><body><p>No jobs matched your search.</p></body></html>";
    controller
        .handle_page(html, &list_request(1))
        .await
        .unwrap();
    assert!(queue.all().await.is_empty());
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn seed_requests_start_at_page_one() {
    let (controller, _queue, _sink) = build(quiet_config());
    let seeds = controller.seed_requests();
    assert_eq!(seeds.len(), 1);
    assert_eq!(seeds[0].role, PageRole::List);
    assert_eq!(seeds[0].page_number, 1);
    assert!(seeds[0].url.contains("searchkeyword=software+engineer"));
}
