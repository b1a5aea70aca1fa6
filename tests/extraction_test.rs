//! End-to-end extraction scenarios: DETAIL pages through the traversal
//! controller, structured data against HTML fallbacks.

use std::sync::Arc;

use async_trait::async_trait;
use job_scout::{
    CollectingSink, CrawlRequest, CrawlerConfig, PageRole, RequestQueue, TraversalController,
};
use tokio::sync::Mutex;

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct RecordingQueue {
    requests: Mutex<Vec<CrawlRequest>>,
}

#[async_trait]
impl RequestQueue for RecordingQueue {
    async fn enqueue(&self, request: CrawlRequest) {
        self.requests.lock().await.push(request);
    }
}

fn controller(config: CrawlerConfig) -> (Arc<TraversalController>, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let queue = Arc::new(RecordingQueue::default());
    let controller = Arc::new(TraversalController::new(config, queue, sink.clone()));
    (controller, sink)
}

fn quiet_config() -> CrawlerConfig {
    CrawlerConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
        ..CrawlerConfig::default()
    }
}

fn detail_request(url: &str) -> CrawlRequest {
    CrawlRequest {
        url: url.to_string(),
        role: PageRole::Detail,
        page_number: 1,
    }
}

fn happy_path_page() -> String {
    // The closing script tag is JSON-escaped (`<\/script>`) the way real
    // sites embed it, so the outer JSON-LD script element is not terminated
    // early by the HTML tokenizer.
    let description = format!(
        "<div><script>track()<\\/script><p>{}</p><div>Sign up to view this job</div></div>",
        "You will own backend services end to end and mentor other engineers on the team. "
            .repeat(3)
    );
    format!(
        r#"<html><head>
        <script type="application/ld+json">{{
            "@context": "https://schema.org/",
            "@type": "JobPosting",
            "title": "Senior Backend Engineer",
            "hiringOrganization": {{"@type": "Organization", "name": "Acme Corp"}},
            "jobLocation": {{"@type": "Place", "address": {{"addressLocality": "Berlin"}}}},
            "employmentType": "FULL_TIME",
            "baseSalary": {{"@type": "MonetaryAmount", "currency": "USD",
                           "value": {{"minValue": 50000, "maxValue": 70000}}}},
            "datePosted": "2026-03-02",
            "description": "{}"
        }}</script>
        </head><body><h1>A Different DOM Title</h1></body></html>"#,
        description.replace('"', "")
    )
}

#[tokio::test]
async fn happy_path_record_comes_from_structured_data() {
    init_logger();
    let (controller, sink) = controller(quiet_config());
    let request =
        detail_request("https://remote.co/remote-jobs/senior-backend-engineer-819241?utm_source=x");
    controller
        .handle_page(&happy_path_page(), &request)
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];

    // Every field originates from the structured block; the DOM h1 loses.
    assert_eq!(record.title, "Senior Backend Engineer");
    assert_eq!(record.company.as_deref(), Some("Acme Corp"));
    assert_eq!(record.location.as_deref(), Some("Berlin"));
    assert_eq!(record.job_type.as_deref(), Some("Full-Time"));
    assert_eq!(record.salary.as_deref(), Some("USD 50000 - 70000"));
    assert_eq!(record.date_posted.as_deref(), Some("2026-03-02"));

    // Tracking parameters are stripped from the emitted URL.
    assert_eq!(
        record.url,
        "https://remote.co/remote-jobs/senior-backend-engineer-819241"
    );

    // The description is sanitized: no scripts, no boilerplate.
    let description = record.description_html.as_deref().unwrap();
    assert!(!description.contains("<script"));
    assert!(!description.contains("Sign up to view this job"));
    assert!(record
        .description_text
        .as_deref()
        .unwrap()
        .contains("backend services"));
    assert!(!record.degraded);
    assert!(record.warnings.is_empty());
}

#[tokio::test]
async fn fallback_path_uses_heading_and_label_row() {
    init_logger();
    let (controller, sink) = controller(quiet_config());
    let html = "<html><body>\
        <h1>Senior Engineer</h1>\
        <ul><li><span>Location</span><span>Remote \u{2014} USA</span></li></ul>\
        </body></html>";
    controller
        .handle_page(html, &detail_request("https://remote.co/remote-jobs/senior-engineer-4411"))
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.title, "Senior Engineer");
    assert_eq!(record.location.as_deref(), Some("Remote \u{2014} USA"));
    // Soft requirements annotate instead of blocking.
    assert!(record.warnings.contains(&"missing_company".to_string()));
    assert!(record.warnings.contains(&"missing_description".to_string()));
}

#[tokio::test]
async fn titleless_page_is_never_emitted() {
    init_logger();
    let (controller, sink) = controller(quiet_config());
    let html = "<html><body><div><p>Some stray text without any heading.</p></div></body></html>";
    controller
        .handle_page(html, &detail_request("https://remote.co/remote-jobs/mystery-1"))
        .await
        .unwrap();
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn login_wall_flags_record_as_degraded_but_emits() {
    init_logger();
    let (controller, sink) = controller(quiet_config());
    let html = "<html><body>\
        <h1>Account Manager</h1>\
        <p>Sign in to view this job and its full description.</p>\
        </body></html>";
    controller
        .handle_page(html, &detail_request("https://remote.co/remote-jobs/account-manager-909"))
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].degraded);
    assert_eq!(records[0].title, "Account Manager");
}

#[tokio::test]
async fn detail_enqueued_by_list_can_still_emit() {
    init_logger();
    let sink = Arc::new(CollectingSink::new());
    let queue = Arc::new(RecordingQueue::default());
    let controller = Arc::new(TraversalController::new(
        quiet_config(),
        queue.clone(),
        sink.clone(),
    ));

    let list_html = r#"<html><body>
        <a href="/remote-jobs/platform-engineer-5150">Platform Engineer</a>
    </body></html>"#;
    controller
        .handle_page(
            list_html,
            &CrawlRequest {
                url: "https://remote.co/remote-jobs/search?searchkeyword=platform".to_string(),
                role: PageRole::List,
                page_number: 1,
            },
        )
        .await
        .unwrap();

    let queued = queue.requests.lock().await.clone();
    let detail = queued
        .iter()
        .find(|r| r.role == PageRole::Detail)
        .expect("a detail request was enqueued");

    let detail_html = "<html><body><h1>Platform Engineer</h1></body></html>";
    controller
        .handle_page(detail_html, &detail.clone())
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Platform Engineer");
}
