//! Job cards embedded in the Next.js hydration payload of LIST pages.
//!
//! When the site ships card data in `#__NEXT_DATA__`, those cards are a
//! cleaner source than the rendered DOM and are preferred for bare-record
//! collection.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;

use super::JobExtractor;
use crate::core::config::{JOB_DETAIL_PREFIX, SITE_HOST};
use crate::core::types::JobRecord;

impl JobExtractor {
    /// Extract bare job records from the embedded `__NEXT_DATA__` blob.
    /// Returns an empty vec when the blob is absent, unparseable or carries
    /// no card data.
    pub fn extract_job_cards(&self, document: &Html) -> Vec<JobRecord> {
        let Ok(selector) = Selector::parse("script#__NEXT_DATA__") else {
            return Vec::new();
        };
        let Some(script) = document.select(&selector).next() else {
            return Vec::new();
        };
        let raw = script.inner_html();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            warn!("__NEXT_DATA__ present but not parseable as JSON");
            return Vec::new();
        };
        let Some(results) = data
            .pointer("/props/pageProps/jobCardData/jobs/results")
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        results
            .iter()
            .filter_map(|card| self.map_job_card(card))
            .collect()
    }

    fn map_job_card(&self, card: &Value) -> Option<JobRecord> {
        let slug = card.get("slug").and_then(Value::as_str)?.trim();
        let title = card.get("title").and_then(Value::as_str)?.trim();
        if slug.is_empty() || title.is_empty() {
            return None;
        }
        Some(JobRecord {
            title: title.to_string(),
            url: format!("{}{}", JOB_DETAIL_PREFIX, slug),
            company: opt_string(card.get("company")),
            location: join_string_list(card.get("jobLocations")),
            job_type: join_string_list(card.get("jobSchedules")),
            salary: opt_string(card.get("salaryRange")),
            date_posted: opt_string(card.get("postedDate")),
            category: self.category_hint().map(str::to_string),
            source: SITE_HOST.to_string(),
            ..JobRecord::default()
        })
    }
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn join_string_list(value: Option<&Value>) -> Option<String> {
    let items = value?.as_array()?;
    let joined = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
