//! Structured-data extraction from embedded JSON-LD job postings.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{title_case_joined, JobExtractor};
use crate::core::error::CrawlError;
use crate::core::types::CandidateJob;

impl JobExtractor {
    /// Scan all JSON-LD blocks for a job posting, singular, array-wrapped or
    /// nested under `@graph`. The first matching block wins. Malformed blocks
    /// are skipped silently; one bad block must not sink a page that carries
    /// a good one.
    pub fn extract_job_posting(&self, document: &Html) -> Option<CandidateJob> {
        let selector = Selector::parse("script[type='application/ld+json']").ok()?;
        for script in document.select(&selector) {
            let json_text = script.inner_html();
            if json_text.trim().is_empty() {
                continue;
            }
            let value = match serde_json::from_str::<Value>(&json_text) {
                Ok(value) => value,
                Err(e) => {
                    debug!("{}", CrawlError::StructuredDataParse(e));
                    continue;
                }
            };
            if let Some(posting) = find_posting(&value) {
                return Some(self.map_posting(posting));
            }
        }
        None
    }

    fn map_posting(&self, posting: &serde_json::Map<String, Value>) -> CandidateJob {
        let mut job = CandidateJob {
            title: json_string(posting.get("title")).or_else(|| json_string(posting.get("name"))),
            company: company_name(posting.get("hiringOrganization")),
            location: first_location(posting.get("jobLocation")),
            job_type: employment_type(posting.get("employmentType")),
            salary: format_salary(posting.get("baseSalary")),
            date_posted: json_string(posting.get("datePosted")),
            ..CandidateJob::default()
        };
        if let Some(description) = posting.get("description").and_then(Value::as_str) {
            if let Some(clean) = self.sanitize_description(description) {
                job.description_text = Some(self.to_plain_text(&clean));
                job.description_html = Some(clean);
            }
        }
        job
    }
}

fn find_posting(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().find_map(find_posting),
        Value::Object(map) => {
            if is_job_posting(map.get("@type")) {
                return Some(map);
            }
            map.get("@graph").and_then(find_posting)
        }
        _ => None,
    }
}

fn is_job_posting(type_value: Option<&Value>) -> bool {
    match type_value {
        Some(Value::String(s)) => s == "JobPosting",
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some("JobPosting")),
        _ => false,
    }
}

/// String-or-first-of-array-or-object-name, trimmed and non-empty.
fn json_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|item| json_string(Some(item))),
        Value::Object(map) => json_string(map.get("name")),
        _ => None,
    }
}

/// Organization name when given as an object, the raw string when bare.
fn company_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Object(map) => json_string(map.get("name")),
        Value::Array(items) => items.iter().find_map(|item| company_name(Some(item))),
        _ => None,
    }
}

/// First of locality, region or street address from the possibly
/// array-wrapped jobLocation field.
fn first_location(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => items.iter().find_map(|item| first_location(Some(item))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Object(place) => {
            let address = place.get("address")?;
            match address {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                }
                Value::Object(map) => ["addressLocality", "addressRegion", "streetAddress"]
                    .iter()
                    .find_map(|key| json_string(map.get(*key))),
                _ => None,
            }
        }
        _ => None,
    }
}

/// First element when array-valued, display-cased: `FULL_TIME` to `Full-Time`.
fn employment_type(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.as_str().map(str::to_string)),
        _ => None,
    }?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(title_case_joined(trimmed))
    }
}

/// `"<currency> <value>"` for a single amount, `"<currency> <min> - <max>"`
/// for a range, None otherwise.
fn format_salary(value: Option<&Value>) -> Option<String> {
    let base = value?.as_object()?;
    let currency = base
        .get("currency")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    let amount = base.get("value")?;
    match amount {
        Value::Object(inner) => {
            if let (Some(min), Some(max)) = (
                format_number(inner.get("minValue")),
                format_number(inner.get("maxValue")),
            ) {
                return Some(format!("{} {} - {}", currency, min, max));
            }
            format_number(inner.get("value")).map(|v| format!("{} {}", currency, v))
        }
        other => format_number(Some(other)).map(|v| format!("{} {}", currency, v)),
    }
}

fn format_number(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            } else {
                None
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}
