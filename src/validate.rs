//! Minimum-viable-record enforcement before emission.

use crate::core::error::CrawlError;
use crate::core::types::JobRecord;

/// Hard requirements reject the record; soft requirements only annotate it.
/// Optional fields that normalize to empty or whitespace-only strings are
/// coerced to None first, so downstream consumers see a consistent
/// null-vs-absent convention rather than empty strings.
pub fn validate(mut record: JobRecord) -> Result<JobRecord, CrawlError> {
    record.title = record.title.trim().to_string();
    record.url = record.url.trim().to_string();
    record.company = clean_optional(record.company);
    record.job_type = clean_optional(record.job_type);
    record.category = clean_optional(record.category);
    record.location = clean_optional(record.location);
    record.date_posted = clean_optional(record.date_posted);
    record.salary = clean_optional(record.salary);
    record.description_html = clean_optional(record.description_html);
    record.description_text = clean_optional(record.description_text);

    if record.title.is_empty() {
        return Err(CrawlError::Validation {
            reason: "missing title".to_string(),
        });
    }
    if record.url.is_empty() {
        return Err(CrawlError::Validation {
            reason: "missing url".to_string(),
        });
    }

    if record.company.is_none() {
        record.warnings.push("missing_company".to_string());
    }
    if record.description_text.is_none() {
        record.warnings.push("missing_description".to_string());
    }
    Ok(record)
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
