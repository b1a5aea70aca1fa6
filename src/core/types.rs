use serde::{Deserialize, Serialize};

/// Declared role of a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageRole {
    /// A search/listing page enumerating many postings.
    List,
    /// A single posting's full page.
    Detail,
}

/// One unit of fetch work. Created by the traversal controller when enqueuing,
/// consumed exactly once by the fetch substrate, discarded after handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    pub role: PageRole,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
}

fn default_page_number() -> u32 {
    1
}

/// Normalized output record for one job posting. `title` and `url` are the
/// only required fields; everything else degrades to None rather than
/// blocking emission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,
    /// Set when a login wall was detected on the source page; the description
    /// may be incomplete.
    #[serde(default)]
    pub degraded: bool,
    /// Soft-validation annotations (e.g. `missing_company`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub source: String,
}

/// A candidate job-detail link discovered on a LIST page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLink {
    pub url: String,
    pub text: String,
}

/// Per-DETAIL-page accumulator: filled by the structured-data pass, then
/// patched field-by-field by the HTML fallback cascades. Never persisted;
/// lives only for the duration of one DETAIL handling.
#[derive(Debug, Clone, Default)]
pub struct CandidateJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub salary: Option<String>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
}
