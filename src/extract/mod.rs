mod fallback;
mod jsonld;
mod nextdata;
mod rows;
mod sanitize;

use crate::core::config::CrawlerConfig;

/// Multi-strategy field extractor for job pages: structured data first, then
/// per-field HTML fallback cascades, with one shared description sanitizer.
pub struct JobExtractor {
    /// Externally supplied category label, used when the page offers none.
    category_hint: Option<String>,
}

impl JobExtractor {
    pub fn new(category_hint: Option<String>) -> Self {
        Self { category_hint }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        let hint = config.category.trim();
        Self::new(if hint.is_empty() {
            None
        } else {
            Some(hint.to_string())
        })
    }

    pub(super) fn category_hint(&self) -> Option<&str> {
        self.category_hint.as_deref()
    }
}

impl Default for JobExtractor {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub(crate) fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `FULL_TIME` / `full time` / `part-time` to display form `Full-Time`.
pub(crate) fn title_case_joined(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
