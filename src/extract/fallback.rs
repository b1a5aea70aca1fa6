//! Per-field heuristic cascades, used only for fields the structured-data
//! pass left empty. Each cascade tries ordered sources and takes the first
//! non-empty hit, so every heuristic stays independently testable.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::sanitize::BOILERPLATE_PHRASES;
use super::{collapse_ws, rows, title_case_joined, JobExtractor};
use crate::core::types::CandidateJob;

/// Minimum plain-text length for a description strategy to win.
const MIN_VIABLE_DESCRIPTION: usize = 100;

/// Minimum paragraph length for the paragraph-sweep description strategy.
const MIN_PARAGRAPH_CHARS: usize = 50;

impl JobExtractor {
    /// Patch every still-empty field of `job` from the page DOM. Fields the
    /// structured-data pass populated are never touched.
    pub fn fill_missing(&self, document: &Html, job: &mut CandidateJob) {
        if job.title.is_none() {
            job.title = self.fallback_title(document);
        }
        if job.company.is_none() {
            job.company = self.fallback_company(document);
        }
        if job.job_type.is_none() {
            job.job_type = self.fallback_job_type(document);
        }
        if job.salary.is_none() {
            job.salary = self.fallback_salary(document);
        }
        if job.location.is_none() {
            job.location = self.fallback_location(document);
        }
        if job.date_posted.is_none() {
            job.date_posted = self.fallback_date_posted(document);
        }
        if job.category.is_none() {
            job.category = self.fallback_category(document);
        }
        if job.description_html.is_none() {
            if let Some(clean) = self.fallback_description(document) {
                job.description_text = Some(self.to_plain_text(&clean));
                job.description_html = Some(clean);
            }
        }
    }

    fn fallback_title(&self, document: &Html) -> Option<String> {
        if let Some(text) = first_text(document, "h1") {
            return Some(text);
        }
        if let Some(text) = first_text(document, "h2") {
            return Some(text);
        }
        if let Some(content) = meta_content(document, "meta[property='og:title']") {
            return Some(content);
        }
        // Page titles carry site branding after a separator; keep the first
        // segment only.
        let title = first_text(document, "title")?;
        let first_segment = ["|", "\u{2013}", "\u{2014}", " - "]
            .iter()
            .fold(title.as_str(), |acc, sep| {
                acc.split(sep).next().unwrap_or(acc)
            });
        let trimmed = first_segment.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn fallback_company(&self, document: &Html) -> Option<String> {
        for selector in ["h1 + h2", "h1 + h3"] {
            if let Some(text) = first_text(document, selector) {
                if text.chars().count() <= 120 {
                    return Some(text);
                }
            }
        }
        if let Some(content) = meta_content(document, "meta[property='og:site_name']") {
            return Some(content);
        }
        first_text(document, "[class*='company']").filter(|t| t.chars().count() <= 120)
    }

    fn fallback_job_type(&self, document: &Html) -> Option<String> {
        if let Some(value) = rows::find_row_value(document, |label| {
            label.contains("job type") || label.contains("employment") || label.contains("schedule")
        }) {
            return Some(value);
        }
        let re_employment =
            Regex::new(r"(?i)\b(full[ -]?time|part[ -]?time|contract|temporary|freelance)\b")
                .unwrap();
        let text = page_text(document);
        re_employment
            .find(&text)
            .map(|m| title_case_joined(m.as_str()))
    }

    fn fallback_salary(&self, document: &Html) -> Option<String> {
        if let Some(value) = rows::find_row_value(document, |label| {
            label.contains("salary")
                || label.contains("compensation")
                || label.contains("pay")
                || label.contains("rate")
        }) {
            return Some(value);
        }
        // Ordered patterns: currency + range, bare range + time unit,
        // currency + single amount. First match wins.
        let patterns = [
            r"(?i)(?:\$|€|£|usd|eur|gbp|cad|aud)\s?\d[\d,]*(?:\.\d+)?\s*[kK]?\s*(?:-|\u{2013}|\u{2014}|to)\s*(?:\$|€|£)?\s?\d[\d,]*(?:\.\d+)?\s*[kK]?",
            r"(?i)\d[\d,]*(?:\.\d+)?\s*(?:-|\u{2013}|\u{2014}|to)\s*\d[\d,]*(?:\.\d+)?\s*(?:per\s+|/\s*)(?:hour|hr|year|yr|annum|month|week|day)",
            r"(?i)(?:\$|€|£|usd|eur|gbp|cad|aud)\s?\d[\d,]*(?:\.\d+)?\s*[kK]?(?:\s*(?:per\s+|/\s*)(?:hour|hr|year|yr|annum|month|week|day))?",
        ];
        let text = page_text(document);
        for pattern in patterns {
            if let Some(m) = Regex::new(pattern).unwrap().find(&text) {
                return Some(collapse_ws(m.as_str()));
            }
        }
        None
    }

    fn fallback_location(&self, document: &Html) -> Option<String> {
        if let Some(value) = rows::find_row_value(document, |label| {
            label == "location" || label.contains("job location") || label.contains("based")
        }) {
            return Some(value);
        }
        for (selector_str, attr) in [
            ("[data-location]", "data-location"),
            ("[data-job-location]", "data-job-location"),
        ] {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element in document.select(&selector) {
                if let Some(value) = element.value().attr(attr) {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
        None
    }

    fn fallback_date_posted(&self, document: &Html) -> Option<String> {
        if let Ok(selector) = Selector::parse("time[datetime]") {
            if let Some(element) = document.select(&selector).next() {
                if let Some(value) = element.value().attr("datetime") {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(to_iso_date(trimmed));
                    }
                }
            }
        }
        rows::find_row_value(document, |label| {
            label.contains("date posted") || label.contains("posted") || label.contains("published")
        })
        .map(|value| to_iso_date(&value))
    }

    fn fallback_category(&self, document: &Html) -> Option<String> {
        if let Some(texts) =
            rows::find_row_anchor_texts(document, |label| label == "categories")
        {
            return Some(texts.join(", "));
        }
        self.category_hint().map(str::to_string)
    }

    fn fallback_description(&self, document: &Html) -> Option<String> {
        let candidates = [
            self.description_known_wrapper(document),
            self.description_main_region(document),
            self.description_after_heading(document),
            self.description_paragraphs(document),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(clean) = self.sanitize_description(&candidate) {
                if self.to_plain_text(&clean).chars().count() >= MIN_VIABLE_DESCRIPTION {
                    return Some(clean);
                }
            }
        }
        None
    }

    /// Strategy 1: a wrapper known to hold the role description.
    fn description_known_wrapper(&self, document: &Html) -> Option<String> {
        for selector_str in [
            "#job-description",
            "[class*='job-description']",
            "[class*='jobDescription']",
            "[class*='job_description']",
        ] {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                return Some(strip_noise_subelements(&element.inner_html()));
            }
        }
        None
    }

    /// Strategy 2: the page's main content region.
    fn description_main_region(&self, document: &Html) -> Option<String> {
        for selector_str in ["main", "article", "[role='main']"] {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                return Some(strip_noise_subelements(&element.inner_html()));
            }
        }
        None
    }

    /// Strategy 3: content following a role/description heading, collected
    /// until the next major heading or a sidebar.
    fn description_after_heading(&self, document: &Html) -> Option<String> {
        let heading_selector = Selector::parse("h1, h2, h3").ok()?;
        let re_heading = Regex::new(
            r"(?i)\b(about the (role|job|position)|description|responsibilities|what you.ll do|overview)\b",
        )
        .unwrap();
        for heading in document.select(&heading_selector) {
            let text = collapse_ws(&heading.text().collect::<String>());
            if !re_heading.is_match(&text) {
                continue;
            }
            let mut parts = Vec::new();
            for sibling in heading.next_siblings() {
                let Some(element) = ElementRef::wrap(sibling) else {
                    continue;
                };
                if matches!(element.value().name(), "h1" | "h2" | "h3") {
                    break;
                }
                if element
                    .value()
                    .classes()
                    .any(|class| class.to_ascii_lowercase().contains("sidebar"))
                {
                    break;
                }
                parts.push(element.html());
            }
            if !parts.is_empty() {
                return Some(parts.join("\n"));
            }
        }
        None
    }

    /// Strategy 4: substantial paragraphs from the content area, minus known
    /// promotional boilerplate.
    fn description_paragraphs(&self, document: &Html) -> Option<String> {
        let scoped = Selector::parse("main p, article p").ok()?;
        let all = Selector::parse("p").ok()?;
        let mut paragraphs: Vec<String> = document
            .select(&scoped)
            .filter_map(paragraph_html)
            .collect();
        if paragraphs.is_empty() {
            paragraphs = document.select(&all).filter_map(paragraph_html).collect();
        }
        if paragraphs.is_empty() {
            None
        } else {
            Some(paragraphs.join("\n"))
        }
    }
}

fn paragraph_html(element: ElementRef) -> Option<String> {
    let text = collapse_ws(&element.text().collect::<String>());
    if text.chars().count() <= MIN_PARAGRAPH_CHARS {
        return None;
    }
    if BOILERPLATE_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        return None;
    }
    Some(element.html())
}

fn first_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    for element in document.select(&selector) {
        let text = collapse_ws(&element.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

fn meta_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let element = document.select(&selector).next()?;
    let content = element.value().attr("content")?.trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

fn page_text(document: &Html) -> String {
    collapse_ws(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Drop sidebar/detail-list/call-to-action blocks from a candidate fragment
/// before sanitization.
fn strip_noise_subelements(html: &str) -> String {
    let re = Regex::new(
        r#"(?is)<(?:div|section|aside|ul|nav)[^>]*?(?:id|class)=(?:'|")[^'">]*(?:sidebar|detail|apply|cta|banner|promo)[^'">]*(?:'|")[^>]*?>.*?</(?:div|section|aside|ul|nav)>"#,
    )
    .unwrap();
    re.replace_all(html, " ").to_string()
}

/// Reformat a date string to ISO-8601 when it parses; keep it raw otherwise.
fn to_iso_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.date_naive().to_string();
    }
    for format in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.to_string();
        }
    }
    trimmed.to_string()
}
