//! Link classification for LIST pages: recover job-detail URLs from anchors
//! and data attributes, and locate the next pagination URL.

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::core::types::JobLink;
use crate::extract::collapse_ws;
use crate::urlnorm;

/// Path segment under which job postings live.
pub const JOB_PATH_SEGMENT: &str = "/remote-jobs/";

/// Find job-detail links by trying strategies in order and stopping at the
/// first one that yields any result. Later strategies are broader fallbacks
/// for site-structure drift; combining them with earlier hits would dilute
/// precision with false positives, so they are intentionally kept separate.
pub fn find_job_links(document: &Html, base: &Url) -> Vec<JobLink> {
    let strategies: &[(&str, fn(&Html, &Url) -> Vec<JobLink>)] = &[
        ("detail-path", detail_path_anchors),
        ("job-card", job_card_anchors),
        ("data-attribute", data_attribute_urls),
        ("section-path", section_path_anchors),
        ("uuid", uuid_anchors),
    ];
    for (name, strategy) in strategies {
        let links = strategy(document, base);
        if !links.is_empty() {
            debug!("link strategy '{}' matched {} links", name, links.len());
            return links;
        }
    }
    Vec::new()
}

/// Strategy 1: anchors whose href carries the job-detail path with a slug
/// embedding the posting id (detail slugs contain a digit, category slugs
/// do not).
fn detail_path_anchors(document: &Html, base: &Url) -> Vec<JobLink> {
    let re_detail_slug = Regex::new(r"/remote-jobs/[a-z0-9-]*\d[a-z0-9-]*").unwrap();
    collect_anchors(document, base, "a[href]", |url| {
        let path = url.path();
        re_detail_slug.is_match(path) && !path.contains("/search")
    })
}

/// Strategy 2: anchors inside recognized job-card containers.
fn job_card_anchors(document: &Html, base: &Url) -> Vec<JobLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for selector_str in [
        "[class*='job-card'] a[href]",
        "article[class*='job'] a[href]",
        "li[class*='job'] a[href]",
        "[data-testid*='job-card'] a[href]",
    ] {
        for link in collect_anchors(document, base, selector_str, |_| true) {
            if seen.insert(link.url.clone()) {
                links.push(link);
            }
        }
    }
    links
}

/// Strategy 3: elements carrying a job-identifying data attribute with an
/// embedded URL.
fn data_attribute_urls(document: &Html, base: &Url) -> Vec<JobLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for (selector_str, attr) in [
        ("[data-job-url]", "data-job-url"),
        ("[data-job-id][data-url]", "data-url"),
    ] {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            let Some(url) = urlnorm::resolve(raw, base) else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(JobLink {
                    url,
                    text: collapse_ws(&element.text().collect::<String>()),
                });
            }
        }
    }
    links
}

/// Strategy 4: any link under the job path, excluding search and pagination.
fn section_path_anchors(document: &Html, base: &Url) -> Vec<JobLink> {
    collect_anchors(document, base, "a[href]", |url| {
        let path = url.path();
        path.starts_with(JOB_PATH_SEGMENT)
            && path.len() > JOB_PATH_SEGMENT.len()
            && !path.contains("/search")
            && !url.query().unwrap_or("").contains("page=")
    })
}

/// Strategy 5 (last resort): any href with a UUID-shaped token.
fn uuid_anchors(document: &Html, base: &Url) -> Vec<JobLink> {
    let re_uuid = Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    collect_anchors(document, base, "a[href]", |url| {
        re_uuid.is_match(url.as_str()) && !url.path().contains("/search")
    })
}

fn collect_anchors<F>(document: &Html, base: &Url, selector_str: &str, keep: F) -> Vec<JobLink>
where
    F: Fn(&Url) -> bool,
{
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(resolved) = urlnorm::resolve(href, base) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&resolved) else {
            continue;
        };
        if !keep(&parsed) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            links.push(JobLink {
                url: resolved,
                text: collapse_ws(&element.text().collect::<String>()),
            });
        }
    }
    links
}

/// Locate the next LIST page: an explicit rel=next link, else a pagination
/// link whose `page` parameter is `current_page + 1`, else a synthesized URL
/// with the `page` parameter set on the current one.
pub fn find_next_page(document: &Html, base: &Url, current_page: u32) -> Option<String> {
    for selector_str in ["link[rel='next']", "a[rel='next']"] {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = urlnorm::resolve(href, base) {
                    return Some(resolved);
                }
            }
        }
    }

    let next_number = current_page + 1;
    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(resolved) = urlnorm::resolve(href, base) else {
                continue;
            };
            let Ok(parsed) = Url::parse(&resolved) else {
                continue;
            };
            let is_next = parsed
                .query_pairs()
                .any(|(key, value)| key == "page" && value.parse::<u32>() == Ok(next_number));
            if is_next {
                return Some(resolved);
            }
        }
    }

    // Synthesize by setting the page parameter on the current URL.
    let mut next = base.clone();
    let kept: Vec<(String, String)> = next
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        pairs.append_pair("page", &next_number.to_string());
    }
    Some(next.to_string())
}
