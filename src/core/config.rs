use std::collections::BTreeMap;

use serde::Deserialize;
use url::Url;

use crate::core::types::{CrawlRequest, PageRole};

/// Host of the target site; also stamped on emitted records as `source`.
pub const SITE_HOST: &str = "remote.co";

pub(crate) const SEARCH_URL: &str = "https://remote.co/remote-jobs/search";
pub(crate) const JOB_DETAIL_PREFIX: &str = "https://remote.co/remote-jobs/";

/// Configuration surface for one crawl run. Consumed by the core, owned by
/// the caller; deserializable so callers can pass it straight from JSON input.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Search keyword merged into the synthesized start URL.
    pub keyword: String,
    pub location: String,
    /// Category filter; also used as the category hint when a DETAIL page
    /// offers no category of its own.
    pub category: String,
    /// Explicit seed URLs. When empty, a search URL is synthesized from
    /// keyword/location/category.
    pub start_urls: Vec<String>,
    /// Results budget. Minimum 1.
    pub results_wanted: usize,
    /// Page-number budget for LIST pagination. Minimum 1.
    pub max_pages: u32,
    /// When false, LIST handling emits bare records directly instead of
    /// enqueueing DETAIL fetches.
    pub collect_details: bool,
    pub dedupe: bool,
    /// Jitter sleep bounds applied at the start of each handler invocation.
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Worker-pool width of the default fetch substrate.
    pub max_concurrency: usize,
    /// Over-fetch multiplier on the outstanding results budget when selecting
    /// candidate links from a LIST page. Slack absorbs later duplicate or
    /// invalid detail pages.
    pub link_slack_factor: usize,
    pub cookies: Option<CookieInput>,
    /// Opaque to the core; handed to the HTTP client as-is.
    pub proxy: Option<String>,
}

/// Custom cookies, either as a raw header string or a name/value map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CookieInput {
    Header(String),
    Map(BTreeMap<String, String>),
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            keyword: "software engineer".to_string(),
            location: String::new(),
            category: String::new(),
            start_urls: Vec::new(),
            results_wanted: 50,
            max_pages: 10,
            collect_details: true,
            dedupe: true,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            max_concurrency: 10,
            link_slack_factor: 2,
            cookies: None,
            proxy: None,
        }
    }
}

impl CrawlerConfig {
    /// Clamp caller-supplied numbers into usable ranges: both budgets are at
    /// least 1 and reversed delay bounds are swapped.
    pub fn clamped(mut self) -> Self {
        self.results_wanted = self.results_wanted.max(1);
        self.max_pages = self.max_pages.max(1);
        self.max_concurrency = self.max_concurrency.max(1);
        self.link_slack_factor = self.link_slack_factor.max(1);
        if self.min_delay_ms > self.max_delay_ms {
            std::mem::swap(&mut self.min_delay_ms, &mut self.max_delay_ms);
        }
        self
    }

    /// Build the search URL for a given page, merging keyword, location and
    /// category into query parameters. Page 1 carries no `page` parameter.
    pub fn search_url(&self, page: u32) -> String {
        let mut url = Url::parse(SEARCH_URL).expect("search url constant parses");
        {
            let mut pairs = url.query_pairs_mut();
            let keyword = self.keyword.trim();
            if !keyword.is_empty() {
                pairs.append_pair("searchkeyword", keyword);
            }
            pairs.append_pair("useclocation", "true");
            let location = self.location.trim();
            if !location.is_empty() {
                pairs.append_pair("location", location);
            }
            let category = self.category.trim();
            if !category.is_empty() {
                pairs.append_pair("category", category);
            }
            if page > 1 {
                pairs.append_pair("page", &page.to_string());
            }
        }
        url.to_string()
    }

    /// Initial LIST(1) requests: explicit seeds belonging to the target site,
    /// else one synthesized search request.
    pub fn seed_requests(&self) -> Vec<CrawlRequest> {
        let seeds: Vec<CrawlRequest> = self
            .start_urls
            .iter()
            .filter(|u| u.contains(SITE_HOST))
            .map(|u| CrawlRequest {
                url: u.clone(),
                role: PageRole::List,
                page_number: 1,
            })
            .collect();
        if seeds.is_empty() {
            vec![CrawlRequest {
                url: self.search_url(1),
                role: PageRole::List,
                page_number: 1,
            }]
        } else {
            seeds
        }
    }

    /// Render the configured cookies as a `Cookie:` header value.
    pub fn cookie_header(&self) -> Option<String> {
        match &self.cookies {
            Some(CookieInput::Header(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(CookieInput::Map(map)) => {
                if map.is_empty() {
                    None
                } else {
                    Some(
                        map.iter()
                            .map(|(name, value)| format!("{}={}", name, value))
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                }
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_budgets_to_at_least_one() {
        let config = CrawlerConfig {
            results_wanted: 0,
            max_pages: 0,
            max_concurrency: 0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.results_wanted, 1);
        assert_eq!(config.max_pages, 1);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn swaps_reversed_delay_bounds() {
        let config = CrawlerConfig {
            min_delay_ms: 2000,
            max_delay_ms: 100,
            ..Default::default()
        }
        .clamped();
        assert!(config.min_delay_ms <= config.max_delay_ms);
    }

    #[test]
    fn search_url_merges_query_parameters() {
        let config = CrawlerConfig {
            keyword: "rust developer".to_string(),
            location: "Europe".to_string(),
            ..Default::default()
        };
        let url = config.search_url(1);
        assert!(url.contains("searchkeyword=rust+developer"));
        assert!(url.contains("location=Europe"));
        assert!(!url.contains("page="));

        let page3 = config.search_url(3);
        assert!(page3.contains("page=3"));
    }

    #[test]
    fn seed_requests_prefer_explicit_site_urls() {
        let config = CrawlerConfig {
            start_urls: vec![
                "https://remote.co/remote-jobs/search?searchkeyword=qa".to_string(),
                "https://elsewhere.example/jobs".to_string(),
            ],
            ..Default::default()
        };
        let seeds = config.seed_requests();
        assert_eq!(seeds.len(), 1);
        assert!(seeds[0].url.contains("remote.co"));
        assert_eq!(seeds[0].page_number, 1);
    }

    #[test]
    fn cookie_map_renders_as_header() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "1".to_string());
        map.insert("b".to_string(), "2".to_string());
        let config = CrawlerConfig {
            cookies: Some(CookieInput::Map(map)),
            ..Default::default()
        };
        assert_eq!(config.cookie_header().as_deref(), Some("a=1; b=2"));
    }
}
