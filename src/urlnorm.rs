//! URL canonicalization for identity comparison.
//!
//! Equality of two normalized URLs is exact string equality; no case or
//! trailing-slash folding is performed. That is a deliberate simplification,
//! not a claim of true URL equivalence.

use url::Url;

/// Query parameters stripped during normalization.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
];

/// Canonicalize a URL for dedupe comparisons: drop the fragment and remove
/// denylisted tracking parameters. A URL that fails to parse is returned
/// unchanged; a malformed URL is never fatal here.
pub fn normalize(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    parsed.set_fragment(None);
    if parsed.query().is_some() {
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &kept {
                serializer.append_pair(key, value);
            }
            let query = serializer.finish();
            parsed.set_query(Some(&query));
        }
    }
    parsed.to_string()
}

/// Resolve a possibly-relative href against a base URL. Returns None for
/// pseudo-hrefs (javascript:, mailto:, fragments, ...), non-HTTP schemes and
/// malformed input.
pub fn resolve(href: &str, base: &Url) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("javascript:")
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("tel:")
        || trimmed.starts_with("data:")
    {
        return None;
    }
    let resolved = base.join(trimmed).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    Some(resolved.to_string())
}
