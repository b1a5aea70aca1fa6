//! Description sanitizer: strips non-content markup, marketing boilerplate
//! and navigation residue from a raw description fragment. Step order
//! matters; later passes assume earlier ones already ran.

use regex::Regex;
use scraper::{ElementRef, Html};

use super::JobExtractor;

/// Marketing/navigation phrases removed when an element's text matches one
/// exactly. Also used to exclude promotional paragraphs in the description
/// fallback.
pub(crate) const BOILERPLATE_PHRASES: &[&str] = &[
    "Join Remote.co to Unlock & View This Job",
    "Sign up to view this job",
    "Unlock your remote career",
    "Find your next remote job",
    "Get new remote jobs sent to your inbox",
    "Apply for this Position",
    "Save this job",
    "Share this job",
];

/// Generated class-name prefix on presentation-only wrapper containers.
/// A build artifact of the site's styling pipeline; wrappers carrying it are
/// unwrapped, their content preserved.
const GENERATED_WRAPPER_PREFIX: &str = "sc-";

const ALLOWED_ATTRS: &[&str] = &["href", "src", "alt", "title"];

/// Cap on empty-element removal sweeps; bounds the cost of cascading
/// empty-container cleanup.
const MAX_EMPTY_SWEEPS: usize = 10;

/// Minimum plain-text length for a sanitized description to count as content.
const MIN_DESCRIPTION_CHARS: usize = 50;

impl JobExtractor {
    /// Clean a raw description fragment. Returns None when the surviving
    /// content is below the minimum viable length.
    pub fn sanitize_description(&self, fragment: &str) -> Option<String> {
        let mut html = fragment.to_string();

        // 1. Non-content embeds.
        let re_embeds = Regex::new(
            r"(?is)<(?:script|style|noscript|svg|canvas|iframe)[^>]*?>.*?</(?:script|style|noscript|svg|canvas|iframe)>",
        )
        .unwrap();
        html = re_embeds.replace_all(&html, " ").to_string();

        // 2. Structural navigation and breadcrumbs.
        let re_structural =
            Regex::new(r"(?is)<(?:nav|header|footer|aside)[^>]*?>.*?</(?:nav|header|footer|aside)>")
                .unwrap();
        html = re_structural.replace_all(&html, " ").to_string();
        let re_breadcrumb = Regex::new(
            r#"(?is)<(?:div|ol|ul|section)[^>]*?(?:id|class|aria-label)=(?:'|")[^'">]*breadcrumb[^'">]*(?:'|")[^>]*?>.*?</(?:div|ol|ul|section)>"#,
        )
        .unwrap();
        html = re_breadcrumb.replace_all(&html, " ").to_string();

        // 3. Exact-text marketing boilerplate.
        for phrase in BOILERPLATE_PHRASES {
            let pattern = format!(
                r"(?is)<(?:p|div|span|a|h2|h3|h4|button|li)[^>]*>\s*{}\s*</(?:p|div|span|a|h2|h3|h4|button|li)>",
                regex::escape(phrase)
            );
            html = Regex::new(&pattern).unwrap().replace_all(&html, " ").to_string();
        }

        // 4. The structured detail-list block; its fields are extracted
        // discretely and must not duplicate into the description.
        let re_detail_list = Regex::new(
            r#"(?is)<(?:ul|div|dl)[^>]*?(?:id|class)=(?:'|")[^'">]*(?:detail|job-meta|job-info)[^'">]*(?:'|")[^>]*?>.*?</(?:ul|div|dl)>"#,
        )
        .unwrap();
        html = re_detail_list.replace_all(&html, " ").to_string();

        // 5. Anchors to sibling category-listing pages. Category slugs carry
        // no digits; posting slugs embed the job id, so they survive.
        let re_category_anchor = Regex::new(
            r#"(?is)<a[^>]*href=(?:'|")[^'"]*/remote-jobs/[a-z][a-z-]*/?(?:'|")[^>]*>.*?</a>"#,
        )
        .unwrap();
        html = re_category_anchor.replace_all(&html, " ").to_string();

        // 6. Unwrap generated presentation wrappers.
        html = unwrap_generated_wrappers(&html);

        // 7. Attribute allowlist.
        html = strip_attributes(&html);

        // 8. Iterative empty-element removal.
        let re_empty = empty_element_regex();
        for _ in 0..MAX_EMPTY_SWEEPS {
            let next = re_empty.replace_all(&html, " ").to_string();
            if next == html {
                break;
            }
            html = next;
        }

        // 9. Character entities.
        html = decode_entities(&html);

        // 10. Whitespace.
        let re_ws = Regex::new(r"\s+").unwrap();
        let html = re_ws.replace_all(&html, " ").trim().to_string();

        if self.to_plain_text(&html).chars().count() < MIN_DESCRIPTION_CHARS {
            return None;
        }
        Some(html)
    }

    /// Markup-free derivative of a cleaned fragment: re-parse, take text
    /// nodes only, collapse whitespace.
    pub fn to_plain_text(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        super::collapse_ws(&text)
    }
}

/// Replace presentation-only wrapper containers (div/span with a generated
/// class-name prefix) with their inner content, keeping everything else
/// intact. Parse-based so arbitrarily nested wrappers unwrap in one pass.
fn unwrap_generated_wrappers(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    serialize_children(fragment.root_element(), &mut out);
    out
}

fn serialize_children(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            let is_wrapper = matches!(name, "div" | "span")
                && child_element
                    .value()
                    .classes()
                    .any(|class| class.starts_with(GENERATED_WRAPPER_PREFIX));
            if is_wrapper {
                serialize_children(child_element, out);
                continue;
            }
            out.push('<');
            out.push_str(name);
            for (attr, value) in child_element.value().attrs() {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
            out.push('>');
            if !matches!(name, "br" | "hr" | "img" | "input" | "meta" | "link") {
                serialize_children(child_element, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&text.text);
        }
    }
}

/// Drop every attribute not on the allowlist. Closing tags start with a
/// slash and do not match, so they pass through untouched.
fn strip_attributes(html: &str) -> String {
    let re_tag = Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)((?:\s+[^<>]*)?)(/?)>").unwrap();
    let re_attr = Regex::new(r#"([a-zA-Z][a-zA-Z0-9-]*)\s*=\s*("[^"]*"|'[^']*'|[^\s'">]+)"#).unwrap();
    re_tag
        .replace_all(html, |caps: &regex::Captures| {
            let name = &caps[1];
            let mut kept = String::new();
            for attr in re_attr.captures_iter(&caps[2]) {
                if ALLOWED_ATTRS.contains(&attr[1].to_ascii_lowercase().as_str()) {
                    kept.push(' ');
                    kept.push_str(&attr[0]);
                }
            }
            format!("<{}{}{}>", name, kept, &caps[3])
        })
        .to_string()
}

fn empty_element_regex() -> Regex {
    // Tags eligible for empty removal; media elements are not listed and so
    // are never removed.
    const TAGS: &str = "p|div|span|li|ul|ol|section|article|strong|em|b|i|u|a|h1|h2|h3|h4|h5|h6|table|thead|tbody|tr|td|th|dl|dt|dd|blockquote|figure|center";
    Regex::new(&format!(r"(?is)<(?:{TAGS})(?:\s[^>]*)?>\s*</(?:{TAGS})>")).unwrap()
}

/// Decode numeric character references plus the named entities that matter
/// for job descriptions. `&amp;` is decoded last so it cannot manufacture
/// new entities.
pub(crate) fn decode_entities(text: &str) -> String {
    let re_decimal = Regex::new(r"&#(\d+);").unwrap();
    let mut out = re_decimal
        .replace_all(text, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();
    let re_hex = Regex::new(r"&#[xX]([0-9a-fA-F]+);").unwrap();
    out = re_hex
        .replace_all(&out, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    const NAMED: &[(&str, &str)] = &[
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&mdash;", "\u{2014}"),
        ("&ndash;", "\u{2013}"),
        ("&hellip;", "\u{2026}"),
        ("&lsquo;", "\u{2018}"),
        ("&rsquo;", "\u{2019}"),
        ("&ldquo;", "\u{201C}"),
        ("&rdquo;", "\u{201D}"),
        ("&amp;", "&"),
    ];
    for (entity, replacement) in NAMED {
        out = out.replace(entity, replacement);
    }
    out
}
