//! Label/value row lookups.
//!
//! The target site renders label/value pairs in generated markup whose class
//! names change between deployments, so rows are matched by structural
//! position: the first and last text-bearing child elements of a list row.
//! This is the most brittle surface of the extractor; keep every row query
//! going through this module so markup drift is a one-place fix.

use scraper::{ElementRef, Html, Selector};

use super::collapse_ws;

/// Generated class-name fragment observed on the site's styled row wrappers.
/// A build artifact, not a semantic hook. Versioned separately from the
/// structural matching below; delete when the site stops emitting it.
pub(crate) const GENERATED_ROW_CLASS: &str = "sc-";

fn row_selector() -> Selector {
    Selector::parse(&format!("li, tr, div[class*='{}']", GENERATED_ROW_CLASS))
        .expect("row selector parses")
}

/// Split a row element into (label, value element). The label is the first
/// text-bearing child, the value the last; rows with fewer than two
/// text-bearing children are not label/value rows.
fn split_row(row: ElementRef) -> Option<(String, ElementRef)> {
    let mut text_children: Vec<ElementRef> = Vec::new();
    for child in row.children() {
        if let Some(element) = ElementRef::wrap(child) {
            if !collapse_ws(&element.text().collect::<String>()).is_empty() {
                text_children.push(element);
            }
        }
    }
    if text_children.len() < 2 {
        return None;
    }
    let label = collapse_ws(&text_children[0].text().collect::<String>());
    let label = label.trim_end_matches(':').trim().to_string();
    if label.is_empty() {
        return None;
    }
    Some((label, text_children[text_children.len() - 1]))
}

/// First row whose label satisfies `matches_label` (called with the
/// lowercased label); returns the row's value text.
pub(crate) fn find_row_value<F>(document: &Html, matches_label: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let selector = row_selector();
    for row in document.select(&selector) {
        let Some((label, value)) = split_row(row) else {
            continue;
        };
        if !matches_label(&label.to_lowercase()) {
            continue;
        }
        let text = collapse_ws(&value.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

/// Anchor texts inside the value element of the first matching row. Used for
/// multi-valued rows such as category listings.
pub(crate) fn find_row_anchor_texts<F>(document: &Html, matches_label: F) -> Option<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let selector = row_selector();
    let anchor_selector = Selector::parse("a").expect("anchor selector parses");
    for row in document.select(&selector) {
        let Some((label, value)) = split_row(row) else {
            continue;
        };
        if !matches_label(&label.to_lowercase()) {
            continue;
        }
        let texts: Vec<String> = value
            .select(&anchor_selector)
            .map(|a| collapse_ws(&a.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            return Some(texts);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_value_by_structural_position() {
        let html = r#"<ul>
            <li><span class="x9f2">Location:</span><span class="q71b">Remote, US</span></li>
            <li><span>Salary</span><span>$90,000</span></li>
        </ul>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            find_row_value(&document, |label| label == "location").as_deref(),
            Some("Remote, US")
        );
        assert_eq!(
            find_row_value(&document, |label| label.contains("salary")).as_deref(),
            Some("$90,000")
        );
    }

    #[test]
    fn ignores_rows_without_two_text_children() {
        let html = "<ul><li><span>Just one cell</span></li></ul>";
        let document = Html::parse_document(html);
        assert_eq!(find_row_value(&document, |_| true), None);
    }

    #[test]
    fn collects_anchor_texts_from_value_cell() {
        let html = r#"<ul><li>
            <div>Categories</div>
            <div><a href="/remote-jobs/developer">Developer</a> <a href="/remote-jobs/qa">QA</a></div>
        </li></ul>"#;
        let document = Html::parse_document(html);
        let texts = find_row_anchor_texts(&document, |label| label == "categories").unwrap();
        assert_eq!(texts, vec!["Developer".to_string(), "QA".to_string()]);
    }
}
