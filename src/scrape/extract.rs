//! Two-tier metadata extraction over rendered HTML.
//!
//! Tier 1 reads structured Open Graph / product meta tags and is authoritative
//! the moment any single probe hits. Tier 2 falls back to DOM heuristics:
//! `<h1>`/`<title>` for the title, `<meta name=description>`/first `<p>` for
//! the description, and a vendor dynamic-image JSON attribute for the image.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::PageMetadata;

pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Vendor attribute holding a JSON map of image URL → [width, height].
const DYNAMIC_IMAGE_ATTR: &str = "data-a-dynamic-image";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Extract best-effort metadata from a rendered page. Deterministic and
/// total: never fails, an empty document yields four empty strings.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let doc = Html::parse_document(html);

    if let Some(metadata) = extract_structured(&doc) {
        return metadata;
    }
    extract_heuristic(&doc)
}

/// Tier 1: Open Graph / product meta tags.
///
/// Returns `None` only when *all four* probes miss. A single hit — even just
/// `og:title` — makes this tier authoritative and the remaining fields stay
/// empty rather than falling through to DOM heuristics.
fn extract_structured(doc: &Html) -> Option<PageMetadata> {
    let title = meta_property(doc, "og:title");
    let description = meta_property(doc, "og:description");
    let image = meta_property(doc, "og:image");
    let price = meta_property(doc, "product:price:amount")
        .or_else(|| meta_property(doc, "og:price:amount"));

    if title.is_none() && description.is_none() && image.is_none() && price.is_none() {
        return None;
    }

    Some(PageMetadata {
        title: clean_text(&title.unwrap_or_default()),
        description: truncate_chars(
            clean_text(&description.unwrap_or_default()),
            MAX_DESCRIPTION_CHARS,
        ),
        image: image.unwrap_or_default(),
        price: price.unwrap_or_default(),
    })
}

/// Tier 2: DOM heuristics. No price heuristic exists at this tier.
fn extract_heuristic(doc: &Html) -> PageMetadata {
    let title = first_text(doc, "h1").or_else(|| first_text(doc, "title"));
    let description = meta_name(doc, "description").or_else(|| first_text(doc, "p"));

    PageMetadata {
        title: clean_text(&title.unwrap_or_default()),
        description: truncate_chars(
            clean_text(&description.unwrap_or_default()),
            MAX_DESCRIPTION_CHARS,
        ),
        image: dynamic_image(doc).unwrap_or_default(),
        price: String::new(),
    }
}

fn meta_property(doc: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn meta_name(doc: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text content of the first element matching `css`, trimmed, `None` if empty.
fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First key of the dynamic-image JSON map on the first `<img>` carrying the
/// attribute. `None` on absence or malformed JSON — no further fallback.
fn dynamic_image(doc: &Html) -> Option<String> {
    let selector = Selector::parse(&format!("img[{DYNAMIC_IMAGE_ATTR}]")).ok()?;
    let attr = doc
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(DYNAMIC_IMAGE_ATTR))?;

    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(attr).ok()?;
    map.keys().next().cloned().filter(|url| !url.is_empty())
}

/// Strip `<...>`-shaped substrings, then trim surrounding whitespace.
fn clean_text(s: &str) -> String {
    TAG_RE.replace_all(s, "").trim().to_string()
}

/// Truncate to at most `max` characters (not bytes).
fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Tier 1 ───────────────────────────────────────────────────────────

    #[test]
    fn og_title_alone_is_authoritative() {
        // Tier 2 sources present but must never be consulted.
        let html = r#"<html><head>
            <meta property="og:title" content="Widget"/>
            <meta name="description" content="Great gadget"/>
        </head><body><h1>Something Else</h1><p>Paragraph text</p></body></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Widget");
        assert_eq!(meta.description, "");
        assert_eq!(meta.image, "");
        assert_eq!(meta.price, "");
    }

    #[test]
    fn extracts_all_structured_fields() {
        let html = r#"<html><head>
            <meta property="og:title" content="Nintendo Switch"/>
            <meta property="og:description" content="A fun gaming console"/>
            <meta property="og:image" content="https://shop.example/switch.jpg"/>
            <meta property="product:price:amount" content="299.99"/>
        </head></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Nintendo Switch");
        assert_eq!(meta.description, "A fun gaming console");
        assert_eq!(meta.image, "https://shop.example/switch.jpg");
        assert_eq!(meta.price, "299.99");
    }

    #[test]
    fn og_price_amount_is_a_fallback_for_product_price() {
        let html = r#"<meta property="og:price:amount" content="59.99"/>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.price, "59.99");
    }

    #[test]
    fn product_price_takes_precedence_over_og_price() {
        let html = r#"<head>
            <meta property="product:price:amount" content="10.00"/>
            <meta property="og:price:amount" content="99.00"/>
        </head>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.price, "10.00");
    }

    #[test]
    fn structured_title_is_tag_stripped_and_trimmed() {
        let html = r#"<meta property="og:title" content="  <b>Sale</b> Item "/>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Sale Item");
    }

    #[test]
    fn whitespace_only_og_content_counts_as_absent() {
        // All probes miss, so Tier 2 picks up the <h1>.
        let html = r#"<html><head><meta property="og:title" content="   "/></head>
            <body><h1>Fallback Title</h1></body></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Fallback Title");
    }

    #[test]
    fn structured_description_truncated_to_500_chars() {
        let long = "x".repeat(600);
        let html = format!(r#"<meta property="og:description" content="{long}"/>"#);
        let meta = extract_metadata(&html);
        assert_eq!(meta.description.chars().count(), 500);
    }

    // ── Tier 2 ───────────────────────────────────────────────────────────

    #[test]
    fn falls_back_to_h1_and_meta_description() {
        let html = r#"<html><head>
            <meta name="description" content="Great gadget"/>
        </head><body><h1>Cool Gadget</h1></body></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Cool Gadget");
        assert_eq!(meta.description, "Great gadget");
        assert_eq!(meta.price, "");
    }

    #[test]
    fn title_tag_used_when_no_h1() {
        let html = r#"<html><head><title>Page Title</title></head><body></body></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Page Title");
    }

    #[test]
    fn h1_preferred_over_title_tag() {
        let html = r#"<html><head><title>Doc Title</title></head>
            <body><h1>Heading</h1></body></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Heading");
    }

    #[test]
    fn first_paragraph_used_when_no_meta_description() {
        let html = r#"<body><p>First paragraph.</p><p>Second.</p></body>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.description, "First paragraph.");
    }

    #[test]
    fn dynamic_image_attribute_first_key_wins() {
        let html = r#"<body><h1>Cool Gadget</h1>
            <meta name="description" content="Great gadget"/>
            <img data-a-dynamic-image='{"https://x/img.jpg":[100,100],"https://x/img2.jpg":[200,200]}'>
        </body>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title, "Cool Gadget");
        assert_eq!(meta.description, "Great gadget");
        assert_eq!(meta.image, "https://x/img.jpg");
        assert_eq!(meta.price, "");
    }

    #[test]
    fn malformed_dynamic_image_json_yields_empty_image() {
        let html = r#"<body><img data-a-dynamic-image='{not json'><img src="https://x/a.jpg"></body>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.image, "");
    }

    #[test]
    fn plain_img_src_is_not_a_fallback() {
        let html = r#"<body><h1>T</h1><img src="https://x/plain.jpg"></body>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.image, "");
    }

    #[test]
    fn heuristic_description_truncated_to_500_chars() {
        let long = "y".repeat(700);
        let html = format!("<body><p>{long}</p></body>");
        let meta = extract_metadata(&html);
        assert_eq!(meta.description.chars().count(), 500);
    }

    #[test]
    fn empty_document_yields_all_empty_fields() {
        let meta = extract_metadata("<html><head></head><body></body></html>");
        assert!(meta.is_empty());
    }

    // ── General properties ───────────────────────────────────────────────

    #[test]
    fn extraction_is_idempotent() {
        let html = r#"<html><head><title>Fixed</title></head>
            <body><p>Stable description.</p></body></html>"#;
        let a = extract_metadata(html);
        let b = extract_metadata(html);
        assert_eq!(a, b);
    }

    #[test]
    fn cleaning_strips_embedded_tags() {
        assert_eq!(clean_text("<b>Sale</b> Item"), "Sale Item");
        assert_eq!(clean_text("  plain  "), "plain");
        assert_eq!(clean_text("a <span class=\"x\">b</span> c"), "a b c");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s: String = "é".repeat(510);
        let out = truncate_chars(s, 500);
        assert_eq!(out.chars().count(), 500);
    }
}
