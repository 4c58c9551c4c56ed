use crate::parsers::text::normalize_whitespace;
use crate::results::{Heading, HeadingLevel, Image, Link, MetaTag};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// All elements matching `css` in document order; empty if the selector is invalid
fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(e) => {
            ::log::warn!("Invalid selector {}: {}", css, e);
            Vec::new()
        }
    }
}

/// Text content of an element with surrounding whitespace trimmed
fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether `element` sits inside an `<svg>` or `<math>` subtree
fn in_foreign_content(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| matches!(e.name(), "svg" | "math"))
    })
}

/// Document title, collapsed the way `document.title` reports it
///
/// SVG `<title>` labels are not document titles.
pub fn title(doc: &Html) -> String {
    select_all(doc, "title")
        .into_iter()
        .find(|t| !in_foreign_content(*t))
        .map(|t| normalize_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default()
}

/// Base URL for resolving relative references: the first `<base href>`
/// resolved against the page address, or the page address itself
pub fn base_url(doc: &Html, page_url: &Url) -> Url {
    select_all(doc, "base[href]")
        .into_iter()
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Anchors whose resolved href is an absolute http(s) address, in document order
pub fn links(doc: &Html, base: &Url) -> Vec<Link> {
    let links = select_all(doc, "a[href]")
        .into_iter()
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let resolved = base.join(href.trim()).ok()?;
            if !matches!(resolved.scheme(), "http" | "https") {
                ::log::trace!("Skipping non-http link: {}", href);
                return None;
            }
            Some(Link {
                text: text_content(a),
                href: resolved.to_string(),
            })
        })
        .collect::<Vec<_>>();

    ::log::debug!("HTML extractor found {} http links", links.len());
    links
}

/// Images with a `src` attribute, in document order
pub fn images(doc: &Html, base: &Url) -> Vec<Image> {
    select_all(doc, "img[src]")
        .into_iter()
        .filter_map(|img| {
            let raw = img.value().attr("src")?;
            let src = if raw.trim().is_empty() {
                String::new()
            } else {
                base.join(raw.trim())
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| raw.to_string())
            };
            Some(Image {
                src,
                alt: img.value().attr("alt").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Every `h1`-`h6` element, in document order
pub fn headings(doc: &Html) -> Vec<Heading> {
    select_all(doc, "h1, h2, h3, h4, h5, h6")
        .into_iter()
        .filter_map(|h| {
            let level = HeadingLevel::from_tag(h.value().name())?;
            Some(Heading {
                level,
                text: text_content(h),
            })
        })
        .collect()
}

/// `<meta>` tags identified by `name`, falling back to `property`
pub fn meta_tags(doc: &Html) -> Vec<MetaTag> {
    select_all(doc, "meta")
        .into_iter()
        .filter_map(|meta| {
            let value = meta.value();
            let name = value
                .attr("name")
                .filter(|n| !n.is_empty())
                .or_else(|| value.attr("property"))
                .filter(|n| !n.is_empty())?;
            Some(MetaTag {
                name: name.to_string(),
                content: value.attr("content").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Parsed JSON-LD blocks, in document order
///
/// Blocks that fail to parse are logged and skipped.
pub fn structured_data(doc: &Html) -> Vec<Value> {
    let mut data = Vec::new();
    for script in select_all(doc, r#"script[type="application/ld+json"]"#) {
        let raw = script.text().collect::<String>();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => data.push(value),
            Err(e) => ::log::warn!("Error parsing JSON-LD: {}", e),
        }
    }
    data
}
