pub mod html;
pub mod text;


use crate::results::{
    ExtractionOptions, IMAGE_LIMIT, ImageSet, LINK_LIMIT, LinkSet, PageSnapshot, TEXT_LIMIT,
    TextContent,
};
use crate::utils::{iso_timestamp, truncate_chars};
use scraper::Html;
use url::Url;

/// A document read from a tab: its address and serialized DOM
#[derive(Debug, Clone)]
pub struct PageSource {
    pub url: Url,
    pub html: String,
}

impl PageSource {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }
}

/// Builds page snapshots from a document
///
/// Extraction never fails: anything missing from the page yields an empty
/// collection for the requested field.
pub struct Extractor;

impl Extractor {
    /// Extract a snapshot stamped with the current time
    pub fn extract(page: &PageSource, options: &ExtractionOptions) -> PageSnapshot {
        Self::extract_at(page, options, iso_timestamp())
    }

    /// Extract a snapshot with an explicit capture timestamp
    pub fn extract_at(
        page: &PageSource,
        options: &ExtractionOptions,
        timestamp: String,
    ) -> PageSnapshot {
        let doc = Html::parse_document(&page.html);
        let base = html::base_url(&doc, &page.url);

        let text = options.scrape_text.then(|| {
            let (text, text_length) = truncate_chars(&text::visible_text(&doc), TEXT_LIMIT);
            TextContent { text, text_length }
        });

        let links = options.scrape_links.then(|| {
            let mut links = html::links(&doc, &base);
            let links_count = links.len();
            links.truncate(LINK_LIMIT);
            LinkSet { links, links_count }
        });

        let images = options.scrape_images.then(|| {
            let mut images = html::images(&doc, &base);
            let images_count = images.len();
            images.truncate(IMAGE_LIMIT);
            ImageSet {
                images,
                images_count,
            }
        });

        let headings = options.scrape_headings.then(|| html::headings(&doc));

        ::log::debug!(
            "Extracted {} (text: {}, links: {}, images: {}, headings: {})",
            page.url,
            text.as_ref().map_or(0, |t| t.text_length),
            links.as_ref().map_or(0, |l| l.links_count),
            images.as_ref().map_or(0, |i| i.images_count),
            headings.as_ref().map_or(0, Vec::len),
        );

        PageSnapshot {
            url: page.url.to_string(),
            title: html::title(&doc),
            timestamp,
            text,
            links,
            images,
            headings,
        }
    }
}
