use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of characters of page text kept in a snapshot
pub const TEXT_LIMIT: usize = 5000;

/// Maximum number of links kept in a snapshot
pub const LINK_LIMIT: usize = 100;

/// Maximum number of images kept in a snapshot
pub const IMAGE_LIMIT: usize = 50;

/// Which parts of the page to capture
///
/// Missing flags deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionOptions {
    pub scrape_text: bool,
    pub scrape_links: bool,
    pub scrape_images: bool,
    pub scrape_headings: bool,
}

impl ExtractionOptions {
    /// Every flag enabled
    pub fn all() -> Self {
        Self {
            scrape_text: true,
            scrape_links: true,
            scrape_images: true,
            scrape_headings: true,
        }
    }

    /// Merge another set of flags into this one (logical or)
    pub fn union(self, other: Self) -> Self {
        Self {
            scrape_text: self.scrape_text || other.scrape_text,
            scrape_links: self.scrape_links || other.scrape_links,
            scrape_images: self.scrape_images || other.scrape_images,
            scrape_headings: self.scrape_headings || other.scrape_headings,
        }
    }
}

/// Snapshot of a page's content, captured once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Address of the page at capture time
    pub url: String,

    /// Document title, empty when the page has none
    pub title: String,

    /// Capture time (ISO-8601, UTC, millisecond precision)
    pub timestamp: String,

    /// Visible text, present only when text was requested
    #[serde(flatten)]
    pub text: Option<TextContent>,

    #[serde(flatten)]
    pub links: Option<LinkSet>,

    #[serde(flatten)]
    pub images: Option<ImageSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<Heading>>,
}

/// Truncated page text along with the untruncated length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub text_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSet {
    pub links: Vec<Link>,
    /// Number of qualifying links before truncation
    pub links_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSet {
    pub images: Vec<Image>,
    /// Number of images before truncation
    pub images_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// Heading level, serialized as the upper-case tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Map a lower-case tag name to its level
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
}

/// A `<meta>` tag with a name (or property) attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// Whatever JSON the backend returned; never interpreted, only rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedResult(Value);

impl ProcessedResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Pretty-printed JSON with a 2-space indent
    pub fn render(&self) -> String {
        // Serializing a Value cannot fail: all map keys are strings
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }
}
