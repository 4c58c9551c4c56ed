use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Elements whose content is never rendered
const NON_RENDERED: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "meta", "link", "iframe",
    "object", "embed", "canvas", "audio", "video", "datalist", "select",
];

/// Elements that start and end on their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "thead", "tfoot", "tr", "ul", "caption", "body",
];

static DISPLAY_NONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)display\s*:\s*none").expect("valid display:none pattern"));

/// Options for collecting visible text
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Keep the whitespace inside `<pre>` and `<textarea>` verbatim
    pub preserve_preformatted: bool,
    /// Skip elements hidden with the `hidden` attribute or inline `display:none`
    pub skip_hidden: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            preserve_preformatted: true,
            skip_hidden: true,
        }
    }
}

/// Visible text of the document body, one rendered line per output line
///
/// Unlike `innerText`, paragraphs are separated by a single newline rather
/// than a blank line, and blank lines are never emitted. Returns an empty
/// string if the document has no body.
pub fn visible_text(doc: &Html) -> String {
    visible_text_with_options(doc, &TextOptions::default())
}

pub fn visible_text_with_options(doc: &Html, options: &TextOptions) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = doc.select(&body_selector).next() else {
        return String::new();
    };

    let mut buffer = LineBuffer::default();
    walk(body, &mut buffer, options, false);
    buffer.finish()
}

/// Recursively appends the rendered text of `element` to `buffer`
fn walk(element: ElementRef<'_>, buffer: &mut LineBuffer, options: &TextOptions, pre: bool) {
    let name = element.value().name();
    if NON_RENDERED.contains(&name) || (options.skip_hidden && is_hidden(element)) {
        return;
    }
    if name == "br" {
        buffer.break_line();
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    let pre = pre || (options.preserve_preformatted && matches!(name, "pre" | "textarea"));

    if block {
        buffer.break_line();
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if pre {
                    buffer.push_preformatted(text);
                } else {
                    buffer.push_collapsed(text);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, buffer, options, pre);
                }
            }
            _ => {}
        }
    }

    if matches!(name, "td" | "th") {
        buffer.push_separator('\t');
    }
    if block {
        buffer.break_line();
    }
}

/// Whether an element is hidden from rendering by its own attributes
pub fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    value
        .attr("style")
        .is_some_and(|style| DISPLAY_NONE.is_match(style))
}

/// Accumulates rendered lines, collapsing whitespace outside preformatted runs
#[derive(Default)]
struct LineBuffer {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineBuffer {
    fn push_collapsed(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
            } else {
                if self.pending_space && !self.current.is_empty() {
                    self.current.push(' ');
                }
                self.pending_space = false;
                self.current.push(c);
            }
        }
    }

    fn push_preformatted(&mut self, text: &str) {
        self.flush_space();
        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            self.current.push_str(first);
        }
        for segment in segments {
            self.end_line();
            self.current.push_str(segment);
        }
    }

    fn push_separator(&mut self, separator: char) {
        if !self.current.is_empty() {
            self.current.push(separator);
        }
        self.pending_space = false;
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.current.is_empty() {
            self.current.push(' ');
        }
        self.pending_space = false;
    }

    fn break_line(&mut self) {
        if !self.current.trim().is_empty() {
            self.end_line();
        } else {
            self.current.clear();
        }
        self.pending_space = false;
    }

    fn end_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push(line.trim_end().to_string());
    }

    fn finish(mut self) -> String {
        self.break_line();
        // Collapse runs of blank lines left behind by preformatted blocks
        let mut out: Vec<String> = Vec::with_capacity(self.lines.len());
        for line in self.lines {
            if line.trim().is_empty() && out.last().is_none_or(|l| l.trim().is_empty()) {
                continue;
            }
            out.push(line);
        }
        while out.last().is_some_and(|l| l.trim().is_empty()) {
            out.pop();
        }
        out.join("\n")
    }
}

/// Trim and collapse every whitespace run in `segment` into a single space
pub fn normalize_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
