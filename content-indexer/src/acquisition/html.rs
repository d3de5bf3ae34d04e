//! Text cleanup for fetched pages and rich-text fields.

use scraper::Html;

/// Appended to content cut at the size cap.
pub const TRUNCATION_MARKER: &str = "\n[content truncated]";

/// Elements whose subtree never contributes text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extract readable text from an HTML document or fragment.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                text.push('\n');
            }
            continue;
        }

        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            text.push_str(fragment);
        }
    }

    normalize_whitespace(&text)
}

/// Collapse whitespace inside lines and drop blank lines.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove control characters other than newline, tab and carriage return.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a character.
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Cap `text` at `max_bytes`, appending the marker when anything was cut.
///
/// `already_truncated` marks text cut earlier, such as a response body read
/// only up to the cap.
pub fn bound_content(text: String, max_bytes: usize, already_truncated: bool) -> String {
    let cut = text.len() > max_bytes;
    let mut bounded = if cut {
        truncate_at_char_boundary(&text, max_bytes).to_string()
    } else {
        text
    };
    if cut || already_truncated {
        bounded.push_str(TRUNCATION_MARKER);
    }
    bounded
}
