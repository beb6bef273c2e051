// ============================================================
// Layer 4 — HTML Preprocessor
// ============================================================
// Prepares raw page HTML for the fuzzy baseline.
//
// Cleaning steps (applied in order):
//   1. Remove bare opening/closing forms of a fixed list of
//      structural tags ("<p>", "</p>", "<td>", ...). Tags that
//      carry attributes ("<a href=..>") are left untouched.
//   2. Keep only the first `limit` characters.

/// Tags whose attribute-free open/close forms are stripped.
pub const STRUCTURAL_TAGS: [&str; 24] = [
    "head", "title", "body", "h1", "h2", "h3", "h4", "h5", "h6", "p", "strong", "a", "img",
    "hr", "table", "tbody", "tr", "th", "td", "ol", "ul", "li", "ruby", "label",
];

pub struct HtmlPreprocessor {
    /// Maximum number of characters kept after tag removal
    limit: usize,
}

impl HtmlPreprocessor {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn clean(&self, html: &str) -> String {
        let mut text = html.to_string();
        for tag in STRUCTURAL_TAGS {
            text = text
                .replace(&format!("<{tag}>"), "")
                .replace(&format!("</{tag}>"), "");
        }

        match text.char_indices().nth(self.limit) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text,
        }
    }
}

impl Default for HtmlPreprocessor {
    fn default() -> Self {
        Self::new(4000)
    }
}
