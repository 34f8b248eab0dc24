use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid url pattern"));
static HORIZONTAL_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid whitespace pattern"));
static LINE_PADDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ?\n ?").expect("valid line padding pattern"));
static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));

/// Prepare text for synthesis: drop URLs, collapse runs of spaces and tabs,
/// and squeeze blank lines so paragraph breaks survive as a single `\n\n`.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let without_urls = URL_PATTERN.replace_all(&text, "");
    let collapsed = HORIZONTAL_WHITESPACE.replace_all(&without_urls, " ");
    let unpadded = LINE_PADDING.replace_all(&collapsed, "\n");
    let squeezed = EXCESS_BLANK_LINES.replace_all(&unpadded, "\n\n");

    squeezed.trim().to_string()
}
