//! Single-pass scans over raw markdown bodies.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+?)[ \t#]*$").expect("valid regex"));

static IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)|<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
        .expect("valid regex")
});

/// A markdown ATX heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// All `#`…`######` headings outside code fences, in document order
pub fn headings(body: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if is_fence(trimmed) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = HEADING_RE.captures(trimmed) {
            found.push(Heading {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
            });
        }
    }

    found
}

/// Text of the first level-one heading
pub fn first_h1(body: &str) -> Option<String> {
    headings(body)
        .into_iter()
        .find(|h| h.level == 1)
        .map(|h| h.text)
}

/// Relative image references (markdown and `<img>`) outside code fences,
/// deduplicated in order of first appearance
pub fn image_paths(body: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if is_fence(line.trim_start()) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for caps in IMAGE_RE.captures_iter(line) {
            let Some(src) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let src = src.as_str().trim();
            if src.is_empty() || is_external(src) || found.iter().any(|f| f == src) {
                continue;
            }
            found.push(src.to_string());
        }
    }

    found
}

fn is_external(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
}

pub(crate) fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}
