//! Excerpt extraction from raw markdown.

use crate::scan::is_fence;
use once_cell::sync::Lazy;
use regex::Regex;

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]|\d+[.)])(?:\s|$)").expect("valid regex"));

static IMAGE_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[[^\]]*\]\([^)]*\)$").expect("valid regex"));

/// First blank-line delimited paragraph of prose, lines joined by spaces.
///
/// Headings, code fences, list items, blockquotes and image-only lines never
/// start an excerpt.
pub fn first_paragraph(markdown: &str) -> Option<String> {
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim();

        if is_fence(trimmed) {
            if let Some(found) = take(&mut current) {
                return Some(found);
            }
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if trimmed.is_empty() {
            if let Some(found) = take(&mut current) {
                return Some(found);
            }
            continue;
        }
        current.push(trimmed);
    }

    take(&mut current)
}

fn take(lines: &mut Vec<&str>) -> Option<String> {
    let para = std::mem::take(lines);
    let first = para.first()?;
    if !is_prose(first) {
        return None;
    }
    Some(para.join(" "))
}

fn is_prose(line: &str) -> bool {
    !(line.starts_with('#')
        || line.starts_with('>')
        || line.starts_with('|')
        || line.starts_with("<!--")
        || is_rule(line)
        || LIST_ITEM_RE.is_match(line)
        || IMAGE_ONLY_RE.is_match(line))
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && (compact.chars().all(|c| c == '-')
            || compact.chars().all(|c| c == '*')
            || compact.chars().all(|c| c == '_'))
}
