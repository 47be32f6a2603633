//! Frontmatter parsing from markdown documents.
//!
//! Parsing happens in two explicit stages. [`parse`] is the lenient scanner:
//! it never fails and produces a flat string map. [`parse_typed`] projects the
//! same block onto [`TypedFrontmatter`], coercing loosely-typed scalars (dates,
//! booleans, tag lists) and preserving unknown keys in `extra`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Frontmatter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

const DELIMITER: &str = "---";

/// Strongly typed view of a frontmatter block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypedFrontmatter {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub slug: Option<String>,

    #[serde(default, alias = "short_id", deserialize_with = "de_opt_string")]
    pub short_id: Option<String>,

    #[serde(default, alias = "type", deserialize_with = "de_opt_string")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub section: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub image: Option<String>,

    #[serde(default, alias = "author", deserialize_with = "de_opt_string")]
    pub contributor: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub layout: Option<String>,

    #[serde(default, deserialize_with = "de_opt_string")]
    pub series: Option<String>,

    #[serde(default, alias = "series_order", deserialize_with = "de_opt_u32")]
    pub series_order: Option<u32>,

    #[serde(default, deserialize_with = "de_bool")]
    pub draft: bool,

    #[serde(default, deserialize_with = "de_bool")]
    pub featured: bool,

    #[serde(default, deserialize_with = "de_tags")]
    pub tags: Vec<String>,

    #[serde(default, alias = "created_at", deserialize_with = "de_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "published_at", deserialize_with = "de_opt_datetime")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "updated_at", deserialize_with = "de_opt_datetime")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Keys the schema does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Split a document into its raw frontmatter block and body.
///
/// The first line must be exactly `---`; the block ends at the next line
/// that is exactly `---`. Returns `None` when either delimiter is missing.
pub fn split(document: &str) -> Option<(&str, &str)> {
    let mut lines = document.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let mut offset = first.len();
    for line in lines {
        if line.trim_end() == DELIMITER {
            let yaml = &document[first.len()..offset];
            let body = &document[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Lenient parse into a flat string map.
///
/// Scalars are stringified, nulls become empty strings, and sequences or
/// nested mappings are dropped. Invalid YAML yields an empty map; the body is
/// still split off.
///
/// # Example
///
/// ```
/// use pressroom_core::frontmatter::parse;
///
/// let doc = "---\ntitle: My Post\ndraft: true\n---\n# Hello\n";
/// let (fields, body) = parse(doc);
/// assert_eq!(fields["title"], "My Post");
/// assert_eq!(fields["draft"], "true");
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn parse(document: &str) -> (BTreeMap<String, String>, String) {
    let Some((yaml, body)) = split(document) else {
        return (BTreeMap::new(), document.to_string());
    };

    let mut fields = BTreeMap::new();
    if yaml.trim().is_empty() {
        return (fields, body.to_string());
    }

    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => {
            for (key, value) in mapping {
                let (Some(key), Some(value)) = (scalar_to_string(key), scalar_to_string(value))
                else {
                    continue;
                };
                fields.insert(key, value);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::debug!("Ignoring malformed frontmatter: {}", e),
    }

    (fields, body.to_string())
}

/// Parse frontmatter into the typed schema.
///
/// Returns `Ok((None, body))` when the document has no frontmatter block.
/// Errors only when a block is present but is not a valid YAML mapping.
pub fn parse_typed(
    document: &str,
) -> Result<(Option<TypedFrontmatter>, String), FrontmatterError> {
    let Some((yaml, body)) = split(document) else {
        return Ok((None, document.to_string()));
    };

    if yaml.trim().is_empty() {
        return Ok((Some(TypedFrontmatter::default()), body.to_string()));
    }

    let value: Value = serde_yaml::from_str(yaml)?;
    let typed = match value {
        Value::Null => TypedFrontmatter::default(),
        Value::Mapping(_) => serde_yaml::from_value(value)?,
        Value::Sequence(_) => return Err(FrontmatterError::NotAMapping("a sequence")),
        _ => return Err(FrontmatterError::NotAMapping("a scalar")),
    };

    Ok((Some(typed), body.to_string()))
}

/// Render a flat map as a delimited YAML block (trailing newline included)
pub fn to_block(fields: &BTreeMap<String, String>) -> Result<String, FrontmatterError> {
    let mut block = String::from("---\n");
    if !fields.is_empty() {
        block.push_str(&serde_yaml::to_string(fields)?);
    }
    block.push_str("---\n");
    Ok(block)
}

/// Join a flat map and a body back into a document
pub fn join(fields: &BTreeMap<String, String>, body: &str) -> Result<String, FrontmatterError> {
    let mut document = to_block(fields)?;
    document.push_str(body);
    Ok(document)
}

/// Format a timestamp the way frontmatter blocks store it
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Coerce a date string into UTC.
///
/// Accepts RFC 3339 (`Z` or offset, with or without fractional seconds),
/// `YYYY-MM-DD HH:MM:SS[.f] ±hhmm [ZONE]`, naive date-times (assumed UTC),
/// and bare dates (midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // "2026-01-09 19:37:45.123 +0000 UTC": drop a trailing zone abbreviation
    let without_zone = match s.rsplit_once(' ') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_alphabetic()) => head,
        _ => s,
    };
    for fmt in ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(without_zone, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Sequence(_) | Value::Mapping(_) => {
            Err(de::Error::custom("expected a scalar value"))
        }
        other => Ok(scalar_to_string(other)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())),
    }
}

fn de_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a positive integer, got {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a positive integer, got `{}`", s))),
        _ => Err(de::Error::custom("expected a positive integer")),
    }
}

fn de_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().map(|v| v != 0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "no" | "n" | "off" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("expected a boolean, got `{}`", other))),
        },
        _ => Err(de::Error::custom("expected a boolean")),
    }
}

fn de_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };

    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn de_opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => datetime_from_str(&s).map(Some),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid unix timestamp {}", n))),
        Value::Tagged(tagged) => match tagged.value {
            Value::String(s) => datetime_from_str(&s).map(Some),
            _ => Err(de::Error::custom("expected a date")),
        },
        _ => Err(de::Error::custom("expected a date")),
    }
}

/// Lenient parsing stores integer timestamps as strings, so accept digits here too
fn datetime_from_str<E: de::Error>(s: &str) -> Result<DateTime<Utc>, E> {
    parse_datetime(s)
        .or_else(|| {
            s.trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
        })
        .ok_or_else(|| E::custom(format!("unrecognized date `{}`", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_flat_frontmatter() {
        let content = r#"---
title: Test Post
description: A test post
draft: true
order: 3
tags:
  - rust
---

# Hello World

This is the content."#;

        let (fields, body) = parse(content);
        assert_eq!(fields["title"], "Test Post");
        assert_eq!(fields["description"], "A test post");
        assert_eq!(fields["draft"], "true");
        assert_eq!(fields["order"], "3");
        assert!(!fields.contains_key("tags"), "sequences are dropped");
        assert!(body.contains("# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fields, body) = parse(content);
        assert!(fields.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\ntitle: Open\n\nNever closed.";
        let (fields, body) = parse(content);
        assert!(fields.is_empty());
        assert_eq!(body, content);

        let (typed, body) = parse_typed(content).unwrap();
        assert!(typed.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_lenient_parse_survives_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        let (fields, body) = parse(content);
        assert!(fields.is_empty());
        assert!(body.contains("Content."));
    }

    #[test]
    fn test_typed_rejects_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        assert!(matches!(
            parse_typed(content),
            Err(FrontmatterError::YamlError(_))
        ));
    }

    #[test]
    fn test_typed_rejects_non_mapping() {
        let content = "---\n- a\n- b\n---\nBody";
        assert!(matches!(
            parse_typed(content),
            Err(FrontmatterError::NotAMapping(_))
        ));
    }

    #[test]
    fn test_typed_without_block_is_not_an_error() {
        let (typed, body) = parse_typed("Plain body").unwrap();
        assert!(typed.is_none());
        assert_eq!(body, "Plain body");
    }

    #[test]
    fn test_typed_coercions() {
        let content = r#"---
title: 2024
kind: Article
draft: "yes"
featured: 1
tags: rust, web ,
series: Intro
series-order: "2"
published-at: 2026-01-09
custom-key: kept
---
Body"#;

        let (typed, _) = parse_typed(content).unwrap();
        let fm = typed.unwrap();
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.kind.as_deref(), Some("Article"));
        assert!(fm.draft);
        assert!(fm.featured);
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert_eq!(fm.series_order, Some(2));
        assert_eq!(
            fm.published_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(
            fm.extra.get("custom-key"),
            Some(&Value::String("kept".into()))
        );
    }

    #[test]
    fn test_snake_case_aliases() {
        let content = "---\nshort_id: ab12cd34\ncreated_at: 2026-01-09T19:37:45Z\n---\n";
        let (typed, _) = parse_typed(content).unwrap();
        let fm = typed.unwrap();
        assert_eq!(fm.short_id.as_deref(), Some("ab12cd34"));
        assert!(fm.created_at.is_some());
    }

    #[test]
    fn test_date_round_trip_utc_and_offset_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 9, 19, 37, 45).unwrap();

        for raw in [
            "2026-01-09T19:37:45Z",
            "2026-01-09T21:37:45.123456789+02:00",
            "2026-01-09 19:37:45.5 +0000 UTC",
            "1767987465",
        ] {
            let document = format!("---\ncreated-at: {}\ntitle: Round trip\n---\nBody\n", raw);
            let (fields, body) = parse(&document);
            let rejoined = join(&fields, &body).unwrap();
            let (typed, body_again) = parse_typed(&rejoined).unwrap();
            let created = typed.unwrap().created_at.expect("created-at parsed");
            assert_eq!(created.timestamp(), expected.timestamp(), "input {}", raw);
            assert_eq!(body_again, "Body\n");
        }
    }

    #[test]
    fn test_unrecognized_date_is_rejected_by_typed_parse() {
        let content = "---\npublished-at: next tuesday\n---\n";
        assert!(parse_typed(content).is_err());
    }

    #[test]
    fn test_to_block_empty_map() {
        let block = to_block(&BTreeMap::new()).unwrap();
        assert_eq!(block, "---\n---\n");
        let (typed, body) = parse_typed(&block).unwrap();
        assert_eq!(typed, Some(TypedFrontmatter::default()));
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2026-01-09T19:37:45").is_some());
        assert!(parse_datetime("2026-01-09 19:37:45").is_some());
        assert!(parse_datetime("2026-01-09").is_some());
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday").is_none());
    }
}
