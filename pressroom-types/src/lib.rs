//! Shared types for pressroom
//!
//! This crate provides the entity records read from the content store and
//! passed between the generation, backup and publishing crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store identifier
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Id(pub u64);

impl Id {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Id {
    fn from(id: u64) -> Self {
        Id(id)
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a site's root index is organised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    /// Sections with their own indices
    #[default]
    Structured,
    /// Reverse-chronological feed on the root index
    Blog,
}

impl SiteMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Some(SiteMode::Structured),
            "blog" => Some(SiteMode::Blog),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteMode::Structured => "structured",
            SiteMode::Blog => "blog",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: Id,
    /// URL-safe identifier, also the name of the site's workspace directory
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub mode: SiteMode,
    #[serde(default)]
    pub active: bool,
    /// Watermark of the last successful publish
    #[serde(default)]
    pub last_published_at: Option<DateTime<Utc>>,
}

/// Kind of content item. Drives generation routing and related-content rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Page,
    #[default]
    Post,
    Article,
    Blog,
    Other(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Page => "page",
            ContentKind::Post => "post",
            ContentKind::Article => "article",
            ContentKind::Blog => "blog",
            ContentKind::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for ContentKind {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "page" => ContentKind::Page,
            "post" => ContentKind::Post,
            "article" => ContentKind::Article,
            "blog" => ContentKind::Blog,
            other => ContentKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentKind {
    fn from(s: String) -> Self {
        ContentKind::from(s.as_str())
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SEO and presentation metadata carried alongside a content item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMeta {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub robots: String,
    #[serde(default)]
    pub canonical_url: String,
    #[serde(default)]
    pub table_of_contents: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: Id,
    /// 8-character portable identifier, stable across backup/restore
    pub short_id: String,
    pub site_id: Id,
    pub section_id: Id,
    #[serde(default)]
    pub contributor_id: Option<Id>,
    pub kind: ContentKind,
    pub heading: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub series: String,
    /// Strictly positive ordering key within `series`
    #[serde(default)]
    pub series_order: u32,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub meta: ContentMeta,
}

impl Content {
    /// Published and visible at `now`
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        !self.draft && self.published_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Whether this item carries the given tag (by identity)
    pub fn has_tag(&self, tag_id: Id) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Id,
    pub site_id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Path segment under the site root; `/` for the root section
    pub path: String,
    #[serde(default)]
    pub layout_id: Option<Id>,
    #[serde(default)]
    pub image: String,
}

impl Section {
    pub fn is_root(&self) -> bool {
        self.path.trim_matches('/').is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: Id,
    pub site_id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub css: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub site_id: Id,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: Id,
    pub site_id: Id,
    pub name: String,
    #[serde(default)]
    pub surname: String,
    /// Unique per site, used as the natural key in backups
    pub handle: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    #[serde(default)]
    pub photo_path: String,
    #[serde(default)]
    pub profile_id: Option<Id>,
}

impl Contributor {
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.name.trim(), self.surname.trim());
        let full = full.trim();
        if full.is_empty() {
            self.handle.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: Id,
    pub site_id: Id,
    #[serde(default)]
    pub short_id: String,
    /// Relative to the site's images directory, `/`-separated
    pub file_path: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default)]
    pub attribution_url: String,
    #[serde(default)]
    pub license: String,
}

impl Image {
    /// Whether the image carries any human-authored metadata
    pub fn has_metadata(&self) -> bool {
        !self.alt_text.trim().is_empty()
            || !self.title.trim().is_empty()
            || !self.attribution.trim().is_empty()
    }
}

/// Link between a content item and one of its images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentImage {
    pub id: Id,
    pub content_id: Id,
    pub image_id: Id,
    #[serde(default)]
    pub is_header: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub order_num: i32,
}

/// Free-form site setting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: Id,
    pub site_id: Id,
    pub name: String,
    pub value: String,
}

/// Public author profile created from a contributor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Id,
    pub site_id: Id,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo_path: String,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_conversion() {
        assert_eq!(ContentKind::from("Blog"), ContentKind::Blog);
        assert_eq!(ContentKind::from("ARTICLE"), ContentKind::Article);
        assert_eq!(
            ContentKind::from("recipe"),
            ContentKind::Other("recipe".to_string())
        );
        assert_eq!(ContentKind::Other("recipe".into()).as_str(), "recipe");
    }

    #[test]
    fn test_site_mode_conversion() {
        assert_eq!(SiteMode::from_str("blog"), Some(SiteMode::Blog));
        assert_eq!(SiteMode::from_str(" Structured "), Some(SiteMode::Structured));
        assert_eq!(SiteMode::from_str("wiki"), None);
    }

    #[test]
    fn test_contributor_full_name_falls_back_to_handle() {
        let c = Contributor {
            handle: "jdoe".into(),
            ..Default::default()
        };
        assert_eq!(c.full_name(), "jdoe");

        let c = Contributor {
            name: "Jane".into(),
            surname: "Doe".into(),
            handle: "jdoe".into(),
            ..Default::default()
        };
        assert_eq!(c.full_name(), "Jane Doe");
    }

    #[test]
    fn test_section_root_detection() {
        let root = Section {
            path: "/".into(),
            ..Default::default()
        };
        let blog = Section {
            path: "/blog".into(),
            ..Default::default()
        };
        assert!(root.is_root());
        assert!(!blog.is_root());
    }
}
