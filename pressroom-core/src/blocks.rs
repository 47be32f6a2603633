//! Related-content and series-navigation blocks.

use pressroom_types::{Content, ContentKind};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlocksConfig {
    pub enabled: bool,
    /// Allow related items from other sections
    pub multi_section: bool,
    pub max_items: usize,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            multi_section: false,
            max_items: 5,
        }
    }
}

/// Recommendation sets for one content item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedBlocks {
    pub related: Vec<Content>,
    pub series_prev: Option<Content>,
    pub series_next: Option<Content>,
    /// Later entries of the series, in order
    pub series_index_forward: Vec<Content>,
    /// Earlier entries of the series, nearest first
    pub series_index_backward: Vec<Content>,
}

impl GeneratedBlocks {
    pub fn has_content(&self) -> bool {
        !self.related.is_empty()
            || self.series_prev.is_some()
            || self.series_next.is_some()
            || !self.series_index_forward.is_empty()
            || !self.series_index_backward.is_empty()
    }
}

pub fn build_blocks(current: &Content, all: &[Content], config: &BlocksConfig) -> GeneratedBlocks {
    if !config.enabled {
        return GeneratedBlocks::default();
    }

    let mut blocks = GeneratedBlocks {
        related: related(current, all, config),
        ..Default::default()
    };
    fill_series(&mut blocks, current, all, config.max_items);
    blocks
}

fn fill_series(blocks: &mut GeneratedBlocks, current: &Content, all: &[Content], max_items: usize) {
    let series = current.series.trim();
    if series.is_empty() {
        return;
    }

    let mut entries: Vec<&Content> = all.iter().filter(|c| c.series.trim() == series).collect();
    entries.sort_by_key(|c| c.series_order);

    let Some(pos) = entries.iter().position(|c| c.id == current.id) else {
        return;
    };

    blocks.series_prev = pos.checked_sub(1).map(|i| entries[i].clone());
    blocks.series_next = entries.get(pos + 1).map(|c| (*c).clone());
    blocks.series_index_forward = entries[pos + 1..]
        .iter()
        .take(max_items)
        .map(|c| (*c).clone())
        .collect();
    blocks.series_index_backward = entries[..pos]
        .iter()
        .rev()
        .take(max_items)
        .map(|c| (*c).clone())
        .collect();
}

const BLOG_TIERS: &[ContentKind] = &[ContentKind::Blog, ContentKind::Article];
const ARTICLE_TIERS: &[ContentKind] = &[ContentKind::Article, ContentKind::Post, ContentKind::Blog];
const POST_TIERS: &[ContentKind] = &[ContentKind::Article];

/// Kinds consulted, in tier order, when looking for items related to `kind`
fn tiers(kind: &ContentKind) -> &'static [ContentKind] {
    match kind {
        ContentKind::Blog => BLOG_TIERS,
        ContentKind::Article => ARTICLE_TIERS,
        ContentKind::Post => POST_TIERS,
        _ => &[],
    }
}

fn related(current: &Content, all: &[Content], config: &BlocksConfig) -> Vec<Content> {
    let tags: HashSet<_> = current.tags.iter().map(|t| t.id).collect();
    if tags.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<&Content> = all
        .iter()
        .filter(|c| c.id != current.id)
        .filter(|c| config.multi_section || c.section_id == current.section_id)
        .filter(|c| c.tags.iter().any(|t| tags.contains(&t.id)))
        .collect();

    let mut found = Vec::new();
    for tier in tiers(&current.kind) {
        if found.len() >= config.max_items {
            break;
        }
        found.extend(
            candidates
                .iter()
                .filter(|c| &c.kind == tier)
                .take(config.max_items - found.len())
                .map(|c| (*c).clone()),
        );
    }
    found
}
