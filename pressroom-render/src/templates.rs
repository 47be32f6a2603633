//! Askama template definitions.

use askama::Template;
use pressroom_core::generate::{BlockLinks, LinkItem};

/// Content page template
#[derive(Template)]
#[template(path = "content.html")]
pub struct ContentTemplate {
    // Page metadata
    pub title: String,
    pub description: String,
    pub kind: String,
    pub author: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,

    // Content
    pub body_html: String,
    pub blocks_html: String,

    // Section breadcrumb
    pub section_name: String,
    pub section_url: String,

    // Site metadata
    pub site_name: String,
    pub year: i32,
    pub body_class: String,

    // Layout CSS from the section's layout
    pub layout_css: Option<String>,
}

/// Paginated index template, used for the root and for each section
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub description: String,
    pub items: Vec<LinkItem>,

    // Pagination
    pub page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,

    // Site metadata
    pub site_name: String,
    pub year: i32,
    pub body_class: String,
    pub layout_css: Option<String>,
}

/// Series navigation and related links, rendered into content pages
#[derive(Template)]
#[template(path = "blocks.html")]
pub struct BlocksTemplate {
    pub series: String,
    pub prev: Option<LinkItem>,
    pub next: Option<LinkItem>,
    pub forward: Vec<LinkItem>,
    pub backward: Vec<LinkItem>,
    pub related: Vec<LinkItem>,
}

impl From<&BlockLinks> for BlocksTemplate {
    fn from(blocks: &BlockLinks) -> Self {
        Self {
            series: blocks.series.clone(),
            prev: blocks.prev.clone(),
            next: blocks.next.clone(),
            forward: blocks.forward.clone(),
            backward: blocks.backward.clone(),
            related: blocks.related.clone(),
        }
    }
}
