//! # pressroom-render
//!
//! Template rendering for pressroom sites.
//!
//! This crate renders page contexts from the generator into HTML using Askama.

pub mod templates;

pub use templates::{BlocksTemplate, ContentTemplate, IndexTemplate};

use askama::Template;
use chrono::{Datelike, Utc};
use pressroom_core::generate::{ContentPage, IndexPage, PageRenderer, RenderError};

/// [`PageRenderer`] backed by the built-in Askama templates
#[derive(Debug, Clone, Copy, Default)]
pub struct AskamaRenderer;

impl AskamaRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn template_error(e: askama::Error) -> RenderError {
    RenderError::Template(e.to_string())
}

impl PageRenderer for AskamaRenderer {
    fn render_content(&self, page: &ContentPage) -> Result<String, RenderError> {
        let blocks_html = if page.blocks.has_content() {
            BlocksTemplate::from(&page.blocks)
                .render()
                .map_err(template_error)?
        } else {
            String::new()
        };

        ContentTemplate {
            title: page.title.clone(),
            description: page.description.clone(),
            kind: page.kind.clone(),
            author: page.author.clone(),
            published: page.published.clone(),
            updated: page.updated.clone(),
            tags: page.tags.clone(),
            image: page.image.clone(),
            body_html: page.body_html.clone(),
            blocks_html,
            section_name: page.section_name.clone(),
            section_url: page.section_url.clone(),
            site_name: page.site.name.clone(),
            year: Utc::now().year(),
            body_class: format!("mode-{} page-content", page.site.mode),
            layout_css: page.layout_css.clone(),
        }
        .render()
        .map_err(template_error)
    }

    fn render_index(&self, page: &IndexPage) -> Result<String, RenderError> {
        IndexTemplate {
            title: page.title.clone(),
            description: page.description.clone(),
            items: page.items.clone(),
            page: page.page,
            total_pages: page.total_pages,
            prev_url: page.prev_url.clone(),
            next_url: page.next_url.clone(),
            site_name: page.site.name.clone(),
            year: Utc::now().year(),
            body_class: format!("mode-{} page-index", page.site.mode),
            layout_css: None,
        }
        .render()
        .map_err(template_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_core::generate::{BlockLinks, LinkItem, SiteInfo};

    fn site() -> SiteInfo {
        SiteInfo {
            slug: "demo".into(),
            name: "Demo & Co".into(),
            mode: "blog".into(),
        }
    }

    fn link(title: &str, url: &str) -> LinkItem {
        LinkItem {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_content_page() {
        let page = ContentPage {
            site: site(),
            title: "Hello <world>".into(),
            kind: "article".into(),
            body_html: "<p>Body</p>".into(),
            author: Some("Ada Lovelace".into()),
            published: Some("2024-03-01".into()),
            tags: vec!["rust".into()],
            layout_css: Some("body { color: red; }".into()),
            ..Default::default()
        };

        let html = AskamaRenderer.render_content(&page).unwrap();
        assert!(html.contains("<p>Body</p>"), "body is not escaped");
        assert!(html.contains("Hello &#60;world&#62;") || html.contains("Hello &lt;world&gt;"));
        assert!(html.contains("Demo &#38; Co") || html.contains("Demo &amp; Co"));
        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("<style>body { color: red; }</style>"));
        assert!(html.contains("content-article"));
        assert!(!html.contains("class=\"blocks\""));
    }

    #[test]
    fn test_content_page_with_blocks() {
        let page = ContentPage {
            site: site(),
            title: "Part 2".into(),
            blocks: BlockLinks {
                series: "Basics".into(),
                prev: Some(link("Part 1", "/blog/part-1/")),
                next: Some(link("Part 3", "/blog/part-3/")),
                related: vec![link("Other", "/blog/other/")],
                ..Default::default()
            },
            ..Default::default()
        };

        let html = AskamaRenderer.render_content(&page).unwrap();
        assert!(html.contains("class=\"blocks\""));
        assert!(html.contains("href=\"/blog/part-1/\">Part 1</a>"));
        assert!(html.contains("href=\"/blog/part-3/\">Part 3</a>"));
        assert!(html.contains("href=\"/blog/other/\">Other</a>"));
    }

    #[test]
    fn test_index_pagination() {
        let page = IndexPage {
            site: site(),
            title: "Blog".into(),
            items: vec![link("First", "/blog/first/")],
            page: 2,
            total_pages: 3,
            prev_url: Some("/blog/".into()),
            next_url: Some("/blog/page/3/".into()),
            ..Default::default()
        };

        let html = AskamaRenderer.render_index(&page).unwrap();
        assert!(html.contains("href=\"/blog/first/\">First</a>"));
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains("rel=\"prev\""));
        assert!(html.contains("rel=\"next\""));
    }

    #[test]
    fn test_empty_index() {
        let page = IndexPage {
            site: site(),
            title: "Demo".into(),
            page: 1,
            total_pages: 1,
            ..Default::default()
        };

        let html = AskamaRenderer.render_index(&page).unwrap();
        assert!(html.contains("Nothing published yet."));
        assert!(!html.contains("pagination"));
    }
}
