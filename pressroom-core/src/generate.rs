//! Static site generation.
//!
//! [`SiteGenerator`] turns a site's entities into two trees: the published
//! HTML site and a markdown export that doubles as an import root.

use crate::backup::{export_meta, is_image_file, BackupError};
use crate::blocks::{build_blocks, GeneratedBlocks};
use crate::frontmatter::{self, format_datetime};
use crate::markdown::{first_paragraph, ContentProcessor, ProcessorOptions};
use crate::service::{Service, ServiceError};
use crate::settings::SiteSettings;
use crate::slug::content_slug;
use crate::workspace::{
    self, clean_dir, clean_dir_except, ensure_site_dirs, page_url, SitePaths, Workspace, WorkspaceError,
};
use chrono::{DateTime, Utc};
use pressroom_types::{Content, ContentKind, Id, Section, Site};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

const GIT_DIR: &str = ".git";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(String),
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Backup(#[from] BackupError),
}

/// Turns page contexts into complete HTML documents
pub trait PageRenderer: Send + Sync {
    fn render_content(&self, page: &ContentPage) -> Result<String, RenderError>;
    fn render_index(&self, page: &IndexPage) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteInfo {
    pub slug: String,
    pub name: String,
    pub mode: String,
}

/// A link to one content item as shown in listings and blocks
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkItem {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub date: Option<String>,
    pub image: Option<String>,
}

/// [`GeneratedBlocks`] projected to links
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockLinks {
    pub related: Vec<LinkItem>,
    pub series: String,
    pub prev: Option<LinkItem>,
    pub next: Option<LinkItem>,
    pub forward: Vec<LinkItem>,
    pub backward: Vec<LinkItem>,
}

impl BlockLinks {
    pub fn has_content(&self) -> bool {
        !self.related.is_empty()
            || self.prev.is_some()
            || self.next.is_some()
            || !self.forward.is_empty()
            || !self.backward.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentPage {
    pub site: SiteInfo,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub body_html: String,
    pub summary: String,
    pub description: String,
    pub author: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub tags: Vec<String>,
    pub section_name: String,
    pub section_url: String,
    pub image: Option<String>,
    pub layout_css: Option<String>,
    pub blocks: BlockLinks,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexPage {
    pub site: SiteInfo,
    pub title: String,
    pub description: String,
    pub url: String,
    pub items: Vec<LinkItem>,
    pub page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    pub pages: usize,
    pub indices: usize,
    pub images: usize,
    pub errors: Vec<String>,
}

/// Everything generation needs about one site, loaded up front
struct SiteData {
    site: Site,
    settings: SiteSettings,
    paths: SitePaths,
    sections: HashMap<Id, Section>,
    content: Vec<Content>,
}

impl SiteData {
    fn section_path(&self, content: &Content) -> &str {
        self.sections
            .get(&content.section_id)
            .map(|s| s.path.as_str())
            .unwrap_or("/")
    }

    fn url_of(&self, content: &Content) -> String {
        workspace::content_url(
            self.section_path(content),
            &content_slug(&content.heading, &content.short_id),
        )
    }
}

#[derive(Clone)]
pub struct SiteGenerator {
    service: Arc<dyn Service>,
    renderer: Arc<dyn PageRenderer>,
    workspace: Workspace,
}

impl SiteGenerator {
    pub fn new(service: Arc<dyn Service>, renderer: Arc<dyn PageRenderer>, workspace: Workspace) -> Self {
        Self {
            service,
            renderer,
            workspace,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn load(&self, site_id: Id) -> Result<SiteData, GenerateError> {
        let site = self.service.get_site(site_id)?;
        let settings = SiteSettings::from_settings(&self.service.get_settings(site_id)?);
        let sections = self
            .service
            .get_sections(site_id)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let content = self.service.get_all_content_with_meta(site_id)?;
        let paths = self.workspace.site(&site.slug);
        ensure_site_dirs(&paths)?;

        Ok(SiteData {
            site,
            settings,
            paths,
            sections,
            content,
        })
    }

    /// Regenerate the published HTML tree. The tree is cleaned first, so an
    /// interrupted run leaves a partial site until the next run. A publishing
    /// checkout (`.git`) inside the tree survives the clean.
    pub fn generate_html(&self, site_id: Id) -> Result<GenerationReport, GenerateError> {
        let data = self.load(site_id)?;
        clean_dir_except(&data.paths.html, &[GIT_DIR])?;

        let now = Utc::now();
        let mut published: Vec<Content> = data
            .content
            .iter()
            .filter(|c| c.is_published_at(now))
            .cloned()
            .collect();
        published.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let info = SiteInfo {
            slug: data.site.slug.clone(),
            name: if data.site.name.is_empty() {
                data.site.slug.clone()
            } else {
                data.site.name.clone()
            },
            mode: data.site.mode.as_str().to_string(),
        };
        let processor = ContentProcessor::new(
            ProcessorOptions::for_site(&data.site.slug).with_forms_endpoint(data.settings.forms_endpoint.clone()),
        );
        let authors = self.service.build_user_authors_map(site_id)?;
        let mut report = GenerationReport::default();

        for content in &published {
            let result = self
                .content_page(&data, &info, &processor, &authors, content, &published)
                .and_then(|page| {
                    let html = self.renderer.render_content(&page).map_err(|e| e.to_string())?;
                    let path = data.paths.content_html_path(
                        data.section_path(content),
                        &content_slug(&content.heading, &content.short_id),
                    );
                    write_file(&path, &html).map_err(|e| e.to_string())
                });
            match result {
                Ok(()) => report.pages += 1,
                Err(e) => report.errors.push(format!("{}: {}", content.short_id, e)),
            }
        }

        let listed: Vec<&Content> = published.iter().filter(|c| c.kind != ContentKind::Page).collect();
        self.write_index(&data, &info, "/", &info.name, "", &listed, &mut report);

        let mut sections: Vec<&Section> = data.sections.values().filter(|s| !s.is_root()).collect();
        sections.sort_by(|a, b| a.path.cmp(&b.path));
        for section in sections {
            let items: Vec<&Content> = listed
                .iter()
                .copied()
                .filter(|c| c.section_id == section.id)
                .collect();
            self.write_index(&data, &info, &section.path, &section.name, &section.description, &items, &mut report);
        }

        report.images = copy_images(&data.paths.images, &data.paths.html_images_dir(), &mut report.errors);

        tracing::info!(
            site = %data.site.slug,
            pages = report.pages,
            indices = report.indices,
            images = report.images,
            errors = report.errors.len(),
            "generated html"
        );
        Ok(report)
    }

    fn content_page(
        &self,
        data: &SiteData,
        info: &SiteInfo,
        processor: &ContentProcessor,
        authors: &BTreeMap<Id, String>,
        content: &Content,
        published: &[Content],
    ) -> Result<ContentPage, String> {
        let summary = if content.summary.trim().is_empty() {
            first_paragraph(&content.body).unwrap_or_default()
        } else {
            content.summary.clone()
        };
        let section = data.sections.get(&content.section_id);
        let layout_css = match section.and_then(|s| s.layout_id) {
            Some(id) => match self.service.get_layout(id) {
                Ok(layout) if !layout.css.trim().is_empty() => Some(layout.css),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(layout = %id, error = %e, "layout lookup failed");
                    None
                }
            },
            None => None,
        };

        let blocks = build_blocks(content, published, &data.settings.blocks);

        Ok(ContentPage {
            site: info.clone(),
            title: content.heading.clone(),
            url: data.url_of(content),
            kind: content.kind.to_string(),
            body_html: processor.to_html(&content.body),
            description: if content.meta.description.is_empty() {
                summary.clone()
            } else {
                content.meta.description.clone()
            },
            summary,
            author: content.contributor_id.and_then(|id| authors.get(&id).cloned()),
            published: content.published_at.as_ref().map(display_date),
            updated: content.updated_at.as_ref().map(display_date),
            tags: content.tags.iter().map(|t| t.name.clone()).collect(),
            section_name: section.map(|s| s.name.clone()).unwrap_or_default(),
            section_url: workspace::section_url(data.section_path(content)),
            image: public_image(&data.site.slug, &content.image),
            layout_css,
            blocks: block_links(data, content, &blocks),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn write_index(
        &self,
        data: &SiteData,
        info: &SiteInfo,
        section_path: &str,
        title: &str,
        description: &str,
        items: &[&Content],
        report: &mut GenerationReport,
    ) {
        let per_page = data.settings.index_max_items.max(1);
        let total_pages = items.len().div_ceil(per_page).max(1);

        for page in 1..=total_pages {
            let start = (page - 1) * per_page;
            let index = IndexPage {
                site: info.clone(),
                title: title.to_string(),
                description: description.to_string(),
                url: page_url(section_path, page),
                items: items
                    .iter()
                    .skip(start)
                    .take(per_page)
                    .map(|c| link_item(data, c))
                    .collect(),
                page,
                total_pages,
                prev_url: (page > 1).then(|| page_url(section_path, page - 1)),
                next_url: (page < total_pages).then(|| page_url(section_path, page + 1)),
            };
            let path = data.paths.paginated_index_path(section_path, page);
            let result = self
                .renderer
                .render_index(&index)
                .map_err(|e| e.to_string())
                .and_then(|html| write_file(&path, &html).map_err(|e| e.to_string()));
            match result {
                Ok(()) => report.indices += 1,
                Err(e) => report.errors.push(format!("index {} page {}: {}", section_path, page, e)),
            }
        }
    }

    /// Write the markdown export: content files, images, and a backup
    /// bundle, laid out as an import root
    pub fn generate_markdown(&self, site_id: Id) -> Result<GenerationReport, GenerateError> {
        let data = self.load(site_id)?;
        clean_dir(&data.paths.markdown)?;

        let handles: HashMap<Id, String> = self
            .service
            .get_contributors(site_id)?
            .into_iter()
            .map(|c| (c.id, c.handle))
            .collect();
        let mut report = GenerationReport::default();

        for content in &data.content {
            let section_path = data.section_path(content);
            let path = data
                .paths
                .content_markdown_path(section_path, &content_slug(&content.heading, &content.short_id));
            let fields = markdown_fields(content, section_path, &handles);
            let result = frontmatter::join(&fields, &content.body)
                .map_err(|e| e.to_string())
                .and_then(|doc| write_file(&path, &doc).map_err(|e| e.to_string()));
            match result {
                Ok(()) => report.pages += 1,
                Err(e) => report.errors.push(format!("{}: {}", content.short_id, e)),
            }
        }

        report.images = copy_images(
            &data.paths.images,
            &data.paths.markdown_images_dir(),
            &mut report.errors,
        );

        let meta = export_meta(self.service.as_ref(), site_id)?;
        meta.write(&data.paths.markdown_meta_dir())?;

        tracing::info!(
            site = %data.site.slug,
            files = report.pages,
            images = report.images,
            errors = report.errors.len(),
            "generated markdown"
        );
        Ok(report)
    }
}

fn markdown_fields(
    content: &Content,
    section_path: &str,
    handles: &HashMap<Id, String>,
) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        if !value.is_empty() {
            fields.insert(key.to_string(), value);
        }
    };

    put("title", content.heading.clone());
    put("short-id", content.short_id.clone());
    put("type", content.kind.to_string());
    put("section", section_path.to_string());
    put("summary", content.summary.clone());
    put("description", content.meta.description.clone());
    put("image", content.image.clone());
    put(
        "author",
        content
            .contributor_id
            .and_then(|id| handles.get(&id).cloned())
            .unwrap_or_default(),
    );
    put("series", content.series.clone());
    if content.series_order > 0 {
        put("series-order", content.series_order.to_string());
    }
    if content.draft {
        put("draft", "true".to_string());
    }
    if content.featured {
        put("featured", "true".to_string());
    }
    put(
        "tags",
        content
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    );
    for (key, at) in [
        ("created-at", content.created_at),
        ("published-at", content.published_at),
        ("updated-at", content.updated_at),
    ] {
        if let Some(at) = at {
            put(key, format_datetime(&at));
        }
    }
    fields
}

fn link_item(data: &SiteData, content: &Content) -> LinkItem {
    let summary = if content.summary.trim().is_empty() {
        first_paragraph(&content.body).unwrap_or_default()
    } else {
        content.summary.clone()
    };
    LinkItem {
        title: content.heading.clone(),
        url: data.url_of(content),
        summary,
        date: content.published_at.as_ref().map(display_date),
        image: public_image(&data.site.slug, &content.image),
    }
}

fn block_links(data: &SiteData, content: &Content, blocks: &GeneratedBlocks) -> BlockLinks {
    let links = |items: &[Content]| items.iter().map(|c| link_item(data, c)).collect::<Vec<_>>();
    BlockLinks {
        related: links(&blocks.related),
        series: content.series.clone(),
        prev: blocks.series_prev.as_ref().map(|c| link_item(data, c)),
        next: blocks.series_next.as_ref().map(|c| link_item(data, c)),
        forward: links(&blocks.series_index_forward),
        backward: links(&blocks.series_index_backward),
    }
}

fn display_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Image reference as served by the published site
fn public_image(site_slug: &str, image: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
        return None;
    }
    let internal = ProcessorOptions::for_site(site_slug);
    Some(match image.strip_prefix(&internal.images_internal_prefix) {
        Some(rest) => format!("{}{}", internal.images_public_prefix, rest),
        None => image.to_string(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| WorkspaceError::io(path, e))
}

/// Copy image files from `source` into `dest`, returning how many were copied
fn copy_images(source: &Path, dest: &Path, errors: &mut Vec<String>) -> usize {
    if !source.is_dir() {
        return 0;
    }
    let mut copied = 0;
    for entry in WalkDir::new(source)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
    {
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(rel);
        let result = target
            .parent()
            .map(fs::create_dir_all)
            .transpose()
            .and_then(|_| fs::copy(entry.path(), &target));
        match result {
            Ok(_) => copied += 1,
            Err(e) => errors.push(format!("image {}: {}", rel.display(), e)),
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::Importer;
    use crate::service::MemoryService;
    use chrono::Duration;
    use pressroom_types::Tag;
    use tempfile::TempDir;

    /// Renders the fields tests look at, one per line
    struct PlainRenderer;

    impl PageRenderer for PlainRenderer {
        fn render_content(&self, page: &ContentPage) -> Result<String, RenderError> {
            let related: Vec<&str> = page.blocks.related.iter().map(|l| l.url.as_str()).collect();
            Ok(format!(
                "title={}\nsummary={}\nrelated={}\n{}",
                page.title,
                page.summary,
                related.join(","),
                page.body_html
            ))
        }

        fn render_index(&self, page: &IndexPage) -> Result<String, RenderError> {
            let urls: Vec<&str> = page.items.iter().map(|l| l.url.as_str()).collect();
            Ok(format!(
                "page={}/{}\nitems={}\nnext={}",
                page.page,
                page.total_pages,
                urls.join(","),
                page.next_url.clone().unwrap_or_default()
            ))
        }
    }

    fn seed(service: &MemoryService) -> Site {
        let site = service
            .insert_site(Site {
                slug: "demo".into(),
                name: "Demo".into(),
                active: true,
                ..Default::default()
            })
            .unwrap();
        service.set_setting(site.id, "index.maxitems", "2").unwrap();
        let blog = service
            .create_section(Section {
                site_id: site.id,
                name: "Blog".into(),
                path: "/blog".into(),
                ..Default::default()
            })
            .unwrap();
        let tag = service
            .create_tag(Tag {
                site_id: site.id,
                name: "Rust".into(),
                slug: "rust".into(),
                ..Default::default()
            })
            .unwrap();
        let now = Utc::now();
        for i in 1..=3 {
            let c = service
                .create_content(Content {
                    site_id: site.id,
                    section_id: blog.id,
                    short_id: format!("post{}", i),
                    kind: ContentKind::Article,
                    heading: format!("Post {}", i),
                    body: format!("Opening paragraph {}.\n\nMore.", i),
                    published_at: Some(now - Duration::days(i)),
                    ..Default::default()
                })
                .unwrap();
            service.add_tag_to_content(c.id, tag.id).unwrap();
        }
        service
            .create_content(Content {
                site_id: site.id,
                section_id: blog.id,
                short_id: "draft1".into(),
                heading: "Draft".into(),
                draft: true,
                published_at: Some(now - Duration::days(1)),
                ..Default::default()
            })
            .unwrap();
        service
            .create_content(Content {
                site_id: site.id,
                section_id: blog.id,
                short_id: "future1".into(),
                heading: "Future".into(),
                published_at: Some(now + Duration::days(1)),
                ..Default::default()
            })
            .unwrap();
        site
    }

    fn generator(service: Arc<MemoryService>, tmp: &TempDir) -> SiteGenerator {
        SiteGenerator::new(service, Arc::new(PlainRenderer), Workspace::new(tmp.path()))
    }

    #[test]
    fn test_generate_html_writes_pages_and_indices() {
        let tmp = TempDir::new().unwrap();
        let service = Arc::new(MemoryService::new());
        let site = seed(&service);
        let paths = Workspace::new(tmp.path()).site("demo");
        fs::create_dir_all(paths.images.join("2024")).unwrap();
        fs::write(paths.images.join("2024/cat.png"), b"png").unwrap();
        fs::create_dir_all(&paths.html).unwrap();
        fs::write(paths.html.join("stale.html"), "old").unwrap();
        fs::create_dir_all(paths.html.join(".git")).unwrap();

        let report = generator(service, &tmp).generate_html(site.id).unwrap();

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.pages, 3, "drafts and future items are skipped");
        assert_eq!(report.images, 1);
        assert!(!paths.html.join("stale.html").exists());
        assert!(paths.html.join(".git").is_dir());
        assert!(paths.html.join("images/2024/cat.png").is_file());

        let post = fs::read_to_string(paths.content_html_path("/blog", "post-1-post1")).unwrap();
        assert!(post.contains("title=Post 1"));
        assert!(post.contains("summary=Opening paragraph 1."));
        assert!(post.contains("related=/blog/post-2-post2/,/blog/post-3-post3/"));

        let first = fs::read_to_string(paths.root_index_path()).unwrap();
        assert!(first.contains("page=1/2"));
        assert!(first.contains("items=/blog/post-1-post1/,/blog/post-2-post2/"));
        assert!(first.contains("next=/page/2/"));
        let second = fs::read_to_string(paths.paginated_index_path("/", 2)).unwrap();
        assert!(second.contains("items=/blog/post-3-post3/"));
        assert!(paths.paginated_index_path("/blog", 2).is_file());
        assert_eq!(report.indices, 4);
    }

    #[test]
    fn test_markdown_export_is_an_import_root() {
        let tmp = TempDir::new().unwrap();
        let service = Arc::new(MemoryService::new());
        let site = seed(&service);

        let report = generator(service.clone(), &tmp).generate_markdown(site.id).unwrap();
        assert_eq!(report.pages, 5);
        let paths = Workspace::new(tmp.path()).site("demo");
        let doc = fs::read_to_string(paths.content_markdown_path("/blog", "post-1-post1")).unwrap();
        assert!(doc.starts_with("---\n"));
        assert!(doc.contains("short-id: post1"));
        assert!(paths.markdown_meta_dir().join("tags.yml").is_file());

        let target = MemoryService::new();
        let copy = target
            .insert_site(Site {
                slug: "copy".into(),
                ..Default::default()
            })
            .unwrap();
        let imported = Importer::new(&target, copy.clone(), Workspace::new(tmp.path()).site("copy"))
            .import(&paths.markdown)
            .unwrap();
        assert_eq!(imported.content_created, 5);
        assert!(imported.errors.is_empty(), "{:?}", imported.errors);

        let originals = service.get_all_content_with_meta(site.id).unwrap();
        let copies = target.get_all_content_with_meta(copy.id).unwrap();
        let original = originals.iter().find(|c| c.short_id == "post2").unwrap();
        let restored = copies.iter().find(|c| c.short_id == "post2").unwrap();
        assert_eq!(restored.heading, original.heading);
        assert_eq!(restored.kind, original.kind);
        assert_eq!(
            restored.published_at.map(|d| d.timestamp()),
            original.published_at.map(|d| d.timestamp())
        );
        assert_eq!(restored.tags[0].name, "Rust");
        assert!(copies.iter().find(|c| c.short_id == "draft1").unwrap().draft);
    }
}
