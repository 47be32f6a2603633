//! Import of a whole content tree into a site.
//!
//! An import root looks like:
//!
//! ```text
//! {root}/content/**.md   frontmatter + body
//! {root}/images/**       image files
//! {root}/profiles/**     contributor photos
//! {root}/meta/           optional backup bundle
//! ```
//!
//! Import is additive. Content whose short id already exists is left alone,
//! so importing the same root twice creates nothing the second time.

use crate::backup::{BackupMeta, HydrationReport, Hydrator, ImageReport, LinkReport, ProfileReport};
use crate::frontmatter::{self, TypedFrontmatter};
use crate::scan;
use crate::service::{ProfileService, Service, ServiceError};
use crate::slug::{normalize_section_path, short_id, slugify};
use crate::workspace::SitePaths;
use pressroom_types::{Content, ContentKind, ContentMeta, Id, Section, Site, Tag};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import root does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] frontmatter::FrontmatterError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub meta: HydrationReport,
    pub content_created: usize,
    pub content_existing: usize,
    pub images: ImageReport,
    pub links: LinkReport,
    pub profiles: ProfileReport,
    /// Bundle load problems and per-file content failures
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
            + self.meta.errors.len()
            + self.images.errors.len()
            + self.links.errors.len()
            + self.profiles.errors.len()
    }
}

pub struct Importer<'a> {
    service: &'a dyn Service,
    profiles: Option<&'a dyn ProfileService>,
    site: Site,
    paths: SitePaths,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a dyn Service, site: Site, paths: SitePaths) -> Self {
        Self {
            service,
            profiles: None,
            site,
            paths,
        }
    }

    pub fn with_profiles(mut self, profiles: &'a dyn ProfileService) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Meta hydration, content, images, content-image links, then profiles
    pub fn import(&self, root: &Path) -> Result<ImportReport, ImportError> {
        if !root.is_dir() {
            return Err(ImportError::MissingRoot(root.to_path_buf()));
        }
        tracing::info!(site = %self.site.slug, root = %root.display(), "importing");

        let mut report = ImportReport::default();
        let hydrator = Hydrator::new(self.service, self.site.id);

        let meta = BackupMeta::load(&root.join("meta"));
        report.errors.extend(meta.errors.iter().cloned());
        report.meta = hydrator.hydrate_meta(&meta);

        self.import_content(&root.join("content"), &mut report);

        report.images = hydrator.hydrate_images(&root.join("images"), &self.paths.images, &meta);
        report.links = hydrator.hydrate_content_images(&meta);
        if let Some(profiles) = self.profiles {
            report.profiles = hydrator.hydrate_profiles(profiles, &root.join("profiles"));
        }

        tracing::info!(
            site = %self.site.slug,
            created = report.content_created,
            existing = report.content_existing,
            errors = report.error_count(),
            "import finished"
        );
        Ok(report)
    }

    fn import_content(&self, dir: &Path, report: &mut ImportReport) {
        if !dir.is_dir() {
            return;
        }

        let files = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"));

        for entry in files {
            let Ok(rel) = entry.path().strip_prefix(dir) else {
                continue;
            };
            match self.import_file(entry.path(), rel) {
                Ok(true) => report.content_created += 1,
                Ok(false) => report.content_existing += 1,
                Err(e) => {
                    tracing::warn!(file = %rel.display(), error = %e, "content import failed");
                    report.errors.push(format!("{}: {}", rel.display(), e));
                }
            }
        }
    }

    /// `Ok(false)` when the short id is already taken
    fn import_file(&self, path: &Path, rel: &Path) -> Result<bool, ImportError> {
        let document = fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (typed, body) = frontmatter::parse_typed(&document)?;
        let fm = typed.unwrap_or_default();

        let rel_str = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let short = fm
            .short_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| short_id(&rel_str));

        if self
            .service
            .get_content_by_short_id(self.site.id, &short)?
            .is_some()
        {
            return Ok(false);
        }

        let section = self.ensure_section(&section_path_for(&fm, rel))?;
        let content = self.service.create_content(self.content_record(&fm, &body, rel, short, &section))?;

        for name in fm.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let tag = self.ensure_tag(name)?;
            self.service.add_tag_to_content(content.id, tag.id)?;
        }

        tracing::debug!(short_id = %content.short_id, heading = %content.heading, "imported content");
        Ok(true)
    }

    fn content_record(
        &self,
        fm: &TypedFrontmatter,
        body: &str,
        rel: &Path,
        short: String,
        section: &Section,
    ) -> Content {
        let heading = fm
            .title
            .clone()
            .or_else(|| scan::first_h1(body))
            .or_else(|| rel.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();

        let kind = match &fm.kind {
            Some(kind) => ContentKind::from(kind.as_str()),
            None if section.is_root() => ContentKind::Page,
            None => ContentKind::Post,
        };

        Content {
            short_id: short,
            site_id: self.site.id,
            section_id: section.id,
            contributor_id: self.contributor_id(fm.contributor.as_deref()),
            kind,
            heading,
            summary: fm.summary.clone().unwrap_or_default(),
            body: body.to_string(),
            image: fm.image.clone().unwrap_or_default(),
            series: fm.series.clone().unwrap_or_default(),
            series_order: fm.series_order.unwrap_or(0),
            draft: fm.draft,
            featured: fm.featured,
            published_at: fm.published_at,
            created_at: fm.created_at.or(fm.published_at),
            updated_at: fm.updated_at,
            meta: ContentMeta {
                description: fm.description.clone().unwrap_or_default(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn contributor_id(&self, handle: Option<&str>) -> Option<Id> {
        let handle = handle?.trim();
        if handle.is_empty() {
            return None;
        }
        match self.service.get_contributor_by_handle(self.site.id, handle) {
            Ok(Some(c)) => Some(c.id),
            Ok(None) => {
                tracing::debug!(handle, "unknown contributor handle");
                None
            }
            Err(e) => {
                tracing::warn!(handle, error = %e, "contributor lookup failed");
                None
            }
        }
    }

    fn ensure_section(&self, path: &str) -> Result<Section, ImportError> {
        if let Some(section) = self.service.get_section_by_path(self.site.id, path)? {
            return Ok(section);
        }
        let name = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("Home");
        Ok(self.service.create_section(Section {
            site_id: self.site.id,
            name: name.to_string(),
            path: path.to_string(),
            ..Default::default()
        })?)
    }

    fn ensure_tag(&self, name: &str) -> Result<Tag, ImportError> {
        if let Some(tag) = self.service.get_tag_by_name(self.site.id, name)? {
            return Ok(tag);
        }
        Ok(self.service.create_tag(Tag {
            site_id: self.site.id,
            name: name.to_string(),
            slug: slugify(name),
            ..Default::default()
        })?)
    }
}

/// Frontmatter `section`, else the file's directory under `content/`
fn section_path_for(fm: &TypedFrontmatter, rel: &Path) -> String {
    if let Some(section) = fm.section.as_deref().filter(|s| !s.trim().is_empty()) {
        return normalize_section_path(section);
    }
    let dir = rel
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    normalize_section_path(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryService;
    use crate::workspace::Workspace;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn fixture(root: &Path) {
        write(
            root,
            "content/blog/hello.md",
            "---\ntitle: Hello World\ntype: article\ntags: rust, web\nauthor: ada\npublished-at: 2024-03-01T10:00:00Z\n---\nFirst post.\n",
        );
        write(root, "content/about.md", "# About us\n\nWe write things.\n");
        write(
            root,
            "content/blog/guide.md",
            "---\nshort-id: fixed01\nsection: /guides\ntags: [rust]\n---\nBody\n",
        );
        write(root, "content/broken.md", "---\ntitle: [unclosed\n---\nBody\n");
        write(root, "meta/contributors.yml", "- handle: ada\n  name: Ada\n");
        write(root, "meta/content_images.yml", "fixed01:\n  - image_path: cover.png\n    is_header: true\n");
        write(root, "images/cover.png", "png");
        write(root, "profiles/ada.png", "png");
    }

    fn setup(tmp: &TempDir) -> (MemoryService, Site, SitePaths) {
        let service = MemoryService::new();
        let site = service
            .insert_site(Site {
                slug: "demo".into(),
                ..Default::default()
            })
            .unwrap();
        let paths = Workspace::new(tmp.path().join("ws")).site("demo");
        (service, site, paths)
    }

    #[test]
    fn test_import_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("import");
        fixture(&root);
        let (service, site, paths) = setup(&tmp);

        let report = Importer::new(&service, site.clone(), paths.clone())
            .with_profiles(&service)
            .import(&root)
            .unwrap();

        assert_eq!(report.content_created, 3);
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(report.errors[0].starts_with("broken.md"));
        assert_eq!(report.meta.contributors_created, 1);
        assert_eq!(report.images.created, 1);
        assert_eq!(report.links.created, 1);
        assert_eq!(report.profiles.created, 1);
        assert!(paths.images.join("cover.png").is_file());

        let all = service.get_all_content_with_meta(site.id).unwrap();
        let hello = all.iter().find(|c| c.heading == "Hello World").unwrap();
        assert_eq!(hello.kind, ContentKind::Article);
        assert_eq!(hello.tags.len(), 2);
        assert!(hello.contributor_id.is_some());
        assert_eq!(service.get_section(hello.section_id).unwrap().path, "/blog");

        let about = all.iter().find(|c| c.heading == "About us").unwrap();
        assert_eq!(about.kind, ContentKind::Page);
        assert!(service.get_section(about.section_id).unwrap().is_root());

        let guide = all.iter().find(|c| c.short_id == "fixed01").unwrap();
        assert_eq!(service.get_section(guide.section_id).unwrap().path, "/guides");
        assert_eq!(guide.heading, "guide");
    }

    #[test]
    fn test_second_import_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("import");
        fixture(&root);
        let (service, site, paths) = setup(&tmp);
        let importer = Importer::new(&service, site.clone(), paths).with_profiles(&service);

        importer.import(&root).unwrap();
        let second = importer.import(&root).unwrap();

        assert_eq!(second.content_created, 0);
        assert_eq!(second.content_existing, 3);
        assert_eq!(second.meta.created(), 0);
        assert_eq!(second.images.created, 0);
        assert_eq!(second.links.created, 0);
        assert_eq!(second.profiles.created, 0);
        assert_eq!(service.get_all_content_with_meta(site.id).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_root_is_terminal() {
        let tmp = TempDir::new().unwrap();
        let (service, site, paths) = setup(&tmp);
        let err = Importer::new(&service, site, paths)
            .import(&tmp.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingRoot(_)));
    }
}
