use super::*;
use crate::service::{ProfileService, Service};
use crate::slug::{normalize_section_path, short_id, slugify};
use crate::workspace::Workspace;
use pressroom_types::{ContentImage, Contributor, Id, Image, Layout, Profile, Section, Tag};
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Outcome of [`Hydrator::hydrate_meta`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HydrationReport {
    pub layouts_created: usize,
    pub contributors_created: usize,
    pub tags_created: usize,
    pub sections_created: usize,
    /// Records that already existed
    pub existing: usize,
    pub errors: Vec<String>,
}

impl HydrationReport {
    pub fn created(&self) -> usize {
        self.layouts_created + self.contributors_created + self.tags_created + self.sections_created
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageReport {
    pub copied: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileReport {
    pub created: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkReport {
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Re-creates missing entities of one site from a bundle
pub struct Hydrator<'a> {
    service: &'a dyn Service,
    site_id: Id,
}

impl<'a> Hydrator<'a> {
    pub fn new(service: &'a dyn Service, site_id: Id) -> Self {
        Self { service, site_id }
    }

    /// Layouts, contributors, tags, then sections (which refer to layouts)
    pub fn hydrate_meta(&self, meta: &BackupMeta) -> HydrationReport {
        let mut report = HydrationReport::default();

        for layout in &meta.layouts {
            match self.ensure_layout(layout) {
                Ok(true) => report.layouts_created += 1,
                Ok(false) => report.existing += 1,
                Err(e) => report.errors.push(format!("layout {}: {}", layout.name, e)),
            }
        }
        for contributor in &meta.contributors {
            match self.ensure_contributor(contributor) {
                Ok(true) => report.contributors_created += 1,
                Ok(false) => report.existing += 1,
                Err(e) => report
                    .errors
                    .push(format!("contributor {}: {}", contributor.handle, e)),
            }
        }
        for tag in &meta.tags {
            match self.ensure_tag(tag) {
                Ok(true) => report.tags_created += 1,
                Ok(false) => report.existing += 1,
                Err(e) => report.errors.push(format!("tag {}: {}", tag.name, e)),
            }
        }
        for section in &meta.sections {
            match self.ensure_section(section) {
                Ok(true) => report.sections_created += 1,
                Ok(false) => report.existing += 1,
                Err(e) => report.errors.push(format!("section {}: {}", section.path, e)),
            }
        }

        tracing::info!(
            site_id = %self.site_id,
            created = report.created(),
            existing = report.existing,
            errors = report.errors.len(),
            "hydrated backup metadata"
        );
        report
    }

    fn ensure_layout(&self, meta: &MetaLayout) -> Result<bool, BackupError> {
        if self.service.get_layout_by_name(self.site_id, &meta.name)?.is_some() {
            return Ok(false);
        }
        self.service.create_layout(Layout {
            site_id: self.site_id,
            name: meta.name.clone(),
            description: meta.description.clone(),
            code: meta.code.clone(),
            css: meta.css.clone(),
            ..Default::default()
        })?;
        Ok(true)
    }

    fn ensure_contributor(&self, meta: &MetaContributor) -> Result<bool, BackupError> {
        if self
            .service
            .get_contributor_by_handle(self.site_id, &meta.handle)?
            .is_some()
        {
            return Ok(false);
        }
        self.service.create_contributor(Contributor {
            site_id: self.site_id,
            name: meta.name.clone(),
            surname: meta.surname.clone(),
            handle: meta.handle.clone(),
            bio: meta.bio.clone(),
            social_links: meta.social_links.clone(),
            photo_path: meta.photo_path.clone(),
            ..Default::default()
        })?;
        Ok(true)
    }

    fn ensure_tag(&self, meta: &MetaTag) -> Result<bool, BackupError> {
        if self.service.get_tag_by_name(self.site_id, &meta.name)?.is_some() {
            return Ok(false);
        }
        let slug = if meta.slug.is_empty() {
            slugify(&meta.name)
        } else {
            meta.slug.clone()
        };
        self.service.create_tag(Tag {
            site_id: self.site_id,
            name: meta.name.clone(),
            slug,
            ..Default::default()
        })?;
        Ok(true)
    }

    fn ensure_section(&self, meta: &MetaSection) -> Result<bool, BackupError> {
        // Bundles carry the stored path verbatim
        if self.service.get_section_by_path(self.site_id, &meta.path)?.is_some() {
            return Ok(false);
        }
        let path = normalize_section_path(&meta.path);
        if self.service.get_section_by_path(self.site_id, &path)?.is_some() {
            return Ok(false);
        }
        let layout_id = if meta.layout_name.is_empty() {
            None
        } else {
            let layout = self
                .service
                .get_layout_by_name(self.site_id, &meta.layout_name)?
                .ok_or_else(|| crate::service::ServiceError::not_found("layout", &meta.layout_name))?;
            Some(layout.id)
        };
        self.service.create_section(Section {
            site_id: self.site_id,
            name: meta.name.clone(),
            description: meta.description.clone(),
            path,
            layout_id,
            image: meta.image.clone(),
            ..Default::default()
        })?;
        Ok(true)
    }

    /// Copy every supported image under `source` into `dest` and make sure
    /// each has a record, applying metadata from the bundle when present
    pub fn hydrate_images(&self, source: &Path, dest: &Path, meta: &BackupMeta) -> ImageReport {
        let mut report = ImageReport::default();
        if !source.is_dir() {
            return report;
        }

        for entry in WalkDir::new(source)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
        {
            let Ok(rel) = entry.path().strip_prefix(source) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if let Err(e) = self.hydrate_image(entry.path(), &rel, dest, meta, &mut report) {
                report.errors.push(format!("image {}: {}", rel, e));
            }
        }

        tracing::info!(
            site_id = %self.site_id,
            copied = report.copied,
            created = report.created,
            updated = report.updated,
            "hydrated images"
        );
        report
    }

    fn hydrate_image(
        &self,
        file: &Path,
        rel: &str,
        dest: &Path,
        meta: &BackupMeta,
        report: &mut ImageReport,
    ) -> Result<(), BackupError> {
        let target = Workspace::confine(dest, rel)?;
        if target != file {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BackupError::io(parent, e))?;
            }
            fs::copy(file, &target).map_err(|e| BackupError::io(&target, e))?;
            report.copied += 1;
        }

        let image_meta = meta.images.get(rel);
        match self.service.get_image_by_path(self.site_id, rel)? {
            Some(mut existing) => {
                if let Some(m) = image_meta {
                    m.apply_to(&mut existing);
                    self.service.update_image(&existing)?;
                    report.updated += 1;
                }
            }
            None => {
                let mut image = Image {
                    site_id: self.site_id,
                    short_id: short_id(rel),
                    file_path: rel.to_string(),
                    ..Default::default()
                };
                if let Some(m) = image_meta {
                    m.apply_to(&mut image);
                }
                self.service.create_image(image)?;
                report.created += 1;
            }
        }
        Ok(())
    }

    /// Create and link a profile for every contributor that lacks one
    pub fn hydrate_profiles(&self, profiles: &dyn ProfileService, photos_dir: &Path) -> ProfileReport {
        let mut report = ProfileReport::default();

        let contributors = match self.service.get_contributors(self.site_id) {
            Ok(c) => c,
            Err(e) => {
                report.errors.push(format!("contributors: {}", e));
                return report;
            }
        };

        for mut contributor in contributors.into_iter().filter(|c| c.profile_id.is_none()) {
            let photo = find_photo(&contributor, photos_dir);
            let profile = Profile {
                site_id: self.site_id,
                slug: slugify(&contributor.handle),
                title: contributor.full_name(),
                bio: contributor.bio.clone(),
                photo_path: photo.unwrap_or_default(),
                social_links: contributor
                    .social_links
                    .iter()
                    .filter(|(_, url)| !url.trim().is_empty())
                    .map(|(k, v)| (k.clone(), v.trim().to_string()))
                    .collect(),
                ..Default::default()
            };

            let linked = profiles.create_profile(profile).and_then(|profile| {
                contributor.profile_id = Some(profile.id);
                self.service.update_contributor(&contributor)
            });
            match linked {
                Ok(()) => report.created += 1,
                Err(e) => {
                    tracing::warn!(handle = %contributor.handle, error = %e, "profile hydration failed");
                    report
                        .errors
                        .push(format!("profile {}: {}", contributor.handle, e));
                }
            }
        }

        report
    }

    /// Link content to images by short id and file path
    pub fn hydrate_content_images(&self, meta: &BackupMeta) -> LinkReport {
        let mut report = LinkReport::default();

        for (short, links) in &meta.content_images {
            let content = match self.service.get_content_by_short_id(self.site_id, short) {
                Ok(Some(content)) => content,
                Ok(None) => {
                    report.skipped += links.len();
                    continue;
                }
                Err(e) => {
                    report.errors.push(format!("content {}: {}", short, e));
                    continue;
                }
            };

            for link in links {
                let image = match self.service.get_image_by_path(self.site_id, &link.image_path) {
                    Ok(Some(image)) => image,
                    Ok(None) => {
                        report.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        report.errors.push(format!("image {}: {}", link.image_path, e));
                        continue;
                    }
                };
                let result = self.service.create_content_image(ContentImage {
                    content_id: content.id,
                    image_id: image.id,
                    is_header: link.is_header,
                    is_featured: link.is_featured,
                    order_num: link.order_num,
                    ..Default::default()
                });
                match result {
                    Ok(_) => report.created += 1,
                    Err(e) if e.is_conflict() => report.existing += 1,
                    Err(e) => report
                        .errors
                        .push(format!("link {} -> {}: {}", short, link.image_path, e)),
                }
            }
        }

        report
    }
}

/// An explicit photo path that exists, else `{handle}.{ext}` in `photos_dir`
fn find_photo(contributor: &Contributor, photos_dir: &Path) -> Option<String> {
    let explicit = contributor.photo_path.trim();
    if !explicit.is_empty() {
        let candidate = Path::new(explicit);
        let resolved = if candidate.is_absolute() {
            Some(candidate.to_path_buf())
        } else {
            Workspace::confine(photos_dir, explicit).ok()
        };
        if resolved.is_some_and(|p| p.is_file()) {
            return Some(explicit.to_string());
        }
    }

    if contributor.handle.is_empty() {
        return None;
    }
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", contributor.handle, ext))
        .find(|name| photos_dir.join(name).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MemoryService, ServiceError, ServiceResult};
    use pressroom_types::{Content, Site};
    use tempfile::TempDir;

    fn setup() -> (MemoryService, Id) {
        let service = MemoryService::new();
        let site = service
            .insert_site(Site {
                slug: "demo".into(),
                ..Default::default()
            })
            .unwrap();
        (service, site.id)
    }

    fn bundle() -> BackupMeta {
        BackupMeta {
            layouts: vec![MetaLayout {
                name: "Wide".into(),
                code: "<main></main>".into(),
                ..Default::default()
            }],
            contributors: vec![MetaContributor {
                handle: "ada".into(),
                name: "Ada".into(),
                ..Default::default()
            }],
            tags: vec![MetaTag {
                name: "Rust".into(),
                slug: String::new(),
            }],
            sections: vec![
                MetaSection {
                    name: "Blog".into(),
                    path: "/blog".into(),
                    layout_name: "Wide".into(),
                    ..Default::default()
                },
                MetaSection {
                    name: "Orphan".into(),
                    path: "/orphan".into(),
                    layout_name: "Missing".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_hydrate_meta_is_idempotent() {
        let (service, site_id) = setup();
        let mut meta = bundle();
        meta.sections.pop();
        let hydrator = Hydrator::new(&service, site_id);

        let first = hydrator.hydrate_meta(&meta);
        assert_eq!(first.created(), 4);
        assert!(first.errors.is_empty());

        let second = hydrator.hydrate_meta(&meta);
        assert_eq!(second.created(), 0);
        assert_eq!(second.existing, 4);
        assert!(second.errors.is_empty());

        let section = service.get_section_by_path(site_id, "/blog").unwrap().unwrap();
        let layout = service.get_layout_by_name(site_id, "Wide").unwrap().unwrap();
        assert_eq!(section.layout_id, Some(layout.id));
        assert_eq!(service.get_tags(site_id).unwrap()[0].slug, "rust");
    }

    #[test]
    fn test_exported_meta_hydrates_back_into_same_site() {
        let (service, site_id) = setup();
        service
            .create_section(Section {
                site_id,
                name: "Docs".into(),
                path: "/Docs".into(),
                ..Default::default()
            })
            .unwrap();

        let meta = export_meta(&service, site_id).unwrap();
        assert_eq!(meta.sections[0].path, "/Docs");

        let report = Hydrator::new(&service, site_id).hydrate_meta(&meta);
        assert_eq!(report.sections_created, 0);
        assert_eq!(report.existing, 1);
        assert_eq!(service.get_sections(site_id).unwrap().len(), 1);
    }

    #[test]
    fn test_unresolved_layout_skips_section() {
        let (service, site_id) = setup();
        let report = Hydrator::new(&service, site_id).hydrate_meta(&bundle());
        assert_eq!(report.sections_created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("/orphan"));
        assert!(service.get_section_by_path(site_id, "/orphan").unwrap().is_none());
    }

    #[test]
    fn test_hydrate_images() {
        let (service, site_id) = setup();
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("import/images");
        fs::create_dir_all(source.join("2024")).unwrap();
        fs::write(source.join("2024/cat.PNG"), b"png").unwrap();
        fs::write(source.join("logo.svg"), b"<svg/>").unwrap();
        fs::write(source.join("notes.txt"), b"skip").unwrap();
        let dest = tmp.path().join("site/images");

        let mut meta = BackupMeta::default();
        meta.images.insert(
            "2024/cat.PNG".into(),
            MetaImage {
                alt_text: "A cat".into(),
                ..Default::default()
            },
        );

        let hydrator = Hydrator::new(&service, site_id);
        let first = hydrator.hydrate_images(&source, &dest, &meta);
        assert_eq!((first.copied, first.created, first.updated), (2, 2, 0));
        assert!(dest.join("2024/cat.PNG").is_file());
        assert!(!dest.join("notes.txt").exists());
        let cat = service.get_image_by_path(site_id, "2024/cat.PNG").unwrap().unwrap();
        assert_eq!(cat.alt_text, "A cat");

        let second = hydrator.hydrate_images(&source, &dest, &meta);
        assert_eq!((second.created, second.updated), (0, 1));
        assert_eq!(service.get_images(site_id).unwrap().len(), 2);
    }

    #[test]
    fn test_hydrate_profiles_with_photo_fallback() {
        let (service, site_id) = setup();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ada.jpg"), b"jpg").unwrap();
        for handle in ["ada", "bob"] {
            service
                .create_contributor(Contributor {
                    site_id,
                    handle: handle.into(),
                    photo_path: if handle == "bob" { "missing.png".into() } else { String::new() },
                    ..Default::default()
                })
                .unwrap();
        }

        let hydrator = Hydrator::new(&service, site_id);
        let report = hydrator.hydrate_profiles(&service, tmp.path());
        assert_eq!(report.created, 2);
        assert!(report.errors.is_empty());

        let profiles = service.profiles(site_id);
        let ada = profiles.iter().find(|p| p.slug == "ada").unwrap();
        assert_eq!(ada.photo_path, "ada.jpg");
        let bob = profiles.iter().find(|p| p.slug == "bob").unwrap();
        assert_eq!(bob.photo_path, "");

        let again = hydrator.hydrate_profiles(&service, tmp.path());
        assert_eq!(again.created, 0);
    }

    struct FailingFor(&'static str);

    impl ProfileService for FailingFor {
        fn create_profile(&self, profile: Profile) -> ServiceResult<Profile> {
            if profile.slug == self.0 {
                Err(ServiceError::Backend("profile store down".into()))
            } else {
                Ok(Profile { id: Id(999), ..profile })
            }
        }
    }

    #[test]
    fn test_profile_failure_does_not_stop_others() {
        let (service, site_id) = setup();
        for handle in ["ada", "bob"] {
            service
                .create_contributor(Contributor {
                    site_id,
                    handle: handle.into(),
                    ..Default::default()
                })
                .unwrap();
        }
        let report = Hydrator::new(&service, site_id).hydrate_profiles(&FailingFor("ada"), Path::new("/nonexistent"));
        assert_eq!(report.created, 1);
        assert_eq!(report.errors.len(), 1);
        let bob = service.get_contributor_by_handle(site_id, "bob").unwrap().unwrap();
        assert_eq!(bob.profile_id, Some(Id(999)));
    }

    #[test]
    fn test_content_image_links() {
        let (service, site_id) = setup();
        service
            .create_content(Content {
                site_id,
                short_id: "abc".into(),
                ..Default::default()
            })
            .unwrap();
        service
            .create_image(Image {
                site_id,
                file_path: "cat.png".into(),
                ..Default::default()
            })
            .unwrap();

        let mut meta = BackupMeta::default();
        meta.content_images.insert(
            "abc".into(),
            vec![
                MetaContentImage {
                    image_path: "cat.png".into(),
                    is_header: true,
                    ..Default::default()
                },
                MetaContentImage {
                    image_path: "gone.png".into(),
                    ..Default::default()
                },
            ],
        );
        meta.content_images.insert(
            "nope".into(),
            vec![MetaContentImage {
                image_path: "cat.png".into(),
                ..Default::default()
            }],
        );

        let hydrator = Hydrator::new(&service, site_id);
        let first = hydrator.hydrate_content_images(&meta);
        assert_eq!((first.created, first.existing, first.skipped), (1, 0, 2));
        assert!(first.errors.is_empty());

        let second = hydrator.hydrate_content_images(&meta);
        assert_eq!((second.created, second.existing), (0, 1));
        assert!(second.errors.is_empty());
    }
}
