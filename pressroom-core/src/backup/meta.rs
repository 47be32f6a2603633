use super::*;
use crate::service::Service;
use crate::slug::slugify;
use pressroom_types::{Contributor, Id, Image, Layout, Section, Tag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaLayout {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Stored in `layouts/{name}.html`
    #[serde(skip)]
    pub code: String,
    /// Stored in `layouts/{name}.css`
    #[serde(skip)]
    pub css: String,
}

impl MetaLayout {
    pub fn file_stem(&self) -> String {
        let stem = slugify(&self.name);
        if stem.is_empty() {
            "layout".to_string()
        } else {
            stem
        }
    }
}

/// Side-file stems in bundle order. A stem already taken by an earlier
/// layout gets a `-2`, `-3`, ... suffix.
fn layout_stems(layouts: &[MetaLayout]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    layouts
        .iter()
        .map(|layout| {
            let base = layout.file_stem();
            let mut stem = base.clone();
            let mut n = 2;
            while !taken.insert(stem.clone()) {
                stem = format!("{}-{}", base, n);
                n += 1;
            }
            stem
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaContributor {
    pub handle: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub surname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bio: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social_links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaSection {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "layout", skip_serializing_if = "String::is_empty")]
    pub layout_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaImage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attribution: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attribution_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,
}

impl MetaImage {
    pub fn apply_to(&self, image: &mut Image) {
        image.alt_text = self.alt_text.clone();
        image.title = self.title.clone();
        image.attribution = self.attribution.clone();
        image.attribution_url = self.attribution_url.clone();
        image.license = self.license.clone();
    }
}

impl From<&Image> for MetaImage {
    fn from(image: &Image) -> Self {
        Self {
            alt_text: image.alt_text.clone(),
            title: image.title.clone(),
            attribution: image.attribution.clone(),
            attribution_url: image.attribution_url.clone(),
            license: image.license.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaContentImage {
    pub image_path: String,
    #[serde(default)]
    pub is_header: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub order_num: i32,
}

/// The in-memory form of a backup bundle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupMeta {
    pub layouts: Vec<MetaLayout>,
    pub contributors: Vec<MetaContributor>,
    pub tags: Vec<MetaTag>,
    pub sections: Vec<MetaSection>,
    /// Keyed by image file path
    pub images: BTreeMap<String, MetaImage>,
    /// Keyed by content short id
    pub content_images: BTreeMap<String, Vec<MetaContentImage>>,
    /// Problems met while loading; never written out
    pub errors: Vec<String>,
}

impl BackupMeta {
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
            && self.contributors.is_empty()
            && self.tags.is_empty()
            && self.sections.is_empty()
            && self.images.is_empty()
            && self.content_images.is_empty()
    }

    /// Read a bundle. Missing files are skipped and malformed ones are
    /// recorded in `errors`, leaving that collection empty.
    pub fn load(dir: &Path) -> Self {
        let mut meta = BackupMeta::default();
        let errors = &mut meta.errors;

        meta.layouts = read_collection(dir, LAYOUTS_FILE, errors);
        meta.contributors = read_collection(dir, CONTRIBUTORS_FILE, errors);
        meta.tags = read_collection(dir, TAGS_FILE, errors);
        meta.sections = read_collection(dir, SECTIONS_FILE, errors);
        meta.images = read_collection(dir, IMAGES_FILE, errors);
        meta.content_images = read_collection(dir, CONTENT_IMAGES_FILE, errors);

        let layouts_dir = dir.join(LAYOUTS_DIR);
        let stems = layout_stems(&meta.layouts);
        for (layout, stem) in meta.layouts.iter_mut().zip(stems) {
            layout.code = read_optional(&layouts_dir.join(format!("{}.html", stem)), &mut meta.errors);
            layout.css = read_optional(&layouts_dir.join(format!("{}.css", stem)), &mut meta.errors);
        }

        if !meta.errors.is_empty() {
            tracing::warn!(dir = %dir.display(), errors = meta.errors.len(), "backup loaded with errors");
        }
        meta
    }

    pub fn write(&self, dir: &Path) -> Result<(), BackupError> {
        let layouts_dir = dir.join(LAYOUTS_DIR);
        fs::create_dir_all(&layouts_dir).map_err(|e| BackupError::io(&layouts_dir, e))?;

        write_yaml(&dir.join(LAYOUTS_FILE), &self.layouts)?;
        write_yaml(&dir.join(CONTRIBUTORS_FILE), &self.contributors)?;
        write_yaml(&dir.join(TAGS_FILE), &self.tags)?;
        write_yaml(&dir.join(SECTIONS_FILE), &self.sections)?;
        write_yaml(&dir.join(IMAGES_FILE), &self.images)?;
        write_yaml(&dir.join(CONTENT_IMAGES_FILE), &self.content_images)?;

        for (layout, stem) in self.layouts.iter().zip(layout_stems(&self.layouts)) {
            let html = layouts_dir.join(format!("{}.html", stem));
            fs::write(&html, &layout.code).map_err(|e| BackupError::io(&html, e))?;
            let css = layouts_dir.join(format!("{}.css", stem));
            fs::write(&css, &layout.css).map_err(|e| BackupError::io(&css, e))?;
        }

        Ok(())
    }
}

fn read_collection<T: DeserializeOwned + Default>(dir: &Path, file: &str, errors: &mut Vec<String>) -> T {
    let path = dir.join(file);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            errors.push(format!("{}: {}", file, e));
            return T::default();
        }
    };
    if text.trim().is_empty() {
        return T::default();
    }
    match serde_yaml::from_str::<Option<T>>(&text) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            errors.push(format!("{}: {}", file, e));
            T::default()
        }
    }
}

fn read_optional(path: &Path, errors: &mut Vec<String>) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            errors.push(format!("{}: {}", path.display(), e));
            String::new()
        }
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), BackupError> {
    let text = serde_yaml::to_string(value)?;
    fs::write(path, text).map_err(|e| BackupError::io(path, e))
}

/// Project a site's live entities into a bundle
pub fn export_meta(service: &dyn Service, site_id: Id) -> Result<BackupMeta, BackupError> {
    let layouts = service.get_layouts(site_id)?;
    let layout_names: HashMap<Id, String> = layouts.iter().map(|l| (l.id, l.name.clone())).collect();

    let images = service.get_images(site_id)?;
    let image_paths: HashMap<Id, String> = images.iter().map(|i| (i.id, i.file_path.clone())).collect();

    let mut content_images = BTreeMap::new();
    for content in service.get_all_content_with_meta(site_id)? {
        let links: Vec<MetaContentImage> = service
            .get_content_images(content.id)?
            .into_iter()
            .filter_map(|link| {
                Some(MetaContentImage {
                    image_path: image_paths.get(&link.image_id)?.clone(),
                    is_header: link.is_header,
                    is_featured: link.is_featured,
                    order_num: link.order_num,
                })
            })
            .collect();
        if !links.is_empty() && !content.short_id.is_empty() {
            content_images.insert(content.short_id.clone(), links);
        }
    }

    Ok(BackupMeta {
        layouts: layouts.iter().map(meta_layout).collect(),
        contributors: service
            .get_contributors(site_id)?
            .iter()
            .map(meta_contributor)
            .collect(),
        tags: service.get_tags(site_id)?.iter().map(meta_tag).collect(),
        sections: service
            .get_sections(site_id)?
            .iter()
            .map(|s| meta_section(s, &layout_names))
            .collect(),
        images: images
            .iter()
            .filter(|i| i.has_metadata())
            .map(|i| (i.file_path.clone(), MetaImage::from(i)))
            .collect(),
        content_images,
        errors: Vec::new(),
    })
}

fn meta_layout(layout: &Layout) -> MetaLayout {
    MetaLayout {
        name: layout.name.clone(),
        description: layout.description.clone(),
        code: layout.code.clone(),
        css: layout.css.clone(),
    }
}

fn meta_contributor(c: &Contributor) -> MetaContributor {
    MetaContributor {
        handle: c.handle.clone(),
        name: c.name.clone(),
        surname: c.surname.clone(),
        bio: c.bio.clone(),
        social_links: c.social_links.clone(),
        photo_path: c.photo_path.clone(),
    }
}

fn meta_tag(tag: &Tag) -> MetaTag {
    MetaTag {
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

fn meta_section(section: &Section, layout_names: &HashMap<Id, String>) -> MetaSection {
    MetaSection {
        name: section.name.clone(),
        path: section.path.clone(),
        description: section.description.clone(),
        layout_name: section
            .layout_id
            .and_then(|id| layout_names.get(&id).cloned())
            .unwrap_or_default(),
        image: section.image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryService;
    use pressroom_types::{Content, ContentImage, Site};
    use tempfile::TempDir;

    fn seeded() -> (MemoryService, Id) {
        let service = MemoryService::new();
        let site = service
            .insert_site(Site {
                slug: "demo".into(),
                ..Default::default()
            })
            .unwrap();
        let layout = service
            .create_layout(Layout {
                site_id: site.id,
                name: "Wide".into(),
                code: "<main>{{ content }}</main>".into(),
                css: "main { width: 100% }".into(),
                ..Default::default()
            })
            .unwrap();
        service
            .create_section(Section {
                site_id: site.id,
                name: "Blog".into(),
                path: "/blog".into(),
                layout_id: Some(layout.id),
                ..Default::default()
            })
            .unwrap();
        service
            .create_tag(Tag {
                site_id: site.id,
                name: "Rust".into(),
                slug: "rust".into(),
                ..Default::default()
            })
            .unwrap();
        let captioned = service
            .create_image(Image {
                site_id: site.id,
                file_path: "2024/cat.png".into(),
                alt_text: "A cat".into(),
                ..Default::default()
            })
            .unwrap();
        service
            .create_image(Image {
                site_id: site.id,
                file_path: "bare.png".into(),
                ..Default::default()
            })
            .unwrap();
        let content = service
            .create_content(Content {
                site_id: site.id,
                short_id: "abc123".into(),
                ..Default::default()
            })
            .unwrap();
        service
            .create_content_image(ContentImage {
                content_id: content.id,
                image_id: captioned.id,
                is_header: true,
                ..Default::default()
            })
            .unwrap();
        (service, site.id)
    }

    #[test]
    fn test_export_projection() {
        let (service, site_id) = seeded();
        let meta = export_meta(&service, site_id).unwrap();

        assert_eq!(meta.layouts[0].name, "Wide");
        assert_eq!(meta.sections[0].layout_name, "Wide");
        assert_eq!(meta.tags, vec![MetaTag { name: "Rust".into(), slug: "rust".into() }]);
        assert_eq!(meta.images.keys().collect::<Vec<_>>(), vec!["2024/cat.png"]);
        assert_eq!(meta.content_images["abc123"][0].image_path, "2024/cat.png");
        assert!(meta.content_images["abc123"][0].is_header);
    }

    #[test]
    fn test_write_then_load() {
        let (service, site_id) = seeded();
        let meta = export_meta(&service, site_id).unwrap();

        let tmp = TempDir::new().unwrap();
        meta.write(tmp.path()).unwrap();
        assert!(tmp.path().join("layouts/wide.html").exists());

        let sections = fs::read_to_string(tmp.path().join(SECTIONS_FILE)).unwrap();
        assert!(!sections.contains("id:"), "bundles carry no numeric ids");

        let loaded = BackupMeta::load(tmp.path());
        assert!(loaded.errors.is_empty());
        assert_eq!(loaded, meta);
    }

    #[test]
    fn test_load_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let meta = BackupMeta::load(&tmp.path().join("nope"));
        assert!(meta.is_empty());
        assert!(meta.errors.is_empty());
    }

    #[test]
    fn test_malformed_file_is_recorded() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(TAGS_FILE), "- name: Rust\n- [broken").unwrap();
        fs::write(tmp.path().join(SECTIONS_FILE), "- name: Blog\n  path: /blog\n").unwrap();

        let meta = BackupMeta::load(tmp.path());
        assert!(meta.tags.is_empty());
        assert_eq!(meta.sections.len(), 1);
        assert_eq!(meta.errors.len(), 1);
        assert!(meta.errors[0].starts_with("tags.yml"));
    }

    #[test]
    fn test_layouts_with_same_stem_keep_their_files() {
        let tmp = TempDir::new().unwrap();
        let meta = BackupMeta {
            layouts: vec![
                MetaLayout {
                    name: "Blog Post".into(),
                    code: "<article></article>".into(),
                    css: "article {}".into(),
                    ..Default::default()
                },
                MetaLayout {
                    name: "blog-post".into(),
                    code: "<section></section>".into(),
                    css: "section {}".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        meta.write(tmp.path()).unwrap();

        let layouts_dir = tmp.path().join(LAYOUTS_DIR);
        assert!(layouts_dir.join("blog-post.html").is_file());
        assert!(layouts_dir.join("blog-post-2.html").is_file());

        let loaded = BackupMeta::load(tmp.path());
        assert_eq!(loaded.layouts[0].code, "<article></article>");
        assert_eq!(loaded.layouts[1].code, "<section></section>");
        assert_eq!(loaded.layouts[1].css, "section {}");
    }
}
