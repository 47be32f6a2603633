//! In-memory store.

use super::{ProfileService, Service, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pressroom_types::{
    Content, ContentImage, Contributor, Id, Image, Layout, Profile, Section, Setting, Site, Tag,
};

#[derive(Debug, Default)]
struct Tables {
    last_id: u64,
    sites: Vec<Site>,
    settings: Vec<Setting>,
    sections: Vec<Section>,
    layouts: Vec<Layout>,
    contents: Vec<Content>,
    content_tags: Vec<(Id, Id)>,
    tags: Vec<Tag>,
    images: Vec<Image>,
    content_images: Vec<ContentImage>,
    contributors: Vec<Contributor>,
    profiles: Vec<Profile>,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        Id(self.last_id)
    }

    fn with_tags(&self, mut content: Content) -> Content {
        content.tags = self
            .content_tags
            .iter()
            .filter(|(c, _)| *c == content.id)
            .filter_map(|(_, t)| self.tags.iter().find(|tag| tag.id == *t).cloned())
            .collect();
        content
    }
}

/// `Service` and `ProfileService` backed by process memory.
///
/// Ids are allocated from one counter shared by every table.
#[derive(Debug, Default)]
pub struct MemoryService {
    tables: RwLock<Tables>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site. Slugs are unique.
    pub fn insert_site(&self, mut site: Site) -> ServiceResult<Site> {
        let mut t = self.tables.write();
        if t.sites.iter().any(|s| s.slug == site.slug) {
            return Err(ServiceError::conflict("site", &site.slug));
        }
        site.id = t.next_id();
        t.sites.push(site.clone());
        Ok(site)
    }

    /// Insert or replace one setting
    pub fn set_setting(&self, site_id: Id, name: &str, value: &str) -> ServiceResult<()> {
        let mut t = self.tables.write();
        if let Some(existing) = t
            .settings
            .iter_mut()
            .find(|s| s.site_id == site_id && s.name == name)
        {
            existing.value = value.to_string();
            return Ok(());
        }
        let id = t.next_id();
        t.settings.push(Setting {
            id,
            site_id,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn profiles(&self, site_id: Id) -> Vec<Profile> {
        self.tables
            .read()
            .profiles
            .iter()
            .filter(|p| p.site_id == site_id)
            .cloned()
            .collect()
    }
}

fn by_site<T: Clone>(items: &[T], site_id: Id, key: impl Fn(&T) -> Id) -> Vec<T> {
    items.iter().filter(|i| key(i) == site_id).cloned().collect()
}

impl Service for MemoryService {
    fn list_sites(&self) -> ServiceResult<Vec<Site>> {
        Ok(self.tables.read().sites.clone())
    }

    fn get_site(&self, id: Id) -> ServiceResult<Site> {
        self.tables
            .read()
            .sites
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("site", id))
    }

    fn get_site_by_slug(&self, slug: &str) -> ServiceResult<Site> {
        self.tables
            .read()
            .sites
            .iter()
            .find(|s| s.slug == slug)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("site", slug))
    }

    fn mark_site_published(&self, id: Id, at: DateTime<Utc>) -> ServiceResult<()> {
        let mut t = self.tables.write();
        let site = t
            .sites
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::not_found("site", id))?;
        site.last_published_at = Some(at);
        Ok(())
    }

    fn get_settings(&self, site_id: Id) -> ServiceResult<Vec<Setting>> {
        Ok(by_site(&self.tables.read().settings, site_id, |s| s.site_id))
    }

    fn get_sections(&self, site_id: Id) -> ServiceResult<Vec<Section>> {
        Ok(by_site(&self.tables.read().sections, site_id, |s| s.site_id))
    }

    fn get_section(&self, id: Id) -> ServiceResult<Section> {
        self.tables
            .read()
            .sections
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("section", id))
    }

    fn get_section_by_path(&self, site_id: Id, path: &str) -> ServiceResult<Option<Section>> {
        Ok(self
            .tables
            .read()
            .sections
            .iter()
            .find(|s| s.site_id == site_id && s.path == path)
            .cloned())
    }

    fn create_section(&self, mut section: Section) -> ServiceResult<Section> {
        let mut t = self.tables.write();
        if t
            .sections
            .iter()
            .any(|s| s.site_id == section.site_id && s.path == section.path)
        {
            return Err(ServiceError::conflict("section", &section.path));
        }
        section.id = t.next_id();
        t.sections.push(section.clone());
        Ok(section)
    }

    fn get_layouts(&self, site_id: Id) -> ServiceResult<Vec<Layout>> {
        Ok(by_site(&self.tables.read().layouts, site_id, |l| l.site_id))
    }

    fn get_layout(&self, id: Id) -> ServiceResult<Layout> {
        self.tables
            .read()
            .layouts
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("layout", id))
    }

    fn get_layout_by_name(&self, site_id: Id, name: &str) -> ServiceResult<Option<Layout>> {
        Ok(self
            .tables
            .read()
            .layouts
            .iter()
            .find(|l| l.site_id == site_id && l.name == name)
            .cloned())
    }

    fn create_layout(&self, mut layout: Layout) -> ServiceResult<Layout> {
        let mut t = self.tables.write();
        if t
            .layouts
            .iter()
            .any(|l| l.site_id == layout.site_id && l.name == layout.name)
        {
            return Err(ServiceError::conflict("layout", &layout.name));
        }
        layout.id = t.next_id();
        t.layouts.push(layout.clone());
        Ok(layout)
    }

    fn get_all_content_with_meta(&self, site_id: Id) -> ServiceResult<Vec<Content>> {
        let t = self.tables.read();
        Ok(t.contents
            .iter()
            .filter(|c| c.site_id == site_id)
            .map(|c| t.with_tags(c.clone()))
            .collect())
    }

    fn get_content_by_short_id(&self, site_id: Id, short_id: &str) -> ServiceResult<Option<Content>> {
        let t = self.tables.read();
        Ok(t.contents
            .iter()
            .find(|c| c.site_id == site_id && c.short_id == short_id)
            .map(|c| t.with_tags(c.clone())))
    }

    fn create_content(&self, mut content: Content) -> ServiceResult<Content> {
        let mut t = self.tables.write();
        if t
            .contents
            .iter()
            .any(|c| c.site_id == content.site_id && c.short_id == content.short_id)
        {
            return Err(ServiceError::conflict("content", &content.short_id));
        }
        content.id = t.next_id();
        content.tags.clear();
        t.contents.push(content.clone());
        Ok(content)
    }

    fn get_tags(&self, site_id: Id) -> ServiceResult<Vec<Tag>> {
        Ok(by_site(&self.tables.read().tags, site_id, |t| t.site_id))
    }

    fn get_tag_by_name(&self, site_id: Id, name: &str) -> ServiceResult<Option<Tag>> {
        Ok(self
            .tables
            .read()
            .tags
            .iter()
            .find(|t| t.site_id == site_id && t.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn create_tag(&self, mut tag: Tag) -> ServiceResult<Tag> {
        let mut t = self.tables.write();
        if t
            .tags
            .iter()
            .any(|x| x.site_id == tag.site_id && x.name.eq_ignore_ascii_case(&tag.name))
        {
            return Err(ServiceError::conflict("tag", &tag.name));
        }
        tag.id = t.next_id();
        t.tags.push(tag.clone());
        Ok(tag)
    }

    fn add_tag_to_content(&self, content_id: Id, tag_id: Id) -> ServiceResult<()> {
        let mut t = self.tables.write();
        if !t.contents.iter().any(|c| c.id == content_id) {
            return Err(ServiceError::not_found("content", content_id));
        }
        if !t.tags.iter().any(|x| x.id == tag_id) {
            return Err(ServiceError::not_found("tag", tag_id));
        }
        if !t.content_tags.contains(&(content_id, tag_id)) {
            t.content_tags.push((content_id, tag_id));
        }
        Ok(())
    }

    fn get_images(&self, site_id: Id) -> ServiceResult<Vec<Image>> {
        Ok(by_site(&self.tables.read().images, site_id, |i| i.site_id))
    }

    fn get_image_by_path(&self, site_id: Id, file_path: &str) -> ServiceResult<Option<Image>> {
        Ok(self
            .tables
            .read()
            .images
            .iter()
            .find(|i| i.site_id == site_id && i.file_path == file_path)
            .cloned())
    }

    fn create_image(&self, mut image: Image) -> ServiceResult<Image> {
        let mut t = self.tables.write();
        if t
            .images
            .iter()
            .any(|i| i.site_id == image.site_id && i.file_path == image.file_path)
        {
            return Err(ServiceError::conflict("image", &image.file_path));
        }
        image.id = t.next_id();
        t.images.push(image.clone());
        Ok(image)
    }

    fn update_image(&self, image: &Image) -> ServiceResult<()> {
        let mut t = self.tables.write();
        let slot = t
            .images
            .iter_mut()
            .find(|i| i.id == image.id)
            .ok_or_else(|| ServiceError::not_found("image", image.id))?;
        *slot = image.clone();
        Ok(())
    }

    fn get_content_images(&self, content_id: Id) -> ServiceResult<Vec<ContentImage>> {
        let mut links: Vec<ContentImage> = self
            .tables
            .read()
            .content_images
            .iter()
            .filter(|l| l.content_id == content_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.order_num);
        Ok(links)
    }

    fn create_content_image(&self, mut link: ContentImage) -> ServiceResult<ContentImage> {
        let mut t = self.tables.write();
        if t
            .content_images
            .iter()
            .any(|l| l.content_id == link.content_id && l.image_id == link.image_id)
        {
            return Err(ServiceError::conflict(
                "content image",
                format!("{}/{}", link.content_id, link.image_id),
            ));
        }
        link.id = t.next_id();
        t.content_images.push(link.clone());
        Ok(link)
    }

    fn get_contributors(&self, site_id: Id) -> ServiceResult<Vec<Contributor>> {
        Ok(by_site(&self.tables.read().contributors, site_id, |c| c.site_id))
    }

    fn get_contributor_by_handle(&self, site_id: Id, handle: &str) -> ServiceResult<Option<Contributor>> {
        Ok(self
            .tables
            .read()
            .contributors
            .iter()
            .find(|c| c.site_id == site_id && c.handle.eq_ignore_ascii_case(handle))
            .cloned())
    }

    fn create_contributor(&self, mut contributor: Contributor) -> ServiceResult<Contributor> {
        let mut t = self.tables.write();
        if t.contributors.iter().any(|c| {
            c.site_id == contributor.site_id && c.handle.eq_ignore_ascii_case(&contributor.handle)
        }) {
            return Err(ServiceError::conflict("contributor", &contributor.handle));
        }
        contributor.id = t.next_id();
        t.contributors.push(contributor.clone());
        Ok(contributor)
    }

    fn update_contributor(&self, contributor: &Contributor) -> ServiceResult<()> {
        let mut t = self.tables.write();
        let slot = t
            .contributors
            .iter_mut()
            .find(|c| c.id == contributor.id)
            .ok_or_else(|| ServiceError::not_found("contributor", contributor.id))?;
        *slot = contributor.clone();
        Ok(())
    }
}

impl ProfileService for MemoryService {
    fn create_profile(&self, mut profile: Profile) -> ServiceResult<Profile> {
        let mut t = self.tables.write();
        if t
            .profiles
            .iter()
            .any(|p| p.site_id == profile.site_id && p.slug == profile.slug)
        {
            return Err(ServiceError::conflict("profile", &profile.slug));
        }
        profile.id = t.next_id();
        t.profiles.push(profile.clone());
        Ok(profile)
    }
}
