//! The store boundary.
//!
//! Entities are created and mutated by an external store. Generation, backup
//! and import only see it through [`Service`] (and [`ProfileService`] for the
//! separate profile registry). [`MemoryService`] implements both.

mod memory;

pub use memory::MemoryService;

use chrono::{DateTime, Utc};
use pressroom_types::{
    Content, ContentImage, Contributor, Id, Image, Layout, Profile, Section, Setting, Site, Tag,
};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("Store error: {0}")]
    Backend(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::Conflict {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Read and create access to site entities.
///
/// `create_*` methods ignore the incoming `id`, assign a fresh one, and
/// return the stored record. Natural-key lookups return `Ok(None)` when
/// nothing matches.
pub trait Service: Send + Sync {
    fn list_sites(&self) -> ServiceResult<Vec<Site>>;
    fn get_site(&self, id: Id) -> ServiceResult<Site>;
    fn get_site_by_slug(&self, slug: &str) -> ServiceResult<Site>;
    fn mark_site_published(&self, id: Id, at: DateTime<Utc>) -> ServiceResult<()>;

    fn get_settings(&self, site_id: Id) -> ServiceResult<Vec<Setting>>;

    fn get_sections(&self, site_id: Id) -> ServiceResult<Vec<Section>>;
    fn get_section(&self, id: Id) -> ServiceResult<Section>;
    fn get_section_by_path(&self, site_id: Id, path: &str) -> ServiceResult<Option<Section>>;
    fn create_section(&self, section: Section) -> ServiceResult<Section>;

    fn get_layouts(&self, site_id: Id) -> ServiceResult<Vec<Layout>>;
    fn get_layout(&self, id: Id) -> ServiceResult<Layout>;
    fn get_layout_by_name(&self, site_id: Id, name: &str) -> ServiceResult<Option<Layout>>;
    fn create_layout(&self, layout: Layout) -> ServiceResult<Layout>;

    /// All content of a site with its tags attached, drafts included
    fn get_all_content_with_meta(&self, site_id: Id) -> ServiceResult<Vec<Content>>;
    fn get_content_by_short_id(&self, site_id: Id, short_id: &str) -> ServiceResult<Option<Content>>;
    fn create_content(&self, content: Content) -> ServiceResult<Content>;

    fn get_tags(&self, site_id: Id) -> ServiceResult<Vec<Tag>>;
    fn get_tag_by_name(&self, site_id: Id, name: &str) -> ServiceResult<Option<Tag>>;
    fn create_tag(&self, tag: Tag) -> ServiceResult<Tag>;
    fn add_tag_to_content(&self, content_id: Id, tag_id: Id) -> ServiceResult<()>;

    fn get_images(&self, site_id: Id) -> ServiceResult<Vec<Image>>;
    fn get_image_by_path(&self, site_id: Id, file_path: &str) -> ServiceResult<Option<Image>>;
    fn create_image(&self, image: Image) -> ServiceResult<Image>;
    fn update_image(&self, image: &Image) -> ServiceResult<()>;

    fn get_content_images(&self, content_id: Id) -> ServiceResult<Vec<ContentImage>>;
    /// Fails with [`ServiceError::Conflict`] when the pair is already linked
    fn create_content_image(&self, link: ContentImage) -> ServiceResult<ContentImage>;

    fn get_contributors(&self, site_id: Id) -> ServiceResult<Vec<Contributor>>;
    fn get_contributor_by_handle(&self, site_id: Id, handle: &str) -> ServiceResult<Option<Contributor>>;
    fn create_contributor(&self, contributor: Contributor) -> ServiceResult<Contributor>;
    fn update_contributor(&self, contributor: &Contributor) -> ServiceResult<()>;

    /// Contributor id to display name
    fn build_user_authors_map(&self, site_id: Id) -> ServiceResult<BTreeMap<Id, String>> {
        Ok(self
            .get_contributors(site_id)?
            .into_iter()
            .map(|c| (c.id, c.full_name()))
            .collect())
    }
}

/// The profile registry used when hydrating contributors
pub trait ProfileService: Send + Sync {
    fn create_profile(&self, profile: Profile) -> ServiceResult<Profile>;
}
