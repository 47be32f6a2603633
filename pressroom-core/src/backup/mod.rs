//! Portable YAML backups of site metadata.
//!
//! A bundle directory holds one YAML file per collection plus a `layouts/`
//! directory with each layout's code and CSS:
//!
//! ```text
//! meta/
//!   layouts.yml  contributors.yml  tags.yml  sections.yml
//!   images.yml  content_images.yml
//!   layouts/{layout}.html  layouts/{layout}.css
//! ```
//!
//! Bundles carry no numeric ids. Entities are matched by natural key when a
//! bundle is hydrated into a site, which makes hydration safe to repeat.

mod hydrate;
mod meta;

pub use hydrate::{HydrationReport, Hydrator, ImageReport, LinkReport, ProfileReport};
pub use meta::{
    export_meta, BackupMeta, MetaContentImage, MetaContributor, MetaImage, MetaLayout, MetaSection,
    MetaTag,
};

use crate::service::ServiceError;
use crate::workspace::WorkspaceError;
use std::path::PathBuf;
use thiserror::Error;

pub const LAYOUTS_FILE: &str = "layouts.yml";
pub const CONTRIBUTORS_FILE: &str = "contributors.yml";
pub const TAGS_FILE: &str = "tags.yml";
pub const SECTIONS_FILE: &str = "sections.yml";
pub const IMAGES_FILE: &str = "images.yml";
pub const CONTENT_IMAGES_FILE: &str = "content_images.yml";
pub const LAYOUTS_DIR: &str = "layouts";

/// Image file extensions picked up by image hydration
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "avif"];

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize backup: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl BackupError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::Io {
            path: path.into(),
            source,
        }
    }
}

pub fn is_image_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
