//! # pressroom-core
//!
//! Core library for the pressroom content-to-site pipeline.
//!
//! This crate holds the content model plumbing: frontmatter, markdown
//! processing, related-content blocks, the workspace layout, backups,
//! import, and static generation. Storage sits behind the [`Service`] trait.

pub mod backup;
pub mod blocks;
pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod import;
pub mod markdown;
pub mod scan;
pub mod service;
pub mod settings;
pub mod slug;
pub mod workspace;

pub use blocks::{build_blocks, BlocksConfig, GeneratedBlocks};
pub use config::Config;
pub use frontmatter::{FrontmatterError, TypedFrontmatter};
pub use generate::{GenerationReport, PageRenderer, RenderError, SiteGenerator};
pub use import::{ImportReport, Importer};
pub use markdown::{ContentProcessor, ProcessorOptions};
pub use service::{MemoryService, ProfileService, Service, ServiceError};
pub use settings::SiteSettings;
pub use slug::slugify;
pub use workspace::{SitePaths, Workspace};
