//! CLI command implementations.
//!
//! Every command starts from an in-memory store seeded from the config, then
//! imports each site's configured source into it.

pub mod build;
pub mod embed;
pub mod export;
pub mod import;
pub mod publish;
pub mod schedule;

pub use build::build_sites;
pub use embed::convert_embed;
pub use export::export_meta;
pub use import::import_sites;
pub use publish::publish_site;
pub use schedule::run_scheduler;

use anyhow::{bail, Context, Result};
use pressroom_core::{Config, ImportReport, Importer, MemoryService, SiteGenerator};
use pressroom_render::AskamaRenderer;
use pressroom_types::Site;
use std::path::Path;
use std::sync::Arc;

pub struct Loaded {
    pub config: Config,
    pub service: Arc<MemoryService>,
    pub sites: Vec<Site>,
}

pub fn load(config_path: &Path) -> Result<Loaded> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let service = Arc::new(MemoryService::new());
    let sites = config.seed(&service).context("Failed to register sites")?;
    Ok(Loaded {
        config,
        service,
        sites,
    })
}

impl Loaded {
    /// The named site, or every site when `slug` is None
    pub fn select(&self, slug: Option<&str>) -> Result<Vec<Site>> {
        match slug {
            Some(slug) => match self.sites.iter().find(|s| s.slug == slug) {
                Some(site) => Ok(vec![site.clone()]),
                None => bail!("Unknown site '{}'", slug),
            },
            None => Ok(self.sites.clone()),
        }
    }

    /// Import `site` from its configured source, if it has one
    pub fn import_configured(&self, site: &Site) -> Result<Option<ImportReport>> {
        let source = self
            .config
            .site(&site.slug)
            .and_then(|sc| self.config.source_dir(sc));
        match source {
            Some(root) => self.import_from(site, &root).map(Some),
            None => {
                tracing::debug!(site = %site.slug, "no source configured");
                Ok(None)
            }
        }
    }

    pub fn import_from(&self, site: &Site, root: &Path) -> Result<ImportReport> {
        let paths = self.config.workspace().site(&site.slug);
        let report = Importer::new(self.service.as_ref(), site.clone(), paths)
            .with_profiles(self.service.as_ref())
            .import(root)
            .with_context(|| format!("Failed to import {} from {}", site.slug, root.display()))?;
        for error in &report.errors {
            tracing::warn!(site = %site.slug, "{}", error);
        }
        Ok(report)
    }

    pub fn generator(&self) -> SiteGenerator {
        SiteGenerator::new(
            self.service.clone(),
            Arc::new(AskamaRenderer),
            self.config.workspace(),
        )
    }
}
