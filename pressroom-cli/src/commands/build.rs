//! Build command implementation.

use super::load;
use anyhow::{Context, Result};
use std::path::Path;

/// Import and regenerate the selected sites
pub fn build_sites(config_path: &Path, site: Option<&str>) -> Result<()> {
    let loaded = load(config_path)?;
    let generator = loaded.generator();

    for site in loaded.select(site)? {
        tracing::info!("Building site: {}", site.slug);
        if let Some(report) = loaded.import_configured(&site)? {
            tracing::info!(
                site = %site.slug,
                created = report.content_created,
                errors = report.error_count(),
                "imported source"
            );
        }

        let html = generator
            .generate_html(site.id)
            .with_context(|| format!("Failed to generate HTML for {}", site.slug))?;
        let markdown = generator
            .generate_markdown(site.id)
            .with_context(|| format!("Failed to generate markdown for {}", site.slug))?;

        for error in html.errors.iter().chain(&markdown.errors) {
            tracing::warn!(site = %site.slug, "{}", error);
        }
        println!(
            "{}: {} pages, {} indices, {} images",
            site.slug, html.pages, html.indices, html.images
        );
    }

    Ok(())
}
