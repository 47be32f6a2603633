//! Export command: write the YAML metadata backup of each site.

use super::load;
use anyhow::{Context, Result};
use pressroom_core::backup;
use std::path::Path;

pub fn export_meta(config_path: &Path, site: Option<&str>, out: Option<&Path>) -> Result<()> {
    let loaded = load(config_path)?;
    let workspace = loaded.config.workspace();

    for site in loaded.select(site)? {
        loaded.import_configured(&site)?;

        let meta = backup::export_meta(loaded.service.as_ref(), site.id)
            .with_context(|| format!("Failed to export {}", site.slug))?;
        let dir = match out {
            Some(out) => out.join(&site.slug),
            None => workspace.site(&site.slug).markdown_meta_dir(),
        };
        meta.write(&dir)
            .with_context(|| format!("Failed to write backup to {}", dir.display()))?;

        println!(
            "{}: {} layouts, {} sections, {} tags, {} contributors, {} images -> {}",
            site.slug,
            meta.layouts.len(),
            meta.sections.len(),
            meta.tags.len(),
            meta.contributors.len(),
            meta.images.len(),
            dir.display()
        );
    }

    Ok(())
}
