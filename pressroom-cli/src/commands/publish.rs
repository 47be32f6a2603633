//! Publish command: build one site and push it with git.

use super::load;
use anyhow::{Context, Result};
use pressroom_core::{Service, SiteSettings};
use pressroom_publish::GitPublisher;
use std::path::Path;

pub async fn publish_site(config_path: &Path, slug: &str) -> Result<()> {
    let loaded = load(config_path)?;
    let site = loaded
        .select(Some(slug))?
        .into_iter()
        .next()
        .context("Site not registered")?;
    loaded.import_configured(&site)?;

    let settings = SiteSettings::from_settings(&loaded.service.get_settings(site.id)?);
    let publisher = GitPublisher::new(loaded.config.workspace());
    let result = pressroom_publish::publish_site(
        loaded.service.as_ref(),
        &loaded.generator(),
        &publisher,
        &site,
        &settings,
    )
    .await
    .with_context(|| format!("Failed to publish {}", site.slug))?;

    match (result.no_changes, result.commit_url) {
        (true, _) => println!("{}: no changes", site.slug),
        (false, Some(url)) => println!("{}: published {}", site.slug, url),
        (false, None) => println!("{}: published", site.slug),
    }
    Ok(())
}
