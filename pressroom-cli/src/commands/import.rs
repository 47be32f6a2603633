//! Import command: load a site's import root and report the outcome.

use super::load;
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::Path;

pub fn import_sites(config_path: &Path, site: Option<&str>, from: Option<&Path>, json: bool) -> Result<()> {
    let loaded = load(config_path)?;
    let sites = loaded.select(site)?;
    if from.is_some() && sites.len() != 1 {
        bail!("--from needs a single site, pass --site");
    }

    let mut reports = BTreeMap::new();
    for site in sites {
        let report = match from {
            Some(root) => loaded.import_from(&site, root)?,
            None => match loaded.import_configured(&site)? {
                Some(report) => report,
                None => bail!("Site '{}' has no source; pass --from", site.slug),
            },
        };
        reports.insert(site.slug, report);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for (slug, report) in &reports {
        println!(
            "{}: {} created, {} existing, {} sections, {} images, {} errors",
            slug,
            report.content_created,
            report.content_existing,
            report.meta.sections_created,
            report.images.created,
            report.error_count()
        );
        for error in &report.errors {
            println!("  error: {}", error);
        }
    }
    Ok(())
}
