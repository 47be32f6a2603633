//! Schedule command: run the publish scheduler until Ctrl-C.

use super::load;
use anyhow::{Context, Result};
use pressroom_core::{Service, SiteSettings};
use pressroom_publish::scheduler::effective_interval;
use pressroom_publish::{GitPublisher, Scheduler, StartOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn run_scheduler(config_path: &Path) -> Result<()> {
    let loaded = load(config_path)?;
    for site in &loaded.sites {
        loaded.import_configured(site)?;
        let settings = SiteSettings::from_settings(&loaded.service.get_settings(site.id)?);
        if settings.publish_scheduled {
            tracing::info!(
                site = %site.slug,
                interval = ?effective_interval(&settings),
                "scheduled"
            );
        }
    }

    let scheduler = Scheduler::new(
        loaded.service.clone(),
        loaded.generator(),
        Arc::new(GitPublisher::new(loaded.config.workspace())),
    );
    let shutdown = CancellationToken::new();

    match scheduler.start(shutdown.clone()) {
        StartOutcome::NothingScheduled => {
            println!("No site has publish.scheduled enabled");
            return Ok(());
        }
        StartOutcome::Started | StartOutcome::AlreadyRunning => {}
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down scheduler");
    shutdown.cancel();

    while scheduler.is_running() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(())
}
