//! Background publishing.
//!
//! The [`Scheduler`] owns one tokio task while running. Every tick it walks
//! the sites in order and, for each scheduled site with content published
//! since the last watermark, regenerates the HTML and hands it to the
//! [`Publisher`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pressroom_core::generate::SiteGenerator;
use pressroom_core::service::Service;
use pressroom_core::settings::{SiteSettings, DEFAULT_PUBLISH_INTERVAL, MIN_PUBLISH_INTERVAL};
use pressroom_types::{Content, Id, Site};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{build_publish_config, PublishError};
use crate::publisher::{PublishResult, Publisher};

/// True when some item became public after `watermark`
pub fn has_pending_content(contents: &[Content], watermark: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    contents.iter().any(|c| {
        !c.draft
            && match c.published_at {
                Some(at) => at <= now && watermark.map_or(true, |w| at > w),
                None => false,
            }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    NothingScheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

enum State {
    Stopped,
    Running {
        stop: oneshot::Sender<()>,
        task: JoinHandle<()>,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub published: Vec<String>,
    pub unchanged: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

/// What happened to one site in a cycle
#[derive(Debug, Clone, PartialEq)]
enum SiteOutcome {
    Skipped(&'static str),
    Published(PublishResult),
}

pub struct Scheduler {
    cycle: Arc<Cycle>,
    state: Mutex<State>,
}

impl Scheduler {
    pub fn new(service: Arc<dyn Service>, generator: SiteGenerator, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            cycle: Arc::new(Cycle {
                service,
                generator,
                publisher,
                last_evaluated: Mutex::new(HashMap::new()),
            }),
            state: Mutex::new(State::Stopped),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.state.lock(), State::Running { task, .. } if !task.is_finished())
    }

    /// Spawn the tick loop. Must be called from within a tokio runtime.
    pub fn start(&self, shutdown: CancellationToken) -> StartOutcome {
        let mut state = self.state.lock();
        if let State::Running { task, .. } = &*state {
            if !task.is_finished() {
                return StartOutcome::AlreadyRunning;
            }
        }

        let Some(period) = self.cycle.tick_interval() else {
            info!("no site has publishing scheduled");
            return StartOutcome::NothingScheduled;
        };

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let cycle = self.cycle.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval = ?period, "scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = cycle.run().await;
                        debug!(
                            published = report.published.len(),
                            errors = report.errors.len(),
                            "scheduler tick"
                        );
                    }
                    _ = &mut stop_rx => break,
                    _ = shutdown.cancelled() => break,
                }
            }
            info!("scheduler stopped");
        });

        *state = State::Running { stop: stop_tx, task };
        StartOutcome::Started
    }

    pub fn stop(&self) -> StopOutcome {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Stopped) {
            State::Running { stop, task } if !task.is_finished() => {
                // The loop may exit on its own between the check and the send
                let _ = stop.send(());
                StopOutcome::Stopped
            }
            _ => StopOutcome::NotRunning,
        }
    }

    /// Evaluate every site once, as a tick would
    pub async fn run_cycle(&self) -> CycleReport {
        self.cycle.run().await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Cycle {
    service: Arc<dyn Service>,
    generator: SiteGenerator,
    publisher: Arc<dyn Publisher>,
    last_evaluated: Mutex<HashMap<Id, Instant>>,
}

impl Cycle {
    /// Smallest interval among scheduled sites, or None when nothing is scheduled
    fn tick_interval(&self) -> Option<Duration> {
        let sites = match self.service.list_sites() {
            Ok(sites) => sites,
            Err(e) => {
                warn!(error = %e, "listing sites failed");
                return None;
            }
        };
        sites
            .iter()
            .filter(|s| s.active)
            .filter_map(|s| self.settings(s).ok())
            .filter(|settings| settings.publish_scheduled)
            .map(|settings| settings.publish_interval)
            .min()
            .map(|d| d.max(MIN_PUBLISH_INTERVAL))
    }

    fn settings(&self, site: &Site) -> Result<SiteSettings, PublishError> {
        Ok(SiteSettings::from_settings(&self.service.get_settings(site.id)?))
    }

    async fn run(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let sites = match self.service.list_sites() {
            Ok(sites) => sites,
            Err(e) => {
                warn!(error = %e, "listing sites failed");
                report.errors.push(e.to_string());
                return report;
            }
        };

        for site in sites {
            match self.run_site(&site).await {
                Ok(SiteOutcome::Skipped(reason)) => {
                    debug!(site = %site.slug, reason, "skipped");
                    report.skipped.push(site.slug);
                }
                Ok(SiteOutcome::Published(result)) if result.no_changes => {
                    info!(site = %site.slug, "publish found no changes");
                    report.unchanged.push(site.slug);
                }
                Ok(SiteOutcome::Published(result)) => {
                    info!(site = %site.slug, commit = ?result.commit_url, "site published");
                    report.published.push(site.slug);
                }
                Err(e) => {
                    warn!(site = %site.slug, error = %e, "publish cycle failed");
                    report.errors.push(format!("{}: {}", site.slug, e));
                }
            }
        }
        report
    }

    async fn run_site(&self, site: &Site) -> Result<SiteOutcome, PublishError> {
        if !site.active {
            return Ok(SiteOutcome::Skipped("inactive"));
        }
        let settings = self.settings(site)?;
        if !settings.publish_scheduled {
            return Ok(SiteOutcome::Skipped("not scheduled"));
        }

        {
            let mut last = self.last_evaluated.lock();
            let interval = settings.publish_interval.max(MIN_PUBLISH_INTERVAL);
            let now = Instant::now();
            if last.get(&site.id).is_some_and(|at| now.duration_since(*at) < interval) {
                return Ok(SiteOutcome::Skipped("interval not elapsed"));
            }
            last.insert(site.id, now);
        }

        let now = Utc::now();
        let contents = self.service.get_all_content_with_meta(site.id)?;
        if !has_pending_content(&contents, site.last_published_at, now) {
            return Ok(SiteOutcome::Skipped("nothing pending"));
        }

        let result = publish_site(self.service.as_ref(), &self.generator, self.publisher.as_ref(), site, &settings).await?;
        Ok(SiteOutcome::Published(result))
    }
}

/// Regenerate, publish, and advance the watermark for one site
pub async fn publish_site(
    service: &dyn Service,
    generator: &SiteGenerator,
    publisher: &dyn Publisher,
    site: &Site,
    settings: &SiteSettings,
) -> Result<PublishResult, PublishError> {
    let started = Utc::now();
    let config = build_publish_config(settings)?;

    let generator = generator.clone();
    let site_id = site.id;
    let generated = tokio::task::spawn_blocking(move || generator.generate_html(site_id))
        .await
        .map_err(std::io::Error::other)??;
    if !generated.errors.is_empty() {
        warn!(site = %site.slug, errors = ?generated.errors, "generation reported errors");
    }

    let result = publisher.publish(&config, &site.slug).await?;
    service.mark_site_published(site.id, started)?;
    Ok(result)
}

/// Interval a site would be evaluated at, for display
pub fn effective_interval(settings: &SiteSettings) -> Duration {
    if settings.publish_scheduled {
        settings.publish_interval.max(MIN_PUBLISH_INTERVAL)
    } else {
        DEFAULT_PUBLISH_INTERVAL
    }
}
