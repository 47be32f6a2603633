//! # pressroom-publish
//!
//! Publishing for pressroom sites: the publish configuration derived from
//! site settings, the [`Publisher`] seam with its git implementation, and the
//! background [`Scheduler`].

pub mod config;
pub mod git;
pub mod publisher;
pub mod scheduler;

pub use config::{build_publish_config, PublishConfig, PublishError};
pub use git::GitPublisher;
pub use publisher::{PublishResult, Publisher};
pub use scheduler::{has_pending_content, publish_site, CycleReport, Scheduler, StartOutcome, StopOutcome};
