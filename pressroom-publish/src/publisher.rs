use crate::config::{PublishConfig, PublishError};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublishResult {
    pub commit_url: Option<String>,
    /// The tree matched what was already published
    pub no_changes: bool,
}

/// Pushes a generated site somewhere it can be served from
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, config: &PublishConfig, slug: &str) -> Result<PublishResult, PublishError>;
}
