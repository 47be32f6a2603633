//! Publish configuration derived from site settings.

use pressroom_core::generate::GenerateError;
use pressroom_core::service::ServiceError;
use pressroom_core::settings::SiteSettings;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Site has no repo.url setting")]
    MissingRepoUrl,

    #[error("git: {0:#}")]
    Git(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Where and how a site's HTML tree is pushed
#[derive(Clone, PartialEq, Serialize)]
pub struct PublishConfig {
    pub repo_url: String,
    pub branch: String,
    #[serde(skip)]
    pub token: Option<String>,
    pub commit_name: String,
    pub commit_email: String,
    /// Push over the URL as given, relying on the ambient ssh credentials
    pub use_ssh: bool,
}

impl PublishConfig {
    /// Remote to push to. Token-authenticated https embeds the token.
    pub fn remote_url(&self) -> String {
        match (&self.token, self.use_ssh) {
            (Some(token), false) => match self.repo_url.strip_prefix(HTTPS) {
                Some(rest) => format!("{}x-access-token:{}@{}", HTTPS, token, rest),
                None => self.repo_url.clone(),
            },
            _ => self.repo_url.clone(),
        }
    }

    /// Browser URL of `sha`, for https remotes
    pub fn commit_url(&self, sha: &str) -> Option<String> {
        if !self.repo_url.starts_with(HTTPS) {
            return None;
        }
        let base = self.repo_url.trim_end_matches('/');
        let base = base.strip_suffix(".git").unwrap_or(base);
        Some(format!("{}/commit/{}", base, sha))
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("repo_url", &self.repo_url)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("commit_name", &self.commit_name)
            .field("commit_email", &self.commit_email)
            .field("use_ssh", &self.use_ssh)
            .finish()
    }
}

const HTTPS: &str = "https://";

pub fn build_publish_config(settings: &SiteSettings) -> Result<PublishConfig, PublishError> {
    let repo_url = settings
        .repo_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(PublishError::MissingRepoUrl)?
        .to_string();
    let token = settings
        .repo_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let use_ssh = !(repo_url.starts_with(HTTPS) && token.is_some());

    Ok(PublishConfig {
        repo_url,
        branch: settings.repo_branch.clone(),
        token,
        commit_name: settings.commit_name.clone(),
        commit_email: settings.commit_email.clone(),
        use_ssh,
    })
}
