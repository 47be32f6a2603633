//! Per-site settings, parsed once from the store's key/value pairs.
//!
//! | Key                   | Default                      |
//! |-----------------------|------------------------------|
//! | `repo.url`            | none (required to publish)   |
//! | `repo.branch`         | `gh-pages`                   |
//! | `repo.auth.token`     | none                         |
//! | `repo.commit.name`    | `Pressroom Publisher`        |
//! | `repo.commit.email`   | `publisher@pressroom.invalid`|
//! | `publish.scheduled`   | `false`                      |
//! | `publish.interval`    | `1h`, at least `1m`          |
//! | `blocks.enabled`      | `true`                       |
//! | `blocks.multisection` | `false`                      |
//! | `blocks.maxitems`     | `5`                          |
//! | `index.maxitems`      | `9`                          |
//! | `forms.endpoint`      | none                         |
//!
//! Unparseable values log a warning and keep the default.

use crate::blocks::BlocksConfig;
use pressroom_types::Setting;
use std::time::Duration;

pub const DEFAULT_BRANCH: &str = "gh-pages";
pub const DEFAULT_COMMIT_NAME: &str = "Pressroom Publisher";
pub const DEFAULT_COMMIT_EMAIL: &str = "publisher@pressroom.invalid";
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const MIN_PUBLISH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_INDEX_MAX_ITEMS: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    pub repo_url: Option<String>,
    pub repo_branch: String,
    pub repo_token: Option<String>,
    pub commit_name: String,
    pub commit_email: String,
    pub publish_scheduled: bool,
    pub publish_interval: Duration,
    pub blocks: BlocksConfig,
    pub index_max_items: usize,
    pub forms_endpoint: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            repo_url: None,
            repo_branch: DEFAULT_BRANCH.to_string(),
            repo_token: None,
            commit_name: DEFAULT_COMMIT_NAME.to_string(),
            commit_email: DEFAULT_COMMIT_EMAIL.to_string(),
            publish_scheduled: false,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            blocks: BlocksConfig::default(),
            index_max_items: DEFAULT_INDEX_MAX_ITEMS,
            forms_endpoint: None,
        }
    }
}

impl SiteSettings {
    pub fn from_settings(settings: &[Setting]) -> Self {
        Self::from_pairs(settings.iter().map(|s| (s.name.as_str(), s.value.as_str())))
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut out = Self::default();
        for (name, value) in pairs {
            out.apply(name.trim(), value.trim());
        }
        out
    }

    fn apply(&mut self, name: &str, value: &str) {
        match name {
            "repo.url" => self.repo_url = non_empty(value),
            "repo.branch" => {
                if !value.is_empty() {
                    self.repo_branch = value.to_string();
                }
            }
            "repo.auth.token" => self.repo_token = non_empty(value),
            "repo.commit.name" => {
                if !value.is_empty() {
                    self.commit_name = value.to_string();
                }
            }
            "repo.commit.email" => {
                if !value.is_empty() {
                    self.commit_email = value.to_string();
                }
            }
            "publish.scheduled" => {
                self.publish_scheduled = parse_flag(name, value, self.publish_scheduled)
            }
            "publish.interval" => self.publish_interval = parse_interval(value),
            "blocks.enabled" => self.blocks.enabled = parse_flag(name, value, self.blocks.enabled),
            "blocks.multisection" => {
                self.blocks.multi_section = parse_flag(name, value, self.blocks.multi_section)
            }
            "blocks.maxitems" => self.blocks.max_items = parse_count(name, value, self.blocks.max_items),
            "index.maxitems" => self.index_max_items = parse_count(name, value, self.index_max_items),
            "forms.endpoint" => self.forms_endpoint = non_empty(value),
            _ => {}
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_flag(name: &str, value: &str, default: bool) -> bool {
    parse_bool(value).unwrap_or_else(|| {
        tracing::warn!(setting = name, value, "invalid boolean setting, using default");
        default
    })
}

fn parse_count(name: &str, value: &str, default: usize) -> usize {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(setting = name, value, "invalid item count, using default");
            default
        }
    }
}

/// Parse `publish.interval` (`30m`, `2h`, `1 day`, or bare seconds),
/// clamped to the one-minute floor
pub fn parse_interval(value: &str) -> Duration {
    match parse_duration::parse(value) {
        Ok(d) if d < MIN_PUBLISH_INTERVAL => {
            tracing::warn!(value, "publish interval below one minute, clamping");
            MIN_PUBLISH_INTERVAL
        }
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(value, error = %e, "invalid publish interval, using default");
            DEFAULT_PUBLISH_INTERVAL
        }
    }
}
