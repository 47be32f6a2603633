//! Media embeds for ```` ```embed ```` blocks.
//!
//! ```text
//! provider: youtube
//! id: dQw4w9WgXcQ
//! ratio: 4:3
//! ```

use super::fenced::BlockTransformer;
use super::html_escape;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Everything but RFC 3986 unreserved characters
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Invalid embed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Embed block must be a mapping")]
    NotAMapping,

    #[error("Embed block has no provider")]
    MissingProvider,

    #[error("Unknown embed provider: {0}")]
    UnknownProvider(String),

    #[error("The {0} provider requires an id")]
    MissingId(Provider),

    #[error("The html provider requires code")]
    MissingCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    YouTube,
    Vimeo,
    TikTok,
    SoundCloud,
    Html,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::TikTok => "tiktok",
            Provider::SoundCloud => "soundcloud",
            Provider::Html => "html",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Provider::YouTube => "YouTube video",
            Provider::Vimeo => "Vimeo video",
            Provider::TikTok => "TikTok video",
            Provider::SoundCloud => "SoundCloud audio",
            Provider::Html => "Embedded content",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Provider::YouTube),
            "vimeo" => Ok(Provider::Vimeo),
            "tiktok" => Ok(Provider::TikTok),
            "soundcloud" => Ok(Provider::SoundCloud),
            "html" => Ok(Provider::Html),
            "" => Err(EmbedError::MissingProvider),
            other => Err(EmbedError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ratio {
    #[default]
    Wide,
    Standard,
    Square,
    Vertical,
}

impl Ratio {
    /// Unrecognised values fall back to 16:9
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "4:3" => Ratio::Standard,
            "1:1" => Ratio::Square,
            "9:16" => Ratio::Vertical,
            _ => Ratio::Wide,
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Ratio::Wide => "ratio-16-9",
            Ratio::Standard => "ratio-4-3",
            Ratio::Square => "ratio-1-1",
            Ratio::Vertical => "ratio-9-16",
        }
    }
}

/// A parsed embed block
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub provider: Provider,
    pub id: String,
    pub ratio: Ratio,
    pub code: String,
}

impl Embed {
    pub fn from_yaml(source: &str) -> Result<Self, EmbedError> {
        let value: Value = serde_yaml::from_str(source)?;
        let Value::Mapping(map) = value else {
            return Err(EmbedError::NotAMapping);
        };
        let field = |key: &str| -> String {
            match map.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            }
        };

        let provider: Provider = field("provider").parse()?;
        let embed = Embed {
            provider,
            id: field("id"),
            ratio: Ratio::parse(&field("ratio")),
            code: match map.get("code") {
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            },
        };
        embed.validate()?;
        Ok(embed)
    }

    fn validate(&self) -> Result<(), EmbedError> {
        match self.provider {
            Provider::Html if self.code.trim().is_empty() => Err(EmbedError::MissingCode),
            Provider::Html => Ok(()),
            p if self.id.is_empty() => Err(EmbedError::MissingId(p)),
            _ => Ok(()),
        }
    }

    /// Player URL for iframe providers
    pub fn player_url(&self) -> Option<String> {
        let id = self.id.trim();
        match self.provider {
            Provider::YouTube => Some(format!("https://www.youtube.com/embed/{}", id)),
            Provider::Vimeo => Some(format!("https://player.vimeo.com/video/{}", id)),
            Provider::TikTok => Some(format!("https://www.tiktok.com/embed/v2/{}", id)),
            Provider::SoundCloud => {
                let track = format!("https://soundcloud.com/{}", soundcloud_path(id));
                Some(format!(
                    "https://w.soundcloud.com/player/?url={}&visual=true",
                    utf8_percent_encode(&track, COMPONENT)
                ))
            }
            Provider::Html => None,
        }
    }

    pub fn to_html(&self) -> Result<String, EmbedError> {
        self.validate()?;

        let class = format!("embed embed-{} {}", self.provider, self.ratio.class());
        let inner = match self.player_url() {
            Some(url) => iframe(&url, self.provider),
            None => self.code.trim().to_string(),
        };
        Ok(format!(r#"<div class="{}">{}</div>"#, class, inner))
    }
}

/// `artist/track` from either a bare path or a full SoundCloud URL
fn soundcloud_path(id: &str) -> String {
    let rest = id
        .strip_prefix("https://")
        .or_else(|| id.strip_prefix("http://"))
        .unwrap_or(id);
    let rest = rest
        .strip_prefix("www.soundcloud.com/")
        .or_else(|| rest.strip_prefix("soundcloud.com/"))
        .or_else(|| rest.strip_prefix("m.soundcloud.com/"))
        .unwrap_or(rest);
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    rest.trim_matches('/').to_string()
}

fn iframe(src: &str, provider: Provider) -> String {
    let allow = match provider {
        Provider::SoundCloud => "autoplay",
        _ => "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture",
    };
    format!(
        r#"<iframe src="{}" title="{}" frameborder="0" allow="{}" allowfullscreen loading="lazy"></iframe>"#,
        html_escape(src),
        provider.title(),
        allow
    )
}

pub fn render(embed: &Embed) -> Result<String, EmbedError> {
    embed.to_html()
}

pub fn render_yaml(source: &str) -> Result<String, EmbedError> {
    Embed::from_yaml(source)?.to_html()
}

/// Handles `embed` blocks during document conversion
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbedTransformer;

impl BlockTransformer for EmbedTransformer {
    fn language(&self) -> &str {
        "embed"
    }

    fn transform(&self, source: &str) -> Option<String> {
        match render_yaml(source) {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(error = %e, "skipping embed block");
                None
            }
        }
    }
}
