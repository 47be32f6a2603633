//! Markdown processing pipeline with post-processing for images, embeds and
//! forms.

pub mod embed;
pub mod excerpt;
pub mod fenced;
pub mod form;
pub mod images;

#[cfg(test)]
mod test_integration;

use pulldown_cmark::{html, Options, Parser};

pub use embed::EmbedTransformer;
pub use excerpt::first_paragraph;
pub use fenced::{BlockTransformer, FencedBlock};
pub use form::FormTransformer;
pub use images::ImageTransformer;

/// Per-site knobs for the content processor
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub site_slug: String,
    /// Image URL prefix used while editing (points into the workspace)
    pub images_internal_prefix: String,
    /// Image URL prefix on the published site
    pub images_public_prefix: String,
    /// External form endpoint; `None` submits relative to the site
    pub forms_endpoint: Option<String>,
}

impl ProcessorOptions {
    pub fn for_site(slug: &str) -> Self {
        Self {
            site_slug: slug.to_string(),
            images_internal_prefix: format!("/workspace/{}/images/", slug),
            images_public_prefix: "/images/".to_string(),
            forms_endpoint: None,
        }
    }

    pub fn with_forms_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.forms_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }
}

/// Converts content bodies into publishable HTML.
///
/// The body is trusted: it has already been sanitized by the store, so raw
/// inline HTML passes through untouched.
pub struct ContentProcessor {
    options: Options,
    settings: ProcessorOptions,
    embeds: EmbedTransformer,
    forms: FormTransformer,
}

impl ContentProcessor {
    pub fn new(settings: ProcessorOptions) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let forms = FormTransformer::new(&settings.site_slug, settings.forms_endpoint.clone());

        Self {
            options,
            settings,
            embeds: EmbedTransformer,
            forms,
        }
    }

    /// Convert a body to HTML and apply, in order: image enhancement, image
    /// path rewriting, embed-block and form-block substitution.
    pub fn to_html(&self, body: &str) -> String {
        let events: Vec<_> = Parser::new_ext(body, self.options).collect();

        let events = ImageTransformer::new().transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        let html_output = self.rewrite_image_paths(&html_output);

        let transformers: [&dyn BlockTransformer; 2] = [&self.embeds, &self.forms];
        fenced::substitute(&html_output, &transformers)
    }

    fn rewrite_image_paths(&self, html: &str) -> String {
        let internal = &self.settings.images_internal_prefix;
        if internal.is_empty() {
            return html.to_string();
        }
        let public = &self.settings.images_public_prefix;
        html.replace(&format!("src=\"{}", internal), &format!("src=\"{}", public))
            .replace(&format!("src='{}", internal), &format!("src='{}", public))
    }
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
