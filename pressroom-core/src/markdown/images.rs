//! Image enhancement.
//!
//! Markdown images get a fixed CSS class and lazy loading. An alt text of
//! the form `alt|||caption` is split, and captioned images are wrapped in a
//! `<figure>` with a `<figcaption>`.

use super::html_escape;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

pub const IMAGE_CLASS: &str = "content-image";
pub const FIGURE_CLASS: &str = "content-figure";
pub const CAPTION_SEPARATOR: &str = "|||";

#[derive(Debug, Default)]
pub struct ImageTransformer;

impl ImageTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut iter = events.into_iter();

        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    let mut alt = String::new();
                    for inner in iter.by_ref() {
                        match inner {
                            Event::End(TagEnd::Image) => break,
                            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
                            Event::SoftBreak | Event::HardBreak => alt.push(' '),
                            _ => {}
                        }
                    }
                    let html = render_image(&dest_url, &alt, &title);
                    out.push(Event::InlineHtml(CowStr::Boxed(html.into_boxed_str())));
                }
                other => out.push(other),
            }
        }

        unwrap_figure_paragraphs(out)
    }
}

/// Split `alt|||caption` into its parts. The caption is `None` when absent
/// or blank.
pub fn split_alt(alt: &str) -> (String, Option<String>) {
    match alt.split_once(CAPTION_SEPARATOR) {
        Some((text, caption)) => {
            let caption = caption.trim();
            (
                text.trim().to_string(),
                (!caption.is_empty()).then(|| caption.to_string()),
            )
        }
        None => (alt.trim().to_string(), None),
    }
}

fn render_image(src: &str, alt: &str, title: &str) -> String {
    let (alt_text, caption) = split_alt(alt);

    let mut img = format!(
        r#"<img src="{}" alt="{}" class="{}" loading="lazy""#,
        html_escape(src),
        html_escape(&alt_text),
        IMAGE_CLASS
    );
    if !title.is_empty() {
        img.push_str(&format!(r#" title="{}""#, html_escape(title)));
    }
    img.push_str(" />");

    match caption {
        Some(caption) => format!(
            r#"<figure class="{}">{}<figcaption>{}</figcaption></figure>"#,
            FIGURE_CLASS,
            img,
            html_escape(&caption)
        ),
        None => img,
    }
}

/// A paragraph holding nothing but a figure is dropped: `<figure>` may not
/// live inside `<p>`.
fn unwrap_figure_paragraphs(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        if i + 2 < events.len() {
            if let (Event::Start(Tag::Paragraph), Event::InlineHtml(html), Event::End(TagEnd::Paragraph)) =
                (&events[i], &events[i + 1], &events[i + 2])
            {
                if html.starts_with("<figure") {
                    out.push(Event::Html(html.clone()));
                    i += 3;
                    continue;
                }
            }
        }
        out.push(events[i].clone());
        i += 1;
    }

    out
}
