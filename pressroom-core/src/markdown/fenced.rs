//! Substitution of rendered fenced code blocks.
//!
//! Fenced blocks tagged with a known language (`embed`, `form`) survive
//! markdown rendering as `<pre><code class="language-…">`. Substitution runs
//! in two phases: [`extract`] finds the blocks and decodes their text, and a
//! [`BlockTransformer`] registered for the language produces the
//! replacement.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<pre[^>]*>\s*<code class="(?:[^"]*\s)?language-([A-Za-z0-9_-]+)(?:\s[^"]*)?"[^>]*>(.*?)</code>\s*</pre>"#,
    )
    .expect("valid regex")
});

/// A fenced block located in rendered HTML
#[derive(Debug, Clone, PartialEq)]
pub struct FencedBlock {
    pub language: String,
    /// Inner text with HTML entities decoded
    pub source: String,
    /// Byte range of the whole `<pre>…</pre>` element
    pub span: Range<usize>,
}

/// Turns the source of one kind of fenced block into HTML
pub trait BlockTransformer {
    fn language(&self) -> &str;

    /// Replacement HTML, or `None` to leave the block as it is
    fn transform(&self, source: &str) -> Option<String>;
}

pub fn extract(html: &str) -> Vec<FencedBlock> {
    CODE_BLOCK_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(FencedBlock {
                language: caps[1].to_string(),
                source: html_escape::decode_html_entities(&caps[2]).into_owned(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Replace every block whose language has a transformer
pub fn substitute(html: &str, transformers: &[&dyn BlockTransformer]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;

    for block in extract(html) {
        let Some(transformer) = transformers
            .iter()
            .find(|t| t.language().eq_ignore_ascii_case(&block.language))
        else {
            continue;
        };
        let Some(replacement) = transformer.transform(&block.source) else {
            tracing::debug!(language = %block.language, "leaving fenced block unchanged");
            continue;
        };
        out.push_str(&html[cursor..block.span.start]);
        out.push_str(&replacement);
        cursor = block.span.end;
    }

    out.push_str(&html[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl BlockTransformer for Upper {
        fn language(&self) -> &str {
            "shout"
        }

        fn transform(&self, source: &str) -> Option<String> {
            if source.trim().is_empty() {
                return None;
            }
            Some(format!("<p>{}</p>", source.trim().to_uppercase()))
        }
    }

    #[test]
    fn test_extract_decodes_entities() {
        let html = r#"<p>x</p><pre><code class="language-embed">code: &lt;b&gt;hi&lt;/b&gt; &amp; &quot;q&quot;
</code></pre>"#;
        let blocks = extract(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "embed");
        assert_eq!(blocks[0].source, "code: <b>hi</b> & \"q\"\n");
        assert_eq!(&html[blocks[0].span.clone()][..5], "<pre>");
    }

    #[test]
    fn test_substitute_only_registered_languages() {
        let html = "<pre><code class=\"language-shout\">hey\n</code></pre>\n<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n";
        let out = substitute(html, &[&Upper]);
        assert!(out.starts_with("<p>HEY</p>"));
        assert!(out.contains("language-rust"));
    }

    #[test]
    fn test_substitute_keeps_declined_blocks() {
        let html = "<pre><code class=\"language-shout\">   </code></pre>";
        assert_eq!(substitute(html, &[&Upper]), html);
    }
}
