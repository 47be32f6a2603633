//! Integration tests for the full content pipeline

use super::*;

fn processor(endpoint: Option<&str>) -> ContentProcessor {
    ContentProcessor::new(
        ProcessorOptions::for_site("demo").with_forms_endpoint(endpoint.map(str::to_string)),
    )
}

#[test]
fn test_embed_block_is_substituted() {
    let markdown = "Intro\n\n```embed\nprovider: YouTube\nid: abc123\nratio: 4:3\n```\n\nOutro";
    let html = processor(None).to_html(markdown);

    assert!(html.contains("https://www.youtube.com/embed/abc123"));
    assert!(html.contains("ratio-4-3"));
    assert!(!html.contains("language-embed"), "code block should be replaced");
    assert!(html.contains("<p>Outro</p>"));
}

#[test]
fn test_every_iframe_provider_in_documents() {
    let cases = [
        ("youtube", "https://www.youtube.com/embed/"),
        ("vimeo", "https://player.vimeo.com/video/"),
        ("tiktok", "https://www.tiktok.com/embed/v2/"),
    ];
    for ratio in ["16:9", "4:3", "1:1", "9:16"] {
        for (provider, prefix) in cases {
            let markdown = format!(
                "```embed\nprovider: {}\nid: \"12345\"\nratio: \"{}\"\n```\n",
                provider, ratio
            );
            let html = processor(None).to_html(&markdown);
            assert!(html.contains(&format!("{}12345", prefix)), "{}", html);
            assert!(
                html.contains(&format!("ratio-{}", ratio.replace(':', "-"))),
                "{}",
                html
            );
        }
    }
}

#[test]
fn test_html_embed_decodes_entities() {
    let markdown = "```embed\nprovider: html\ncode: '<iframe src=\"https://maps.example.com/?a=1&b=2\"></iframe>'\n```\n";
    let html = processor(None).to_html(markdown);
    assert!(html.contains(r#"<iframe src="https://maps.example.com/?a=1&b=2"></iframe>"#));
}

#[test]
fn test_invalid_embed_is_left_unchanged() {
    let markdown = "```embed\nprovider: myspace\nid: 1\n```\n";
    let html = processor(None).to_html(markdown);
    assert!(html.contains(r#"<code class="language-embed">"#));
}

#[test]
fn test_form_block_uses_endpoint() {
    let markdown = "# Contact\n\n```form\ntype: contact\n```\n";
    let html = processor(Some("https://forms.example.com/")).to_html(markdown);
    assert!(html.contains(r#"action="https://forms.example.com/api/v1/forms/submit""#));
    assert!(html.contains(r#"name="site" value="demo""#));
    assert!(!html.contains("language-form"));
}

#[test]
fn test_unknown_form_type_is_left_unchanged() {
    let html = processor(None).to_html("```form\ntype: poll\n```\n");
    assert!(html.contains(r#"<code class="language-form">"#));
}

#[test]
fn test_ordinary_code_blocks_survive() {
    let html = processor(None).to_html("```rust\nfn main() {}\n```\n");
    assert!(html.contains(r#"<code class="language-rust">"#));
}

#[test]
fn test_captioned_internal_image() {
    let html = processor(None).to_html("![Map|||The old town](/workspace/demo/images/map.png)");
    assert!(html.contains(r#"<figure class="content-figure"><img src="/images/map.png" alt="Map" class="content-image" loading="lazy" />"#));
    assert!(html.contains("<figcaption>The old town</figcaption>"));
}
