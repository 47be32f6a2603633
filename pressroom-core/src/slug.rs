//! Slug generation and normalization.

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Transliterate diacritics to their ASCII base ("é" → "e")
/// - Replace every run of characters outside `[a-z0-9]` with one hyphen
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use pressroom_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("Héllo Wörld"), "hello-world");
/// ```
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

/// Slug for a content item: the heading slug plus its short id, so two items
/// with the same heading never collide.
pub fn content_slug(heading: &str, short_id: &str) -> String {
    let base = slugify(heading);
    let short_id = slugify(short_id);
    match (base.is_empty(), short_id.is_empty()) {
        (_, true) => base,
        (true, false) => short_id,
        (false, false) => format!("{}-{}", base, short_id),
    }
}

/// Stable eight-character id derived from `seed`
pub fn short_id(seed: &str) -> String {
    let hash = blake3::hash(seed.as_bytes());
    hash.to_hex().as_str()[..8].to_string()
}

/// Normalize a section path to `/segment/segment` form (`/` for the root)
pub fn normalize_section_path(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(slugify)
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
