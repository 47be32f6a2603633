//! Embed command: convert one embed block directly.

use anyhow::{Context, Result};
use pressroom_core::markdown::embed;
use std::fs;
use std::path::Path;

pub fn convert_embed(file: &Path) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let html = embed::render_yaml(&source)
        .with_context(|| format!("Invalid embed block in {}", file.display()))?;
    println!("{}", html);
    Ok(())
}
