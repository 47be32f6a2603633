use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn embed_converts_a_block() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("video.yml");
    fs::write(&file, "provider: youtube\nid: dQw4w9WgXcQ\nratio: \"4:3\"\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("pressroom")?
        .arg("embed")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.youtube.com/embed/dQw4w9WgXcQ"))
        .stdout(predicate::str::contains("ratio-4-3"));
    Ok(())
}

#[test]
fn embed_rejects_unknown_provider() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("bad.yml");
    fs::write(&file, "provider: myspace\nid: 1\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("pressroom")?
        .arg("embed")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid embed block"));
    Ok(())
}
