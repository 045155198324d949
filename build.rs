use anyhow::{Context, Result};
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

const LIBRARY: &str = "swapdoodle";
const LIBRARY_MANIFEST: &str = "swapdoodle/Cargo.toml";

fn main() -> Result<()> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let emitted = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    // Source tarballs have no git metadata
    if let Err(e) = emitted {
        eprintln!("git describe unavailable: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }

    let built = match env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => chrono::Utc
            .timestamp_opt(epoch.parse::<i64>()?, 0)
            .single()
            .with_context(|| format!("SOURCE_DATE_EPOCH out of range: {epoch}"))?,
        Err(_) => chrono::Utc::now(),
    };
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        built.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let version = library_version_from_metadata()
        .or_else(|_| library_version_from_manifest())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SWAPDOODLE_VERSION={version}");
    println!("cargo:rerun-if-changed={LIBRARY_MANIFEST}");

    Ok(())
}

/// Library version as resolved by `cargo metadata`, local or published.
fn library_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;
    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let workspace = metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some(LIBRARY))
        .and_then(|package| package["version"].as_str());
    if let Some(version) = workspace {
        return Ok(version.to_string());
    }

    // Resolved node ids look like "swapdoodle 0.2.0 (registry+...)"
    metadata["resolve"]["nodes"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|node| node["id"].as_str())
        .find_map(|id| {
            let mut parts = id.split(' ');
            (parts.next() == Some(LIBRARY))
                .then(|| parts.next())
                .flatten()
                .map(str::to_string)
        })
        .with_context(|| format!("{LIBRARY} package not found in metadata"))
}

fn library_version_from_manifest() -> Result<String> {
    let manifest = fs::read_to_string(LIBRARY_MANIFEST)?;

    manifest
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("version"))
        .find_map(|line| line.split_once('='))
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .with_context(|| format!("Could not find version in {LIBRARY_MANIFEST}"))
}
