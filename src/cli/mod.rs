use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use swapdoodle::session::LetterSession;

use crate::input::InputReader;
use command::Cli;

pub mod command;
pub mod convert;
pub mod extract;
pub mod info;
pub mod render;

/// Loads one letter into a fresh session configured from the global flags.
///
/// Returns the session together with the stem used to name derived outputs.
pub fn load_letter(input: &Path, cli: &Cli) -> Result<(LetterSession, String)> {
    let reader = InputReader::new(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let stem = reader.stem();

    let mut session = LetterSession::default();
    session.set_strict(cli.strict);
    session
        .load_from(reader)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    Ok((session, stem))
}

/// `input` with its extension replaced by `ext`, or `{stem}.{ext}` in the
/// working directory for stdin.
pub fn derived_path(input: &Path, stem: &str, ext: &str) -> PathBuf {
    if input.as_os_str() == "-" {
        return PathBuf::from(format!("{stem}.{ext}"));
    }
    input.with_file_name(format!("{stem}.{ext}"))
}

/// Splits an output path into the directory and file name an export expects.
pub fn split_output(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("Output path {} has no file name", path.display()))?
        .to_string_lossy()
        .into_owned();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, name))
}
