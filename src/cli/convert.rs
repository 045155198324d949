use anyhow::Result;
use log::info;
use swapdoodle::codec::lzss;
use swapdoodle::session::Export;

use super::command::{Cli, CompressArgs, DecompressArgs};
use super::{derived_path, load_letter, split_output};

pub fn cmd_decompress(args: &DecompressArgs, cli: &Cli) -> Result<()> {
    let (session, stem) = load_letter(&args.input, cli)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| derived_path(&args.input, &stem, "dec.bpk"));
    let (dir, name) = split_output(&output)?;

    let export = session.export_decompressed(name)?;
    let path = export.write_into(dir)?;
    info!(
        "Wrote {} ({} bytes, input was {} bytes)",
        path.display(),
        export.data.len(),
        session.raw_bytes().map_or(0, <[u8]>::len)
    );

    Ok(())
}

pub fn cmd_compress(args: &CompressArgs, cli: &Cli) -> Result<()> {
    let (session, stem) = load_letter(&args.input, cli)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| derived_path(&args.input, &stem, "lz.bpk"));
    let (dir, name) = split_output(&output)?;

    let plain = session.export_decompressed(name.clone())?;
    let export = Export {
        file_name: name,
        data: lzss::compress(&plain.data)?,
    };
    let path = export.write_into(dir)?;

    let ratio = if plain.data.is_empty() {
        0.0
    } else {
        export.data.len() as f64 / plain.data.len() as f64 * 100.0
    };
    info!(
        "Wrote {} ({} -> {} bytes, {ratio:.1}%)",
        path.display(),
        plain.data.len(),
        export.data.len()
    );

    Ok(())
}
