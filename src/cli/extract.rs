use std::fs;

use anyhow::{Context, Result};
use log::info;

use super::command::{Cli, ExtractArgs};
use super::load_letter;

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli) -> Result<()> {
    let (session, _) = load_letter(&args.input, cli)?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let exports = if args.all {
        let blocks = session.document().context("No letter loaded")?.blocks();
        let mut exports = Vec::with_capacity(blocks.total());
        for (name, payloads) in blocks.iter() {
            for index in 0..payloads.len() {
                exports.push(session.export_block(name, index)?);
            }
        }
        exports
    } else {
        let name = args.block.as_deref().context("Either --block or --all is required")?;
        vec![session.export_block(name, args.index)?]
    };

    for export in &exports {
        let path = export.write_into(&args.output_dir)?;
        info!("Wrote {} ({} bytes)", path.display(), export.data.len());
    }

    Ok(())
}
