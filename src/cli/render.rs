use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info};
use swapdoodle::structs::asset::ImageAsset;

use super::command::{Cli, RenderArgs};
use super::load_letter;

pub fn cmd_render(args: &RenderArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(args.inputs.len() as u64));
            pb.set_style(ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} letters ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
            )?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        }
        None => None,
    };

    let mut failed = 0usize;
    for input in &args.inputs {
        if let Some(pb) = &pb {
            pb.set_message(input.display().to_string());
        }

        match render_one(input, &args.output_dir, cli) {
            Ok(dir) => info!("Rendered {} into {}", input.display(), dir.display()),
            Err(e) => {
                error!("{e:#}");
                failed += 1;
                if cli.strict {
                    break;
                }
            }
        }

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    if failed > 0 {
        bail!("{failed} of {} letters could not be rendered", args.inputs.len());
    }
    Ok(())
}

fn render_one(input: &Path, output_dir: &Path, cli: &Cli) -> Result<PathBuf> {
    let (session, stem) = load_letter(input, cli)?;
    let rendered = session.rendered().context("No letter loaded")?;

    let dir = output_dir.join(stem);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    for (i, thumbnail) in rendered.thumbnails.iter().enumerate() {
        write_asset(&dir, &format!("thumb{i}"), thumbnail)?;
    }

    if let Some(stationery) = &rendered.stationery {
        write_asset(&dir, "background_2d", &stationery.background_2d)?;
        write_asset(&dir, "background_3d", &stationery.background_3d)?;
        write_asset(&dir, "mask", &stationery.mask)?;
        write_asset(&dir, "stationery", &stationery.composite)?;
    }

    if !rendered.sheets.is_empty() {
        let path = dir.join("sheets.yaml");
        fs::write(&path, serde_yaml_ng::to_string(&rendered.sheets)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(dir)
}

fn write_asset(dir: &Path, stem: &str, asset: &ImageAsset) -> Result<()> {
    let path = dir.join(format!("{stem}.{}", asset.format().extension()));
    fs::write(&path, asset.bytes()).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!(
        "Wrote {} ({}x{}, {} bytes)",
        path.display(),
        asset.width(),
        asset.height(),
        asset.bytes().len()
    );
    Ok(())
}
