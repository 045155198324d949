use anyhow::{Context, Result};
use serde::Serialize;
use swapdoodle::codec::lzss;
use swapdoodle::session::LetterSession;
use swapdoodle::structs::asset::{AssetFormat, ImageAsset};
use swapdoodle::structs::document::LetterDocument;
use swapdoodle::structs::mii::MiiData;
use swapdoodle::structs::rendered::RenderedLetter;

use super::command::{Cli, InfoArgs, InfoFormat};
use super::load_letter;

#[derive(Debug, Serialize)]
struct LetterSummary<'a> {
    source: String,
    size: usize,
    compression: Option<&'static str>,
    blocks: Vec<BlockSummary<'a>>,
    thumbnails: Vec<ImageSummary>,
    sender: Option<SenderSummary<'a>>,
    stationery: Option<StationerySummary<'a>>,
    sheets: Vec<SheetSummary>,
}

#[derive(Debug, Serialize)]
struct BlockSummary<'a> {
    name: &'a str,
    sizes: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct ImageSummary {
    format: AssetFormat,
    width: u32,
    height: u32,
    size: usize,
}

impl From<&ImageAsset> for ImageSummary {
    fn from(asset: &ImageAsset) -> Self {
        Self {
            format: asset.format(),
            width: asset.width(),
            height: asset.height(),
            size: asset.bytes().len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SenderSummary<'a> {
    #[serde(flatten)]
    mii: &'a MiiData,
    size: usize,
}

#[derive(Debug, Serialize)]
struct StationerySummary<'a> {
    name: &'a str,
    background_2d: ImageSummary,
    background_3d: ImageSummary,
    mask_opaque_fraction: f64,
}

#[derive(Debug, Serialize)]
struct SheetSummary {
    strokes: usize,
    lines: usize,
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli) -> Result<()> {
    log::info!("Analyzing letter: {}", args.input.display());

    let (session, stem) = load_letter(&args.input, cli)?;
    let summary = summarize(&session, stem)?;

    match args.format {
        InfoFormat::Plain => print_plain(&summary),
        InfoFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&summary)?),
    }

    Ok(())
}

fn summarize(session: &LetterSession, source: String) -> Result<LetterSummary<'_>> {
    let raw = session.raw_bytes().context("No letter loaded")?;
    let document: &LetterDocument = session.document().context("No letter loaded")?;
    let rendered: &RenderedLetter = session.rendered().context("No letter loaded")?;

    let compression = match raw.first() {
        Some(&lzss::LZ10_MARKER) if lzss::is_compressed(raw) => Some("LZ10"),
        Some(&lzss::LZ11_MARKER) if lzss::is_compressed(raw) => Some("LZ11"),
        _ => None,
    };

    let stationery = rendered
        .stationery
        .as_ref()
        .zip(document.stationery())
        .map(|(rendered, decoded)| {
            let cells = decoded.mask().iter().map(Vec::len).sum::<usize>().max(1);
            let opaque = decoded.mask().iter().flatten().filter(|&&v| v == 0x0F).count();
            StationerySummary {
                name: &rendered.name,
                background_2d: (&rendered.background_2d).into(),
                background_3d: (&rendered.background_3d).into(),
                mask_opaque_fraction: opaque as f64 / cells as f64,
            }
        });

    Ok(LetterSummary {
        source,
        size: raw.len(),
        compression,
        blocks: document
            .blocks()
            .iter()
            .map(|(name, payloads)| BlockSummary {
                name,
                sizes: payloads.iter().map(Vec::len).collect(),
            })
            .collect(),
        thumbnails: rendered.thumbnails.iter().map(ImageSummary::from).collect(),
        sender: document
            .sender_mii()
            .zip(document.sender_mii_bytes())
            .map(|(mii, bytes)| SenderSummary {
                mii,
                size: bytes.len(),
            }),
        stationery,
        sheets: rendered
            .sheets
            .iter()
            .map(|sheet| SheetSummary {
                strokes: sheet.strokes.len(),
                lines: sheet.line_count(),
            })
            .collect(),
    })
}

fn print_plain(summary: &LetterSummary<'_>) {
    println!("Letter: {}", summary.source);
    println!("  Size: {} bytes", summary.size);
    println!("  Compression: {}", summary.compression.unwrap_or("none"));

    println!("Blocks:");
    for block in &summary.blocks {
        let sizes: Vec<String> = block.sizes.iter().map(ToString::to_string).collect();
        println!("  {:<8} x{} ({} bytes)", block.name, block.sizes.len(), sizes.join(", "));
    }

    for (i, thumb) in summary.thumbnails.iter().enumerate() {
        println!(
            "Thumbnail {i}: {}x{} {} ({} bytes)",
            thumb.width, thumb.height, thumb.format, thumb.size
        );
    }

    match &summary.sender {
        Some(sender) => {
            println!("Sender Mii: \"{}\" ({} bytes)", sender.mii.mii_name, sender.size);
            println!("  Creator: \"{}\"", sender.mii.creator_name);
        }
        None => println!("Sender Mii: none"),
    }

    match &summary.stationery {
        Some(stationery) => {
            println!("Stationery: \"{}\"", stationery.name);
            println!(
                "  2D background: {}x{}",
                stationery.background_2d.width, stationery.background_2d.height
            );
            println!(
                "  3D background: {}x{}",
                stationery.background_3d.width, stationery.background_3d.height
            );
            println!("  Mask: {:.1}% opaque", stationery.mask_opaque_fraction * 100.0);
        }
        None => println!("Stationery: none"),
    }

    for (i, sheet) in summary.sheets.iter().enumerate() {
        println!("Sheet {i}: {} strokes, {} line segments", sheet.strokes, sheet.lines);
    }
}
