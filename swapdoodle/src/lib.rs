//! Decoder for Swapdoodle Letter files.
//!
//! ## Technical Overview
//!
//! A Letter is a BPK1 block package, optionally wrapped in LZ10/LZ11
//! compression. Each block carries a name, its data and a CRC-32.
//!
//! ### Letter Blocks
//!
//! - `THUMB2`: JPEG thumbnail, one per page
//! - `MIISTD1`: the sender's Mii; names and profile are decoded
//! - `STATIN1`: stationery, itself a BPK1 package with two JPEG backgrounds
//!   and a 4-bit transparency mask
//! - `SHEET1`: pen strokes of one drawing page
//!
//! ## Quick Start
//!
//! 1. Decode a Letter with [`codec::parse_letter`]
//! 2. Turn it into display-ready images with [`render::post_process`]
//!
//! Or let a [`session::LetterSession`] do both and handle exports:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use swapdoodle::session::LetterSession;
//!
//! let mut session = LetterSession::default();
//! session.load_from(Path::new("letter.bpk"))?;
//!
//! if let Some(rendered) = session.rendered() {
//!     for thumbnail in &rendered.thumbnails {
//!         println!("{} {}x{}", thumbnail.format(), thumbnail.width(), thumbnail.height());
//!     }
//! }
//!
//! session.export_decompressed("letter.dec.bpk")?.write_into(".")?;
//! session.export_block("SHEET1", 0)?.write_into(".")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Binary formats: LZSS, BPK1 packages and the Letter block layout.
///
/// - **LZSS** ([`codec::lzss`]): LZ10/LZ11 decompression and LZ11 compression
/// - **BPK1** ([`codec::bpk1`]): Block packages with CRC-32 validation
/// - **Letters** ([`codec::letter`]): Block interpretation
pub mod codec;

/// Data structures representing decoded and rendered Letters.
pub mod structs;

/// Post-processing into display-ready assets.
pub mod render;

/// Loading, state tracking and exports.
pub mod session;

/// User-facing notifications.
pub mod notify;

/// Utility functions and supporting infrastructure.
///
/// - **Byte I/O** ([`utils::byte_io`]): Little-endian reads over byte slices
/// - **Byte Order** ([`utils::byteorder`]): Little-endian serialization
/// - **CRC Validation** ([`utils::crc`]): Block checksums
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
