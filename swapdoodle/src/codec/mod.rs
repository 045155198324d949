/// LZSS decompression and compression.
///
/// Provides [`decompress`](lzss::decompress),
/// [`decompress_if_compressed`](lzss::decompress_if_compressed) and
/// [`compress`](lzss::compress) for the LZ10/LZ11 streams Letter files may
/// be wrapped in.
pub mod lzss;

/// BPK1 block packages.
///
/// Provides [`read_blocks`](bpk1::read_blocks) with per-block CRC-32
/// validation and the [`Bpk1Writer`](bpk1::Bpk1Writer) for building packages.
pub mod bpk1;

/// Letter decoding.
///
/// Provides [`parse_letter`](letter::parse_letter), the only way to obtain a
/// [`LetterDocument`](crate::structs::document::LetterDocument).
pub mod letter;

pub use letter::parse_letter;
pub use lzss::{decompress, decompress_if_compressed};
