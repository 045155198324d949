use std::io;

use crate::session::SessionState;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum LzssError {
    #[error("Unknown compression header {0:#04X}")]
    UnknownHeader(u8),

    #[error("Compressed stream is shorter than its header")]
    MissingHeader,

    #[error("Compressed stream ended after {written} of {expected} bytes")]
    Truncated { written: usize, expected: usize },

    #[error("Back-reference distance {distance} exceeds the {written} bytes written so far")]
    DistanceTooFar { distance: usize, written: usize },

    #[error("Back-reference of length {length} overruns the declared size ({written} of {expected} written)")]
    Overrun {
        length: usize,
        written: usize,
        expected: usize,
    },

    #[error("Input of {0} bytes is too large to compress")]
    InputTooLarge(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("Bad BPK1 magic")]
    BadMagic,

    #[error("Incorrect CRC32 checksum for block {name}: calculated {calculated:#010X}, read {read:#010X}")]
    ChecksumMismatch {
        name: String,
        calculated: u32,
        read: u32,
    },

    #[error("Truncated data: {0}")]
    Truncated(#[from] io::Error),

    #[error("Block name is not valid UTF-8: {0:02X?}")]
    InvalidBlockName(Vec<u8>),

    #[error("Stationery is missing its {0} block")]
    MissingStationeryBlock(&'static str),

    #[error("Decompression failed: {0}")]
    Decompression(#[from] LzssError),
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Mask must have {expected} rows, found {found}")]
    MaskRowCount { expected: usize, found: usize },

    #[error("Mask row {row} must have {expected} entries, found {found}")]
    MaskRowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Mask value {value} at ({row}, {column}) is outside 0..=15")]
    MaskValueOutOfRange { row: usize, column: usize, value: u8 },

    #[error("{layer} is {width}x{height}, canvas is {canvas_width}x{canvas_height}")]
    CanvasMismatch {
        layer: &'static str,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("Could not allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("Image error in {context}: {source}")]
    Image {
        context: String,
        #[source]
        source: image::ImageError,
    },
}

impl RenderError {
    pub fn image(context: impl Into<String>, source: image::ImageError) -> Self {
        Self::Image {
            context: context.into(),
            source,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Could not read file content: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Nonexistent block {block}[{index}]")]
    NotFound { block: String, index: usize },

    #[error("No letter is loaded (session is {0})")]
    NotReady(SessionState),

    #[error("Compressed document could not be expanded: {0}")]
    Export(#[from] LzssError),
}
