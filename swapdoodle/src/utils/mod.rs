//! Utility functions and supporting infrastructure.
//!
//! Provides little-endian byte I/O, CRC validation, record serialization and
//! the error taxonomy shared by the codec, the renderer and the session.

pub mod byte_io;
pub mod byteorder;
pub mod crc;
pub mod errors;
