use thiserror::Error;

use crate::chunk::Tag;
use crate::pixmap::PixMapFormat;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk {tag} holds {actual} bytes, expected {expected}")]
    ChunkSize { tag: Tag, expected: usize, actual: usize },

    #[error("no converter from {src:?} to {dest:?}")]
    UnsupportedConversion { src: PixMapFormat, dest: PixMapFormat },

    #[error("pixel format {0:?} is not supported here")]
    UnsupportedFormat(PixMapFormat),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("skin description, line {line}: {message}")]
    SkinParse { line: usize, message: String },

    #[error("XPM data: {0}")]
    Xpm(String),

    #[error("state encode failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("state decode failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no register bank at 0x{0:08X}")]
    Unmapped(u32),

    #[error("register bank at 0x{base:08X}..=0x{last:08X} overlaps {other}")]
    BankOverlap { base: u32, last: u32, other: &'static str },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
