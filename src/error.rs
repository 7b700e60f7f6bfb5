// src/error.rs
//! Ошибки крейта

use thiserror::Error;

/// Ошибки сглаживания и ввода-вывода карт высот
#[derive(Debug, Error)]
pub enum Error {
    /// Нулевая ширина/высота или число отсчётов не равно `width × height`
    #[error("invalid heightmap dimensions {width}×{height} for {len} samples")]
    InvalidDimension { width: u32, height: u32, len: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
