// src/config.rs
//! Конфигурация сглаживания
//!
//! Параметры можно задать в TOML-файле и переопределить флагами CLI.
//!
//! ```toml
//! # smooth.toml
//! smoothness = 0.75
//! progress_rows = 32
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Параметры одного прохода сглаживания
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Сила сглаживания: `0.0` — без изменений, `1.0` — полное размытие 3×3.
    /// Значения вне диапазона обрезаются при применении.
    #[serde(default = "default_smoothness")]
    pub smoothness: f32,

    /// Через сколько строк обновлять прогресс
    #[serde(default = "default_progress_rows")]
    pub progress_rows: u32,
}

fn default_smoothness() -> f32 {
    0.5
}
fn default_progress_rows() -> u32 {
    10
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            smoothness: default_smoothness(),
            progress_rows: default_progress_rows(),
        }
    }
}

impl SmoothingParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Ошибки
    /// Возвращает ошибку, если файл не найден или содержит недопустимый формат.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
