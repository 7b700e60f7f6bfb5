use crate::error::{Error, Result};
use crate::smooth::{self, Progress, check_dimensions};
use image::{ImageBuffer, Luma};
use serde::Serialize;
use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Двумерная карта высот: нормализованные значения, обычно от 0.0 до 1.0
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// Сводка по высотам карты
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl Heightmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Оборачивает готовые данные, проверяя размеры
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        check_dimensions(data.len(), width, height)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Возвращает сглаженную копию карты
    pub fn smoothed(&self, smoothness: f32) -> Result<Self> {
        self.smoothed_with_progress(smoothness, self.height, |_| {})
    }

    /// Сглаживание с отчётом о прогрессе каждые `batch_rows` строк
    pub fn smoothed_with_progress<F>(
        &self,
        smoothness: f32,
        batch_rows: u32,
        on_progress: F,
    ) -> Result<Self>
    where
        F: FnMut(Progress),
    {
        let data = smooth::smooth_with_progress(
            &self.data,
            self.width,
            self.height,
            smoothness,
            batch_rows,
            on_progress,
        )?;
        Ok(Self {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Сглаживает карту на месте. При ошибке карта не меняется.
    pub fn apply_smoothing(&mut self, smoothness: f32) -> Result<()> {
        self.data = smooth::smooth(&self.data, self.width, self.height, smoothness)?;
        Ok(())
    }

    pub fn stats(&self) -> HeightStats {
        let min = self.data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = self.data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let sum: f64 = self.data.iter().map(|&v| f64::from(v)).sum();
        HeightStats {
            min,
            max,
            mean: (sum / self.data.len() as f64) as f32,
        }
    }

    /// 16-битные отсчёты; значения вне `[0, 1]` обрезаются
    pub fn to_grayscale16(&self) -> Vec<u16> {
        #[cfg(feature = "parallel")]
        let samples = self.data.par_iter();
        #[cfg(not(feature = "parallel"))]
        let samples = self.data.iter();

        samples
            .map(|&v| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16)
            .collect()
    }

    pub fn save_as_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_grayscale16()).ok_or(
                Error::InvalidDimension {
                    width: self.width,
                    height: self.height,
                    len: self.data.len(),
                },
            )?;
        img.save(path)?;
        Ok(())
    }

    /// Загружает карту из изображения в оттенках серого (8 или 16 бит).
    ///
    /// Цветные изображения переводятся в яркость средствами `image`.
    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?.into_luma16();
        let (width, height) = img.dimensions();
        let data = img
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / f32::from(u16::MAX))
            .collect();
        Self::from_raw(width, height, data)
    }
}
