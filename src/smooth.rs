// src/smooth.rs
//! Сглаживание карты высот усредняющим фильтром 3×3
//!
//! Алгоритм в два прохода:
//! 1. **Размытие** — каждый отсчёт заменяется средним по окрестности 3×3.
//!    Соседи за краем карты берутся с ближайшего края (clamp-to-edge), поэтому
//!    среднее всегда считается ровно по 9 отсчётам, с повторами на краях и в углах.
//! 2. **Смешивание** — результат линейно интерполируется между исходной высотой
//!    и размытой: `h + (b - h) * s`, что равно `h * (1 - s) + b * s`.
//!
//! Размытый буфер — отдельная полная копия; исходные высоты не меняются,
//! поэтому порядок обхода не влияет на результат. Строки независимы и при
//! включённой фиче `parallel` считаются параллельно через `rayon`.
//!
//! ## Пример
//! ```
//! use heightsmooth::smooth::smooth;
//!
//! let heights = vec![0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0];
//! let result = smooth(&heights, 3, 3, 1.0).unwrap();
//! assert_eq!(result[4], 10.0 / 9.0);
//! ```

use crate::error::{Error, Result};
use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Размер стороны ядра
pub const KERNEL_SIZE: usize = 3;

/// Радиус ядра (`KERNEL_SIZE / 2`)
pub const HALF_KERNEL: isize = (KERNEL_SIZE / 2) as isize;

const KERNEL_AREA: f64 = (KERNEL_SIZE * KERNEL_SIZE) as f64;

/// Прогресс прохода размытия: сколько строк из `total_rows` уже готово
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub rows_done: u32,
    pub total_rows: u32,
}

impl Progress {
    /// Доля выполненной работы в диапазоне `[0, 1]`
    #[must_use]
    pub fn fraction(self) -> f32 {
        if self.total_rows == 0 {
            return 1.0;
        }
        self.rows_done as f32 / self.total_rows as f32
    }
}

/// Проверяет, что сетка непуста и содержит ровно `width × height` отсчётов
pub fn check_dimensions(len: usize, width: u32, height: u32) -> Result<()> {
    let expected = width as usize * height as usize;
    if width == 0 || height == 0 || len != expected {
        return Err(Error::InvalidDimension { width, height, len });
    }
    Ok(())
}

/// Приводит коэффициент сглаживания к `[0, 1]`. `NaN` считается нулём.
#[must_use]
pub fn clamp_smoothness(smoothness: f32) -> f32 {
    if smoothness.is_nan() {
        warn!("smoothness is NaN, treating as 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&smoothness) {
        warn!("smoothness {smoothness} out of range, clamping to [0, 1]");
    }
    smoothness.clamp(0.0, 1.0)
}

/// Сглаживает карту высот и возвращает новую сетку.
///
/// `smoothness = 0` — тождественное преобразование, свёртка не выполняется.
pub fn smooth(heights: &[f32], width: u32, height: u32, smoothness: f32) -> Result<Vec<f32>> {
    smooth_with_progress(heights, width, height, smoothness, height, |_| {})
}

/// То же, что [`smooth`], но после каждых `batch_rows` строк размытия вызывает
/// `on_progress`. Последнее событие всегда сообщает `fraction() == 1.0`.
///
/// `batch_rows == 0` трактуется как 1. Колбэк вызывается только из текущего
/// потока, между пакетами строк.
pub fn smooth_with_progress<F>(
    heights: &[f32],
    width: u32,
    height: u32,
    smoothness: f32,
    batch_rows: u32,
    mut on_progress: F,
) -> Result<Vec<f32>>
where
    F: FnMut(Progress),
{
    check_dimensions(heights.len(), width, height)?;
    let smoothness = clamp_smoothness(smoothness);

    if smoothness <= 0.0 {
        on_progress(Progress {
            rows_done: height,
            total_rows: height,
        });
        return Ok(heights.to_vec());
    }

    let w = width as usize;
    let h = height as usize;
    let batch = batch_rows.max(1) as usize;
    debug!("smoothing {w}×{h} heightmap, smoothness={smoothness}, batch={batch}");

    // === 1. Размытие ===
    let mut blurred = vec![0.0; heights.len()];
    for (batch_idx, chunk) in blurred.chunks_mut(batch * w).enumerate() {
        let first_row = batch_idx * batch;
        blur_rows(heights, w, h, first_row, chunk);
        on_progress(Progress {
            rows_done: (first_row + chunk.len() / w) as u32,
            total_rows: height,
        });
    }

    // === 2. Смешивание ===
    Ok(blend(heights, &blurred, smoothness))
}

/// Полностью размытая копия карты (эквивалент `smooth(.., 1.0)`)
pub fn blur(heights: &[f32], width: u32, height: u32) -> Result<Vec<f32>> {
    check_dimensions(heights.len(), width, height)?;
    let mut blurred = vec![0.0; heights.len()];
    blur_rows(heights, width as usize, height as usize, 0, &mut blurred);
    Ok(blurred)
}

/// Размывает одну строку `y` в `out_row` (длиной `width`).
///
/// Позволяет вызывающему коду самому делить диапазон строк на части.
pub fn blur_row(
    heights: &[f32],
    width: u32,
    height: u32,
    y: u32,
    out_row: &mut [f32],
) -> Result<()> {
    check_dimensions(heights.len(), width, height)?;
    if y >= height || out_row.len() != width as usize {
        return Err(Error::InvalidDimension {
            width,
            height,
            len: out_row.len(),
        });
    }
    blur_row_into(heights, width as usize, height as usize, y as usize, out_row);
    Ok(())
}

/// Линейная интерполяция исходной и размытой сеток.
///
/// Считается в `f64` в форме `h + (b - h) * s`: при `b == h` высота не
/// меняется, при `s == 1` результат ровно `b`.
fn blend(heights: &[f32], blurred: &[f32], smoothness: f32) -> Vec<f32> {
    let s = f64::from(smoothness);
    heights
        .iter()
        .zip(blurred)
        .map(|(&original, &smoothed)| {
            let h = f64::from(original);
            (h + (f64::from(smoothed) - h) * s) as f32
        })
        .collect()
}

/// Размывает подряд идущие строки, начиная с `first_row`; `out` кратен `width`
#[cfg(feature = "parallel")]
fn blur_rows(heights: &[f32], width: usize, height: usize, first_row: usize, out: &mut [f32]) {
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(i, row)| blur_row_into(heights, width, height, first_row + i, row));
}

#[cfg(not(feature = "parallel"))]
fn blur_rows(heights: &[f32], width: usize, height: usize, first_row: usize, out: &mut [f32]) {
    for (i, row) in out.chunks_mut(width).enumerate() {
        blur_row_into(heights, width, height, first_row + i, row);
    }
}

fn blur_row_into(heights: &[f32], width: usize, height: usize, y: usize, out: &mut [f32]) {
    let max_x = width - 1;
    let max_y = height - 1;

    for (x, value) in out.iter_mut().enumerate() {
        // 9 отсчётов f32 в сумме f64: среднее константы восстанавливается точно
        let mut total = 0.0_f64;
        for ky in -HALF_KERNEL..=HALF_KERNEL {
            let sample_y = y.saturating_add_signed(ky).min(max_y);
            let row = &heights[sample_y * width..(sample_y + 1) * width];
            for kx in -HALF_KERNEL..=HALF_KERNEL {
                let sample_x = x.saturating_add_signed(kx).min(max_x);
                total += f64::from(row[sample_x]);
            }
        }
        *value = (total / KERNEL_AREA) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn spike() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0]
    }

    #[test]
    fn zero_smoothness_is_identity() {
        let heights = vec![0.1, 0.7, 0.3, 0.9, 0.2, 0.4];
        let result = smooth(&heights, 3, 2, 0.0).unwrap();
        assert_eq!(result, heights);
    }

    #[test]
    fn center_spike_spreads_evenly() {
        let result = smooth(&spike(), 3, 3, 1.0).unwrap();
        for value in result {
            assert_eq!(value, 10.0 / 9.0);
        }
    }

    const FACTORS: [f32; 7] = [0.0, 0.1, 0.25, 0.3, 0.5, 0.75, 1.0];

    fn random_heights(count: usize) -> Vec<f32> {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut values: Vec<f32> = (0..count).map(|_| rng.gen_range(0.0..1.0)).collect();
        values.extend([0.003_711, 0.1, 1.0 / 3.0, 0.999_999, 123.456]);
        values
    }

    #[test]
    fn single_sample_is_unchanged() {
        for c in random_heights(500) {
            for s in FACTORS {
                let result = smooth(&[c], 1, 1, s).unwrap();
                assert_eq!(result, vec![c], "c={c}, s={s}");
            }
        }
    }

    #[test]
    fn constant_grid_is_unchanged() {
        for c in random_heights(500) {
            let heights = vec![c; 4 * 5];
            assert_eq!(blur(&heights, 4, 5).unwrap(), heights, "c={c}");
            for s in FACTORS {
                let result = smooth(&heights, 4, 5, s).unwrap();
                assert_eq!(result, heights, "c={c}, s={s}");
            }
        }
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = smooth(&[], 0, 3, 0.5).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDimension {
                width: 0,
                height: 3,
                len: 0
            }
        ));
    }

    #[test]
    fn sample_count_mismatch_is_rejected() {
        let err = smooth(&[0.0; 5], 2, 3, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { len: 5, .. }));
    }

    #[test]
    fn out_of_range_smoothness_is_clamped() {
        let above = smooth(&spike(), 3, 3, 4.0).unwrap();
        assert_eq!(above, smooth(&spike(), 3, 3, 1.0).unwrap());

        let below = smooth(&spike(), 3, 3, -2.0).unwrap();
        assert_eq!(below, spike());

        let nan = smooth(&spike(), 3, 3, f32::NAN).unwrap();
        assert_eq!(nan, spike());
    }

    #[test]
    fn edges_clamp_per_axis_on_non_square_grid() {
        // 4×1: по вертикали все три строки окрестности — одна и та же строка
        let heights = vec![0.0, 9.0, 0.0, 0.0];
        let blurred = blur(&heights, 4, 1).unwrap();
        assert_eq!(blurred, vec![3.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn blur_row_matches_full_blur() {
        let heights: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let full = blur(&heights, 4, 3).unwrap();
        let mut row = vec![0.0; 4];
        for y in 0..3 {
            blur_row(&heights, 4, 3, y, &mut row).unwrap();
            assert_eq!(row, full[y as usize * 4..(y as usize + 1) * 4]);
        }
        assert!(blur_row(&heights, 4, 3, 3, &mut row).is_err());
    }

    #[test]
    fn progress_is_reported_per_batch() {
        let heights = vec![0.5; 3 * 25];
        let mut events = Vec::new();
        smooth_with_progress(&heights, 3, 25, 0.5, 10, |p| events.push(p.rows_done)).unwrap();
        assert_eq!(events, vec![10, 20, 25]);
    }

    #[test]
    fn identity_path_reports_completion() {
        let mut events = Vec::new();
        smooth_with_progress(&spike(), 3, 3, 0.0, 1, |p| events.push(p.fraction())).unwrap();
        assert_eq!(events, vec![1.0]);
    }

    #[test]
    fn zero_batch_is_one_row() {
        let mut events = Vec::new();
        smooth_with_progress(&spike(), 3, 3, 1.0, 0, |p| events.push(p.rows_done)).unwrap();
        assert_eq!(events, vec![1, 2, 3]);
    }
}
