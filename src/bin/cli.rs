use clap::Parser;
use heightsmooth::{HeightStats, Heightmap, SmoothingParams};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;

/// Сглаживание карты высот фильтром 3×3
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Карта высот в PNG (оттенки серого, 8 или 16 бит)
    #[arg(short, long)]
    input: PathBuf,

    /// Куда сохранить результат (по умолчанию: перезаписать входной файл)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сила сглаживания от 0.0 до 1.0 (перекрывает конфиг)
    #[arg(short, long)]
    smoothness: Option<f32>,

    /// Через сколько строк обновлять прогресс (перекрывает конфиг)
    #[arg(long)]
    progress_rows: Option<u32>,

    /// Сохранить копию исходной карты для отмены изменений
    #[arg(long)]
    backup: Option<PathBuf>,

    /// Записать статистику до/после в JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Посчитать, но ничего не записывать
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a PathBuf,
    smoothness: f32,
    before: HeightStats,
    after: HeightStats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut params = match &cli.config {
        Some(path) => {
            info!("Загрузка конфигурации из {}", path.display());
            SmoothingParams::from_toml_file(path)?
        }
        None => SmoothingParams::default(),
    };
    if let Some(smoothness) = cli.smoothness {
        params.smoothness = smoothness;
    }
    if let Some(rows) = cli.progress_rows {
        params.progress_rows = rows;
    }

    info!("Загрузка карты высот {}", cli.input.display());
    let original = Heightmap::load_png(&cli.input)?;
    let before = original.stats();
    info!(
        "Размер {}×{}, высоты {:.4}..{:.4}, среднее {:.4}",
        original.width, original.height, before.min, before.max, before.mean
    );

    let pb = ProgressBar::new(u64::from(original.height));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    let smoothed = original.smoothed_with_progress(params.smoothness, params.progress_rows, |p| {
        pb.set_position(u64::from(p.rows_done));
    })?;
    pb.finish_with_message("Smoothing done");

    let after = smoothed.stats();
    info!(
        "После сглаживания: высоты {:.4}..{:.4}, среднее {:.4}",
        after.min, after.max, after.mean
    );

    if let Some(path) = &cli.report {
        let report = Report {
            input: &cli.input,
            smoothness: params.smoothness,
            before,
            after,
        };
        serde_json::to_writer_pretty(File::create(path)?, &report)?;
        info!("Отчёт сохранён в {}", path.display());
    }

    if cli.dry_run {
        info!("Пробный запуск: файлы не изменены");
        return Ok(());
    }

    if let Some(path) = &cli.backup {
        original.save_as_png(path)?;
        info!("Исходная карта сохранена в {}", path.display());
    }

    let output = cli.output.as_ref().unwrap_or(&cli.input);
    smoothed.save_as_png(output)?;
    info!("Готово! Карта высот сохранена в {}", output.display());
    Ok(())
}
