//! Общий модуль для CLI
//!
//! Инициализация логирования, сообщения в консоль, поиск файлов `.lsl`,
//! форматирование вывода и прогресс.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

pub mod args;
pub mod output;
pub mod progress;

pub use args::{CommonArgs, ConfigArgs, OutputArgs};
pub use output::{OutputFormat, OutputWriter, Statistics};
pub use progress::{ProgressReporter, ProgressStyle};

/// Расширение файлов скриптов
pub const LSL_EXTENSION: &str = "lsl";

/// Инициализирует логирование в stderr; `RUST_LOG` дополняет уровень из флагов
pub fn init_logging(level: tracing::Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Сообщение об успешной операции в stdout
pub fn print_success(message: &str) {
    println!("{} {}", "ok:".green().bold(), message);
}

/// Сообщения ниже выводятся в stderr, чтобы не смешиваться с JSON
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Файлы `.lsl` по пути: сам файл или обход директории, в порядке имён
pub fn collect_lsl_files(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Input path does not exist: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let walker = if recursive { WalkDir::new(path) } else { WalkDir::new(path).max_depth(1) };
    let mut files = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let is_lsl = entry.path().extension().and_then(|e| e.to_str()) == Some(LSL_EXTENSION);
        if entry.file_type().is_file() && is_lsl {
            files.push(entry.into_path());
        }
    }
    tracing::debug!("Found {} .lsl files under {}", files.len(), path.display());
    Ok(files)
}

/// Длительность для сводки: миллисекунды до секунды, затем секунды с дробью, от минуты минуты и секунды
pub fn format_duration(duration: std::time::Duration) -> String {
    match duration.as_secs() {
        0 => format!("{}ms", duration.as_millis()),
        s @ 1..=59 => format!("{:.3}s", s as f64 + f64::from(duration.subsec_millis()) / 1000.0),
        s => format!("{}m {}s", s / 60, s % 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let ms = std::time::Duration::from_millis;
        assert_eq!(format_duration(ms(42)), "42ms");
        assert_eq!(format_duration(ms(2_250)), "2.250s");
        assert_eq!(format_duration(ms(125_000)), "2m 5s");
    }

    #[test]
    fn test_collect_lsl_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.lsl"), "").unwrap();
        std::fs::write(dir.path().join("a.lsl"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.lsl"), "").unwrap();

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files.iter().map(|f| f.file_name().unwrap().to_string_lossy().into_owned()).collect()
        };
        assert_eq!(names(collect_lsl_files(dir.path(), false).unwrap()), vec!["a.lsl", "b.lsl"]);
        assert_eq!(names(collect_lsl_files(dir.path(), true).unwrap()), vec!["a.lsl", "b.lsl", "c.lsl"]);

        let single = dir.path().join("a.lsl");
        assert_eq!(collect_lsl_files(&single, true).unwrap(), vec![single]);
        assert!(collect_lsl_files(&dir.path().join("missing"), true).is_err());
    }
}
