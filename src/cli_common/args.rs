//! Общие аргументы командной строки

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::output::OutputFormat;
use crate::config::AnalyzerConfig;

/// Общие аргументы для всех подкоманд
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,
}

impl CommonArgs {
    /// Определяет уровень логирования на основе флагов
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    pub fn should_print(&self) -> bool { !self.quiet }
}

/// Аргументы, переопределяющие файл конфигурации
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (.toml, .yaml); default lookup when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Library definition file replacing the built-in one
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    /// Activate a library subset (repeatable)
    #[arg(long = "subset", global = true)]
    pub subsets: Vec<String>,
}

impl ConfigArgs {
    /// Конфигурация из файла (или поиск по умолчанию) с учётом флагов.
    pub fn load(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::load(path)?,
            None => AnalyzerConfig::discover()?,
        };
        if let Some(library) = &self.library {
            config.library.file = Some(library.clone());
        }
        if !self.subsets.is_empty() {
            config.library.subsets = self.subsets.clone();
        }
        Ok(config)
    }
}

/// Аргументы для работы с выводом
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        let mut args = CommonArgs { verbose: true, quiet: false, format: OutputFormat::Text };
        assert_eq!(args.log_level(), tracing::Level::DEBUG);
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
        assert!(!args.should_print());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.toml");
        std::fs::write(&path, "[library]\nsubsets = [\"lsl\"]\n").unwrap();
        let args = ConfigArgs {
            config: Some(path),
            library: Some(PathBuf::from("/tmp/custom.toml")),
            subsets: vec!["os-lsl".to_string()],
        };
        let config = args.load().unwrap();
        assert_eq!(config.library.file, Some(PathBuf::from("/tmp/custom.toml")));
        assert_eq!(config.library.subsets, vec!["os-lsl".to_string()]);
    }
}
