/*!
# Analyzer Configuration

Настройки анализатора: источник библиотечных сигнатур, активные наборы
и переключатели проходов анализа. Поддерживаются файлы TOML и YAML.

Поиск файла по умолчанию: `./lsl-analyzer.toml`, затем
`<config dir>/lsl-analyzer/config.toml`. Если ни один файл не найден,
используются значения по умолчанию.
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::signatures::LibraryData;

/// Имя конфигурационного файла в текущем каталоге
pub const LOCAL_CONFIG_FILE: &str = "lsl-analyzer.toml";

/// Источник библиотечных сигнатур
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// TOML-файл с сигнатурами вместо встроенного
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Активные наборы; пусто означает наборы, указанные в самом файле
    #[serde(default)]
    pub subsets: Vec<String>,
}

/// Переключатели диагностик
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Предупреждения о недостижимом коде
    #[serde(default = "default_true")]
    pub dead_code: bool,

    /// Предупреждения о неиспользуемых локальных переменных
    #[serde(default = "default_true")]
    pub unused_variables: bool,

    /// Максимум диагностик на файл при выводе
    #[serde(default = "default_max_diagnostics")]
    pub max_per_file: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_max_diagnostics() -> Option<usize> {
    Some(100)
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            dead_code: true,
            unused_variables: true,
            max_per_file: default_max_diagnostics(),
        }
    }
}

/// Конфигурация анализатора
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Потоки для параллельной проверки (по умолчанию число ядер)
    #[serde(default)]
    pub threads: Option<usize>,
}

impl AnalyzerConfig {
    /// Загрузить конфигурацию по расширению файла (`.yaml`/`.yml` или TOML).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path),
            _ => Self::load_from_file(path),
        }
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config from {}", path.as_ref().display()))?;

        config.finish_loading(path.as_ref())
    }

    /// Load configuration from YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config from {}", path.as_ref().display()))?;

        config.finish_loading(path.as_ref())
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Найти конфигурацию в стандартных местах; без файла возвращаются значения по умолчанию.
    pub fn discover() -> Result<Self> {
        match Self::default_locations().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!("Using config {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("lsl-analyzer").join("config.toml"));
        }
        locations
    }

    // Относительный путь к библиотеке считается от каталога конфигурации
    fn finish_loading(mut self, path: &Path) -> Result<Self> {
        if let (Some(file), Some(dir)) = (&self.library.file, path.parent()) {
            if file.is_relative() {
                self.library.file = Some(dir.join(file));
            }
        }
        for warning in self.validate()? {
            tracing::warn!("{}: {}", path.display(), warning);
        }
        Ok(self)
    }

    /// Validate configuration. Ошибки возвращаются как `Err`, замечания как список.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.threads == Some(0) {
            anyhow::bail!("threads must be greater than zero");
        }
        if self.diagnostics.max_per_file == Some(0) {
            warnings.push("max_per_file = 0 hides all diagnostics".to_string());
        }
        if let Some(file) = &self.library.file {
            if !file.exists() {
                warnings.push(format!("library file {} does not exist", file.display()));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for subset in &self.library.subsets {
            if !seen.insert(subset) {
                warnings.push(format!("subset '{}' is listed more than once", subset));
            }
        }
        Ok(warnings)
    }

    /// Библиотека сигнатур согласно конфигурации.
    pub fn library_data(&self) -> Result<LibraryData> {
        let mut library = match &self.library.file {
            Some(file) => LibraryData::load_from_file(file)?,
            None => LibraryData::builtin().clone(),
        };
        if !self.library.subsets.is_empty() {
            library
                .set_active_subsets(self.library.subsets.iter())
                .context("Invalid library subsets in config")?;
        }
        Ok(library)
    }
}
