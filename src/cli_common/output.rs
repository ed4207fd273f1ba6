//! Вывод результатов проверки: текст для терминала или JSON

use anyhow::Result;
use colored::Colorize;
use console::style;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::diagnostics::{Diagnostic, DiagnosticSeverity};

/// Формат вывода результатов
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[value(alias = "txt")]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as clap::ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow::anyhow!("Unknown output format '{}', expected text or json", s))
    }
}

/// Приёмник вывода с выбранным форматом
pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
    pretty: bool,
}

impl OutputWriter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self { writer: Box::new(io::stdout()), format, pretty: false }
    }

    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: Box::new(file), format, pretty: false })
    }

    /// Writer в файл, если путь задан, иначе в stdout.
    pub fn create(path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        match path {
            Some(path) => Self::file(path, format),
            None => Ok(Self::stdout(format)),
        }
    }

    /// Включает pretty-печать для JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format(&self) -> OutputFormat { self.format }

    /// Записывает сериализуемый объект как JSON
    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let json = if self.pretty { serde_json::to_string_pretty(obj)? } else { serde_json::to_string(obj)? };
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    /// Записывает текст как есть (без перевода строки в конце)
    pub fn write_raw(&mut self, text: &str) -> Result<()> {
        write!(self.writer, "{}", text)?;
        Ok(())
    }

    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "\n{}", header.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(header.chars().count()).blue())?;
        Ok(())
    }

    /// Диагностика в человекочитаемом виде
    pub fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        let severity = match diagnostic.severity {
            DiagnosticSeverity::Error => style("error").red().bold(),
            DiagnosticSeverity::Warning => style("warning").yellow().bold(),
            DiagnosticSeverity::Info => style("info").blue(),
            DiagnosticSeverity::Hint => style("hint").cyan(),
        };
        writeln!(self.writer, "{}[{}]: {}", severity, diagnostic.code, diagnostic.message)?;
        writeln!(self.writer, "  --> {}", diagnostic.location)?;

        let details = &diagnostic.details;
        if let Some(found) = &details.found {
            writeln!(self.writer, "  found: {}", style(found).dim())?;
        }
        if let Some(expected) = &details.expected {
            writeln!(self.writer, "  expected: {}", style(expected).green())?;
        }
        if let Some(info) = &details.info {
            writeln!(self.writer, "  note: {}", info)?;
        }
        if let Some(suggestion) = &details.suggestion {
            writeln!(self.writer, "  help: {}", style(suggestion).cyan())?;
        }
        Ok(())
    }

    /// Записывает таблицу
    pub fn write_table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.format == OutputFormat::Json {
            let objects: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|row| {
                    let obj = headers
                        .iter()
                        .zip(row)
                        .map(|(header, cell)| (header.to_string(), serde_json::Value::String(cell)))
                        .collect();
                    serde_json::Value::Object(obj)
                })
                .collect();
            return self.write_object(&objects);
        }

        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        for (i, header) in headers.iter().enumerate() {
            if i > 0 {
                write!(self.writer, " │ ")?;
            }
            write!(self.writer, "{}", format!("{:width$}", header, width = widths[i]).bold())?;
        }
        writeln!(self.writer)?;

        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(self.writer, "─┼─")?;
            }
            write!(self.writer, "{}", "─".repeat(*width))?;
        }
        writeln!(self.writer)?;

        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(self.writer, " │ ")?;
                }
                match widths.get(i) {
                    Some(width) => write!(self.writer, "{:width$}", cell, width = *width)?,
                    None => write!(self.writer, "{}", cell)?,
                }
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Завершает запись и сбрасывает буфер
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Итоги проверки набора файлов
#[derive(Debug, Default, Clone, Serialize)]
pub struct Statistics {
    pub files_checked: usize,
    pub files_with_errors: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub duration: Option<String>,
}

impl Statistics {
    pub fn write(&self, writer: &mut OutputWriter) -> Result<()> {
        match writer.format {
            OutputFormat::Json => writer.write_object(self),
            OutputFormat::Text => {
                writer.write_header("Statistics")?;
                writer.write_line(&format!("Files checked: {}", self.files_checked))?;
                writer.write_line(&format!("Files with errors: {}", self.files_with_errors))?;
                let errors = if self.total_errors > 0 {
                    self.total_errors.to_string().red()
                } else {
                    self.total_errors.to_string().green()
                };
                writer.write_line(&format!("Errors: {}", errors))?;
                writer.write_line(&format!("Warnings: {}", self.total_warnings.to_string().yellow()))?;
                if let Some(duration) = &self.duration {
                    writer.write_line(&format!("Duration: {}", duration))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::codes;
    use crate::core::SourceCodeRange;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_file_writer_json_table() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        {
            let mut writer = OutputWriter::file(&path, OutputFormat::Json).unwrap();
            writer.write_table(&["name", "type"], vec![vec!["PI".into(), "float".into()]]).unwrap();
            writer.flush().unwrap();
        }
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), r#"[{"name":"PI","type":"float"}]"#);
    }

    #[test]
    fn test_diagnostic_text() {
        console::set_colors_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let range = SourceCodeRange::new(3, 5, 40, 3, 9, 44);
        let diagnostic = Diagnostic::error(range, codes::UNDEFINED_VARIABLE, "undefined variable \"x\"")
            .in_file("a.lsl")
            .with_suggestion("declare it first");
        {
            let mut writer = OutputWriter::file(&path, OutputFormat::Text).unwrap();
            writer.write_diagnostic(&diagnostic).unwrap();
        }
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(&format!("error[{}]: undefined variable \"x\"", codes::UNDEFINED_VARIABLE)));
        assert!(written.contains("--> a.lsl:3:5"));
        assert!(written.contains("help: declare it first"));
    }
}
