//! Модуль для отображения прогресса выполнения

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget};
use std::time::Instant;

use super::format_duration;

/// Стиль отображения прогресса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Прогресс-бар с известным числом шагов
    Bar,
    /// Спиннер
    Spinner,
    /// Ничего не рисовать
    Hidden,
}

/// Репортер прогресса поверх indicatif. Безопасен для вызова из потоков rayon.
pub struct ProgressReporter {
    bar: ProgressBar,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(total: usize, message: impl Into<String>, style: ProgressStyle) -> Result<Self> {
        let bar = match style {
            ProgressStyle::Bar => {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(
                    indicatif::ProgressStyle::default_bar()
                        .template("{msg} [{bar:40.green/white}] {pos}/{len} ({elapsed})")
                        .context("Failed to set progress style")?
                        .progress_chars("█░ "),
                );
                bar
            }
            ProgressStyle::Spinner => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    indicatif::ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg} {pos}")
                        .context("Failed to set progress style")?,
                );
                bar
            }
            ProgressStyle::Hidden => ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden()),
        };
        bar.set_message(message.into());
        Ok(Self { bar, start_time: Instant::now() })
    }

    /// Скрытый репортер, только считает шаги
    pub fn hidden(total: usize) -> Self {
        Self {
            bar: ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden()),
            start_time: Instant::now(),
        }
    }

    pub fn inc(&self) { self.bar.inc(1); }

    pub fn set_message(&self, message: impl Into<String>) { self.bar.set_message(message.into()); }

    pub fn position(&self) -> usize { self.bar.position() as usize }

    /// Выводит строку над прогресс-баром, не ломая его
    pub fn println(&self, line: impl AsRef<str>) { self.bar.println(line); }

    /// Убирает бар и возвращает затраченное время в читаемом виде
    pub fn finish(&self) -> String {
        self.bar.finish_and_clear();
        format_duration(self.start_time.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_reporter_counts() {
        let reporter = ProgressReporter::hidden(3);
        reporter.inc();
        reporter.inc();
        assert_eq!(reporter.position(), 2);
        assert!(!reporter.finish().is_empty());
    }

    #[test]
    fn test_styles_build() {
        for style in [ProgressStyle::Bar, ProgressStyle::Spinner, ProgressStyle::Hidden] {
            let reporter = ProgressReporter::new(2, "checking", style).unwrap();
            reporter.inc();
            reporter.finish();
        }
    }
}
