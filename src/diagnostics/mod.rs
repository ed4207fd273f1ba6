//! Структуры для диагностических сообщений

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::position::SourceCodeRange;

/// Уровень серьезности диагностики
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Hint => "hint",
        };
        f.write_str(text)
    }
}

/// Местоположение в исходном коде
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl Location {
    pub fn new(file: String, line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self { file, line, column, offset, length }
    }

    pub fn from_range(file: impl Into<String>, range: SourceCodeRange) -> Self {
        Self::new(file.into(), range.start_line(), range.start_column(), range.start_index(), range.len())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Детали диагностики
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticDetails {
    /// Найденное значение
    pub found: Option<String>,
    /// Ожидаемое значение
    pub expected: Option<String>,
    /// Дополнительная информация
    pub info: Option<String>,
    /// Предлагаемое исправление
    pub suggestion: Option<String>,
}

/// Диагностическое сообщение
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub location: Location,
    pub code: String,
    pub message: String,
    pub details: DiagnosticDetails,
}

impl Diagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        location: Location,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location,
            code: code.into(),
            message: message.into(),
            details: DiagnosticDetails::default(),
        }
    }

    pub fn error(range: SourceCodeRange, code: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, Location::from_range("", range), code, message)
    }

    pub fn warning(range: SourceCodeRange, code: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, Location::from_range("", range), code, message)
    }

    /// Привязать диагностику к файлу.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.location.file = file.into();
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.details.found = Some(found.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.details.expected = Some(expected.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.details.info = Some(info.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.details.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool { self.severity == DiagnosticSeverity::Error }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]: {}", self.location, self.severity, self.code, self.message)?;
        if let (Some(expected), Some(found)) = (&self.details.expected, &self.details.found) {
            write!(f, " (expected {}, found {})", expected, found)?;
        }
        Ok(())
    }
}

/// Отсортировать диагностики по позиции, затем по серьезности.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.location.offset, a.severity, &a.code).cmp(&(b.location.offset, b.severity, &b.code))
    });
}

/// Коды диагностик
pub mod codes {
    /// Синтаксическая ошибка
    pub const SYNTAX_ERROR: &str = "LSL001";
    /// Необъявленная переменная
    pub const UNDEFINED_VARIABLE: &str = "LSL002";
    /// Вызов несуществующей функции
    pub const UNDEFINED_FUNCTION: &str = "LSL003";
    /// Переход к несуществующей метке
    pub const UNDEFINED_LABEL: &str = "LSL004";
    /// Повторное объявление
    pub const DUPLICATE_DECLARATION: &str = "LSL005";
    /// Неверное количество аргументов
    pub const WRONG_ARGUMENT_COUNT: &str = "LSL006";
    /// Несовместимый тип аргумента
    pub const ARGUMENT_TYPE_MISMATCH: &str = "LSL007";
    /// Несовместимые типы операндов / присваивания
    pub const TYPE_MISMATCH: &str = "LSL008";
    /// Присваивание не-переменной
    pub const NOT_ASSIGNABLE: &str = "LSL009";
    /// Тип возвращаемого значения не совпадает с объявлением
    pub const RETURN_TYPE_MISMATCH: &str = "LSL010";
    /// Неизвестное событие
    pub const UNKNOWN_EVENT: &str = "LSL011";
    /// Параметры события не совпадают с библиотечными
    pub const EVENT_PARAMETER_MISMATCH: &str = "LSL012";
    /// Переход в неизвестное состояние
    pub const UNKNOWN_STATE: &str = "LSL013";
    /// Не все пути возвращают значение
    pub const MISSING_RETURN: &str = "LSL014";
    /// Недостижимый код
    pub const DEAD_CODE: &str = "LSL015";
    /// Неиспользуемая переменная
    pub const UNUSED_VARIABLE: &str = "LSL016";
    /// Недопустимое приведение типа
    pub const INVALID_CAST: &str = "LSL017";
}
