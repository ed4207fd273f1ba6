/*!
# Source position types (SourceCodeRange, LineIndex)

Centralized location types shared by the lexer, the syntax tree and diagnostics.
Lines are 1-based, columns are 0-based, indices are byte offsets into the source.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Непрерывный участок исходного текста.
///
/// Значение неизменяемо после создания. Конец не раньше начала: предусловие
/// вызывающей стороны, не проверяется.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCodeRange {
    start_line: usize,
    start_column: usize,
    start_index: usize,
    end_line: usize,
    end_column: usize,
    end_index: usize,
}

impl SourceCodeRange {
    pub fn new(
        start_line: usize,
        start_column: usize,
        start_index: usize,
        end_line: usize,
        end_column: usize,
        end_index: usize,
    ) -> Self {
        Self { start_line, start_column, start_index, end_line, end_column, end_index }
    }

    /// Диапазон нулевой длины в точке.
    pub fn point(line: usize, column: usize, index: usize) -> Self {
        Self::new(line, column, index, line, column, index)
    }

    /// Диапазон, охватывающий все переданные диапазоны (например, набор токенов конструкции).
    /// Возвращает `None` для пустого набора.
    pub fn spanning<I>(ranges: I) -> Option<Self>
    where
        I: IntoIterator<Item = SourceCodeRange>,
    {
        ranges.into_iter().reduce(|acc, r| acc.merge(&r))
    }

    /// Объединение двух диапазонов.
    pub fn merge(&self, other: &SourceCodeRange) -> Self {
        let (start_line, start_column, start_index) = if other.start_index < self.start_index {
            (other.start_line, other.start_column, other.start_index)
        } else {
            (self.start_line, self.start_column, self.start_index)
        };
        let (end_line, end_column, end_index) = if other.end_index > self.end_index {
            (other.end_line, other.end_column, other.end_index)
        } else {
            (self.end_line, self.end_column, self.end_index)
        };
        Self::new(start_line, start_column, start_index, end_line, end_column, end_index)
    }

    pub fn start_line(&self) -> usize { self.start_line }
    pub fn start_column(&self) -> usize { self.start_column }
    pub fn start_index(&self) -> usize { self.start_index }
    pub fn end_line(&self) -> usize { self.end_line }
    pub fn end_column(&self) -> usize { self.end_column }
    pub fn end_index(&self) -> usize { self.end_index }

    /// Длина в байтах.
    pub fn len(&self) -> usize { self.end_index.saturating_sub(self.start_index) }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn contains_index(&self, index: usize) -> bool {
        index >= self.start_index && index <= self.end_index
    }
}

impl fmt::Display for SourceCodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Таблица начал строк для перевода байтового смещения в (строка, колонка).
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Arc<Vec<usize>>, // Arc для дешёвого клонирования
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts: Arc::new(starts) }
    }

    pub fn line_count(&self) -> usize { self.line_starts.len() }

    /// (line, column): строка с 1, колонка с 0.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        // первая строка всегда начинается с 0, поэтому индекс не меньше 1
        let line = self.line_starts.partition_point(|&start| start <= offset);
        (line, offset - self.line_starts[line - 1])
    }

    /// Диапазон для байтового интервала `[start, end)`.
    pub fn range(&self, start: usize, end: usize) -> SourceCodeRange {
        let (sl, sc) = self.line_col(start);
        let (el, ec) = self.line_col(end);
        SourceCodeRange::new(sl, sc, start, el, ec, end)
    }
}
