/*!
# LSL Parser

Front-end for LSL (Linden Scripting Language): logos lexer, recursive-descent
syntax analyzer building the arena tree, and the analysis passes run over the
finished tree.

## Usage

```rust
use lsl_analyzer::parser::LslParser;

let parser = LslParser::new();
let result = parser.parse_text(r#"
    default {
        state_entry() { llSay(0, "Hello"); }
    }
"#)?;
assert!(!result.has_errors());
# Ok::<(), lsl_analyzer::core::ContractError>(())
```
*/

pub mod lexer;
pub mod syntax_analyzer;
pub mod token_tools;
pub mod types;

pub use lexer::{LslLexer, Token, TokenType};
pub use syntax_analyzer::SyntaxAnalyzer;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::analysis::{self, PassOptions};
use crate::ast_core::SyntaxTree;
use crate::config::AnalyzerConfig;
use crate::core::errors::ContractResult;
use crate::core::read_lsl_file;
use crate::diagnostics::{sort_diagnostics, Diagnostic};
use crate::signatures::{LibraryData, LibraryDataProvider};

/// Результат разбора: дерево с корнем `CompilationUnit` и диагностики по смещению.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool { self.diagnostics.iter().any(Diagnostic::is_error) }

    pub fn error_count(&self) -> usize { self.diagnostics.iter().filter(|d| d.is_error()).count() }

    pub fn warning_count(&self) -> usize { self.diagnostics.len() - self.error_count() }
}

/// Main LSL parser
#[derive(Clone)]
pub struct LslParser {
    library: Arc<dyn LibraryDataProvider + Send + Sync>,
    options: PassOptions,
}

impl Default for LslParser {
    fn default() -> Self { Self::new() }
}

impl LslParser {
    /// Парсер со встроенной библиотекой и всеми проходами анализа.
    pub fn new() -> Self {
        Self::with_library(Arc::new(LibraryData::builtin().clone()))
    }

    pub fn with_library(library: Arc<dyn LibraryDataProvider + Send + Sync>) -> Self {
        Self { library, options: PassOptions::default() }
    }

    /// Парсер по конфигурации: библиотека из файла или встроенная, переключатели проходов.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let library = config.library_data()?;
        let options = PassOptions {
            dead_code: config.diagnostics.dead_code,
            unused_variables: config.diagnostics.unused_variables,
        };
        Ok(Self::with_library(Arc::new(library)).with_options(options))
    }

    pub fn with_options(mut self, options: PassOptions) -> Self {
        self.options = options;
        self
    }

    pub fn library(&self) -> &dyn LibraryDataProvider { self.library.as_ref() }

    pub fn options(&self) -> &PassOptions { &self.options }

    /// Parses LSL code from string
    pub fn parse_text(&self, input: &str) -> ContractResult<ParseResult> {
        let mut analyzer = SyntaxAnalyzer::new(self.library.as_ref());
        let ParseResult { mut tree, mut diagnostics } = analyzer.parse(input)?;
        analysis::run_passes(&mut tree, &mut diagnostics, &self.options);
        sort_diagnostics(&mut diagnostics);
        Ok(ParseResult { tree, diagnostics })
    }

    /// Parses LSL file with proper encoding detection and BOM handling
    pub fn parse_file<P: AsRef<Path>>(&self, file_path: P) -> Result<ParseResult> {
        let path = file_path.as_ref();
        let content = read_lsl_file(path)?;
        let mut result = self
            .parse_text(&content)
            .with_context(|| format!("Internal tree contract violated in {}", path.display()))?;
        let file = path.display().to_string();
        for diagnostic in &mut result.diagnostics {
            diagnostic.location.file = file.clone();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::codes;
    use std::io::Write;

    #[test]
    fn test_parse_text_runs_passes() {
        let parser = LslParser::new();
        let result = parser
            .parse_text("integer f() { if (1) return 1; }\ndefault { state_entry() { integer unused; } }")
            .unwrap();
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::MISSING_RETURN, codes::UNUSED_VARIABLE]);
        assert!(result.has_errors());
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_options_disable_passes() {
        let parser = LslParser::new().with_options(PassOptions { dead_code: true, unused_variables: false });
        let result = parser.parse_text("default { state_entry() { integer unused; } }").unwrap();
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_file_sets_location() {
        let mut file = tempfile::Builder::new().suffix(".lsl").tempfile().unwrap();
        write!(file, "default {{ state_entry() {{ x = 1; }} }}").unwrap();
        let result = LslParser::new().parse_file(file.path()).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, codes::UNDEFINED_VARIABLE);
        assert_eq!(result.diagnostics[0].location.file, file.path().display().to_string());
    }
}
