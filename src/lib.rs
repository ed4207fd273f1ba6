/*!
# LSL Analyzer

Front-end for LSL (Linden Scripting Language) scripts: lexing, parsing into an
arena syntax tree, semantic checks against a library of built-in signatures,
dead code and return path analysis, formatting.

## Architecture

```text
LSL Analyzer
├── Core          - Source ranges, contract errors, file reading
├── Collections   - Stable priority queue
├── Signatures    - Function/event/constant signatures, library feed
├── AST Core      - Arena tree, jump/label index, visitor, subtree clone
├── Parser        - logos lexer, recursive descent, semantic checks
├── Analysis      - Scope ids, dead code, return paths, unused variables
├── Format        - Source formatter and structural dump
├── Diagnostics   - Errors and warnings with codes
└── Config        - TOML/YAML analyzer configuration
```

## Usage

```rust
use lsl_analyzer::{LslParser, SourceFormatter};

let result = LslParser::new().parse_text(r#"
    integer twice(integer x) { return x * 2; }
    default { state_entry() { llOwnerSay((string)twice(21)); } }
"#)?;
assert!(!result.has_errors());

let text = SourceFormatter::new().format_tree(&result.tree).unwrap_or_default();
assert!(text.starts_with("integer twice(integer x) {"));
# Ok::<(), lsl_analyzer::core::ContractError>(())
```
*/

pub mod analysis;
pub mod ast_core;
pub mod cli_common;
pub mod collections;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod format;
pub mod parser;
pub mod signatures;

pub use analysis::PassOptions;
pub use ast_core::{NodeId, NodeKind, NodeVisitor, SyntaxKind, SyntaxTree};
pub use collections::PriorityQueue;
pub use config::AnalyzerConfig;
pub use core::{ContractError, ContractResult, SourceCodeRange};
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use format::{SourceFormatter, TreeDumper};
pub use parser::{LslParser, ParseResult};
pub use signatures::{FunctionSignature, LibraryData, LibraryDataProvider, LslType};
