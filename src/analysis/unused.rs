//! Неиспользуемые локальные переменные. Параметры и глобальные переменные не проверяются.

use std::collections::HashSet;

use crate::ast_core::{Expr, NodeId, NodeKind, Stmt, SyntaxTree};
use crate::diagnostics::{codes, Diagnostic};

pub fn check_unused_variables(tree: &SyntaxTree, root: NodeId, diagnostics: &mut Vec<Diagnostic>) {
    // Ссылки ищутся по всей арене: часть из них висит под заглушками ошибок
    let used: HashSet<NodeId> = tree
        .iter()
        .filter_map(|(_, node)| match node.kind() {
            NodeKind::Expr(Expr::Variable(v)) => v.declaration,
            _ => None,
        })
        .collect();

    for id in tree.preorder(root) {
        let NodeKind::Stmt(Stmt::LocalVariableDeclaration(decl)) = tree.kind(id) else {
            continue;
        };
        if used.contains(&id) {
            continue;
        }
        let node = tree.node(id);
        let Some(range) = node.detail_range().or(node.range()) else { continue };
        diagnostics.push(
            Diagnostic::warning(range, codes::UNUSED_VARIABLE, format!("local variable \"{}\" is declared but never used", decl.name))
                .with_suggestion("remove the declaration"),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::codes;
    use crate::parser::LslParser;

    #[test]
    fn reports_only_unused_locals() {
        let code = "integer g;\nf(integer p) { integer used = 1; integer idle = used; }\ndefault { state_entry() { } }";
        let result = LslParser::new().parse_text(code).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.code, codes::UNUSED_VARIABLE);
        assert!(diagnostic.message.contains("\"idle\""));
        assert_eq!(diagnostic.location.length, "idle".len());
    }

    #[test]
    fn reference_under_error_counts_as_use() {
        let code = "default { state_entry() { string s; integer n = s + 1; } }";
        let result = LslParser::new().parse_text(code).unwrap();
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::UNUSED_VARIABLE, codes::TYPE_MISMATCH]);
    }
}
