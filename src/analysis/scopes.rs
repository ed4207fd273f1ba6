//! Идентификаторы блоков и позиции операторов.
//!
//! В каждом теле блоки нумеруются в порядке исходника начиная с 0 (само тело).
//! Оператор получает номер содержащего блока; вложенный блок как оператор
//! получает собственный номер.

use super::bodies;
use crate::ast_core::{NodeId, NodeKind, Stmt, SyntaxTree};

pub fn assign_scopes(tree: &mut SyntaxTree, root: NodeId) {
    for body in bodies(tree, root) {
        number_scopes(tree, body.scope);
    }
}

fn number_scopes(tree: &mut SyntaxTree, body: NodeId) {
    let scopes: Vec<(NodeId, Vec<NodeId>, bool)> = tree
        .preorder(body)
        .into_iter()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Stmt(Stmt::CodeScope(c)) => Some((id, c.statements.clone(), c.single_statement)),
            _ => None,
        })
        .collect();

    for (scope_id, (scope, statements, single)) in scopes.into_iter().enumerate() {
        tree.info_mut(scope).scope_id = scope_id;
        let last = statements.len().saturating_sub(1);
        for (index, statement) in statements.into_iter().enumerate() {
            let is_scope = matches!(tree.kind(statement), NodeKind::Stmt(Stmt::CodeScope(_)));
            let info = tree.info_mut(statement);
            info.statement_index = index;
            info.is_last_statement_in_scope = index == last;
            info.inside_single_statement_scope = single;
            if !is_scope {
                info.scope_id = scope_id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LslParser;
    use crate::ast_core::SyntaxKind;

    #[test]
    fn scopes_are_numbered_per_body() {
        let code = "f() { integer a; { integer b; } if (a) a = 1; }\n\
                    default { state_entry() { { } } }";
        let result = LslParser::new().parse_text(code).unwrap();
        let tree = &result.tree;
        let scopes: Vec<(usize, bool)> = tree
            .iter()
            .filter(|(_, n)| matches!(n.kind(), NodeKind::Stmt(Stmt::CodeScope(_))))
            .map(|(id, _)| (tree.info(id).scope_id, tree.info(id).inside_single_statement_scope))
            .collect();
        // тело f, анонимный блок, тело if; затем тело события и его блок
        let mut ids: Vec<usize> = scopes.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 0, 1, 1, 2]);

        let assignment = tree
            .iter()
            .find(|(_, n)| n.syntax_kind() == SyntaxKind::ExpressionStatement)
            .map(|(id, _)| id)
            .unwrap();
        let info = tree.info(assignment);
        assert_eq!(info.scope_id, 2);
        assert!(info.inside_single_statement_scope);
        assert!(info.is_last_statement_in_scope);
        assert_eq!(info.statement_index, 0);
    }
}
