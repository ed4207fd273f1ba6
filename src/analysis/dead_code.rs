/*!
# Dead Code & Return Paths

Операторы блока просматриваются по порядку. После оператора с гарантированным
возвратом или после `jump` начинается недостижимая область; она заканчивается
меткой, на которую ссылается достижимый переход.

Путь возврата:
- `return` сам является путём возврата;
- блок получает первый путь возврата среди своих достижимых операторов;
- `if` с `else`, у которого каждая ветвь имеет путь возврата;
- циклы пути возврата не имеют.

Недостижимые операторы не анализируются глубже.
*/

use super::bodies;
use crate::ast_core::{DeadCodeType, Decl, NodeId, NodeKind, ScopeType, Stmt, SyntaxKind, SyntaxTree};
use crate::diagnostics::{codes, Diagnostic};

pub fn analyze(tree: &mut SyntaxTree, root: NodeId, diagnostics: &mut Vec<Diagnostic>, report_dead_code: bool) {
    for body in bodies(tree, root) {
        let mut pass = DeadCodePass { tree: &mut *tree, diagnostics: &mut *diagnostics, report_dead_code };
        let return_path = pass.scope(body.scope);
        pass.annotate(body.scope, return_path);

        if body.returns_value && return_path.is_none() && !tree.node(body.scope).has_errors() {
            let node = tree.node(body.owner);
            if let Some(range) = node.detail_range().or(node.range()) {
                let name = match tree.kind(body.owner) {
                    NodeKind::Decl(Decl::FunctionDeclaration(f)) => f.name.as_str(),
                    _ => "",
                };
                diagnostics.push(Diagnostic::error(
                    range,
                    codes::MISSING_RETURN,
                    format!("not all code paths of function \"{}\" return a value", name),
                ));
            }
        }
    }
}

struct DeadCodePass<'t> {
    tree: &'t mut SyntaxTree,
    diagnostics: &'t mut Vec<Diagnostic>,
    report_dead_code: bool,
}

impl DeadCodePass<'_> {
    fn annotate(&mut self, id: NodeId, return_path: Option<NodeId>) {
        let info = self.tree.info_mut(id);
        info.has_return_path = return_path.is_some();
        info.return_path = return_path;
    }

    /// Разметить блок; возвращает оператор, обеспечивающий возврат.
    fn scope(&mut self, scope: NodeId) -> Option<NodeId> {
        let statements = match self.tree.kind(scope) {
            NodeKind::Stmt(Stmt::CodeScope(c)) => c.statements.clone(),
            _ => return None,
        };
        let mut return_path = None;
        let mut dead: Option<DeadCodeType> = None;

        for (index, &statement) in statements.iter().enumerate() {
            if dead.is_some() && self.is_live_label(statement) {
                dead = None;
            }
            if let Some(kind) = dead {
                let first_in_region = {
                    let info = self.tree.info(statements[index - 1]);
                    !info.is_dead_code
                };
                let info = self.tree.info_mut(statement);
                info.is_dead_code = true;
                info.dead_code_type = Some(kind);
                if first_in_region {
                    self.report(statement, kind);
                }
                continue;
            }

            let path = self.statement(statement);
            self.annotate(statement, path);
            if path.is_some() {
                return_path.get_or_insert(statement);
                dead = Some(DeadCodeType::AfterReturnPath);
            } else if let Some(kind) = self.jump_kind(scope, index, statement, &statements) {
                self.tree.info_mut(statement).constant_jump = self.is_unconditional(scope);
                dead = Some(kind);
            }
        }
        return_path
    }

    fn statement(&mut self, id: NodeId) -> Option<NodeId> {
        let kind = self.tree.kind(id).clone();
        match kind {
            NodeKind::Stmt(Stmt::ReturnStatement(_)) | NodeKind::Error(SyntaxKind::ReturnStatement) => Some(id),
            NodeKind::Stmt(Stmt::CodeScope(_)) => self.scope(id),
            NodeKind::Stmt(Stmt::ControlStatement(c)) => {
                let mut all_return = true;
                for branch in c.branches() {
                    let body = match self.tree.kind(branch) {
                        NodeKind::Stmt(Stmt::IfStatement(b)) => b.body,
                        NodeKind::Stmt(Stmt::ElseIfStatement(b)) => b.body,
                        NodeKind::Stmt(Stmt::ElseStatement(b)) => b.body,
                        _ => continue,
                    };
                    let path = self.scope(body);
                    self.annotate(body, path);
                    self.annotate(branch, path);
                    all_return &= path.is_some();
                }
                (c.has_else() && all_return).then_some(id)
            }
            NodeKind::Stmt(Stmt::WhileLoop(l)) => self.loop_body(l.body),
            NodeKind::Stmt(Stmt::DoLoop(l)) => self.loop_body(l.body),
            NodeKind::Stmt(Stmt::ForLoop(l)) => self.loop_body(l.body),
            _ => None,
        }
    }

    fn loop_body(&mut self, body: NodeId) -> Option<NodeId> {
        let path = self.scope(body);
        self.annotate(body, path);
        None
    }

    /// Тип недостижимого кода после перехода, если оператор является `jump`.
    fn jump_kind(&self, scope: NodeId, index: usize, statement: NodeId, statements: &[NodeId]) -> Option<DeadCodeType> {
        let NodeKind::Stmt(Stmt::JumpStatement(jump)) = self.tree.kind(statement) else {
            return None;
        };
        if self.tree.parent(jump.label) != Some(scope) {
            return Some(DeadCodeType::AfterJumpOutOfScope);
        }
        let label_index = statements.iter().position(|s| *s == jump.label)?;
        if label_index > index {
            Some(DeadCodeType::JumpOverCode)
        } else {
            Some(DeadCodeType::AfterJumpLoopForever)
        }
    }

    /// Блок выполняется всегда, когда выполняется тело (нет ветвлений и циклов выше).
    fn is_unconditional(&self, scope: NodeId) -> bool {
        std::iter::once(scope)
            .chain(self.tree.ancestors(scope))
            .take_while(|id| !matches!(self.tree.syntax_kind(*id), SyntaxKind::FunctionDeclaration | SyntaxKind::EventHandler))
            .filter_map(|id| match self.tree.kind(id) {
                NodeKind::Stmt(Stmt::CodeScope(c)) => Some(c.scope_type),
                _ => None,
            })
            .all(|t| matches!(t, ScopeType::AnonymousBlock | ScopeType::FunctionBody | ScopeType::EventHandlerBody))
    }

    fn is_live_label(&self, id: NodeId) -> bool {
        if self.tree.syntax_kind(id) != SyntaxKind::LabelStatement {
            return false;
        }
        // переход внутри недостижимого оператора сам не размечен, смотрим на предков
        self.tree.jumps_to(id).iter().any(|j| {
            !std::iter::once(*j).chain(self.tree.ancestors(*j)).any(|n| self.tree.info(n).is_dead_code)
        })
    }

    fn report(&mut self, statement: NodeId, kind: DeadCodeType) {
        if !self.report_dead_code {
            return;
        }
        let Some(range) = self.tree.node(statement).range() else { return };
        tracing::trace!("Dead code at {}: {}", range, kind);
        self.diagnostics
            .push(Diagnostic::warning(range, codes::DEAD_CODE, format!("unreachable code ({})", kind)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LslParser, ParseResult};

    fn parse(code: &str) -> ParseResult {
        LslParser::new().parse_text(code).unwrap()
    }

    fn statements_of_first_body(result: &ParseResult) -> (NodeId, Vec<NodeId>) {
        let tree = &result.tree;
        let body = bodies(tree, tree.root().unwrap())[0].scope;
        (body, tree.scope_statements(body).unwrap().to_vec())
    }

    fn dead_types(result: &ParseResult, statements: &[NodeId]) -> Vec<Option<DeadCodeType>> {
        statements.iter().map(|s| result.tree.info(*s).dead_code_type).collect()
    }

    #[test]
    fn code_after_return_is_dead() {
        let result = parse("integer f() { return 1; llOwnerSay(\"a\"); llOwnerSay(\"b\"); }\ndefault { state_entry() { } }");
        let (body, statements) = statements_of_first_body(&result);
        assert_eq!(
            dead_types(&result, &statements),
            vec![None, Some(DeadCodeType::AfterReturnPath), Some(DeadCodeType::AfterReturnPath)]
        );
        assert_eq!(result.tree.info(body).return_path, Some(statements[0]));
        let warnings: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(warnings, vec![codes::DEAD_CODE]);
    }

    #[test]
    fn if_else_returning_on_all_branches() {
        let code = "integer f(integer x) { if (x) { return 1; } else if (x > 1) return 2; else { return 3; } }\n\
                    integer g(integer x) { if (x) { return 1; } }\n\
                    default { state_entry() { } }";
        let result = parse(code);
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::MISSING_RETURN]);
        assert!(result.diagnostics[0].message.contains("\"g\""));

        let (body, statements) = statements_of_first_body(&result);
        assert!(result.tree.info(statements[0]).has_return_path);
        assert_eq!(result.tree.info(body).return_path, Some(statements[0]));
    }

    #[test]
    fn loops_never_return() {
        let result = parse("integer f() { while (1) { return 1; } }\ndefault { state_entry() { } }");
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::MISSING_RETURN]);
    }

    #[test]
    fn jump_over_code_ends_at_label() {
        let code = "default { state_entry() { jump skip; llOwnerSay(\"x\"); @skip; llOwnerSay(\"y\"); } }";
        let result = parse(code);
        let (_, statements) = statements_of_first_body(&result);
        assert_eq!(dead_types(&result, &statements), vec![None, Some(DeadCodeType::JumpOverCode), None, None]);
        assert!(result.tree.info(statements[0]).constant_jump);
    }

    #[test]
    fn backward_jump_loops_forever() {
        let code = "default { state_entry() { @top; llOwnerSay(\"x\"); jump top; llOwnerSay(\"never\"); } }";
        let result = parse(code);
        let (_, statements) = statements_of_first_body(&result);
        assert_eq!(
            dead_types(&result, &statements),
            vec![None, None, None, Some(DeadCodeType::AfterJumpLoopForever)]
        );
    }

    #[test]
    fn jump_out_of_nested_scope() {
        let code = "default { state_entry() { if (1) { jump out; llOwnerSay(\"x\"); } @out; } }";
        let result = parse(code);
        let jump = result
            .tree
            .iter()
            .find(|(_, n)| n.syntax_kind() == SyntaxKind::JumpStatement)
            .map(|(id, _)| id)
            .unwrap();
        let scope = result.tree.parent(jump).unwrap();
        let inner = result.tree.scope_statements(scope).unwrap().to_vec();
        assert_eq!(dead_types(&result, &inner), vec![None, Some(DeadCodeType::AfterJumpOutOfScope)]);
        assert!(!result.tree.info(jump).constant_jump);
    }

    #[test]
    fn label_reached_only_from_dead_code_stays_dead() {
        let code = "default { state_entry() { return; if (1) { jump l; } @l; llOwnerSay(\"x\"); } }";
        let result = parse(code);
        let (_, statements) = statements_of_first_body(&result);
        assert_eq!(
            dead_types(&result, &statements),
            vec![
                None,
                Some(DeadCodeType::AfterReturnPath),
                Some(DeadCodeType::AfterReturnPath),
                Some(DeadCodeType::AfterReturnPath),
            ]
        );
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::DEAD_CODE]);
    }

    #[test]
    fn mistyped_return_still_counts_as_return_path() {
        let result = parse("integer f() { return \"s\"; }\ndefault { state_entry() { } }");
        let found: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found, vec![codes::RETURN_TYPE_MISMATCH]);
        let (body, statements) = statements_of_first_body(&result);
        assert!(result.tree.kind(statements[0]).is_error());
        assert_eq!(result.tree.info(body).return_path, Some(statements[0]));
    }

    #[test]
    fn dead_code_warnings_can_be_disabled() {
        use crate::analysis::PassOptions;
        let parser = LslParser::new().with_options(PassOptions { dead_code: false, unused_variables: true });
        let result = parser.parse_text("default { state_entry() { return; llOwnerSay(\"x\"); } }").unwrap();
        assert!(result.diagnostics.is_empty());
        let (_, statements) = statements_of_first_body(&result);
        assert!(result.tree.info(statements[1]).is_dead_code);
    }
}
