/*!
# Source Formatter

Печать дерева обратно в текст LSL с единообразными отступами.

Правила:
- блок в фигурных скобках открывается на строке заголовка;
- тело без скобок (`if (x) y;`) переносится на следующую строку с отступом;
- `else` продолжает строку после `}` или начинается с новой строки;
- функции и состояния разделяются пустой строкой.

Скобки в выражениях берутся только из `ParenthesizedExpression`, поэтому
повторный разбор результата даёт то же дерево.

## Использование

```rust
use lsl_analyzer::format::SourceFormatter;
use lsl_analyzer::parser::LslParser;

let result = LslParser::new().parse_text("default{state_entry(){llSay(0,\"hi\");}}")?;
let text = SourceFormatter::new().format_tree(&result.tree).unwrap_or_default();
assert!(text.contains("llSay(0, \"hi\");"));
# Ok::<(), lsl_analyzer::core::ContractError>(())
```
*/

pub mod dump;

pub use dump::TreeDumper;

use crate::ast_core::nodes::*;
use crate::ast_core::{accept, NodeId, NodeKind, NodeVisitor, Stmt, SyntaxKind, SyntaxTree};

/// Форматер исходного текста
#[derive(Debug, Clone)]
pub struct SourceFormatter {
    indent_unit: String,
    depth: usize,
}

impl Default for SourceFormatter {
    fn default() -> Self { Self::new() }
}

impl SourceFormatter {
    pub fn new() -> Self {
        Self { indent_unit: "    ".to_string(), depth: 0 }
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_unit = " ".repeat(width);
        self
    }

    /// Текст всего дерева; `None`, если корень не задан.
    pub fn format_tree(&mut self, tree: &SyntaxTree) -> Option<String> {
        tree.root().map(|root| self.format(tree, root))
    }

    /// Текст поддерева с корнем `id`.
    pub fn format(&mut self, tree: &SyntaxTree, id: NodeId) -> String {
        self.depth = 0;
        accept(tree, id, self)
    }

    fn indent(&self) -> String { self.indent_unit.repeat(self.depth) }

    fn nested(&mut self, tree: &SyntaxTree, id: NodeId) -> String {
        self.depth += 1;
        let text = accept(tree, id, self);
        self.depth -= 1;
        text
    }

    /// Тело после заголовка: ` {\n...}\n` либо перенос одиночного оператора.
    fn body(&mut self, tree: &SyntaxTree, scope: NodeId) -> String {
        match tree.kind(scope) {
            NodeKind::Stmt(Stmt::CodeScope(c)) if c.single_statement => {
                let mut out = String::from("\n");
                for statement in &c.statements {
                    out.push_str(&self.nested(tree, *statement));
                }
                out
            }
            NodeKind::Stmt(Stmt::CodeScope(c)) => {
                let mut out = String::from(" {\n");
                for statement in &c.statements {
                    out.push_str(&self.nested(tree, *statement));
                }
                out.push_str(&self.indent());
                out.push_str("}\n");
                out
            }
            _ => {
                let mut out = String::from("\n");
                out.push_str(&self.nested(tree, scope));
                out
            }
        }
    }

    /// Продолжение строки после тела (`else`, `while` у `do`).
    fn continue_after(&self, out: &mut String) {
        if out.ends_with("}\n") {
            out.pop();
            out.push(' ');
        } else {
            out.push_str(&self.indent());
        }
    }

    fn list(&mut self, tree: &SyntaxTree, items: &[NodeId]) -> String {
        items.iter().map(|item| accept(tree, *item, self)).collect::<Vec<_>>().join(", ")
    }

    fn optional(&mut self, tree: &SyntaxTree, id: Option<NodeId>) -> String {
        id.map(|id| accept(tree, id, self)).unwrap_or_default()
    }

    fn declaration(&mut self, tree: &SyntaxTree, ty: impl std::fmt::Display, name: &str, initializer: Option<NodeId>) -> String {
        let mut out = format!("{}{} {}", self.indent(), ty, name);
        if let Some(init) = initializer {
            out.push_str(" = ");
            out.push_str(&accept(tree, init, self));
        }
        out.push_str(";\n");
        out
    }
}

impl NodeVisitor for SourceFormatter {
    type Output = String;

    fn visit_float_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &FloatLiteral) -> String { node.text.clone() }

    fn visit_integer_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &IntegerLiteral) -> String { node.text.clone() }

    fn visit_string_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &StringLiteral) -> String { node.text.clone() }

    fn visit_vector_literal(&mut self, tree: &SyntaxTree, _: NodeId, node: &VectorLiteral) -> String {
        format!("<{}>", self.list(tree, &[node.x, node.y, node.z]))
    }

    fn visit_rotation_literal(&mut self, tree: &SyntaxTree, _: NodeId, node: &RotationLiteral) -> String {
        format!("<{}>", self.list(tree, &[node.x, node.y, node.z, node.s]))
    }

    fn visit_list_literal(&mut self, tree: &SyntaxTree, _: NodeId, node: &ListLiteral) -> String {
        format!("[{}]", accept(tree, node.items, self))
    }

    fn visit_variable(&mut self, _: &SyntaxTree, _: NodeId, node: &Variable) -> String { node.name.clone() }

    fn visit_library_constant(&mut self, _: &SyntaxTree, _: NodeId, node: &LibraryConstant) -> String {
        node.signature.name.clone()
    }

    fn visit_user_function_call(&mut self, tree: &SyntaxTree, _: NodeId, node: &UserFunctionCall) -> String {
        format!("{}({})", node.name, accept(tree, node.arguments, self))
    }

    fn visit_library_function_call(&mut self, tree: &SyntaxTree, _: NodeId, node: &LibraryFunctionCall) -> String {
        format!("{}({})", node.signature.name, accept(tree, node.arguments, self))
    }

    fn visit_binary_expression(&mut self, tree: &SyntaxTree, _: NodeId, node: &BinaryExpression) -> String {
        let left = accept(tree, node.left, self);
        let right = accept(tree, node.right, self);
        format!("{} {} {}", left, node.op.symbol(), right)
    }

    fn visit_prefix_expression(&mut self, tree: &SyntaxTree, _: NodeId, node: &PrefixExpression) -> String {
        let operand = accept(tree, node.operand, self);
        let symbol = node.op.symbol();
        // `- -1` не должно склеиться в `--1`
        let glued = symbol.chars().last().is_some_and(|last| operand.starts_with(last));
        if glued {
            format!("{} {}", symbol, operand)
        } else {
            format!("{}{}", symbol, operand)
        }
    }

    fn visit_postfix_expression(&mut self, tree: &SyntaxTree, _: NodeId, node: &PostfixExpression) -> String {
        format!("{}{}", accept(tree, node.operand, self), node.op.symbol())
    }

    fn visit_typecast_expression(&mut self, tree: &SyntaxTree, _: NodeId, node: &TypecastExpression) -> String {
        format!("({}){}", node.cast_to, accept(tree, node.operand, self))
    }

    fn visit_parenthesized_expression(&mut self, tree: &SyntaxTree, _: NodeId, node: &ParenthesizedExpression) -> String {
        format!("({})", accept(tree, node.inner, self))
    }

    fn visit_tuple_accessor(&mut self, tree: &SyntaxTree, _: NodeId, node: &TupleAccessor) -> String {
        format!("{}.{}", accept(tree, node.target, self), node.component.name())
    }

    fn visit_expression_list(&mut self, tree: &SyntaxTree, _: NodeId, node: &ExpressionList) -> String {
        self.list(tree, &node.items)
    }

    fn visit_code_scope(&mut self, tree: &SyntaxTree, _: NodeId, node: &CodeScope) -> String {
        let mut out = format!("{}{{\n", self.indent());
        for statement in &node.statements {
            out.push_str(&self.nested(tree, *statement));
        }
        out.push_str(&self.indent());
        out.push_str("}\n");
        out
    }

    fn visit_expression_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &ExpressionStatement) -> String {
        format!("{}{};\n", self.indent(), accept(tree, node.expr, self))
    }

    fn visit_return_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &ReturnStatement) -> String {
        match node.value {
            Some(value) => format!("{}return {};\n", self.indent(), accept(tree, value, self)),
            None => format!("{}return;\n", self.indent()),
        }
    }

    fn visit_jump_statement(&mut self, _: &SyntaxTree, _: NodeId, node: &JumpStatement) -> String {
        format!("{}jump {};\n", self.indent(), node.label_name)
    }

    fn visit_label_statement(&mut self, _: &SyntaxTree, _: NodeId, node: &LabelStatement) -> String {
        format!("{}@{};\n", self.indent(), node.name)
    }

    fn visit_local_variable_declaration(&mut self, tree: &SyntaxTree, _: NodeId, node: &LocalVariableDeclaration) -> String {
        self.declaration(tree, node.ty, &node.name, node.initializer)
    }

    fn visit_state_change_statement(&mut self, _: &SyntaxTree, _: NodeId, node: &StateChangeStatement) -> String {
        format!("{}state {};\n", self.indent(), node.state)
    }

    fn visit_semicolon_statement(&mut self, _: &SyntaxTree, _: NodeId) -> String { format!("{};\n", self.indent()) }

    fn visit_control_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &ControlStatement) -> String {
        let mut out = self.indent();
        for (index, branch) in node.branches().into_iter().enumerate() {
            if index > 0 {
                self.continue_after(&mut out);
            }
            out.push_str(&accept(tree, branch, self));
        }
        out
    }

    fn visit_if_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &IfStatement) -> String {
        let condition = accept(tree, node.condition, self);
        format!("if ({}){}", condition, self.body(tree, node.body))
    }

    fn visit_else_if_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &ElseIfStatement) -> String {
        let condition = accept(tree, node.condition, self);
        format!("else if ({}){}", condition, self.body(tree, node.body))
    }

    fn visit_else_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &ElseStatement) -> String {
        format!("else{}", self.body(tree, node.body))
    }

    fn visit_while_loop(&mut self, tree: &SyntaxTree, _: NodeId, node: &WhileLoop) -> String {
        let condition = accept(tree, node.condition, self);
        format!("{}while ({}){}", self.indent(), condition, self.body(tree, node.body))
    }

    fn visit_do_loop(&mut self, tree: &SyntaxTree, _: NodeId, node: &DoLoop) -> String {
        let mut out = format!("{}do{}", self.indent(), self.body(tree, node.body));
        self.continue_after(&mut out);
        out.push_str(&format!("while ({});\n", accept(tree, node.condition, self)));
        out
    }

    fn visit_for_loop(&mut self, tree: &SyntaxTree, _: NodeId, node: &ForLoop) -> String {
        let init = self.optional(tree, node.init);
        let condition = self.optional(tree, node.condition);
        let after = self.optional(tree, node.after);
        let header = if init.is_empty() && condition.is_empty() && after.is_empty() {
            "for (;;)".to_string()
        } else {
            format!("for ({}; {}; {})", init, condition, after)
        };
        format!("{}{}{}", self.indent(), header, self.body(tree, node.body))
    }

    fn visit_global_variable_declaration(&mut self, tree: &SyntaxTree, _: NodeId, node: &GlobalVariableDeclaration) -> String {
        self.declaration(tree, node.ty, &node.name, node.initializer)
    }

    fn visit_parameter(&mut self, _: &SyntaxTree, _: NodeId, node: &ParameterDecl) -> String {
        format!("{} {}", node.ty, node.name)
    }

    fn visit_parameter_list(&mut self, tree: &SyntaxTree, _: NodeId, node: &ParameterList) -> String {
        self.list(tree, &node.params)
    }

    fn visit_function_declaration(&mut self, tree: &SyntaxTree, _: NodeId, node: &FunctionDeclaration) -> String {
        let mut out = self.indent();
        if !node.return_type.is_void() {
            out.push_str(&format!("{} ", node.return_type));
        }
        let parameters = accept(tree, node.parameters, self);
        out.push_str(&format!("{}({})", node.name, parameters));
        out.push_str(&self.body(tree, node.body));
        out
    }

    fn visit_event_handler(&mut self, tree: &SyntaxTree, _: NodeId, node: &EventHandler) -> String {
        let parameters = accept(tree, node.parameters, self);
        format!("{}{}({}){}", self.indent(), node.name, parameters, self.body(tree, node.body))
    }

    fn visit_state(&mut self, tree: &SyntaxTree, _: NodeId, node: &State) -> String {
        let mut out = match &node.name {
            Some(name) => format!("{}state {} {{\n", self.indent(), name),
            None => format!("{}default {{\n", self.indent()),
        };
        let events: Vec<String> = node.events.iter().map(|e| self.nested(tree, *e)).collect();
        out.push_str(&events.join("\n"));
        out.push_str(&self.indent());
        out.push_str("}\n");
        out
    }

    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, _: NodeId, node: &CompilationUnit) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let mut globals = String::new();
        for item in &node.items {
            let text = accept(tree, *item, self);
            if tree.syntax_kind(*item) == SyntaxKind::GlobalVariableDeclaration {
                globals.push_str(&text);
                continue;
            }
            if !globals.is_empty() {
                blocks.push(std::mem::take(&mut globals));
            }
            blocks.push(text);
        }
        if !globals.is_empty() {
            blocks.push(globals);
        }
        for state in node.default_state.iter().chain(&node.states) {
            blocks.push(accept(tree, *state, self));
        }
        blocks.join("\n")
    }

    fn visit_error(&mut self, _: &SyntaxTree, _: NodeId, kind: SyntaxKind) -> String {
        if kind.is_expression() {
            format!("/* {} */", kind)
        } else {
            format!("{}/* {} */\n", self.indent(), kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LslParser;
    use pretty_assertions::assert_eq;

    fn format(code: &str) -> String {
        let result = LslParser::new().parse_text(code).unwrap();
        SourceFormatter::new().format_tree(&result.tree).unwrap()
    }

    #[test]
    fn test_layout_of_script() {
        let code = "integer count=1;string name;\n\
                    integer add(integer a,integer b){return a+b;}\n\
                    default{state_entry(){count=add(count,2);if(count>2)llOwnerSay(name);else{state other;}}\n\
                    touch_start(integer n){}}\n\
                    state other{state_entry(){state default;}}";
        let expected = "\
integer count = 1;
string name;

integer add(integer a, integer b) {
    return a + b;
}

default {
    state_entry() {
        count = add(count, 2);
        if (count > 2)
            llOwnerSay(name);
        else {
            state other;
        }
    }

    touch_start(integer n) {
    }
}

state other {
    state_entry() {
        state default;
    }
}
";
        assert_eq!(format(code), expected);
    }

    #[test]
    fn test_loops_and_jumps() {
        let code = "default{state_entry(){integer i;for(i=0;i<3;i++){jump done;}do i--;while(i>0);\
                    while(i<2){i+=1;}for(;;);@done;}}";
        let expected = "\
default {
    state_entry() {
        integer i;
        for (i = 0; i < 3; i++) {
            jump done;
        }
        do
            i--;
        while (i > 0);
        while (i < 2) {
            i += 1;
        }
        for (;;)
            ;
        @done;
    }
}
";
        assert_eq!(format(code), expected);
    }

    #[test]
    fn test_literals_and_parentheses_are_kept() {
        let code = "default{state_entry(){vector v=<1,2.5,-3>;list l=[v,(string)v.x,ZERO_ROTATION];\
                    integer k=-(-1);k=(k+1)*2;}}";
        let text = format(code);
        assert!(text.contains("vector v = <1, 2.5, -3>;"));
        assert!(text.contains("list l = [v, (string)v.x, ZERO_ROTATION];"));
        assert!(text.contains("integer k = -(-1);"));
        assert!(text.contains("k = (k + 1) * 2;"));
    }

    #[test]
    fn test_format_is_stable() {
        let code = "integer f(integer x){if(x){return 1;}else if(x>2)return 2;else return 3;}\n\
                    default{state_entry(){llSay(0,(string)f(4));}}";
        let once = format(code);
        assert_eq!(format(&once), once);
    }

    #[test]
    fn test_error_nodes_are_marked() {
        let text = format("default{state_entry(){x=1;}}");
        assert!(text.contains("/* "));
    }
}
