//! Структурный дамп дерева: одна строка на узел, отступ по глубине.
//!
//! Идентификаторы узлов в дамп не попадают, поэтому дампы копии и оригинала
//! совпадают. Аннотации операторов выводятся по запросу.

use crate::ast_core::nodes::*;
use crate::ast_core::{accept, NodeId, NodeVisitor, SyntaxKind, SyntaxTree};

#[derive(Debug, Clone, Default)]
pub struct TreeDumper {
    annotations: bool,
}

impl TreeDumper {
    pub fn new() -> Self { Self::default() }

    /// Добавлять к операторам `scope_id`, пути возврата и недостижимость.
    pub fn with_annotations(mut self, enabled: bool) -> Self {
        self.annotations = enabled;
        self
    }

    pub fn dump(&mut self, tree: &SyntaxTree, root: NodeId) -> String {
        let mut out = String::new();
        self.dump_node(tree, root, 0, &mut out);
        out
    }

    fn dump_node(&mut self, tree: &SyntaxTree, id: NodeId, depth: usize, out: &mut String) {
        let node = tree.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&accept(tree, id, self));
        if node.has_errors() && !node.kind().is_error() {
            out.push_str(" !");
        }
        if self.annotations && node.syntax_kind().is_code_statement() {
            out.push_str(&annotation(tree, id));
        }
        out.push('\n');
        for child in tree.children(id) {
            self.dump_node(tree, child, depth + 1, out);
        }
    }
}

fn annotation(tree: &SyntaxTree, id: NodeId) -> String {
    let info = tree.info(id);
    let mut parts = vec![format!("scope={}", info.scope_id), format!("index={}", info.statement_index)];
    if info.has_return_path {
        parts.push("returns".to_string());
    }
    if let Some(kind) = info.dead_code_type {
        parts.push(format!("dead: {}", kind));
    }
    if info.constant_jump {
        parts.push("constant".to_string());
    }
    format!(" [{}]", parts.join(", "))
}

impl NodeVisitor for TreeDumper {
    type Output = String;

    fn visit_float_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &FloatLiteral) -> String {
        format!("FloatLiteral {}", node.text)
    }

    fn visit_integer_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &IntegerLiteral) -> String {
        format!("IntegerLiteral {} = {}", node.text, node.value)
    }

    fn visit_string_literal(&mut self, _: &SyntaxTree, _: NodeId, node: &StringLiteral) -> String {
        format!("StringLiteral {}", node.text)
    }

    fn visit_vector_literal(&mut self, _: &SyntaxTree, _: NodeId, _: &VectorLiteral) -> String { "VectorLiteral".into() }

    fn visit_rotation_literal(&mut self, _: &SyntaxTree, _: NodeId, _: &RotationLiteral) -> String { "RotationLiteral".into() }

    fn visit_list_literal(&mut self, _: &SyntaxTree, _: NodeId, _: &ListLiteral) -> String { "ListLiteral".into() }

    fn visit_variable(&mut self, _: &SyntaxTree, _: NodeId, node: &Variable) -> String {
        let resolved = if node.declaration.is_some() { "" } else { ", unresolved" };
        format!("Variable {} : {} ({:?}{})", node.name, node.ty, node.scope, resolved)
    }

    fn visit_library_constant(&mut self, _: &SyntaxTree, _: NodeId, node: &LibraryConstant) -> String {
        format!("LibraryConstant {}", node.signature)
    }

    fn visit_user_function_call(&mut self, tree: &SyntaxTree, _: NodeId, node: &UserFunctionCall) -> String {
        format!("UserFunctionCall {}", tree.signature(node.signature).signature())
    }

    fn visit_library_function_call(&mut self, _: &SyntaxTree, _: NodeId, node: &LibraryFunctionCall) -> String {
        format!("LibraryFunctionCall {}", node.signature)
    }

    fn visit_binary_expression(&mut self, _: &SyntaxTree, _: NodeId, node: &BinaryExpression) -> String {
        format!("BinaryExpression {} : {}", node.op, node.ty)
    }

    fn visit_prefix_expression(&mut self, _: &SyntaxTree, _: NodeId, node: &PrefixExpression) -> String {
        format!("PrefixExpression {} : {}", node.op.symbol(), node.ty)
    }

    fn visit_postfix_expression(&mut self, _: &SyntaxTree, _: NodeId, node: &PostfixExpression) -> String {
        format!("PostfixExpression {} : {}", node.op.symbol(), node.ty)
    }

    fn visit_typecast_expression(&mut self, _: &SyntaxTree, _: NodeId, node: &TypecastExpression) -> String {
        format!("TypecastExpression ({})", node.cast_to)
    }

    fn visit_parenthesized_expression(&mut self, _: &SyntaxTree, _: NodeId, _: &ParenthesizedExpression) -> String {
        "ParenthesizedExpression".into()
    }

    fn visit_tuple_accessor(&mut self, _: &SyntaxTree, _: NodeId, node: &TupleAccessor) -> String {
        format!("TupleAccessor .{}", node.component.name())
    }

    fn visit_expression_list(&mut self, _: &SyntaxTree, _: NodeId, node: &ExpressionList) -> String {
        format!("ExpressionList ({})", node.items.len())
    }

    fn visit_code_scope(&mut self, _: &SyntaxTree, _: NodeId, node: &CodeScope) -> String {
        let single = if node.single_statement { ", single" } else { "" };
        format!("CodeScope {:?}{}", node.scope_type, single)
    }

    fn visit_expression_statement(&mut self, _: &SyntaxTree, _: NodeId, _: &ExpressionStatement) -> String {
        "ExpressionStatement".into()
    }

    fn visit_return_statement(&mut self, _: &SyntaxTree, _: NodeId, _: &ReturnStatement) -> String { "ReturnStatement".into() }

    fn visit_jump_statement(&mut self, tree: &SyntaxTree, _: NodeId, node: &JumpStatement) -> String {
        // ссылка на метку, а не дочерний узел
        let detached = if tree.parent(node.label).is_none() { " (detached)" } else { "" };
        format!("JumpStatement -> @{}{}", node.label_name, detached)
    }

    fn visit_label_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &LabelStatement) -> String {
        format!("LabelStatement @{} ({} jumps)", node.name, tree.jumps_to(id).len())
    }

    fn visit_local_variable_declaration(&mut self, _: &SyntaxTree, _: NodeId, node: &LocalVariableDeclaration) -> String {
        format!("LocalVariableDeclaration {} {}", node.ty, node.name)
    }

    fn visit_state_change_statement(&mut self, _: &SyntaxTree, _: NodeId, node: &StateChangeStatement) -> String {
        format!("StateChangeStatement {}", node.state)
    }

    fn visit_semicolon_statement(&mut self, _: &SyntaxTree, _: NodeId) -> String { "SemicolonStatement".into() }

    fn visit_control_statement(&mut self, _: &SyntaxTree, _: NodeId, node: &ControlStatement) -> String {
        format!("ControlStatement ({} branches)", node.branches().len())
    }

    fn visit_if_statement(&mut self, _: &SyntaxTree, _: NodeId, _: &IfStatement) -> String { "IfStatement".into() }

    fn visit_else_if_statement(&mut self, _: &SyntaxTree, _: NodeId, _: &ElseIfStatement) -> String { "ElseIfStatement".into() }

    fn visit_else_statement(&mut self, _: &SyntaxTree, _: NodeId, _: &ElseStatement) -> String { "ElseStatement".into() }

    fn visit_while_loop(&mut self, _: &SyntaxTree, _: NodeId, _: &WhileLoop) -> String { "WhileLoop".into() }

    fn visit_do_loop(&mut self, _: &SyntaxTree, _: NodeId, _: &DoLoop) -> String { "DoLoop".into() }

    fn visit_for_loop(&mut self, _: &SyntaxTree, _: NodeId, _: &ForLoop) -> String { "ForLoop".into() }

    fn visit_global_variable_declaration(&mut self, _: &SyntaxTree, _: NodeId, node: &GlobalVariableDeclaration) -> String {
        format!("GlobalVariableDeclaration {} {}", node.ty, node.name)
    }

    fn visit_parameter(&mut self, _: &SyntaxTree, _: NodeId, node: &ParameterDecl) -> String {
        format!("Parameter #{} {} {}", node.index, node.ty, node.name)
    }

    fn visit_parameter_list(&mut self, _: &SyntaxTree, _: NodeId, node: &ParameterList) -> String {
        format!("ParameterList ({})", node.params.len())
    }

    fn visit_function_declaration(&mut self, tree: &SyntaxTree, _: NodeId, node: &FunctionDeclaration) -> String {
        format!("FunctionDeclaration {}", tree.signature(node.signature).signature())
    }

    fn visit_event_handler(&mut self, _: &SyntaxTree, _: NodeId, node: &EventHandler) -> String {
        format!("EventHandler {}", node.name)
    }

    fn visit_state(&mut self, _: &SyntaxTree, _: NodeId, node: &State) -> String {
        format!("State {}", node.display_name())
    }

    fn visit_compilation_unit(&mut self, _: &SyntaxTree, _: NodeId, node: &CompilationUnit) -> String {
        format!("CompilationUnit ({} items, {} states)", node.items.len(), node.states.len() + node.default_state.iter().count())
    }

    fn visit_error(&mut self, _: &SyntaxTree, _: NodeId, kind: SyntaxKind) -> String {
        format!("Error <{}>", kind)
    }
}
