//! Полная диспетчеризация по видам узлов.
//!
//! [`NodeVisitor`] требует обработчик для каждого варианта: добавление нового
//! вида узла ломает компиляцию всех реализаций, пока они не будут дополнены.
//! [`accept`] выполняет исчерпывающий `match` и вызывает нужный метод.

use super::nodes::*;
use super::{NodeId, SyntaxKind, SyntaxTree};

pub trait NodeVisitor {
    type Output;

    fn visit_float_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &FloatLiteral) -> Self::Output;
    fn visit_integer_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &IntegerLiteral) -> Self::Output;
    fn visit_string_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &StringLiteral) -> Self::Output;
    fn visit_vector_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &VectorLiteral) -> Self::Output;
    fn visit_rotation_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &RotationLiteral) -> Self::Output;
    fn visit_list_literal(&mut self, tree: &SyntaxTree, id: NodeId, node: &ListLiteral) -> Self::Output;
    fn visit_variable(&mut self, tree: &SyntaxTree, id: NodeId, node: &Variable) -> Self::Output;
    fn visit_library_constant(&mut self, tree: &SyntaxTree, id: NodeId, node: &LibraryConstant) -> Self::Output;
    fn visit_user_function_call(&mut self, tree: &SyntaxTree, id: NodeId, node: &UserFunctionCall) -> Self::Output;
    fn visit_library_function_call(&mut self, tree: &SyntaxTree, id: NodeId, node: &LibraryFunctionCall) -> Self::Output;
    fn visit_binary_expression(&mut self, tree: &SyntaxTree, id: NodeId, node: &BinaryExpression) -> Self::Output;
    fn visit_prefix_expression(&mut self, tree: &SyntaxTree, id: NodeId, node: &PrefixExpression) -> Self::Output;
    fn visit_postfix_expression(&mut self, tree: &SyntaxTree, id: NodeId, node: &PostfixExpression) -> Self::Output;
    fn visit_typecast_expression(&mut self, tree: &SyntaxTree, id: NodeId, node: &TypecastExpression) -> Self::Output;
    fn visit_parenthesized_expression(&mut self, tree: &SyntaxTree, id: NodeId, node: &ParenthesizedExpression) -> Self::Output;
    fn visit_tuple_accessor(&mut self, tree: &SyntaxTree, id: NodeId, node: &TupleAccessor) -> Self::Output;
    fn visit_expression_list(&mut self, tree: &SyntaxTree, id: NodeId, node: &ExpressionList) -> Self::Output;

    fn visit_code_scope(&mut self, tree: &SyntaxTree, id: NodeId, node: &CodeScope) -> Self::Output;
    fn visit_expression_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &ExpressionStatement) -> Self::Output;
    fn visit_return_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &ReturnStatement) -> Self::Output;
    fn visit_jump_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &JumpStatement) -> Self::Output;
    fn visit_label_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &LabelStatement) -> Self::Output;
    fn visit_local_variable_declaration(&mut self, tree: &SyntaxTree, id: NodeId, node: &LocalVariableDeclaration) -> Self::Output;
    fn visit_state_change_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &StateChangeStatement) -> Self::Output;
    fn visit_semicolon_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Self::Output;
    fn visit_control_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &ControlStatement) -> Self::Output;
    fn visit_if_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &IfStatement) -> Self::Output;
    fn visit_else_if_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &ElseIfStatement) -> Self::Output;
    fn visit_else_statement(&mut self, tree: &SyntaxTree, id: NodeId, node: &ElseStatement) -> Self::Output;
    fn visit_while_loop(&mut self, tree: &SyntaxTree, id: NodeId, node: &WhileLoop) -> Self::Output;
    fn visit_do_loop(&mut self, tree: &SyntaxTree, id: NodeId, node: &DoLoop) -> Self::Output;
    fn visit_for_loop(&mut self, tree: &SyntaxTree, id: NodeId, node: &ForLoop) -> Self::Output;

    fn visit_global_variable_declaration(&mut self, tree: &SyntaxTree, id: NodeId, node: &GlobalVariableDeclaration) -> Self::Output;
    fn visit_parameter(&mut self, tree: &SyntaxTree, id: NodeId, node: &ParameterDecl) -> Self::Output;
    fn visit_parameter_list(&mut self, tree: &SyntaxTree, id: NodeId, node: &ParameterList) -> Self::Output;
    fn visit_function_declaration(&mut self, tree: &SyntaxTree, id: NodeId, node: &FunctionDeclaration) -> Self::Output;
    fn visit_event_handler(&mut self, tree: &SyntaxTree, id: NodeId, node: &EventHandler) -> Self::Output;
    fn visit_state(&mut self, tree: &SyntaxTree, id: NodeId, node: &State) -> Self::Output;
    fn visit_compilation_unit(&mut self, tree: &SyntaxTree, id: NodeId, node: &CompilationUnit) -> Self::Output;

    /// Узел-заглушка ошибки; `kind` это вид конструкции, которую не удалось разобрать.
    fn visit_error(&mut self, tree: &SyntaxTree, id: NodeId, kind: SyntaxKind) -> Self::Output;
}

/// Вызвать у visitor обработчик, соответствующий виду узла.
pub fn accept<V: NodeVisitor + ?Sized>(tree: &SyntaxTree, id: NodeId, visitor: &mut V) -> V::Output {
    match tree.kind(id) {
        NodeKind::Expr(e) => match e {
            Expr::FloatLiteral(n) => visitor.visit_float_literal(tree, id, n),
            Expr::IntegerLiteral(n) => visitor.visit_integer_literal(tree, id, n),
            Expr::StringLiteral(n) => visitor.visit_string_literal(tree, id, n),
            Expr::VectorLiteral(n) => visitor.visit_vector_literal(tree, id, n),
            Expr::RotationLiteral(n) => visitor.visit_rotation_literal(tree, id, n),
            Expr::ListLiteral(n) => visitor.visit_list_literal(tree, id, n),
            Expr::Variable(n) => visitor.visit_variable(tree, id, n),
            Expr::LibraryConstant(n) => visitor.visit_library_constant(tree, id, n),
            Expr::UserFunctionCall(n) => visitor.visit_user_function_call(tree, id, n),
            Expr::LibraryFunctionCall(n) => visitor.visit_library_function_call(tree, id, n),
            Expr::BinaryExpression(n) => visitor.visit_binary_expression(tree, id, n),
            Expr::PrefixExpression(n) => visitor.visit_prefix_expression(tree, id, n),
            Expr::PostfixExpression(n) => visitor.visit_postfix_expression(tree, id, n),
            Expr::TypecastExpression(n) => visitor.visit_typecast_expression(tree, id, n),
            Expr::ParenthesizedExpression(n) => visitor.visit_parenthesized_expression(tree, id, n),
            Expr::TupleAccessor(n) => visitor.visit_tuple_accessor(tree, id, n),
            Expr::ExpressionList(n) => visitor.visit_expression_list(tree, id, n),
        },
        NodeKind::Stmt(s) => match s {
            Stmt::CodeScope(n) => visitor.visit_code_scope(tree, id, n),
            Stmt::ExpressionStatement(n) => visitor.visit_expression_statement(tree, id, n),
            Stmt::ReturnStatement(n) => visitor.visit_return_statement(tree, id, n),
            Stmt::JumpStatement(n) => visitor.visit_jump_statement(tree, id, n),
            Stmt::LabelStatement(n) => visitor.visit_label_statement(tree, id, n),
            Stmt::LocalVariableDeclaration(n) => visitor.visit_local_variable_declaration(tree, id, n),
            Stmt::StateChangeStatement(n) => visitor.visit_state_change_statement(tree, id, n),
            Stmt::SemicolonStatement => visitor.visit_semicolon_statement(tree, id),
            Stmt::ControlStatement(n) => visitor.visit_control_statement(tree, id, n),
            Stmt::IfStatement(n) => visitor.visit_if_statement(tree, id, n),
            Stmt::ElseIfStatement(n) => visitor.visit_else_if_statement(tree, id, n),
            Stmt::ElseStatement(n) => visitor.visit_else_statement(tree, id, n),
            Stmt::WhileLoop(n) => visitor.visit_while_loop(tree, id, n),
            Stmt::DoLoop(n) => visitor.visit_do_loop(tree, id, n),
            Stmt::ForLoop(n) => visitor.visit_for_loop(tree, id, n),
        },
        NodeKind::Decl(d) => match d {
            Decl::GlobalVariableDeclaration(n) => visitor.visit_global_variable_declaration(tree, id, n),
            Decl::Parameter(n) => visitor.visit_parameter(tree, id, n),
            Decl::ParameterList(n) => visitor.visit_parameter_list(tree, id, n),
            Decl::FunctionDeclaration(n) => visitor.visit_function_declaration(tree, id, n),
            Decl::EventHandler(n) => visitor.visit_event_handler(tree, id, n),
            Decl::State(n) => visitor.visit_state(tree, id, n),
            Decl::CompilationUnit(n) => visitor.visit_compilation_unit(tree, id, n),
        },
        NodeKind::Error(kind) => visitor.visit_error(tree, id, *kind),
    }
}
