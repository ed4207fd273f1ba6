//! Полезная нагрузка узлов: одно размеченное объединение на категорию
//! (выражение / оператор / объявление), по структуре на вариант.
//!
//! Дочерние узлы и перекрёстные ссылки хранятся как [`NodeId`] той же арены.

use super::kinds::{BinaryOp, PostfixOp, PrefixOp, ScopeType, SyntaxKind, TupleComponent, VariableScope};
use super::NodeId;
use crate::signatures::{ConstantSignature, FunctionSignature, LslType, SignatureId};

#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteral { pub text: String, pub value: f64 }

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral { pub text: String, pub value: i32 }

/// Строковый литерал; `text` хранится как в исходнике, вместе с кавычками.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral { pub text: String }

impl StringLiteral {
    /// Значение с раскрытыми escape-последовательностями.
    pub fn value(&self) -> String {
        let inner = self.text.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(&self.text);
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push_str("    "),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorLiteral { pub x: NodeId, pub y: NodeId, pub z: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct RotationLiteral { pub x: NodeId, pub y: NodeId, pub z: NodeId, pub s: NodeId }

/// `[a, b, c]`; элементы хранятся в дочернем [`ExpressionList`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListLiteral { pub items: NodeId }

/// Ссылка на переменную. `declaration` указывает на узел объявления
/// (глобальная/локальная переменная или параметр), это не родительская связь.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: LslType,
    pub scope: VariableScope,
    pub declaration: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryConstant { pub signature: ConstantSignature }

/// Вызов пользовательской функции: ссылается на заранее объявленную сигнатуру дерева.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunctionCall { pub name: String, pub signature: SignatureId, pub arguments: NodeId }

/// Вызов библиотечной функции: владеет сигнатурой из внешнего источника.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryFunctionCall { pub signature: FunctionSignature, pub arguments: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression { pub op: BinaryOp, pub left: NodeId, pub right: NodeId, pub ty: LslType }

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression { pub op: PrefixOp, pub operand: NodeId, pub ty: LslType }

#[derive(Debug, Clone, PartialEq)]
pub struct PostfixExpression { pub op: PostfixOp, pub operand: NodeId, pub ty: LslType }

#[derive(Debug, Clone, PartialEq)]
pub struct TypecastExpression { pub cast_to: LslType, pub operand: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression { pub inner: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct TupleAccessor { pub target: NodeId, pub component: TupleComponent }

/// Список выражений: аргументы вызова, элементы списка, части заголовка `for`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionList { pub items: Vec<NodeId> }

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    FloatLiteral(FloatLiteral),
    IntegerLiteral(IntegerLiteral),
    StringLiteral(StringLiteral),
    VectorLiteral(VectorLiteral),
    RotationLiteral(RotationLiteral),
    ListLiteral(ListLiteral),
    Variable(Variable),
    LibraryConstant(LibraryConstant),
    UserFunctionCall(UserFunctionCall),
    LibraryFunctionCall(LibraryFunctionCall),
    BinaryExpression(BinaryExpression),
    PrefixExpression(PrefixExpression),
    PostfixExpression(PostfixExpression),
    TypecastExpression(TypecastExpression),
    ParenthesizedExpression(ParenthesizedExpression),
    TupleAccessor(TupleAccessor),
    ExpressionList(ExpressionList),
}

/// Блок кода. `single_statement` означает тело без фигурных скобок (`if (x) y;`).
#[derive(Debug, Clone, PartialEq)]
pub struct CodeScope { pub scope_type: ScopeType, pub single_statement: bool, pub statements: Vec<NodeId> }

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement { pub expr: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement { pub value: Option<NodeId> }

impl ReturnStatement {
    pub fn has_return_expression(&self) -> bool { self.value.is_some() }
}

/// `jump name;`. Цель задаётся при создании и больше не меняется.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpStatement { pub label: NodeId, pub label_name: String }

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStatement { pub name: String }

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableDeclaration { pub name: String, pub ty: LslType, pub initializer: Option<NodeId> }

/// `state name;`; для `state default;` хранится `"default"`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangeStatement { pub state: String }

/// Цепочка `if / else if / else`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlStatement { pub if_branch: NodeId, pub else_ifs: Vec<NodeId>, pub else_branch: Option<NodeId> }

impl ControlStatement {
    pub fn has_else(&self) -> bool { self.else_branch.is_some() }

    /// Все ветви по порядку.
    pub fn branches(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.else_ifs.len() + 2);
        out.push(self.if_branch);
        out.extend(self.else_ifs.iter().copied());
        out.extend(self.else_branch);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement { pub condition: NodeId, pub body: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfStatement { pub condition: NodeId, pub body: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct ElseStatement { pub body: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop { pub condition: NodeId, pub body: NodeId }

#[derive(Debug, Clone, PartialEq)]
pub struct DoLoop { pub body: NodeId, pub condition: NodeId }

/// `for (init; condition; after) body`. Все части заголовка необязательны.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub init: Option<NodeId>,
    pub condition: Option<NodeId>,
    pub after: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    CodeScope(CodeScope),
    ExpressionStatement(ExpressionStatement),
    ReturnStatement(ReturnStatement),
    JumpStatement(JumpStatement),
    LabelStatement(LabelStatement),
    LocalVariableDeclaration(LocalVariableDeclaration),
    StateChangeStatement(StateChangeStatement),
    SemicolonStatement,
    ControlStatement(ControlStatement),
    IfStatement(IfStatement),
    ElseIfStatement(ElseIfStatement),
    ElseStatement(ElseStatement),
    WhileLoop(WhileLoop),
    DoLoop(DoLoop),
    ForLoop(ForLoop),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariableDeclaration { pub name: String, pub ty: LslType, pub initializer: Option<NodeId> }

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl { pub name: String, pub ty: LslType, pub index: usize }

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterList { pub params: Vec<NodeId> }

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: LslType,
    pub parameters: NodeId,
    pub body: NodeId,
    pub signature: SignatureId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventHandler { pub name: String, pub parameters: NodeId, pub body: NodeId }

/// Состояние; `name == None` для `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct State { pub name: Option<String>, pub events: Vec<NodeId> }

impl State {
    pub fn is_default(&self) -> bool { self.name.is_none() }
    pub fn display_name(&self) -> &str { self.name.as_deref().unwrap_or("default") }
}

/// Корень: глобальные переменные и функции в порядке исходника, затем состояния.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit { pub items: Vec<NodeId>, pub default_state: Option<NodeId>, pub states: Vec<NodeId> }

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    GlobalVariableDeclaration(GlobalVariableDeclaration),
    Parameter(ParameterDecl),
    ParameterList(ParameterList),
    FunctionDeclaration(FunctionDeclaration),
    EventHandler(EventHandler),
    State(State),
    CompilationUnit(CompilationUnit),
}

/// Содержимое узла. `Error` хранит вид конструкции, на месте которой
/// произошла синтаксическая ошибка.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Expr(Expr),
    Stmt(Stmt),
    Decl(Decl),
    Error(SyntaxKind),
}

impl NodeKind {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self {
            NodeKind::Expr(e) => match e {
                Expr::FloatLiteral(_) => SyntaxKind::FloatLiteral,
                Expr::IntegerLiteral(_) => SyntaxKind::IntegerLiteral,
                Expr::StringLiteral(_) => SyntaxKind::StringLiteral,
                Expr::VectorLiteral(_) => SyntaxKind::VectorLiteral,
                Expr::RotationLiteral(_) => SyntaxKind::RotationLiteral,
                Expr::ListLiteral(_) => SyntaxKind::ListLiteral,
                Expr::Variable(_) => SyntaxKind::Variable,
                Expr::LibraryConstant(_) => SyntaxKind::LibraryConstant,
                Expr::UserFunctionCall(_) => SyntaxKind::UserFunctionCall,
                Expr::LibraryFunctionCall(_) => SyntaxKind::LibraryFunctionCall,
                Expr::BinaryExpression(_) => SyntaxKind::BinaryExpression,
                Expr::PrefixExpression(_) => SyntaxKind::PrefixExpression,
                Expr::PostfixExpression(_) => SyntaxKind::PostfixExpression,
                Expr::TypecastExpression(_) => SyntaxKind::TypecastExpression,
                Expr::ParenthesizedExpression(_) => SyntaxKind::ParenthesizedExpression,
                Expr::TupleAccessor(_) => SyntaxKind::TupleAccessor,
                Expr::ExpressionList(_) => SyntaxKind::ExpressionList,
            },
            NodeKind::Stmt(s) => match s {
                Stmt::CodeScope(_) => SyntaxKind::CodeScope,
                Stmt::ExpressionStatement(_) => SyntaxKind::ExpressionStatement,
                Stmt::ReturnStatement(_) => SyntaxKind::ReturnStatement,
                Stmt::JumpStatement(_) => SyntaxKind::JumpStatement,
                Stmt::LabelStatement(_) => SyntaxKind::LabelStatement,
                Stmt::LocalVariableDeclaration(_) => SyntaxKind::LocalVariableDeclaration,
                Stmt::StateChangeStatement(_) => SyntaxKind::StateChangeStatement,
                Stmt::SemicolonStatement => SyntaxKind::SemicolonStatement,
                Stmt::ControlStatement(_) => SyntaxKind::ControlStatement,
                Stmt::IfStatement(_) => SyntaxKind::IfStatement,
                Stmt::ElseIfStatement(_) => SyntaxKind::ElseIfStatement,
                Stmt::ElseStatement(_) => SyntaxKind::ElseStatement,
                Stmt::WhileLoop(_) => SyntaxKind::WhileLoop,
                Stmt::DoLoop(_) => SyntaxKind::DoLoop,
                Stmt::ForLoop(_) => SyntaxKind::ForLoop,
            },
            NodeKind::Decl(d) => match d {
                Decl::GlobalVariableDeclaration(_) => SyntaxKind::GlobalVariableDeclaration,
                Decl::Parameter(_) => SyntaxKind::Parameter,
                Decl::ParameterList(_) => SyntaxKind::ParameterList,
                Decl::FunctionDeclaration(_) => SyntaxKind::FunctionDeclaration,
                Decl::EventHandler(_) => SyntaxKind::EventHandler,
                Decl::State(_) => SyntaxKind::State,
                Decl::CompilationUnit(_) => SyntaxKind::CompilationUnit,
            },
            NodeKind::Error(kind) => *kind,
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, NodeKind::Error(_)) }

    /// Дочерние узлы в порядке исходного текста (без перекрёстных ссылок).
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Expr(e) => match e {
                Expr::FloatLiteral(_) | Expr::IntegerLiteral(_) | Expr::StringLiteral(_) => {}
                Expr::Variable(_) | Expr::LibraryConstant(_) => {}
                Expr::VectorLiteral(v) => out.extend([v.x, v.y, v.z]),
                Expr::RotationLiteral(r) => out.extend([r.x, r.y, r.z, r.s]),
                Expr::ListLiteral(l) => out.push(l.items),
                Expr::UserFunctionCall(c) => out.push(c.arguments),
                Expr::LibraryFunctionCall(c) => out.push(c.arguments),
                Expr::BinaryExpression(b) => out.extend([b.left, b.right]),
                Expr::PrefixExpression(p) => out.push(p.operand),
                Expr::PostfixExpression(p) => out.push(p.operand),
                Expr::TypecastExpression(t) => out.push(t.operand),
                Expr::ParenthesizedExpression(p) => out.push(p.inner),
                Expr::TupleAccessor(t) => out.push(t.target),
                Expr::ExpressionList(l) => out.extend(l.items.iter().copied()),
            },
            NodeKind::Stmt(s) => match s {
                Stmt::CodeScope(c) => out.extend(c.statements.iter().copied()),
                Stmt::ExpressionStatement(e) => out.push(e.expr),
                Stmt::ReturnStatement(r) => out.extend(r.value),
                Stmt::JumpStatement(_) | Stmt::LabelStatement(_) => {}
                Stmt::StateChangeStatement(_) | Stmt::SemicolonStatement => {}
                Stmt::LocalVariableDeclaration(l) => out.extend(l.initializer),
                Stmt::ControlStatement(c) => out.extend(c.branches()),
                Stmt::IfStatement(i) => out.extend([i.condition, i.body]),
                Stmt::ElseIfStatement(i) => out.extend([i.condition, i.body]),
                Stmt::ElseStatement(e) => out.push(e.body),
                Stmt::WhileLoop(w) => out.extend([w.condition, w.body]),
                Stmt::DoLoop(d) => out.extend([d.body, d.condition]),
                Stmt::ForLoop(f) => {
                    out.extend(f.init);
                    out.extend(f.condition);
                    out.extend(f.after);
                    out.push(f.body);
                }
            },
            NodeKind::Decl(d) => match d {
                Decl::GlobalVariableDeclaration(g) => out.extend(g.initializer),
                Decl::Parameter(_) => {}
                Decl::ParameterList(p) => out.extend(p.params.iter().copied()),
                Decl::FunctionDeclaration(f) => out.extend([f.parameters, f.body]),
                Decl::EventHandler(e) => out.extend([e.parameters, e.body]),
                Decl::State(s) => out.extend(s.events.iter().copied()),
                Decl::CompilationUnit(c) => {
                    out.extend(c.items.iter().copied());
                    out.extend(c.default_state);
                    out.extend(c.states.iter().copied());
                }
            },
            NodeKind::Error(_) => {}
        }
        out
    }

    /// Заменить все идентификаторы узлов (и дочерние, и перекрёстные ссылки).
    pub fn remap(&mut self, f: &impl Fn(NodeId) -> NodeId) {
        let opt = |o: &mut Option<NodeId>| {
            if let Some(id) = o {
                *id = f(*id);
            }
        };
        let all = |v: &mut Vec<NodeId>| v.iter_mut().for_each(|id| *id = f(*id));
        match self {
            NodeKind::Expr(e) => match e {
                Expr::FloatLiteral(_) | Expr::IntegerLiteral(_) | Expr::StringLiteral(_) => {}
                Expr::LibraryConstant(_) => {}
                Expr::Variable(v) => opt(&mut v.declaration),
                Expr::VectorLiteral(v) => {
                    v.x = f(v.x);
                    v.y = f(v.y);
                    v.z = f(v.z);
                }
                Expr::RotationLiteral(r) => {
                    r.x = f(r.x);
                    r.y = f(r.y);
                    r.z = f(r.z);
                    r.s = f(r.s);
                }
                Expr::ListLiteral(l) => l.items = f(l.items),
                Expr::UserFunctionCall(c) => c.arguments = f(c.arguments),
                Expr::LibraryFunctionCall(c) => c.arguments = f(c.arguments),
                Expr::BinaryExpression(b) => {
                    b.left = f(b.left);
                    b.right = f(b.right);
                }
                Expr::PrefixExpression(p) => p.operand = f(p.operand),
                Expr::PostfixExpression(p) => p.operand = f(p.operand),
                Expr::TypecastExpression(t) => t.operand = f(t.operand),
                Expr::ParenthesizedExpression(p) => p.inner = f(p.inner),
                Expr::TupleAccessor(t) => t.target = f(t.target),
                Expr::ExpressionList(l) => all(&mut l.items),
            },
            NodeKind::Stmt(s) => match s {
                Stmt::CodeScope(c) => all(&mut c.statements),
                Stmt::ExpressionStatement(e) => e.expr = f(e.expr),
                Stmt::ReturnStatement(r) => opt(&mut r.value),
                Stmt::JumpStatement(j) => j.label = f(j.label),
                Stmt::LabelStatement(_) | Stmt::StateChangeStatement(_) | Stmt::SemicolonStatement => {}
                Stmt::LocalVariableDeclaration(l) => opt(&mut l.initializer),
                Stmt::ControlStatement(c) => {
                    c.if_branch = f(c.if_branch);
                    all(&mut c.else_ifs);
                    opt(&mut c.else_branch);
                }
                Stmt::IfStatement(i) => {
                    i.condition = f(i.condition);
                    i.body = f(i.body);
                }
                Stmt::ElseIfStatement(i) => {
                    i.condition = f(i.condition);
                    i.body = f(i.body);
                }
                Stmt::ElseStatement(e) => e.body = f(e.body),
                Stmt::WhileLoop(w) => {
                    w.condition = f(w.condition);
                    w.body = f(w.body);
                }
                Stmt::DoLoop(d) => {
                    d.body = f(d.body);
                    d.condition = f(d.condition);
                }
                Stmt::ForLoop(l) => {
                    opt(&mut l.init);
                    opt(&mut l.condition);
                    opt(&mut l.after);
                    l.body = f(l.body);
                }
            },
            NodeKind::Decl(d) => match d {
                Decl::GlobalVariableDeclaration(g) => opt(&mut g.initializer),
                Decl::Parameter(_) => {}
                Decl::ParameterList(p) => all(&mut p.params),
                Decl::FunctionDeclaration(fd) => {
                    fd.parameters = f(fd.parameters);
                    fd.body = f(fd.body);
                }
                Decl::EventHandler(e) => {
                    e.parameters = f(e.parameters);
                    e.body = f(e.body);
                }
                Decl::State(s) => all(&mut s.events),
                Decl::CompilationUnit(c) => {
                    all(&mut c.items);
                    opt(&mut c.default_state);
                    all(&mut c.states);
                }
            },
            NodeKind::Error(_) => {}
        }
    }
}

impl From<Expr> for NodeKind {
    fn from(e: Expr) -> Self { NodeKind::Expr(e) }
}

impl From<Stmt> for NodeKind {
    fn from(s: Stmt) -> Self { NodeKind::Stmt(s) }
}

impl From<Decl> for NodeKind {
    fn from(d: Decl) -> Self { NodeKind::Decl(d) }
}
