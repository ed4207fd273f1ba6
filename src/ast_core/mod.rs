//! Синтаксическое дерево LSL на арене.
//!
//! Узлы адресуются устойчивыми [`NodeId`] внутри одного [`SyntaxTree`].
//! Родитель задаётся ровно один раз (при создании родительского узла или при
//! добавлении оператора в блок), повторная установка возвращает
//! [`ContractError::ParentAlreadySet`]. Единственное ребро вне дерева это
//! ссылка `jump → label`; обратный индекс `label → [jump]` хранится в самом дереве.

use std::collections::HashMap;
use std::fmt;

use crate::collections::PriorityQueue;
use crate::core::errors::{ContractError, ContractResult};
use crate::core::position::SourceCodeRange;
use crate::signatures::{FunctionSignature, LslType, PreDefinedFunctionSignature, SignatureId};

pub mod kinds;
pub mod nodes;
pub mod visitor;
mod clone;

pub use kinds::{BinaryOp, DeadCodeType, PostfixOp, PrefixOp, ScopeType, SyntaxKind, TupleComponent, VariableScope};
pub use nodes::*;
pub use visitor::{accept, NodeVisitor};

/// Устойчивый идентификатор узла внутри одной арены.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Аннотации операторов, заполняемые проходами анализа (не парсером).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementInfo {
    pub statement_index: usize,
    pub is_last_statement_in_scope: bool,
    pub is_dead_code: bool,
    pub dead_code_type: Option<DeadCodeType>,
    /// Уникален в пределах тела функции/события, не глобально.
    pub scope_id: usize,
    pub has_return_path: bool,
    /// Оператор, обеспечивающий гарантированный возврат.
    pub return_path: Option<NodeId>,
    pub inside_single_statement_scope: bool,
    /// Безусловный `jump` (не внутри ветвления текущего блока).
    pub constant_jump: bool,
}

/// Узел в арене.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    has_errors: bool,
    range: Option<SourceCodeRange>,
    /// Диапазон имени / оператора (уточняющий диапазон конструкции).
    detail_range: Option<SourceCodeRange>,
    ranges_available: bool,
    pub info: StatementInfo,
}

impl SyntaxNode {
    fn new(kind: NodeKind, range: Option<SourceCodeRange>) -> Self {
        Self {
            kind,
            parent: None,
            has_errors: false,
            ranges_available: range.is_some(),
            range,
            detail_range: None,
            info: StatementInfo::default(),
        }
    }

    pub fn kind(&self) -> &NodeKind { &self.kind }
    pub fn syntax_kind(&self) -> SyntaxKind { self.kind.syntax_kind() }
    pub fn parent(&self) -> Option<NodeId> { self.parent }
    pub fn has_errors(&self) -> bool { self.has_errors }
    pub fn range(&self) -> Option<SourceCodeRange> { self.range }
    pub fn detail_range(&self) -> Option<SourceCodeRange> { if self.ranges_available { self.detail_range } else { None } }
    pub fn ranges_available(&self) -> bool { self.ranges_available }
    pub fn expr(&self) -> Option<&Expr> { match &self.kind { NodeKind::Expr(e) => Some(e), _ => None } }
    pub fn stmt(&self) -> Option<&Stmt> { match &self.kind { NodeKind::Stmt(s) => Some(s), _ => None } }
    pub fn decl(&self) -> Option<&Decl> { match &self.kind { NodeKind::Decl(d) => Some(d), _ => None } }
}

/// Дерево: арена узлов, таблица заранее объявленных сигнатур и обратный индекс переходов.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: Option<NodeId>,
    signatures: Vec<PreDefinedFunctionSignature>,
    jump_index: HashMap<NodeId, Vec<NodeId>>,
}

impl SyntaxTree {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    pub fn node(&self, id: NodeId) -> &SyntaxNode { &self.nodes[id.0 as usize] }
    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> { self.nodes.get(id.0 as usize) }
    pub fn kind(&self, id: NodeId) -> &NodeKind { &self.node(id).kind }
    pub fn syntax_kind(&self, id: NodeId) -> SyntaxKind { self.node(id).syntax_kind() }
    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self.node(id).parent }
    pub fn children(&self, id: NodeId) -> Vec<NodeId> { self.node(id).kind.children() }
    pub fn info(&self, id: NodeId) -> &StatementInfo { &self.node(id).info }
    pub fn info_mut(&mut self, id: NodeId) -> &mut StatementInfo { &mut self.nodes[id.0 as usize].info }
    pub fn root(&self) -> Option<NodeId> { self.root }
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    fn check_exists(&self, id: NodeId) -> ContractResult<()> {
        if (id.0 as usize) < self.nodes.len() { Ok(()) } else { Err(ContractError::UnknownNode { node: id }) }
    }

    fn alloc(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Назначить корень (узел `CompilationUnit` без родителя).
    pub fn set_root(&mut self, id: NodeId) -> ContractResult<()> {
        self.check_exists(id)?;
        self.expect_kind(id, SyntaxKind::CompilationUnit, "CompilationUnit")?;
        if self.parent(id).is_some() {
            return Err(ContractError::ParentAlreadySet { node: id, kind: self.syntax_kind(id) });
        }
        self.root = Some(id);
        Ok(())
    }

    /// Однократная установка родителя.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> ContractResult<()> {
        self.check_exists(child)?;
        self.check_exists(parent)?;
        let node = &mut self.nodes[child.0 as usize];
        if node.parent.is_some() {
            return Err(ContractError::ParentAlreadySet { node: child, kind: node.syntax_kind() });
        }
        node.parent = Some(parent);
        Ok(())
    }

    pub fn set_range(&mut self, id: NodeId, range: SourceCodeRange) {
        let node = &mut self.nodes[id.0 as usize];
        node.range = Some(range);
        node.ranges_available = !node.has_errors;
    }

    pub fn set_detail_range(&mut self, id: NodeId, range: SourceCodeRange) {
        self.nodes[id.0 as usize].detail_range = Some(range);
    }

    fn expect_kind(&self, id: NodeId, kind: SyntaxKind, expected: &'static str) -> ContractResult<()> {
        let found = self.syntax_kind(id);
        if found == kind { Ok(()) } else { Err(ContractError::UnexpectedKind { node: id, expected, found }) }
    }

    /// Проверки структурного контракта для нового узла.
    fn validate(&self, kind: &NodeKind) -> ContractResult<()> {
        let children = kind.children();
        for (i, c) in children.iter().enumerate() {
            self.check_exists(*c)?;
            let child = self.node(*c);
            if child.parent.is_some() || children[..i].contains(c) {
                return Err(ContractError::ParentAlreadySet { node: *c, kind: child.syntax_kind() });
            }
        }
        match kind {
            NodeKind::Expr(Expr::ListLiteral(l)) => self.expect_kind(l.items, SyntaxKind::ExpressionList, "ExpressionList"),
            NodeKind::Expr(Expr::UserFunctionCall(c)) => {
                if (c.signature.0 as usize) >= self.signatures.len() {
                    return Err(ContractError::MissingChild { kind: SyntaxKind::UserFunctionCall, child: "signature" });
                }
                self.expect_kind(c.arguments, SyntaxKind::ExpressionList, "ExpressionList")
            }
            NodeKind::Expr(Expr::LibraryFunctionCall(c)) => {
                self.expect_kind(c.arguments, SyntaxKind::ExpressionList, "ExpressionList")
            }
            NodeKind::Stmt(Stmt::JumpStatement(j)) => {
                self.check_exists(j.label)?;
                self.expect_kind(j.label, SyntaxKind::LabelStatement, "LabelStatement")?;
                if self.parent(j.label).is_none() {
                    return Err(ContractError::DetachedJumpTarget { label: j.label });
                }
                Ok(())
            }
            NodeKind::Stmt(Stmt::IfStatement(IfStatement { body, .. }))
            | NodeKind::Stmt(Stmt::ElseIfStatement(ElseIfStatement { body, .. }))
            | NodeKind::Stmt(Stmt::ElseStatement(ElseStatement { body }))
            | NodeKind::Stmt(Stmt::WhileLoop(WhileLoop { body, .. }))
            | NodeKind::Stmt(Stmt::DoLoop(DoLoop { body, .. }))
            | NodeKind::Stmt(Stmt::ForLoop(ForLoop { body, .. }))
            | NodeKind::Decl(Decl::FunctionDeclaration(FunctionDeclaration { body, .. }))
            | NodeKind::Decl(Decl::EventHandler(EventHandler { body, .. })) => {
                self.expect_kind(*body, SyntaxKind::CodeScope, "CodeScope")
            }
            NodeKind::Stmt(Stmt::ControlStatement(c)) => {
                self.expect_kind(c.if_branch, SyntaxKind::IfStatement, "IfStatement")?;
                for e in &c.else_ifs {
                    self.expect_kind(*e, SyntaxKind::ElseIfStatement, "ElseIfStatement")?;
                }
                match c.else_branch {
                    Some(e) => self.expect_kind(e, SyntaxKind::ElseStatement, "ElseStatement"),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Добавить узел; все дочерние узлы получают его в качестве родителя.
    pub fn add(&mut self, kind: impl Into<NodeKind>, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        let kind = kind.into();
        self.validate(&kind)?;
        let children = kind.children();
        let jump_target = match &kind {
            NodeKind::Stmt(Stmt::JumpStatement(j)) => Some(j.label),
            _ => None,
        };
        let id = self.alloc(SyntaxNode::new(kind, range));
        for c in children {
            self.nodes[c.0 as usize].parent = Some(id);
        }
        if let Some(label) = jump_target {
            self.jump_index.entry(label).or_default().push(id);
        }
        Ok(id)
    }

    /// Узел-заглушка на месте синтаксической ошибки.
    pub fn error_node(&mut self, kind: SyntaxKind, range: Option<SourceCodeRange>) -> NodeId {
        let mut node = SyntaxNode::new(NodeKind::Error(kind), range);
        node.has_errors = true;
        node.ranges_available = false;
        self.alloc(node)
    }

    // ---- Конструкторы с контрактами ----

    /// Пустой блок кода; операторы добавляются через [`push_statement`](Self::push_statement).
    pub fn code_scope(&mut self, scope_type: ScopeType, single_statement: bool, range: Option<SourceCodeRange>) -> NodeId {
        let kind = NodeKind::Stmt(Stmt::CodeScope(CodeScope { scope_type, single_statement, statements: Vec::new() }));
        self.alloc(SyntaxNode::new(kind, range))
    }

    pub fn push_statement(&mut self, scope: NodeId, statement: NodeId) -> ContractResult<()> {
        let len = self.scope_statements(scope)?.len();
        self.insert_statement(scope, len, statement)
    }

    /// Вставить оператор в блок на позицию `index` (для отложенных переходов вперёд).
    pub fn insert_statement(&mut self, scope: NodeId, index: usize, statement: NodeId) -> ContractResult<()> {
        self.check_exists(statement)?;
        let kind = self.syntax_kind(statement);
        if !kind.is_code_statement() {
            return Err(ContractError::UnexpectedKind { node: statement, expected: "code statement", found: kind });
        }
        self.scope_statements(scope)?;
        self.set_parent(statement, scope)?;
        if let NodeKind::Stmt(Stmt::CodeScope(c)) = &mut self.nodes[scope.0 as usize].kind {
            let index = index.min(c.statements.len());
            c.statements.insert(index, statement);
        }
        Ok(())
    }

    pub fn scope_statements(&self, scope: NodeId) -> ContractResult<&[NodeId]> {
        self.check_exists(scope)?;
        match &self.node(scope).kind {
            NodeKind::Stmt(Stmt::CodeScope(c)) => Ok(&c.statements),
            _ => Err(ContractError::UnexpectedKind { node: scope, expected: "CodeScope", found: self.syntax_kind(scope) }),
        }
    }

    pub fn while_loop(&mut self, condition: Option<NodeId>, body: Option<NodeId>, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        let condition = condition.ok_or(ContractError::MissingChild { kind: SyntaxKind::WhileLoop, child: "condition" })?;
        let body = body.ok_or(ContractError::MissingChild { kind: SyntaxKind::WhileLoop, child: "body" })?;
        self.add(Stmt::WhileLoop(WhileLoop { condition, body }), range)
    }

    pub fn do_loop(&mut self, body: Option<NodeId>, condition: Option<NodeId>, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        let body = body.ok_or(ContractError::MissingChild { kind: SyntaxKind::DoLoop, child: "body" })?;
        let condition = condition.ok_or(ContractError::MissingChild { kind: SyntaxKind::DoLoop, child: "condition" })?;
        self.add(Stmt::DoLoop(DoLoop { body, condition }), range)
    }

    pub fn for_loop(
        &mut self,
        init: Option<NodeId>,
        condition: Option<NodeId>,
        after: Option<NodeId>,
        body: Option<NodeId>,
        range: Option<SourceCodeRange>,
    ) -> ContractResult<NodeId> {
        let body = body.ok_or(ContractError::MissingChild { kind: SyntaxKind::ForLoop, child: "body" })?;
        self.add(Stmt::ForLoop(ForLoop { init, condition, after, body }), range)
    }

    pub fn return_statement(&mut self, value: Option<NodeId>, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        self.add(Stmt::ReturnStatement(ReturnStatement { value }), range)
    }

    /// Переход к метке; метка должна уже находиться в дереве.
    pub fn jump(&mut self, label: NodeId, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        self.check_exists(label)?;
        let label_name = match &self.node(label).kind {
            NodeKind::Stmt(Stmt::LabelStatement(l)) => l.name.clone(),
            other => {
                return Err(ContractError::UnexpectedKind { node: label, expected: "LabelStatement", found: other.syntax_kind() })
            }
        };
        self.add(Stmt::JumpStatement(JumpStatement { label, label_name }), range)
    }

    pub fn user_call(&mut self, signature: SignatureId, arguments: NodeId, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        let name = self
            .signatures
            .get(signature.0 as usize)
            .map(|s| s.name().to_string())
            .ok_or(ContractError::MissingChild { kind: SyntaxKind::UserFunctionCall, child: "signature" })?;
        self.add(Expr::UserFunctionCall(UserFunctionCall { name, signature, arguments }), range)
    }

    pub fn library_call(&mut self, signature: FunctionSignature, arguments: NodeId, range: Option<SourceCodeRange>) -> ContractResult<NodeId> {
        self.add(Expr::LibraryFunctionCall(LibraryFunctionCall { signature, arguments }), range)
    }

    // ---- Сигнатуры пользовательских функций ----

    pub fn register_signature(&mut self, signature: FunctionSignature) -> SignatureId {
        let id = SignatureId(self.signatures.len() as u32);
        self.signatures.push(PreDefinedFunctionSignature::new(signature));
        id
    }

    pub fn signature(&self, id: SignatureId) -> &PreDefinedFunctionSignature { &self.signatures[id.0 as usize] }
    pub fn signatures(&self) -> &[PreDefinedFunctionSignature] { &self.signatures }
    pub fn find_signature(&self, name: &str) -> Option<SignatureId> {
        self.signatures.iter().position(|s| s.name() == name).map(|i| SignatureId(i as u32))
    }

    /// Однократная привязка объявления функции к сигнатуре.
    pub fn bind_definition(&mut self, signature: SignatureId, node: NodeId) -> ContractResult<()> {
        self.check_exists(node)?;
        self.expect_kind(node, SyntaxKind::FunctionDeclaration, "FunctionDeclaration")?;
        let slot = self
            .signatures
            .get_mut(signature.0 as usize)
            .ok_or(ContractError::MissingChild { kind: SyntaxKind::FunctionDeclaration, child: "signature" })?;
        slot.bind_definition(node)
    }

    /// Объявление, реализующее вызываемую пользовательскую функцию.
    pub fn call_definition(&self, call: NodeId) -> ContractResult<Option<NodeId>> {
        self.check_exists(call)?;
        match &self.node(call).kind {
            NodeKind::Expr(Expr::UserFunctionCall(c)) => Ok(self.signature(c.signature).definition()),
            NodeKind::Expr(Expr::LibraryFunctionCall(_)) => Err(ContractError::LibraryCallHasNoDefinition { node: call }),
            other => Err(ContractError::UnexpectedKind { node: call, expected: "function call", found: other.syntax_kind() }),
        }
    }

    // ---- Метки и переходы ----

    /// Переходы к метке в порядке создания.
    pub fn jumps_to(&self, label: NodeId) -> &[NodeId] {
        self.jump_index.get(&label).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Перестройка индекса `label → [jump]` из уже зарегистрированных переходов.
    /// Переход попадает в индекс только при создании через `jump` или при
    /// копировании вместе со своей меткой, положение в дереве не учитывается.
    pub fn rebuild_jump_index(&mut self) {
        let mut jumps: Vec<NodeId> = self.jump_index.values().flatten().copied().collect();
        jumps.sort_unstable();
        let mut index: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for id in jumps {
            if let NodeKind::Stmt(Stmt::JumpStatement(j)) = &self.node(id).kind {
                index.entry(j.label).or_default().push(id);
            }
        }
        self.jump_index = index;
    }

    // ---- Навигация ----

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    pub fn top_ancestor(&self, id: NodeId) -> NodeId { self.ancestors(id).last().unwrap_or(id) }

    /// Ближайший предок заданного вида.
    pub fn enclosing(&self, id: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.syntax_kind(*a) == kind)
    }

    /// Все узлы поддерева в прямом порядке.
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children = self.children(id);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Узлы-заглушки ошибок, упорядоченные по смещению в исходнике.
    /// Если корень задан, учитываются только узлы, достижимые из него.
    pub fn error_nodes(&self) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = match self.root {
            Some(root) => self.preorder(root),
            None => self.iter().map(|(id, _)| id).collect(),
        };
        let mut queue = PriorityQueue::new();
        for id in candidates {
            let node = self.node(id);
            if node.has_errors {
                let offset = node.range.map(|r| r.start_index()).unwrap_or(usize::MAX);
                queue.enqueue((offset, id), id);
            }
        }
        queue.into_sorted_vec().into_iter().map(|(_, id)| id).collect()
    }

    // ---- Семантика выражений ----

    /// Статический тип выражения (`void` для не-выражений и ошибок).
    pub fn expr_type(&self, id: NodeId) -> LslType {
        let Some(expr) = self.node(id).expr() else { return LslType::Void };
        match expr {
            Expr::FloatLiteral(_) => LslType::Float,
            Expr::IntegerLiteral(_) => LslType::Integer,
            Expr::StringLiteral(_) => LslType::String,
            Expr::VectorLiteral(_) => LslType::Vector,
            Expr::RotationLiteral(_) => LslType::Rotation,
            Expr::ListLiteral(_) => LslType::List,
            Expr::Variable(v) => v.ty,
            Expr::LibraryConstant(c) => c.signature.ty,
            Expr::UserFunctionCall(c) => self.signature(c.signature).return_type(),
            Expr::LibraryFunctionCall(c) => c.signature.return_type,
            Expr::BinaryExpression(b) => b.ty,
            Expr::PrefixExpression(p) => p.ty,
            Expr::PostfixExpression(p) => p.ty,
            Expr::TypecastExpression(t) => t.cast_to,
            Expr::ParenthesizedExpression(p) => self.expr_type(p.inner),
            Expr::TupleAccessor(_) => LslType::Float,
            Expr::ExpressionList(_) => LslType::Void,
        }
    }

    /// Является ли выражение константой времени компиляции.
    pub fn is_constant(&self, id: NodeId) -> bool {
        let Some(expr) = self.node(id).expr() else { return false };
        match expr {
            Expr::FloatLiteral(_) | Expr::IntegerLiteral(_) | Expr::StringLiteral(_) => true,
            Expr::LibraryConstant(_) => true,
            Expr::Variable(_) | Expr::UserFunctionCall(_) | Expr::LibraryFunctionCall(_) => false,
            Expr::PostfixExpression(_) => false,
            Expr::VectorLiteral(v) => [v.x, v.y, v.z].iter().all(|c| self.is_constant(*c)),
            Expr::RotationLiteral(r) => [r.x, r.y, r.z, r.s].iter().all(|c| self.is_constant(*c)),
            Expr::ListLiteral(l) => self.is_constant(l.items),
            Expr::ExpressionList(l) => l.items.iter().all(|c| self.is_constant(*c)),
            Expr::BinaryExpression(b) => !b.op.is_assignment() && self.is_constant(b.left) && self.is_constant(b.right),
            Expr::PrefixExpression(p) => !p.op.is_modifying() && self.is_constant(p.operand),
            Expr::TypecastExpression(t) => self.is_constant(t.operand),
            Expr::ParenthesizedExpression(p) => self.is_constant(p.inner),
            Expr::TupleAccessor(t) => self.is_constant(t.target),
        }
    }
}

/// Контроль обхода.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl { Continue, SkipChildren, Stop }

/// Обход enter/leave для проходов, которым важны лишь отдельные виды узлов.
pub trait Visitor {
    fn enter(&mut self, _id: NodeId, _node: &SyntaxNode, _tree: &SyntaxTree) -> VisitControl { VisitControl::Continue }
    fn leave(&mut self, _id: NodeId, _node: &SyntaxNode, _tree: &SyntaxTree) {}
}

/// Обход дерева с visitor (preorder + post события). Возвращает true если не прерван.
pub fn walk<V: Visitor>(tree: &SyntaxTree, root: NodeId, visitor: &mut V) -> bool {
    fn inner<V: Visitor>(tree: &SyntaxTree, id: NodeId, vis: &mut V) -> Option<()> {
        let node = tree.node(id);
        match vis.enter(id, node, tree) {
            VisitControl::Continue => {
                for c in node.kind.children() {
                    inner(tree, c, vis)?;
                }
            }
            VisitControl::SkipChildren => {}
            VisitControl::Stop => return None,
        }
        vis.leave(id, node, tree);
        Some(())
    }
    inner(tree, root, visitor).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::Parameter;

    fn int(tree: &mut SyntaxTree, v: i32) -> NodeId {
        tree.add(Expr::IntegerLiteral(IntegerLiteral { text: v.to_string(), value: v }), None).unwrap()
    }

    fn label(tree: &mut SyntaxTree, name: &str) -> NodeId {
        tree.add(Stmt::LabelStatement(LabelStatement { name: name.into() }), None).unwrap()
    }

    #[test]
    fn parent_can_only_be_set_once() {
        let mut t = SyntaxTree::new();
        let a = int(&mut t, 1);
        let b = int(&mut t, 2);
        let sum = t
            .add(Expr::BinaryExpression(BinaryExpression { op: BinaryOp::Add, left: a, right: b, ty: LslType::Integer }), None)
            .unwrap();
        assert_eq!(t.parent(a), Some(sum));
        let err = t.add(Expr::ParenthesizedExpression(ParenthesizedExpression { inner: a }), None).unwrap_err();
        assert!(matches!(err, ContractError::ParentAlreadySet { node, .. } if node == a));
        assert!(t.set_parent(a, b).is_err());
    }

    #[test]
    fn same_child_twice_is_rejected() {
        let mut t = SyntaxTree::new();
        let a = int(&mut t, 1);
        let err = t
            .add(Expr::BinaryExpression(BinaryExpression { op: BinaryOp::Add, left: a, right: a, ty: LslType::Integer }), None)
            .unwrap_err();
        assert!(matches!(err, ContractError::ParentAlreadySet { .. }));
    }

    #[test]
    fn jump_requires_attached_label() {
        let mut t = SyntaxTree::new();
        let l = label(&mut t, "top");
        assert_eq!(t.jump(l, None).unwrap_err(), ContractError::DetachedJumpTarget { label: l });

        let scope = t.code_scope(ScopeType::FunctionBody, false, None);
        t.push_statement(scope, l).unwrap();
        let j1 = t.jump(l, None).unwrap();
        let j2 = t.jump(l, None).unwrap();
        assert_eq!(t.jumps_to(l), &[j1, j2]);
        match t.kind(j1) {
            NodeKind::Stmt(Stmt::JumpStatement(j)) => assert_eq!(j.label_name, "top"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn loops_require_children() {
        let mut t = SyntaxTree::new();
        let cond = int(&mut t, 1);
        let err = t.while_loop(Some(cond), None, None).unwrap_err();
        assert_eq!(err, ContractError::MissingChild { kind: SyntaxKind::WhileLoop, child: "body" });
        assert!(t.do_loop(None, Some(cond), None).is_err());
        let body = t.code_scope(ScopeType::ForLoopBody, false, None);
        let f = t.for_loop(None, None, None, Some(body), None).unwrap();
        assert_eq!(t.children(f), vec![body]);
        assert_eq!(t.parent(cond), None);
    }

    #[test]
    fn library_call_has_no_definition() {
        let mut t = SyntaxTree::new();
        let args = t.add(Expr::ExpressionList(ExpressionList::default()), None).unwrap();
        let sig = FunctionSignature::new(LslType::Void, "llResetScript", vec![]);
        let call = t.library_call(sig, args, None).unwrap();
        assert_eq!(t.call_definition(call).unwrap_err(), ContractError::LibraryCallHasNoDefinition { node: call });

        let user_sig = t.register_signature(FunctionSignature::new(LslType::Integer, "f", vec![Parameter::new(LslType::Integer, "a")]));
        let one = int(&mut t, 1);
        let args = t.add(Expr::ExpressionList(ExpressionList { items: vec![one] }), None).unwrap();
        let call = t.user_call(user_sig, args, None).unwrap();
        assert_eq!(t.call_definition(call).unwrap(), None);
        assert_eq!(t.expr_type(call), LslType::Integer);
    }

    #[test]
    fn constants_and_errors() {
        let mut t = SyntaxTree::new();
        let a = int(&mut t, 1);
        let b = int(&mut t, 2);
        let sum = t
            .add(Expr::BinaryExpression(BinaryExpression { op: BinaryOp::Add, left: a, right: b, ty: LslType::Integer }), None)
            .unwrap();
        assert!(t.is_constant(sum));
        let var = t
            .add(Expr::Variable(Variable { name: "x".into(), ty: LslType::Integer, scope: VariableScope::Local, declaration: None }), None)
            .unwrap();
        let inc = t.add(Expr::PostfixExpression(PostfixExpression { op: PostfixOp::Increment, operand: var, ty: LslType::Integer }), None).unwrap();
        assert!(!t.is_constant(inc));

        let late = t.error_node(SyntaxKind::ReturnStatement, Some(SourceCodeRange::new(3, 0, 40, 3, 5, 45)));
        let early = t.error_node(SyntaxKind::IfStatement, Some(SourceCodeRange::new(1, 0, 2, 1, 5, 7)));
        assert!(t.node(early).has_errors());
        assert!(!t.node(early).ranges_available());
        assert_eq!(t.error_nodes(), vec![early, late]);
    }

    struct KindCollector(Vec<SyntaxKind>);
    impl Visitor for KindCollector {
        fn enter(&mut self, _id: NodeId, node: &SyntaxNode, _tree: &SyntaxTree) -> VisitControl {
            self.0.push(node.syntax_kind());
            if node.syntax_kind() == SyntaxKind::ParenthesizedExpression { VisitControl::SkipChildren } else { VisitControl::Continue }
        }
    }

    #[test]
    fn walk_visits_in_preorder() {
        let mut t = SyntaxTree::new();
        let a = int(&mut t, 1);
        let b = int(&mut t, 2);
        let p = t.add(Expr::ParenthesizedExpression(ParenthesizedExpression { inner: b }), None).unwrap();
        let sum = t
            .add(Expr::BinaryExpression(BinaryExpression { op: BinaryOp::Add, left: a, right: p, ty: LslType::Integer }), None)
            .unwrap();
        let mut v = KindCollector(Vec::new());
        assert!(walk(&t, sum, &mut v));
        assert_eq!(
            v.0,
            vec![SyntaxKind::BinaryExpression, SyntaxKind::IntegerLiteral, SyntaxKind::ParenthesizedExpression]
        );
    }
}
