//! Виды узлов, операторы и перечисления-аннотации дерева.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Плоский список всех вариантов узлов (без полей).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    FloatLiteral,
    IntegerLiteral,
    StringLiteral,
    VectorLiteral,
    RotationLiteral,
    ListLiteral,
    Variable,
    LibraryConstant,
    UserFunctionCall,
    LibraryFunctionCall,
    BinaryExpression,
    PrefixExpression,
    PostfixExpression,
    TypecastExpression,
    ParenthesizedExpression,
    TupleAccessor,
    ExpressionList,
    CodeScope,
    ExpressionStatement,
    ReturnStatement,
    JumpStatement,
    LabelStatement,
    LocalVariableDeclaration,
    StateChangeStatement,
    SemicolonStatement,
    ControlStatement,
    IfStatement,
    ElseIfStatement,
    ElseStatement,
    WhileLoop,
    DoLoop,
    ForLoop,
    GlobalVariableDeclaration,
    Parameter,
    ParameterList,
    FunctionDeclaration,
    EventHandler,
    State,
    CompilationUnit,
}

impl SyntaxKind {
    pub fn is_expression(&self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            FloatLiteral | IntegerLiteral | StringLiteral | VectorLiteral | RotationLiteral | ListLiteral
                | Variable | LibraryConstant | UserFunctionCall | LibraryFunctionCall | BinaryExpression
                | PrefixExpression | PostfixExpression | TypecastExpression | ParenthesizedExpression
                | TupleAccessor | ExpressionList
        )
    }

    /// Узлы, которые могут стоять непосредственно в [`CodeScope`](SyntaxKind::CodeScope).
    pub fn is_code_statement(&self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            CodeScope | ExpressionStatement | ReturnStatement | JumpStatement | LabelStatement
                | LocalVariableDeclaration | StateChangeStatement | SemicolonStatement | ControlStatement
                | WhileLoop | DoLoop | ForLoop
        )
    }

    pub fn is_loop(&self) -> bool { matches!(self, SyntaxKind::WhileLoop | SyntaxKind::DoLoop | SyntaxKind::ForLoop) }

    pub fn is_literal(&self) -> bool {
        matches!(self, SyntaxKind::FloatLiteral | SyntaxKind::IntegerLiteral | SyntaxKind::StringLiteral)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

/// Бинарные операторы, включая присваивания.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModulusAssign,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulus => "%",
            Equals => "==",
            NotEquals => "!=",
            LessThan => "<",
            GreaterThan => ">",
            LessEquals => "<=",
            GreaterEquals => ">=",
            LogicalAnd => "&&",
            LogicalOr => "||",
            BitwiseAnd => "&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            LeftShift => "<<",
            RightShift => ">>",
            Assign => "=",
            AddAssign => "+=",
            SubtractAssign => "-=",
            MultiplyAssign => "*=",
            DivideAssign => "/=",
            ModulusAssign => "%=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match symbol {
            "+" => Add,
            "-" => Subtract,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulus,
            "==" => Equals,
            "!=" => NotEquals,
            "<" => LessThan,
            ">" => GreaterThan,
            "<=" => LessEquals,
            ">=" => GreaterEquals,
            "&&" => LogicalAnd,
            "||" => LogicalOr,
            "&" => BitwiseAnd,
            "|" => BitwiseOr,
            "^" => BitwiseXor,
            "<<" => LeftShift,
            ">>" => RightShift,
            "=" => Assign,
            "+=" => AddAssign,
            "-=" => SubtractAssign,
            "*=" => MultiplyAssign,
            "/=" => DivideAssign,
            "%=" => ModulusAssign,
            _ => return None,
        })
    }

    pub fn is_assignment(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Assign | AddAssign | SubtractAssign | MultiplyAssign | DivideAssign | ModulusAssign)
    }

    /// Оператор, которому соответствует составное присваивание (`+=` → `+`).
    pub fn compound_base(&self) -> Option<BinaryOp> {
        use BinaryOp::*;
        match self {
            AddAssign => Some(Add),
            SubtractAssign => Some(Subtract),
            MultiplyAssign => Some(Multiply),
            DivideAssign => Some(Divide),
            ModulusAssign => Some(Modulus),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.symbol()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefixOp {
    Not,
    BitwiseNot,
    Negate,
    Increment,
    Decrement,
}

impl PrefixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::BitwiseNot => "~",
            PrefixOp::Negate => "-",
            PrefixOp::Increment => "++",
            PrefixOp::Decrement => "--",
        }
    }

    pub fn is_modifying(&self) -> bool { matches!(self, PrefixOp::Increment | PrefixOp::Decrement) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

/// Компонент вектора/кватерниона (`v.x`, `r.s`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TupleComponent {
    X,
    Y,
    Z,
    S,
}

impl TupleComponent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(TupleComponent::X),
            "y" => Some(TupleComponent::Y),
            "z" => Some(TupleComponent::Z),
            "s" => Some(TupleComponent::S),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TupleComponent::X => "x",
            TupleComponent::Y => "y",
            TupleComponent::Z => "z",
            TupleComponent::S => "s",
        }
    }
}

/// Назначение блока кода.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeType {
    FunctionBody,
    EventHandlerBody,
    AnonymousBlock,
    IfBody,
    ElseIfBody,
    ElseBody,
    WhileLoopBody,
    DoLoopBody,
    ForLoopBody,
}

impl ScopeType {
    pub fn is_body(&self) -> bool { matches!(self, ScopeType::FunctionBody | ScopeType::EventHandlerBody) }

    pub fn is_loop_body(&self) -> bool {
        matches!(self, ScopeType::WhileLoopBody | ScopeType::DoLoopBody | ScopeType::ForLoopBody)
    }
}

/// Почему код признан недостижимым.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadCodeType {
    /// После оператора с гарантированным возвратом.
    AfterReturnPath,
    /// Между безусловным `jump` и его меткой ниже по тексту.
    JumpOverCode,
    /// После безусловного `jump` за пределы текущего блока.
    AfterJumpOutOfScope,
    /// После безусловного `jump` назад (бесконечный цикл).
    AfterJumpLoopForever,
}

impl fmt::Display for DeadCodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeadCodeType::AfterReturnPath => "code after return path",
            DeadCodeType::JumpOverCode => "code jumped over",
            DeadCodeType::AfterJumpOutOfScope => "code after jump out of scope",
            DeadCodeType::AfterJumpLoopForever => "code after infinite jump loop",
        };
        f.write_str(text)
    }
}

/// Где объявлена переменная.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableScope {
    Global,
    Local,
    Parameter,
}
