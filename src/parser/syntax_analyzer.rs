/*!
# LSL Syntax Analyzer

Рекурсивный спуск по токенам LSL. Дерево строится снизу вверх: дочерние узлы
создаются раньше родителя, блоки кода создаются пустыми и наполняются по мере
разбора, поэтому метка всегда оказывается в дереве раньше перехода к ней.

Перед основным проходом выполняется предварительный: собираются заголовки
всех пользовательских функций и имена состояний, чтобы вызовы и `state x;`
могли ссылаться на объявления ниже по тексту. Переходы вперёд (`jump` к метке,
объявленной позже) откладываются до конца тела функции или события.

Синтаксические ошибки раскручиваются до ближайшего оператора: диагностика,
пропуск до `;` или `}` и узел-заглушка вместо оператора. Семантические ошибки
(неизвестные имена, несовпадение типов) заменяют ошибочный узел заглушкой на
месте, не прерывая разбор.
*/

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::lexer::{LslLexer, Token, TokenType};
use super::types;
use super::ParseResult;
use crate::ast_core::{
    BinaryExpression, BinaryOp, CompilationUnit, ControlStatement, Decl, ElseIfStatement, ElseStatement,
    EventHandler, Expr, ExpressionList, ExpressionStatement, FloatLiteral, FunctionDeclaration,
    GlobalVariableDeclaration, IfStatement, IntegerLiteral, LabelStatement, LibraryConstant, ListLiteral,
    LocalVariableDeclaration, NodeId, NodeKind, ParameterDecl, ParameterList, ParenthesizedExpression,
    PostfixExpression, PostfixOp, PrefixExpression, PrefixOp, RotationLiteral, ScopeType, State,
    StateChangeStatement, Stmt, StringLiteral, SyntaxKind, SyntaxTree, TupleAccessor, TupleComponent,
    TypecastExpression, Variable, VariableScope, VectorLiteral,
};
use crate::core::errors::{ContractError, ContractResult};
use crate::core::position::SourceCodeRange;
use crate::diagnostics::{codes, Diagnostic};
use crate::signatures::{FunctionSignature, LibraryDataProvider, LslType, Parameter};

#[derive(Debug, Error)]
enum ParseFailure {
    #[error("{message}")]
    Syntax { message: String, range: SourceCodeRange },
    #[error(transparent)]
    Contract(#[from] ContractError),
}

type PResult<T> = Result<T, ParseFailure>;

#[derive(Debug, Clone)]
struct Symbol {
    ty: LslType,
    scope: VariableScope,
    declaration: NodeId,
}

#[derive(Debug, Clone)]
struct ParsedParameter {
    name: String,
    ty: LslType,
    node: NodeId,
}

/// `jump` к ещё не объявленной метке.
#[derive(Debug)]
struct PendingJump {
    scope: NodeId,
    index: usize,
    name: String,
    range: SourceCodeRange,
    name_range: SourceCodeRange,
    /// Открытые блоки на момент перехода, от внутреннего к внешнему.
    visible: Vec<NodeId>,
}

/// Состояние разбора одного тела функции или события.
#[derive(Debug, Default)]
struct BodyContext {
    return_type: LslType,
    open_scopes: Vec<NodeId>,
    labels: HashMap<NodeId, HashMap<String, NodeId>>,
    label_names: HashSet<String>,
    pending_jumps: Vec<PendingJump>,
}

/// Компоненты `<x, y, z>` разбираются начиная с этого уровня, чтобы `>` закрывал литерал.
const SHIFT_PRECEDENCE: u8 = 8;

fn binary_operator(token: TokenType) -> Option<(u8, BinaryOp)> {
    let entry = match token {
        TokenType::OrOr => (1, BinaryOp::LogicalOr),
        TokenType::AndAnd => (2, BinaryOp::LogicalAnd),
        TokenType::Pipe => (3, BinaryOp::BitwiseOr),
        TokenType::Caret => (4, BinaryOp::BitwiseXor),
        TokenType::Amp => (5, BinaryOp::BitwiseAnd),
        TokenType::Equal => (6, BinaryOp::Equals),
        TokenType::NotEqual => (6, BinaryOp::NotEquals),
        TokenType::Less => (7, BinaryOp::LessThan),
        TokenType::Greater => (7, BinaryOp::GreaterThan),
        TokenType::LessEqual => (7, BinaryOp::LessEquals),
        TokenType::GreaterEqual => (7, BinaryOp::GreaterEquals),
        TokenType::ShiftLeft => (SHIFT_PRECEDENCE, BinaryOp::LeftShift),
        TokenType::ShiftRight => (SHIFT_PRECEDENCE, BinaryOp::RightShift),
        TokenType::Plus => (9, BinaryOp::Add),
        TokenType::Minus => (9, BinaryOp::Subtract),
        TokenType::Star => (10, BinaryOp::Multiply),
        TokenType::Slash => (10, BinaryOp::Divide),
        TokenType::Percent => (10, BinaryOp::Modulus),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(token: TokenType) -> Option<BinaryOp> {
    match token {
        TokenType::Assign => Some(BinaryOp::Assign),
        TokenType::PlusAssign => Some(BinaryOp::AddAssign),
        TokenType::MinusAssign => Some(BinaryOp::SubtractAssign),
        TokenType::StarAssign => Some(BinaryOp::MultiplyAssign),
        TokenType::SlashAssign => Some(BinaryOp::DivideAssign),
        TokenType::PercentAssign => Some(BinaryOp::ModulusAssign),
        _ => None,
    }
}

/// Значение целочисленного литерала. Выход за 32 бита даёт -1, как в LSL.
fn integer_value(text: &str) -> i32 {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse::<u32>().ok(),
    };
    parsed.map(|v| v as i32).unwrap_or(-1)
}

fn float_value(text: &str) -> f64 {
    text.trim_end_matches(['f', 'F']).parse::<f64>().unwrap_or_default()
}

/// LSL syntax analyzer
pub struct SyntaxAnalyzer<'a> {
    /// Current token index
    current_index: usize,
    tokens: Vec<Token>,
    library: &'a dyn LibraryDataProvider,
    tree: SyntaxTree,
    diagnostics: Vec<Diagnostic>,
    /// Стек областей видимости переменных; нулевой кадр это глобальные переменные.
    variables: Vec<HashMap<String, Symbol>>,
    states: HashSet<String>,
    body: BodyContext,
}

impl<'a> SyntaxAnalyzer<'a> {
    pub fn new(library: &'a dyn LibraryDataProvider) -> Self {
        Self {
            current_index: 0,
            tokens: Vec::new(),
            library,
            tree: SyntaxTree::new(),
            diagnostics: Vec::new(),
            variables: vec![HashMap::new()],
            states: HashSet::new(),
            body: BodyContext::default(),
        }
    }

    /// Разобрать исходный текст. Ошибки в тексте возвращаются как данные
    /// ([`ParseResult::diagnostics`] и узлы-заглушки), `Err` означает нарушение
    /// контракта дерева.
    pub fn parse(&mut self, code: &str) -> ContractResult<ParseResult> {
        self.tokens = LslLexer::new().tokenize(code);
        self.current_index = 0;
        self.tree = SyntaxTree::new();
        self.diagnostics.clear();
        self.variables = vec![HashMap::new()];
        self.states.clear();
        self.body = BodyContext::default();

        self.report_lexical_errors();
        self.predefine_functions_and_states();
        let root = self.parse_compilation_unit()?;
        self.tree.set_root(root)?;
        tracing::debug!(
            "Parsed {} tokens into {} nodes, {} diagnostics",
            self.tokens.len(),
            self.tree.len(),
            self.diagnostics.len()
        );
        Ok(ParseResult { tree: std::mem::take(&mut self.tree), diagnostics: std::mem::take(&mut self.diagnostics) })
    }

    fn report_lexical_errors(&mut self) {
        let (errors, tokens): (Vec<Token>, Vec<Token>) =
            std::mem::take(&mut self.tokens).into_iter().partition(|t| t.token_type == TokenType::Error);
        for token in errors {
            self.syntax_error(token.range, format!("unexpected character '{}'", token.value));
        }
        self.tokens = tokens;
    }

    // ---- Предварительный проход ----

    fn predefine_functions_and_states(&mut self) {
        let mut depth = 0usize;
        let mut in_states = false;
        let mut i = 0;
        while i < self.tokens.len() {
            match self.tokens[i].token_type {
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => depth = depth.saturating_sub(1),
                TokenType::Default if depth == 0 => in_states = true,
                TokenType::State if depth == 0 => {
                    in_states = true;
                    if let Some(name) = self.tokens.get(i + 1).filter(|t| t.token_type == TokenType::Identifier) {
                        self.states.insert(name.value.clone());
                    }
                }
                _ if depth == 0 && !in_states && self.at_item_start(i) => {
                    if let Some((signature, next)) = self.scan_function_header(i) {
                        if self.tree.find_signature(&signature.name).is_none() {
                            tracing::trace!("Predefined function {}", signature);
                            self.tree.register_signature(signature);
                        }
                        i = next;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn at_item_start(&self, i: usize) -> bool {
        i == 0 || matches!(self.tokens[i - 1].token_type, TokenType::Semicolon | TokenType::RightBrace)
    }

    /// `type? ID '(' (type ID (',' type ID)*)? ')'`
    fn scan_function_header(&self, start: usize) -> Option<(FunctionSignature, usize)> {
        let token = |i: usize| self.tokens.get(i);
        let mut i = start;
        let return_type = match token(i)?.token_type.as_type() {
            Some(ty) => {
                i += 1;
                ty
            }
            None => LslType::Void,
        };
        let name = token(i).filter(|t| t.token_type == TokenType::Identifier)?.value.clone();
        i += 1;
        if token(i)?.token_type != TokenType::LeftParen {
            return None;
        }
        i += 1;
        let mut parameters = Vec::new();
        if token(i)?.token_type == TokenType::RightParen {
            return Some((FunctionSignature::new(return_type, name, parameters), i + 1));
        }
        loop {
            let ty = token(i)?.token_type.as_type()?;
            let param = token(i + 1).filter(|t| t.token_type == TokenType::Identifier)?.value.clone();
            parameters.push(Parameter::new(ty, param));
            i += 2;
            match token(i)?.token_type {
                TokenType::Comma => i += 1,
                TokenType::RightParen => return Some((FunctionSignature::new(return_type, name, parameters), i + 1)),
                _ => return None,
            }
        }
    }

    // ---- Верхний уровень ----

    fn parse_compilation_unit(&mut self) -> ContractResult<NodeId> {
        let start = self.current_position();
        let mut items = Vec::new();
        while !self.match_any_token(&[TokenType::Default, TokenType::State, TokenType::Eof]) {
            let item_start = self.current_position();
            let (kind, result) = if self.is_function_header() {
                (SyntaxKind::FunctionDeclaration, self.parse_function_declaration())
            } else {
                (SyntaxKind::GlobalVariableDeclaration, self.parse_global_variable())
            };
            items.push(self.recover_top_level(result, kind, item_start)?);
        }

        let mut defined_states = HashSet::new();
        let mut default_state = None;
        if self.match_token(&TokenType::Default) {
            let state_start = self.current_position();
            let result = self.parse_state(&mut defined_states);
            default_state = Some(self.recover_top_level(result, SyntaxKind::State, state_start)?);
        } else {
            let range = self.current_position();
            self.syntax_error(range, "missing default state".to_string());
        }

        let mut states = Vec::new();
        while !self.match_token(&TokenType::Eof) {
            let state_start = self.current_position();
            if self.match_any_token(&[TokenType::State, TokenType::Default]) {
                let result = self.parse_state(&mut defined_states);
                states.push(self.recover_top_level(result, SyntaxKind::State, state_start)?);
            } else {
                let failure = self.unexpected("state declaration");
                let node = self.recover_top_level(Err(failure), SyntaxKind::State, state_start)?;
                states.push(node);
            }
        }

        let range = self.span_from(start);
        let unit = CompilationUnit { items, default_state, states };
        self.tree.add(Decl::CompilationUnit(unit), Some(range))
    }

    fn is_function_header(&self) -> bool {
        let first = self.peek_type();
        if first.as_type().is_some() {
            self.peek_at(1) == TokenType::Identifier && self.peek_at(2) == TokenType::LeftParen
        } else {
            first == TokenType::Identifier && self.peek_at(1) == TokenType::LeftParen
        }
    }

    fn recover_top_level(&mut self, result: PResult<NodeId>, kind: SyntaxKind, start: SourceCodeRange) -> ContractResult<NodeId> {
        match result {
            Ok(id) => Ok(id),
            Err(ParseFailure::Contract(e)) => Err(e),
            Err(ParseFailure::Syntax { message, range }) => {
                self.syntax_error(range, message);
                self.skip_top_level();
                self.reset_body();
                let range = self.span_from(start);
                Ok(self.tree.error_node(kind, Some(range)))
            }
        }
    }

    fn parse_global_variable(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let ty = self.expect_type()?;
        let (name, name_range) = self.expect_identifier()?;
        let initializer = self.parse_initializer()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        if self.variables[0].contains_key(&name) {
            let message = format!("global variable \"{}\" is already defined", name);
            return Ok(self.semantic_error(SyntaxKind::GlobalVariableDeclaration, range, codes::DUPLICATE_DECLARATION, message));
        }
        let id = match self.initializer_mismatch(ty, initializer) {
            Some(found) => {
                let message = format!("cannot initialize {} variable \"{}\" with {}", ty, name, found);
                self.semantic_error(SyntaxKind::GlobalVariableDeclaration, range, codes::TYPE_MISMATCH, message)
            }
            None => {
                let decl = GlobalVariableDeclaration { name: name.clone(), ty, initializer };
                let id = self.tree.add(Decl::GlobalVariableDeclaration(decl), Some(range))?;
                self.tree.set_detail_range(id, name_range);
                id
            }
        };
        self.variables[0].insert(name, Symbol { ty, scope: VariableScope::Global, declaration: id });
        Ok(id)
    }

    fn parse_function_declaration(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let return_type = match self.peek_type().as_type() {
            Some(ty) => {
                self.advance();
                ty
            }
            None => LslType::Void,
        };
        let (name, name_range) = self.expect_identifier()?;
        let (parameters, params) = self.parse_parameter_list()?;

        self.enter_body(return_type, &params);
        let body = self.parse_braced_scope(ScopeType::FunctionBody, false)?;
        self.leave_body()?;
        let range = self.span_from(start);

        let existing = self.tree.find_signature(&name);
        let already_defined = existing.map(|s| self.tree.signature(s).definition().is_some()).unwrap_or(false);
        if already_defined || self.library.is_function(&name) {
            let message = format!("function \"{}\" is already defined", name);
            return Ok(self.semantic_error(SyntaxKind::FunctionDeclaration, range, codes::DUPLICATE_DECLARATION, message));
        }
        let signature = match existing {
            Some(id) => id,
            None => {
                let params = params.iter().map(|p| Parameter::new(p.ty, p.name.clone())).collect();
                self.tree.register_signature(FunctionSignature::new(return_type, name.clone(), params))
            }
        };
        let decl = FunctionDeclaration { name, return_type, parameters, body, signature };
        let id = self.tree.add(Decl::FunctionDeclaration(decl), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        self.tree.bind_definition(signature, id)?;
        Ok(id)
    }

    fn parse_parameter_list(&mut self) -> PResult<(NodeId, Vec<ParsedParameter>)> {
        let start = self.current_position();
        self.expect(TokenType::LeftParen, "'('")?;
        let mut params: Vec<ParsedParameter> = Vec::new();
        let mut nodes = Vec::new();
        if !self.match_token(&TokenType::RightParen) {
            loop {
                let param_start = self.current_position();
                let ty = self.expect_type()?;
                let (name, name_range) = self.expect_identifier()?;
                let range = self.span_from(param_start);
                let node = if params.iter().any(|p| p.name == name) {
                    let message = format!("parameter \"{}\" is already defined", name);
                    self.semantic_error(SyntaxKind::Parameter, range, codes::DUPLICATE_DECLARATION, message)
                } else {
                    let decl = ParameterDecl { name: name.clone(), ty, index: nodes.len() };
                    let id = self.tree.add(Decl::Parameter(decl), Some(range))?;
                    self.tree.set_detail_range(id, name_range);
                    id
                };
                params.push(ParsedParameter { name, ty, node });
                nodes.push(node);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenType::RightParen, "')'")?;
        let range = self.span_from(start);
        let list = self.tree.add(Decl::ParameterList(ParameterList { params: nodes }), Some(range))?;
        Ok((list, params))
    }

    fn parse_state(&mut self, defined: &mut HashSet<String>) -> PResult<NodeId> {
        let start = self.current_position();
        let (name, name_range) = if self.match_token(&TokenType::Default) {
            (None, self.advance().range)
        } else {
            self.expect(TokenType::State, "'state'")?;
            let (name, range) = self.expect_identifier()?;
            (Some(name), range)
        };
        self.expect(TokenType::LeftBrace, "'{'")?;

        let mut events = Vec::new();
        let mut handlers = HashSet::new();
        while !self.match_any_token(&[TokenType::RightBrace, TokenType::Eof]) {
            let event_start = self.current_position();
            match self.parse_event_handler(&mut handlers) {
                Ok(id) => events.push(id),
                Err(ParseFailure::Contract(e)) => return Err(e.into()),
                Err(ParseFailure::Syntax { message, range }) => {
                    self.syntax_error(range, message);
                    self.skip_statement();
                    self.reset_body();
                    let range = self.span_from(event_start);
                    events.push(self.tree.error_node(SyntaxKind::EventHandler, Some(range)));
                }
            }
        }
        self.expect(TokenType::RightBrace, "'}'")?;
        let range = self.span_from(start);

        let state = State { name, events };
        if !defined.insert(state.display_name().to_string()) {
            let message = format!("state \"{}\" is already defined", state.display_name());
            return Ok(self.semantic_error(SyntaxKind::State, range, codes::DUPLICATE_DECLARATION, message));
        }
        let id = self.tree.add(Decl::State(state), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        Ok(id)
    }

    fn parse_event_handler(&mut self, handlers: &mut HashSet<String>) -> PResult<NodeId> {
        let start = self.current_position();
        let (name, name_range) = self.expect_identifier()?;
        let (parameters, params) = self.parse_parameter_list()?;

        self.enter_body(LslType::Void, &params);
        let body = self.parse_braced_scope(ScopeType::EventHandlerBody, false)?;
        self.leave_body()?;
        let range = self.span_from(start);

        let library = self.library;
        let problem = match library.event(&name) {
            None => Some((codes::UNKNOWN_EVENT, format!("unknown event handler \"{}\"", name))),
            Some(sig) if !sig.parameter_types().eq(params.iter().map(|p| p.ty)) => Some((
                codes::EVENT_PARAMETER_MISMATCH,
                format!("parameters of event handler \"{}\" do not match \"{}\"", name, sig),
            )),
            Some(_) if !handlers.insert(name.clone()) => {
                Some((codes::DUPLICATE_DECLARATION, format!("event handler \"{}\" is already defined in this state", name)))
            }
            Some(_) => None,
        };
        if let Some((code, message)) = problem {
            return Ok(self.semantic_error(SyntaxKind::EventHandler, range, code, message));
        }
        let id = self.tree.add(Decl::EventHandler(EventHandler { name, parameters, body }), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        Ok(id)
    }

    // ---- Тела функций и событий ----

    fn enter_body(&mut self, return_type: LslType, params: &[ParsedParameter]) {
        self.body = BodyContext { return_type, ..Default::default() };
        let mut frame = HashMap::new();
        for p in params {
            frame
                .entry(p.name.clone())
                .or_insert(Symbol { ty: p.ty, scope: VariableScope::Parameter, declaration: p.node });
        }
        self.variables.push(frame);
    }

    fn leave_body(&mut self) -> ContractResult<()> {
        self.resolve_pending_jumps()?;
        self.reset_body();
        Ok(())
    }

    fn reset_body(&mut self) {
        self.variables.truncate(1);
        self.body = BodyContext::default();
    }

    /// Построить отложенные переходы вперёд. Узлы создаются в порядке исходника,
    /// а вставляются с конца, чтобы сохранённые позиции оставались верными.
    fn resolve_pending_jumps(&mut self) -> ContractResult<()> {
        let pending = std::mem::take(&mut self.body.pending_jumps);
        let mut built = Vec::with_capacity(pending.len());
        for jump in pending {
            let label = jump
                .visible
                .iter()
                .find_map(|scope| self.body.labels.get(scope).and_then(|m| m.get(&jump.name)).copied());
            let node = match label {
                Some(label) => {
                    let id = self.tree.jump(label, Some(jump.range))?;
                    self.tree.set_detail_range(id, jump.name_range);
                    id
                }
                None => {
                    let message = format!("label \"{}\" is not defined in this scope", jump.name);
                    self.semantic_error(SyntaxKind::JumpStatement, jump.range, codes::UNDEFINED_LABEL, message)
                }
            };
            built.push((jump.scope, jump.index, node));
        }
        for (scope, index, node) in built.into_iter().rev() {
            self.tree.insert_statement(scope, index, node)?;
        }
        Ok(())
    }

    fn open_scope(&mut self, scope: NodeId, new_frame: bool) {
        self.body.open_scopes.push(scope);
        if new_frame {
            self.variables.push(HashMap::new());
        }
    }

    fn close_scope(&mut self, new_frame: bool) {
        self.body.open_scopes.pop();
        if new_frame {
            self.variables.pop();
        }
    }

    /// `{ statement* }`. Для тел функций и событий кадр переменных уже открыт параметрами.
    fn parse_braced_scope(&mut self, scope_type: ScopeType, new_frame: bool) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::LeftBrace, "'{'")?;
        let scope = self.tree.code_scope(scope_type, false, None);
        self.open_scope(scope, new_frame);
        let result = self.parse_statements_until_brace(scope);
        self.close_scope(new_frame);
        result?;
        let range = self.span_from(start);
        self.tree.set_range(scope, range);
        Ok(scope)
    }

    fn parse_statements_until_brace(&mut self, scope: NodeId) -> PResult<()> {
        while !self.match_any_token(&[TokenType::RightBrace, TokenType::Eof]) {
            self.parse_statement_into(scope)?;
        }
        self.expect(TokenType::RightBrace, "'}'")?;
        Ok(())
    }

    /// Тело управляющей конструкции: блок в скобках или одиночный оператор.
    fn parse_body_statement(&mut self, scope_type: ScopeType) -> PResult<NodeId> {
        if self.match_token(&TokenType::LeftBrace) {
            return self.parse_braced_scope(scope_type, true);
        }
        let start = self.current_position();
        if self.peek_type().as_type().is_some() {
            self.syntax_error(start, "declaration requires a new scope, use { and }".to_string());
        }
        let scope = self.tree.code_scope(scope_type, true, None);
        self.open_scope(scope, true);
        let result = self.parse_statement_into(scope);
        self.close_scope(true);
        result?;
        let range = self.span_from(start);
        self.tree.set_range(scope, range);
        Ok(scope)
    }

    /// Разобрать один оператор и добавить его в блок; синтаксическая ошибка
    /// превращается в заглушку.
    fn parse_statement_into(&mut self, scope: NodeId) -> ContractResult<()> {
        let start = self.current_position();
        let kind = self.statement_kind();
        match self.parse_statement(scope) {
            Ok(Some(statement)) => self.tree.push_statement(scope, statement)?,
            Ok(None) => {}
            Err(ParseFailure::Contract(e)) => return Err(e),
            Err(ParseFailure::Syntax { message, range }) => {
                self.syntax_error(range, message);
                self.skip_statement();
                let range = self.span_from(start);
                let error = self.tree.error_node(kind, Some(range));
                self.tree.push_statement(scope, error)?;
            }
        }
        Ok(())
    }

    fn statement_kind(&self) -> SyntaxKind {
        match self.peek_type() {
            TokenType::If => SyntaxKind::ControlStatement,
            TokenType::While => SyntaxKind::WhileLoop,
            TokenType::Do => SyntaxKind::DoLoop,
            TokenType::For => SyntaxKind::ForLoop,
            TokenType::Jump => SyntaxKind::JumpStatement,
            TokenType::At => SyntaxKind::LabelStatement,
            TokenType::Return => SyntaxKind::ReturnStatement,
            TokenType::State => SyntaxKind::StateChangeStatement,
            TokenType::LeftBrace => SyntaxKind::CodeScope,
            TokenType::Semicolon => SyntaxKind::SemicolonStatement,
            t if t.as_type().is_some() => SyntaxKind::LocalVariableDeclaration,
            _ => SyntaxKind::ExpressionStatement,
        }
    }

    /// `None` для перехода вперёд: он будет вставлен в блок по завершении тела.
    fn parse_statement(&mut self, scope: NodeId) -> PResult<Option<NodeId>> {
        let node = match self.peek_type() {
            TokenType::Semicolon => {
                let token = self.advance();
                self.tree.add(Stmt::SemicolonStatement, Some(token.range))?
            }
            TokenType::LeftBrace => self.parse_braced_scope(ScopeType::AnonymousBlock, true)?,
            TokenType::If => self.parse_control_statement()?,
            TokenType::While => self.parse_while_loop()?,
            TokenType::Do => self.parse_do_loop()?,
            TokenType::For => self.parse_for_loop()?,
            TokenType::Jump => return self.parse_jump(scope),
            TokenType::At => self.parse_label()?,
            TokenType::Return => self.parse_return()?,
            TokenType::State => self.parse_state_change()?,
            t if t.as_type().is_some() => self.parse_local_variable()?,
            _ => self.parse_expression_statement()?,
        };
        Ok(Some(node))
    }

    fn parse_control_statement(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::If, "'if'")?;
        let condition = self.parse_condition()?;
        let body = self.parse_body_statement(ScopeType::IfBody)?;
        let range = self.span_from(start);
        let if_branch = self.tree.add(Stmt::IfStatement(IfStatement { condition, body }), Some(range))?;

        let mut else_ifs = Vec::new();
        let mut else_branch = None;
        while self.match_token(&TokenType::Else) {
            let branch_start = self.current_position();
            self.advance();
            if self.match_token(&TokenType::If) {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_body_statement(ScopeType::ElseIfBody)?;
                let range = self.span_from(branch_start);
                else_ifs.push(self.tree.add(Stmt::ElseIfStatement(ElseIfStatement { condition, body }), Some(range))?);
            } else {
                let body = self.parse_body_statement(ScopeType::ElseBody)?;
                let range = self.span_from(branch_start);
                else_branch = Some(self.tree.add(Stmt::ElseStatement(ElseStatement { body }), Some(range))?);
                break;
            }
        }
        let range = self.span_from(start);
        let control = ControlStatement { if_branch, else_ifs, else_branch };
        Ok(self.tree.add(Stmt::ControlStatement(control), Some(range))?)
    }

    fn parse_while_loop(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::While, "'while'")?;
        let condition = self.parse_condition()?;
        let body = self.parse_body_statement(ScopeType::WhileLoopBody)?;
        let range = self.span_from(start);
        Ok(self.tree.while_loop(Some(condition), Some(body), Some(range))?)
    }

    fn parse_do_loop(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::Do, "'do'")?;
        let body = self.parse_body_statement(ScopeType::DoLoopBody)?;
        self.expect(TokenType::While, "'while'")?;
        let condition = self.parse_condition()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);
        Ok(self.tree.do_loop(Some(body), Some(condition), Some(range))?)
    }

    fn parse_for_loop(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::For, "'for'")?;
        self.expect(TokenType::LeftParen, "'('")?;
        let init = self.parse_optional_expression_list(TokenType::Semicolon)?;
        self.expect(TokenType::Semicolon, "';'")?;
        let condition = if self.match_token(&TokenType::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenType::Semicolon, "';'")?;
        let after = self.parse_optional_expression_list(TokenType::RightParen)?;
        self.expect(TokenType::RightParen, "')'")?;
        let body = self.parse_body_statement(ScopeType::ForLoopBody)?;
        let range = self.span_from(start);
        Ok(self.tree.for_loop(init, condition, after, Some(body), Some(range))?)
    }

    fn parse_optional_expression_list(&mut self, close: TokenType) -> PResult<Option<NodeId>> {
        if self.match_token(&close) {
            return Ok(None);
        }
        let items = self.parse_arguments(close)?;
        Ok(Some(self.expression_list(items)?))
    }

    fn parse_jump(&mut self, scope: NodeId) -> PResult<Option<NodeId>> {
        let start = self.current_position();
        self.expect(TokenType::Jump, "'jump'")?;
        let (name, name_range) = self.expect_identifier()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        if let Some(label) = self.visible_label(&name) {
            let id = self.tree.jump(label, Some(range))?;
            self.tree.set_detail_range(id, name_range);
            return Ok(Some(id));
        }
        let index = self.tree.scope_statements(scope)?.len();
        let visible = self.body.open_scopes.iter().rev().copied().collect();
        self.body.pending_jumps.push(PendingJump { scope, index, name, range, name_range, visible });
        Ok(None)
    }

    fn visible_label(&self, name: &str) -> Option<NodeId> {
        self.body
            .open_scopes
            .iter()
            .rev()
            .find_map(|scope| self.body.labels.get(scope).and_then(|m| m.get(name)).copied())
    }

    fn parse_label(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::At, "'@'")?;
        let (name, name_range) = self.expect_identifier()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        if !self.body.label_names.insert(name.clone()) {
            let message = format!("label \"{}\" is already defined", name);
            return Ok(self.semantic_error(SyntaxKind::LabelStatement, range, codes::DUPLICATE_DECLARATION, message));
        }
        let id = self.tree.add(Stmt::LabelStatement(LabelStatement { name: name.clone() }), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        if let Some(scope) = self.body.open_scopes.last() {
            self.body.labels.entry(*scope).or_default().insert(name, id);
        }
        Ok(id)
    }

    fn parse_return(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::Return, "'return'")?;
        let value = if self.match_token(&TokenType::Semicolon) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        let expected = self.body.return_type;
        let problem = match value {
            None if !expected.is_void() => Some(format!("function must return a value of type {}", expected)),
            Some(_) if expected.is_void() => Some("cannot return a value from a function without return type".to_string()),
            Some(v) if !self.is_error(v) && !expected.is_assignable_from(self.tree.expr_type(v)) => {
                Some(format!("cannot return {} from a function returning {}", self.tree.expr_type(v), expected))
            }
            _ => None,
        };
        if let Some(message) = problem {
            return Ok(self.semantic_error(SyntaxKind::ReturnStatement, range, codes::RETURN_TYPE_MISMATCH, message));
        }
        Ok(self.tree.return_statement(value, Some(range))?)
    }

    fn parse_state_change(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::State, "'state'")?;
        let (state, name_range) = if self.match_token(&TokenType::Default) {
            let token = self.advance();
            ("default".to_string(), token.range)
        } else {
            self.expect_identifier()?
        };
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        if state != "default" && !self.states.contains(&state) {
            let message = format!("state \"{}\" is not defined", state);
            return Ok(self.semantic_error(SyntaxKind::StateChangeStatement, range, codes::UNKNOWN_STATE, message));
        }
        let id = self.tree.add(Stmt::StateChangeStatement(StateChangeStatement { state }), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        Ok(id)
    }

    fn parse_local_variable(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let ty = self.expect_type()?;
        let (name, name_range) = self.expect_identifier()?;
        let initializer = self.parse_initializer()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);

        if self.variables.last().map(|f| f.contains_key(&name)).unwrap_or(false) {
            let message = format!("local variable \"{}\" is already defined in this scope", name);
            return Ok(self.semantic_error(SyntaxKind::LocalVariableDeclaration, range, codes::DUPLICATE_DECLARATION, message));
        }
        let id = match self.initializer_mismatch(ty, initializer) {
            Some(found) => {
                let message = format!("cannot initialize {} variable \"{}\" with {}", ty, name, found);
                self.semantic_error(SyntaxKind::LocalVariableDeclaration, range, codes::TYPE_MISMATCH, message)
            }
            None => {
                let decl = LocalVariableDeclaration { name: name.clone(), ty, initializer };
                let id = self.tree.add(Stmt::LocalVariableDeclaration(decl), Some(range))?;
                self.tree.set_detail_range(id, name_range);
                id
            }
        };
        if let Some(frame) = self.variables.last_mut() {
            frame.insert(name, Symbol { ty, scope: VariableScope::Local, declaration: id });
        }
        Ok(id)
    }

    fn parse_initializer(&mut self) -> PResult<Option<NodeId>> {
        if !self.match_token(&TokenType::Assign) {
            return Ok(None);
        }
        self.advance();
        Ok(Some(self.parse_expression()?))
    }

    /// Тип инициализатора, если он несовместим с объявленным типом.
    fn initializer_mismatch(&self, ty: LslType, initializer: Option<NodeId>) -> Option<LslType> {
        let init = initializer?;
        if self.is_error(init) {
            return None;
        }
        let found = self.tree.expr_type(init);
        (!ty.is_assignable_from(found)).then_some(found)
    }

    fn parse_expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let expr = self.parse_expression()?;
        self.expect(TokenType::Semicolon, "';'")?;
        let range = self.span_from(start);
        Ok(self.tree.add(Stmt::ExpressionStatement(ExpressionStatement { expr }), Some(range))?)
    }

    fn parse_condition(&mut self) -> PResult<NodeId> {
        self.expect(TokenType::LeftParen, "'('")?;
        let expr = self.parse_expression()?;
        self.expect(TokenType::RightParen, "')'")?;
        if !self.is_error(expr) && self.tree.expr_type(expr).is_void() {
            let range = self.node_range(expr);
            let kind = self.tree.syntax_kind(expr);
            return Ok(self.semantic_error(kind, range, codes::TYPE_MISMATCH, "condition expression has no value".to_string()));
        }
        Ok(expr)
    }

    // ---- Выражения ----

    fn parse_expression(&mut self) -> PResult<NodeId> { self.parse_assignment() }

    fn parse_assignment(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let left = self.parse_binary(1)?;
        let Some(op) = assignment_operator(self.peek_type()) else {
            return Ok(left);
        };
        let op_token = self.advance();
        let right = self.parse_assignment()?;
        let range = self.span_from(start);
        if !self.is_error(left) && !self.is_assignable_target(left) {
            let message = format!("left side of '{}' must be a variable", op);
            return Ok(self.semantic_error(SyntaxKind::BinaryExpression, range, codes::NOT_ASSIGNABLE, message));
        }
        self.binary_node(op, left, right, range, op_token.range)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> PResult<NodeId> {
        let start = self.current_position();
        let mut left = self.parse_unary()?;
        while let Some((precedence, op)) = binary_operator(self.peek_type()) {
            if precedence < min_precedence {
                break;
            }
            let op_token = self.advance();
            let right = self.parse_binary(precedence + 1)?;
            let range = self.span_from(start);
            left = self.binary_node(op, left, right, range, op_token.range)?;
        }
        Ok(left)
    }

    fn binary_node(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        range: SourceCodeRange,
        op_range: SourceCodeRange,
    ) -> PResult<NodeId> {
        if self.is_error(left) || self.is_error(right) {
            return Ok(self.tree.error_node(SyntaxKind::BinaryExpression, Some(range)));
        }
        let (lt, rt) = (self.tree.expr_type(left), self.tree.expr_type(right));
        let Some(ty) = types::binary_result(op, lt, rt) else {
            let diagnostic = Diagnostic::error(range, codes::TYPE_MISMATCH, format!("operator '{}' cannot be applied to {} and {}", op, lt, rt))
                .with_found(format!("{} {} {}", lt, op, rt));
            self.diagnostics.push(diagnostic);
            return Ok(self.tree.error_node(SyntaxKind::BinaryExpression, Some(range)));
        };
        let id = self.tree.add(Expr::BinaryExpression(BinaryExpression { op, left, right, ty }), Some(range))?;
        self.tree.set_detail_range(id, op_range);
        Ok(id)
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let op = match self.peek_type() {
            TokenType::Bang => Some(PrefixOp::Not),
            TokenType::Tilde => Some(PrefixOp::BitwiseNot),
            TokenType::Minus => Some(PrefixOp::Negate),
            TokenType::Increment => Some(PrefixOp::Increment),
            TokenType::Decrement => Some(PrefixOp::Decrement),
            _ => None,
        };
        if let Some(op) = op {
            let op_token = self.advance();
            let operand = self.parse_unary()?;
            let range = self.span_from(start);
            return self.prefix_node(op, operand, range, op_token.range);
        }
        if self.is_cast() {
            self.advance();
            let cast_to = self.expect_type()?;
            self.expect(TokenType::RightParen, "')'")?;
            let operand = self.parse_unary()?;
            let range = self.span_from(start);
            if self.is_error(operand) {
                return Ok(self.tree.error_node(SyntaxKind::TypecastExpression, Some(range)));
            }
            let from = self.tree.expr_type(operand);
            if !types::cast_valid(cast_to, from) {
                let message = format!("cannot cast {} to {}", from, cast_to);
                return Ok(self.semantic_error(SyntaxKind::TypecastExpression, range, codes::INVALID_CAST, message));
            }
            return Ok(self.tree.add(Expr::TypecastExpression(TypecastExpression { cast_to, operand }), Some(range))?);
        }
        self.parse_postfix()
    }

    fn is_cast(&self) -> bool {
        self.peek_type() == TokenType::LeftParen
            && self.peek_at(1).as_type().is_some()
            && self.peek_at(2) == TokenType::RightParen
    }

    fn prefix_node(&mut self, op: PrefixOp, operand: NodeId, range: SourceCodeRange, op_range: SourceCodeRange) -> PResult<NodeId> {
        if self.is_error(operand) {
            return Ok(self.tree.error_node(SyntaxKind::PrefixExpression, Some(range)));
        }
        if op.is_modifying() && !self.is_assignable_target(operand) {
            let message = format!("operand of '{}' must be a variable", op.symbol());
            return Ok(self.semantic_error(SyntaxKind::PrefixExpression, range, codes::NOT_ASSIGNABLE, message));
        }
        let operand_type = self.tree.expr_type(operand);
        let Some(ty) = types::prefix_result(op, operand_type) else {
            let message = format!("operator '{}' cannot be applied to {}", op.symbol(), operand_type);
            return Ok(self.semantic_error(SyntaxKind::PrefixExpression, range, codes::TYPE_MISMATCH, message));
        };
        let id = self.tree.add(Expr::PrefixExpression(PrefixExpression { op, operand, ty }), Some(range))?;
        self.tree.set_detail_range(id, op_range);
        Ok(id)
    }

    fn parse_postfix(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_type() {
                TokenType::Dot => {
                    self.advance();
                    let (name, name_range) = self.expect_identifier()?;
                    let component = TupleComponent::from_name(&name).ok_or_else(|| ParseFailure::Syntax {
                        message: format!("unknown component '{}', expected x, y, z or s", name),
                        range: name_range,
                    })?;
                    let range = self.span_from(start);
                    expr = self.tuple_accessor(expr, component, range, name_range)?;
                }
                TokenType::Increment | TokenType::Decrement => {
                    let op_token = self.advance();
                    let op = if op_token.token_type == TokenType::Increment { PostfixOp::Increment } else { PostfixOp::Decrement };
                    let range = self.span_from(start);
                    expr = self.postfix_node(op, expr, range, op_token.range)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn tuple_accessor(
        &mut self,
        target: NodeId,
        component: TupleComponent,
        range: SourceCodeRange,
        name_range: SourceCodeRange,
    ) -> PResult<NodeId> {
        if self.is_error(target) {
            return Ok(self.tree.error_node(SyntaxKind::TupleAccessor, Some(range)));
        }
        let ty = self.tree.expr_type(target);
        let valid = match ty {
            LslType::Vector => component != TupleComponent::S,
            LslType::Rotation => true,
            _ => false,
        };
        if !valid {
            let message = format!("{} has no component '{}'", ty, component.name());
            return Ok(self.semantic_error(SyntaxKind::TupleAccessor, range, codes::TYPE_MISMATCH, message));
        }
        let id = self.tree.add(Expr::TupleAccessor(TupleAccessor { target, component }), Some(range))?;
        self.tree.set_detail_range(id, name_range);
        Ok(id)
    }

    fn postfix_node(&mut self, op: PostfixOp, operand: NodeId, range: SourceCodeRange, op_range: SourceCodeRange) -> PResult<NodeId> {
        if self.is_error(operand) {
            return Ok(self.tree.error_node(SyntaxKind::PostfixExpression, Some(range)));
        }
        if !self.is_assignable_target(operand) {
            let message = format!("operand of '{}' must be a variable", op.symbol());
            return Ok(self.semantic_error(SyntaxKind::PostfixExpression, range, codes::NOT_ASSIGNABLE, message));
        }
        let operand_type = self.tree.expr_type(operand);
        let Some(ty) = types::postfix_result(op, operand_type) else {
            let message = format!("operator '{}' cannot be applied to {}", op.symbol(), operand_type);
            return Ok(self.semantic_error(SyntaxKind::PostfixExpression, range, codes::TYPE_MISMATCH, message));
        };
        let id = self.tree.add(Expr::PostfixExpression(PostfixExpression { op, operand, ty }), Some(range))?;
        self.tree.set_detail_range(id, op_range);
        Ok(id)
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        let token = self.peek().clone();
        match token.token_type {
            TokenType::IntegerLiteral | TokenType::HexIntegerLiteral => {
                self.advance();
                let value = integer_value(&token.value);
                Ok(self.tree.add(Expr::IntegerLiteral(IntegerLiteral { text: token.value, value }), Some(token.range))?)
            }
            TokenType::FloatLiteral => {
                self.advance();
                let value = float_value(&token.value);
                Ok(self.tree.add(Expr::FloatLiteral(FloatLiteral { text: token.value, value }), Some(token.range))?)
            }
            TokenType::StringLiteral => {
                self.advance();
                Ok(self.tree.add(Expr::StringLiteral(StringLiteral { text: token.value }), Some(token.range))?)
            }
            TokenType::Less => self.parse_vector_or_rotation(),
            TokenType::LeftBracket => self.parse_list(),
            TokenType::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RightParen, "')'")?;
                let range = self.span_from(token.range);
                if self.is_error(inner) {
                    return Ok(self.tree.error_node(SyntaxKind::ParenthesizedExpression, Some(range)));
                }
                Ok(self.tree.add(Expr::ParenthesizedExpression(ParenthesizedExpression { inner }), Some(range))?)
            }
            TokenType::Identifier if self.peek_at(1) == TokenType::LeftParen => self.parse_call(),
            TokenType::Identifier => {
                self.advance();
                self.resolve_variable(token.value, token.range)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_vector_or_rotation(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::Less, "'<'")?;
        let mut components = vec![self.parse_binary(SHIFT_PRECEDENCE)?];
        while self.match_token(&TokenType::Comma) && components.len() < 4 {
            self.advance();
            components.push(self.parse_binary(SHIFT_PRECEDENCE)?);
        }
        self.expect(TokenType::Greater, "'>'")?;
        let range = self.span_from(start);
        let kind = match components.len() {
            3 => SyntaxKind::VectorLiteral,
            4 => SyntaxKind::RotationLiteral,
            _ => {
                return Err(ParseFailure::Syntax {
                    message: "vector literal requires 3 components, rotation literal requires 4".to_string(),
                    range,
                })
            }
        };
        if components.iter().any(|c| self.is_error(*c)) {
            return Ok(self.tree.error_node(kind, Some(range)));
        }
        if let Some(bad) = components.iter().find(|c| !matches!(self.tree.expr_type(**c), LslType::Integer | LslType::Float)) {
            let message = format!("{} component must be integer or float, found {}", kind, self.tree.expr_type(*bad));
            return Ok(self.semantic_error(kind, range, codes::TYPE_MISMATCH, message));
        }
        let node = match components[..] {
            [x, y, z] => Expr::VectorLiteral(VectorLiteral { x, y, z }),
            [x, y, z, s] => Expr::RotationLiteral(RotationLiteral { x, y, z, s }),
            _ => return Ok(self.tree.error_node(kind, Some(range))),
        };
        Ok(self.tree.add(node, Some(range))?)
    }

    fn parse_list(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        self.expect(TokenType::LeftBracket, "'['")?;
        let items = self.parse_arguments(TokenType::RightBracket)?;
        self.expect(TokenType::RightBracket, "']'")?;
        let range = self.span_from(start);
        if items.iter().any(|i| self.is_error(*i)) {
            return Ok(self.tree.error_node(SyntaxKind::ListLiteral, Some(range)));
        }
        if let Some(bad) = items.iter().find(|i| matches!(self.tree.expr_type(**i), LslType::List | LslType::Void)) {
            let message = format!("list element cannot be of type {}", self.tree.expr_type(*bad));
            return Ok(self.semantic_error(SyntaxKind::ListLiteral, range, codes::TYPE_MISMATCH, message));
        }
        let items = self.expression_list(items)?;
        Ok(self.tree.add(Expr::ListLiteral(ListLiteral { items }), Some(range))?)
    }

    /// Выражения через запятую до закрывающего токена (сам токен не потребляется).
    fn parse_arguments(&mut self, close: TokenType) -> PResult<Vec<NodeId>> {
        let mut items = Vec::new();
        if self.match_token(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
            self.advance();
        }
        Ok(items)
    }

    fn expression_list(&mut self, items: Vec<NodeId>) -> ContractResult<NodeId> {
        let range = SourceCodeRange::spanning(items.iter().filter_map(|i| self.tree.node(*i).range()));
        self.tree.add(Expr::ExpressionList(ExpressionList { items }), range)
    }

    fn parse_call(&mut self) -> PResult<NodeId> {
        let start = self.current_position();
        let (name, name_range) = self.expect_identifier()?;
        self.expect(TokenType::LeftParen, "'('")?;
        let args = self.parse_arguments(TokenType::RightParen)?;
        self.expect(TokenType::RightParen, "')'")?;
        let range = self.span_from(start);

        let user = self.tree.find_signature(&name);
        let kind = if user.is_some() { SyntaxKind::UserFunctionCall } else { SyntaxKind::LibraryFunctionCall };
        if args.iter().any(|a| self.is_error(*a)) {
            return Ok(self.tree.error_node(kind, Some(range)));
        }
        let arg_types: Vec<LslType> = args.iter().map(|a| self.tree.expr_type(*a)).collect();

        if let Some(sid) = user {
            let signature = self.tree.signature(sid).signature().clone();
            if let Err(index) = signature.check_arguments(&arg_types) {
                return Ok(self.call_mismatch(kind, &signature, index, &arg_types, range));
            }
            let arguments = self.expression_list(args)?;
            let id = self.tree.user_call(sid, arguments, Some(range))?;
            self.tree.set_detail_range(id, name_range);
            return Ok(id);
        }

        let library = self.library;
        let overloads = library.functions(&name);
        if overloads.is_empty() {
            let message = format!("function \"{}\" is not defined", name);
            return Ok(self.semantic_error(SyntaxKind::UserFunctionCall, range, codes::UNDEFINED_FUNCTION, message));
        }
        match overloads.iter().find(|s| s.check_arguments(&arg_types).is_ok()) {
            Some(signature) => {
                let signature = (*signature).clone();
                let arguments = self.expression_list(args)?;
                let id = self.tree.library_call(signature, arguments, Some(range))?;
                self.tree.set_detail_range(id, name_range);
                Ok(id)
            }
            None => {
                // для сообщения берётся перегрузка с подходящим числом аргументов, если есть
                let (signature, index) = overloads
                    .iter()
                    .map(|s| (*s, s.check_arguments(&arg_types).err().unwrap_or(usize::MAX)))
                    .min_by_key(|(_, index)| *index == usize::MAX)
                    .map(|(s, i)| (s.clone(), i))
                    .unwrap_or_else(|| (overloads[0].clone(), usize::MAX));
                Ok(self.call_mismatch(kind, &signature, index, &arg_types, range))
            }
        }
    }

    fn call_mismatch(
        &mut self,
        kind: SyntaxKind,
        signature: &FunctionSignature,
        index: usize,
        arg_types: &[LslType],
        range: SourceCodeRange,
    ) -> NodeId {
        let diagnostic = if index == usize::MAX {
            Diagnostic::error(
                range,
                codes::WRONG_ARGUMENT_COUNT,
                format!("function \"{}\" called with {} argument(s)", signature.name, arg_types.len()),
            )
            .with_expected(signature.to_string())
            .with_found(arg_types.len().to_string())
        } else {
            let expected = signature.parameters.get(index).or_else(|| signature.parameters.last());
            Diagnostic::error(
                range,
                codes::ARGUMENT_TYPE_MISMATCH,
                format!("argument {} of \"{}\" has incompatible type", index + 1, signature.name),
            )
            .with_expected(expected.map(|p| p.ty.to_string()).unwrap_or_default())
            .with_found(arg_types[index].to_string())
        };
        self.diagnostics.push(diagnostic);
        self.tree.error_node(kind, Some(range))
    }

    fn resolve_variable(&mut self, name: String, range: SourceCodeRange) -> PResult<NodeId> {
        if let Some(symbol) = self.lookup(&name).cloned() {
            let variable = Variable { name, ty: symbol.ty, scope: symbol.scope, declaration: Some(symbol.declaration) };
            return Ok(self.tree.add(Expr::Variable(variable), Some(range))?);
        }
        let library = self.library;
        if let Some(constant) = library.constant(&name) {
            let constant = LibraryConstant { signature: constant.clone() };
            return Ok(self.tree.add(Expr::LibraryConstant(constant), Some(range))?);
        }
        let message = format!("variable \"{}\" is not defined", name);
        Ok(self.semantic_error(SyntaxKind::Variable, range, codes::UNDEFINED_VARIABLE, message))
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.variables.iter().rev().find_map(|frame| frame.get(name))
    }

    fn is_assignable_target(&self, id: NodeId) -> bool {
        match self.tree.kind(id) {
            NodeKind::Expr(Expr::Variable(_)) => true,
            NodeKind::Expr(Expr::TupleAccessor(t)) => matches!(self.tree.kind(t.target), NodeKind::Expr(Expr::Variable(_))),
            _ => false,
        }
    }

    // ---- Ошибки и восстановление ----

    fn is_error(&self, id: NodeId) -> bool { self.tree.node(id).has_errors() }

    fn node_range(&self, id: NodeId) -> SourceCodeRange {
        self.tree.node(id).range().unwrap_or_else(|| self.previous_range())
    }

    fn syntax_error(&mut self, range: SourceCodeRange, message: String) {
        tracing::debug!("Syntax error at {}: {}", range, message);
        self.diagnostics.push(Diagnostic::error(range, codes::SYNTAX_ERROR, message));
    }

    fn semantic_error(&mut self, kind: SyntaxKind, range: SourceCodeRange, code: &str, message: String) -> NodeId {
        tracing::debug!("{} at {}: {}", code, range, message);
        self.diagnostics.push(Diagnostic::error(range, code, message));
        self.tree.error_node(kind, Some(range))
    }

    fn unexpected(&self, expected: &str) -> ParseFailure {
        let token = self.peek();
        let message = if token.token_type == TokenType::Eof {
            format!("unexpected end of file, expected {}", expected)
        } else {
            format!("unexpected '{}', expected {}", token.value, expected)
        };
        ParseFailure::Syntax { message, range: token.range }
    }

    /// Пропуск до конца оператора: `;` на том же уровне или закрытый блок.
    /// `}` внешнего блока не потребляется.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_type() {
                TokenType::Eof => return,
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenType::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Пропуск на верхнем уровне; лишняя `}` потребляется.
    fn skip_top_level(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_type() {
                TokenType::Eof => return,
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => {
                    self.advance();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                    continue;
                }
                TokenType::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ---- Токены ----

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current_index.min(last)]
    }

    fn peek_type(&self) -> TokenType { self.peek().token_type }

    fn peek_at(&self, offset: usize) -> TokenType {
        self.tokens.get(self.current_index + offset).map(|t| t.token_type).unwrap_or(TokenType::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.token_type != TokenType::Eof {
            self.current_index += 1;
        }
        token
    }

    /// Gets current position
    fn current_position(&self) -> SourceCodeRange { self.peek().range }

    fn previous_range(&self) -> SourceCodeRange {
        match self.current_index.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.range,
            None => self.current_position(),
        }
    }

    /// Диапазон от `start` до последнего потреблённого токена.
    fn span_from(&self, start: SourceCodeRange) -> SourceCodeRange {
        let previous = self.previous_range();
        if previous.end_index() < start.start_index() {
            start
        } else {
            start.merge(&previous)
        }
    }

    fn match_token(&self, expected: &TokenType) -> bool { self.peek_type() == *expected }

    fn match_any_token(&self, tokens: &[TokenType]) -> bool { tokens.contains(&self.peek_type()) }

    fn expect(&mut self, expected: TokenType, description: &str) -> PResult<Token> {
        if self.match_token(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(description))
        }
    }

    /// Consumes identifier token
    fn consume_identifier(&mut self) -> Option<(String, SourceCodeRange)> {
        if self.match_token(&TokenType::Identifier) {
            let token = self.advance();
            Some((token.value, token.range))
        } else {
            None
        }
    }

    fn expect_identifier(&mut self) -> PResult<(String, SourceCodeRange)> {
        match self.consume_identifier() {
            Some(found) => Ok(found),
            None => Err(self.unexpected("identifier")),
        }
    }

    fn expect_type(&mut self) -> PResult<LslType> {
        match self.peek_type().as_type() {
            Some(ty) => {
                self.advance();
                Ok(ty)
            }
            None => Err(self.unexpected("type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::LibraryData;

    fn parse(code: &str) -> ParseResult {
        let mut analyzer = SyntaxAnalyzer::new(LibraryData::builtin());
        analyzer.parse(code).expect("contract violation")
    }

    fn codes_of(result: &ParseResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    fn unit(result: &ParseResult) -> CompilationUnit {
        let root = result.tree.root().expect("root");
        match result.tree.kind(root) {
            NodeKind::Decl(Decl::CompilationUnit(u)) => u.clone(),
            other => panic!("unexpected root {:?}", other),
        }
    }

    fn first_body(result: &ParseResult) -> NodeId {
        let u = unit(result);
        let state = u.default_state.expect("default state");
        let handler = match result.tree.kind(state) {
            NodeKind::Decl(Decl::State(s)) => s.events[0],
            other => panic!("unexpected {:?}", other),
        };
        match result.tree.kind(handler) {
            NodeKind::Decl(Decl::EventHandler(e)) => e.body,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_minimal_script() {
        let result = parse("default { state_entry() { llSay(0, \"Hello\"); } }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let body = first_body(&result);
        let statements = result.tree.scope_statements(body).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(result.tree.syntax_kind(statements[0]), SyntaxKind::ExpressionStatement);
    }

    #[test]
    fn calls_may_precede_declarations() {
        let code = "default { touch_start(integer n) { integer x = twice(n); } }";
        let result = parse(code);
        assert_eq!(codes_of(&result), vec![codes::UNDEFINED_FUNCTION]);

        let code = "integer quad(integer v) { return twice(twice(v)); }\n\
                    integer twice(integer v) { return v * 2; }\n\
                    default { touch_start(integer n) { integer x = quad(n); } }";
        let result = parse(code);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let sig = result.tree.find_signature("twice").unwrap();
        let definition = result.tree.signature(sig).definition().unwrap();
        assert_eq!(result.tree.syntax_kind(definition), SyntaxKind::FunctionDeclaration);
        let call = result
            .tree
            .iter()
            .find_map(|(id, n)| match n.kind() {
                NodeKind::Expr(Expr::UserFunctionCall(c)) if c.name == "twice" => Some(id),
                _ => None,
            })
            .unwrap();
        assert_eq!(result.tree.call_definition(call).unwrap(), Some(definition));
    }

    #[test]
    fn operator_precedence() {
        let result = parse("default { state_entry() { integer x = 1 + 2 * 3; } }");
        let body = first_body(&result);
        let decl = result.tree.scope_statements(body).unwrap()[0];
        let init = match result.tree.kind(decl) {
            NodeKind::Stmt(Stmt::LocalVariableDeclaration(d)) => d.initializer.unwrap(),
            other => panic!("unexpected {:?}", other),
        };
        match result.tree.kind(init) {
            NodeKind::Expr(Expr::BinaryExpression(b)) => {
                assert_eq!(b.op, BinaryOp::Add);
                assert_eq!(result.tree.syntax_kind(b.right), SyntaxKind::BinaryExpression);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn vector_components_stop_at_greater() {
        let result = parse("default { state_entry() { vector v = <1, 2.5, -3>; rotation r = <0, 0, 0, 1>; } }");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let body = first_body(&result);
        let statements = result.tree.scope_statements(body).unwrap().to_vec();
        let kinds: Vec<SyntaxKind> = statements
            .iter()
            .map(|s| match result.tree.kind(*s) {
                NodeKind::Stmt(Stmt::LocalVariableDeclaration(d)) => result.tree.syntax_kind(d.initializer.unwrap()),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec![SyntaxKind::VectorLiteral, SyntaxKind::RotationLiteral]);
    }

    #[test]
    fn forward_jump_is_linked_after_body() {
        let code = "default { state_entry() { jump done; llOwnerSay(\"skipped\"); @done; } }";
        let result = parse(code);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let body = first_body(&result);
        let statements = result.tree.scope_statements(body).unwrap().to_vec();
        let kinds: Vec<SyntaxKind> = statements.iter().map(|s| result.tree.syntax_kind(*s)).collect();
        assert_eq!(kinds, vec![SyntaxKind::JumpStatement, SyntaxKind::ExpressionStatement, SyntaxKind::LabelStatement]);
        assert_eq!(result.tree.jumps_to(statements[2]), &[statements[0]]);
    }

    #[test]
    fn jump_to_label_in_sibling_scope_is_undefined() {
        let code = "default { state_entry() { { @inner; } jump inner; } }";
        let result = parse(code);
        assert_eq!(codes_of(&result), vec![codes::UNDEFINED_LABEL]);
        assert_eq!(result.tree.error_nodes().len(), 1);
    }

    #[test]
    fn semantic_errors_become_placeholders() {
        let code = "default { state_entry() { integer x = \"text\"; y = 1; llAbs(1, 2); } }";
        let result = parse(code);
        assert_eq!(
            codes_of(&result),
            vec![codes::TYPE_MISMATCH, codes::UNDEFINED_VARIABLE, codes::WRONG_ARGUMENT_COUNT]
        );
        assert_eq!(result.tree.error_nodes().len(), 3);
    }

    #[test]
    fn syntax_error_recovers_at_statement_boundary() {
        let code = "default { state_entry() { integer x = ; llOwnerSay(\"ok\"); } }";
        let result = parse(code);
        assert_eq!(codes_of(&result), vec![codes::SYNTAX_ERROR]);
        let body = first_body(&result);
        let statements = result.tree.scope_statements(body).unwrap().to_vec();
        assert_eq!(statements.len(), 2);
        assert!(result.tree.node(statements[0]).has_errors());
        assert_eq!(result.tree.syntax_kind(statements[0]), SyntaxKind::LocalVariableDeclaration);
        assert_eq!(result.tree.syntax_kind(statements[1]), SyntaxKind::ExpressionStatement);
    }

    #[test]
    fn return_type_is_checked() {
        let code = "integer f() { return \"s\"; }\ndefault { state_entry() { return 1; } }";
        let result = parse(code);
        assert_eq!(codes_of(&result), vec![codes::RETURN_TYPE_MISMATCH, codes::RETURN_TYPE_MISMATCH]);
    }

    #[test]
    fn events_and_states_are_validated() {
        let code = "default { no_such_event() { } touch_start(string s) { } timer() { state missing; } }\n\
                    state other { state_entry() { state default; } }";
        let result = parse(code);
        assert_eq!(
            codes_of(&result),
            vec![codes::UNKNOWN_EVENT, codes::EVENT_PARAMETER_MISMATCH, codes::UNKNOWN_STATE]
        );
        assert_eq!(unit(&result).states.len(), 1);
    }

    #[test]
    fn parameters_are_resolved_with_declaration_links() {
        let code = "default { listen(integer channel, string name, key id, string message) { llOwnerSay(message); } }";
        let result = parse(code);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let variable = result
            .tree
            .iter()
            .find_map(|(id, n)| match n.kind() {
                NodeKind::Expr(Expr::Variable(v)) => Some((id, v.clone())),
                _ => None,
            })
            .expect("variable reference");
        assert_eq!(variable.1.scope, VariableScope::Parameter);
        let declaration = variable.1.declaration.unwrap();
        assert_eq!(result.tree.syntax_kind(declaration), SyntaxKind::Parameter);
    }

    #[test]
    fn integer_literals_wrap_like_lsl() {
        assert_eq!(integer_value("0xFFFFFFFF"), -1);
        assert_eq!(integer_value("2147483648"), i32::MIN);
        assert_eq!(integer_value("99999999999"), -1);
        assert_eq!(float_value("1.5f"), 1.5);
    }
}
