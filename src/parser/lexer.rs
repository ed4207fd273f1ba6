/*!
# LSL Lexical Analyzer

Лексический анализатор LSL на logos. Позиции: строки с 1, колонки с 0,
смещения в байтах. Комментарии и пробелы пропускаются; неизвестные символы
превращаются в токены [`TokenType::Error`] и не прерывают разбор.
*/

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::position::{LineIndex, SourceCodeRange};
use crate::signatures::LslType;

/// LSL token types.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    // Types
    #[token("integer")]
    TypeInteger,
    #[token("float")]
    TypeFloat,
    #[token("string")]
    TypeString,
    #[token("key")]
    TypeKey,
    #[token("vector")]
    TypeVector,
    #[token("rotation")]
    #[token("quaternion")]
    TypeRotation,
    #[token("list")]
    TypeList,

    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("jump")]
    Jump,
    #[token("return")]
    Return,
    #[token("state")]
    State,
    #[token("default")]
    Default,

    // Assignment
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,

    // Arithmetic / bitwise / logical
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,

    // Delimiters
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("@")]
    At,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexIntegerLiteral,
    #[regex(r"[0-9]+")]
    IntegerLiteral,
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fF]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fF]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fF]?")]
    FloatLiteral,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,

    // Identifiers (lower priority than keywords)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", priority = 1)]
    Identifier,

    // Comments and whitespace
    #[regex(r"//[^\r\n]*", logos::skip)]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    /// Нераспознанный символ.
    Error,
    Eof,
}

impl TokenType {
    /// Тип LSL для ключевого слова типа.
    pub fn as_type(&self) -> Option<LslType> {
        match self {
            TokenType::TypeInteger => Some(LslType::Integer),
            TokenType::TypeFloat => Some(LslType::Float),
            TokenType::TypeString => Some(LslType::String),
            TokenType::TypeKey => Some(LslType::Key),
            TokenType::TypeVector => Some(LslType::Vector),
            TokenType::TypeRotation => Some(LslType::Rotation),
            TokenType::TypeList => Some(LslType::List),
            _ => None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenType::Assign
                | TokenType::PlusAssign
                | TokenType::MinusAssign
                | TokenType::StarAssign
                | TokenType::SlashAssign
                | TokenType::PercentAssign
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::TypeInteger => "integer",
            TokenType::TypeFloat => "float",
            TokenType::TypeString => "string",
            TokenType::TypeKey => "key",
            TokenType::TypeVector => "vector",
            TokenType::TypeRotation => "rotation",
            TokenType::TypeList => "list",
            TokenType::If => "if",
            TokenType::Else => "else",
            TokenType::While => "while",
            TokenType::Do => "do",
            TokenType::For => "for",
            TokenType::Jump => "jump",
            TokenType::Return => "return",
            TokenType::State => "state",
            TokenType::Default => "default",
            TokenType::Assign => "=",
            TokenType::PlusAssign => "+=",
            TokenType::MinusAssign => "-=",
            TokenType::StarAssign => "*=",
            TokenType::SlashAssign => "/=",
            TokenType::PercentAssign => "%=",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            TokenType::Percent => "%",
            TokenType::Increment => "++",
            TokenType::Decrement => "--",
            TokenType::Equal => "==",
            TokenType::NotEqual => "!=",
            TokenType::Less => "<",
            TokenType::Greater => ">",
            TokenType::LessEqual => "<=",
            TokenType::GreaterEqual => ">=",
            TokenType::AndAnd => "&&",
            TokenType::OrOr => "||",
            TokenType::Bang => "!",
            TokenType::Tilde => "~",
            TokenType::Amp => "&",
            TokenType::Pipe => "|",
            TokenType::Caret => "^",
            TokenType::ShiftLeft => "<<",
            TokenType::ShiftRight => ">>",
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBrace => "{",
            TokenType::RightBrace => "}",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Dot => ".",
            TokenType::At => "@",
            TokenType::HexIntegerLiteral | TokenType::IntegerLiteral => "INTEGER",
            TokenType::FloatLiteral => "FLOAT",
            TokenType::StringLiteral => "STRING",
            TokenType::Identifier => "IDENTIFIER",
            TokenType::LineComment | TokenType::BlockComment => "COMMENT",
            TokenType::Whitespace => "WHITESPACE",
            TokenType::Error => "ERROR",
            TokenType::Eof => "EOF",
        };
        f.write_str(text)
    }
}

/// Token with position information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub range: SourceCodeRange,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, range: SourceCodeRange) -> Self {
        Self { token_type, value: value.into(), range }
    }
}

/// LSL lexer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LslLexer;

impl LslLexer {
    pub fn new() -> Self { Self }

    /// Разбить текст на токены. Всегда завершается токеном [`TokenType::Eof`].
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let index = LineIndex::new(input);
        let mut tokens = Vec::new();
        let mut lexer = TokenType::lexer(input);
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let range = index.range(span.start, span.end);
            match result {
                Ok(token_type) => tokens.push(Token::new(token_type, lexer.slice(), range)),
                Err(()) => {
                    tracing::debug!("Unexpected character '{}' at {}", lexer.slice(), range);
                    tokens.push(Token::new(TokenType::Error, lexer.slice(), range));
                }
            }
        }
        let end = input.len();
        let (line, column) = index.line_col(end);
        tokens.push(Token::new(TokenType::Eof, "", SourceCodeRange::point(line, column, end)));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(src: &str) -> Vec<TokenType> {
        LslLexer::new().tokenize(src).into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            types("integer x = llAbs(-5);"),
            vec![
                TokenType::TypeInteger,
                TokenType::Identifier,
                TokenType::Assign,
                TokenType::Identifier,
                TokenType::LeftParen,
                TokenType::Minus,
                TokenType::IntegerLiteral,
                TokenType::RightParen,
                TokenType::Semicolon,
                TokenType::Eof,
            ]
        );
        assert_eq!(types("integers")[0], TokenType::Identifier);
    }

    #[test]
    fn literals() {
        assert_eq!(
            types(r#"0x1F 1.5 .5 2e3 3.f "a\"b""#),
            vec![
                TokenType::HexIntegerLiteral,
                TokenType::FloatLiteral,
                TokenType::FloatLiteral,
                TokenType::FloatLiteral,
                TokenType::FloatLiteral,
                TokenType::StringLiteral,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_positions_tracked() {
        let tokens = LslLexer::new().tokenize("// c\n/* a\n b */ x += 1;");
        let x = &tokens[0];
        assert_eq!(x.value, "x");
        assert_eq!((x.range.start_line(), x.range.start_column()), (3, 6));
        assert_eq!(tokens[1].token_type, TokenType::PlusAssign);
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        let t = types("x $ y");
        assert_eq!(t, vec![TokenType::Identifier, TokenType::Error, TokenType::Identifier, TokenType::Eof]);
    }
}
