use std::fmt;

use crate::ast::BinaryOperation;
use crate::{Span, Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    TypeKeyword(Type),

    Int(i64),
    Float(f64),
    Bool(bool),

    Operator(Operator),
    Punctuation(Punctuation),

    /// `;`
    EndOfStatement,

    /// Generated after the last real token
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Func,
    Return,
    If,
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,
    Colon,

    Plus,
    Minus,
    Star,
    Slash,

    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equals,
    NotEquals,

    And,
    Or,
}

impl Operator {
    /// The binary operation this operator stands for, if any
    pub fn binary_operation(self) -> Option<BinaryOperation> {
        match self {
            Operator::Assign | Operator::Colon => None,
            Operator::Plus => Some(BinaryOperation::Add),
            Operator::Minus => Some(BinaryOperation::Sub),
            Operator::Star => Some(BinaryOperation::Mul),
            Operator::Slash => Some(BinaryOperation::Div),
            Operator::Less => Some(BinaryOperation::Less),
            Operator::LessEq => Some(BinaryOperation::LessEq),
            Operator::Greater => Some(BinaryOperation::Greater),
            Operator::GreaterEq => Some(BinaryOperation::GreaterEq),
            Operator::Equals => Some(BinaryOperation::Equals),
            Operator::NotEquals => Some(BinaryOperation::NotEquals),
            Operator::And => Some(BinaryOperation::And),
            Operator::Or => Some(BinaryOperation::Or),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuation {
    ParenOpen,
    ParenClose,
    CurlyOpen,
    CurlyClose,
    Comma,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Func => write!(f, "func"),
            Keyword::Return => write!(f, "return"),
            Keyword::If => write!(f, "if"),
            Keyword::Else => write!(f, "else"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::Assign => "=",
            Operator::Colon => ":",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Less => "<",
            Operator::LessEq => "<=",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::And => "&&",
            Operator::Or => "||",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Punctuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Punctuation::ParenOpen => "(",
            Punctuation::ParenClose => ")",
            Punctuation::CurlyOpen => "{",
            Punctuation::CurlyClose => "}",
            Punctuation::Comma => ",",
        };
        f.write_str(text)
    }
}

/// Renders the token the way it is written in source code
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Keyword(keyword) => keyword.fmt(f),
            TokenKind::TypeKeyword(typ) => typ.fmt(f),
            TokenKind::Int(i) => write!(f, "{i}"),
            TokenKind::Float(x) => {
                // f64's Display never uses exponents, but drops a trailing `.0`
                let text = x.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{text}.0")
                }
            }
            TokenKind::Bool(b) => write!(f, "{b}"),
            TokenKind::Operator(op) => op.fmt(f),
            TokenKind::Punctuation(punct) => punct.fmt(f),
            TokenKind::EndOfStatement => f.write_str(";"),
            TokenKind::EndOfInput => Ok(()),
        }
    }
}

impl TokenKind {
    /// Human readable description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("[ID: {name}]"),
            TokenKind::Keyword(keyword) => format!("[KEYWORD: {keyword}]"),
            TokenKind::TypeKeyword(typ) => format!("[TYPE: {typ}]"),
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Bool(_) => {
                format!("[LITERAL: {self}]")
            }
            TokenKind::Operator(op) => format!("[OPERATOR: '{op}']"),
            TokenKind::Punctuation(punct) => format!("[PUNCTUATION: '{punct}']"),
            TokenKind::EndOfStatement => String::from("[PUNCTUATION: ';']"),
            TokenKind::EndOfInput => String::from("end of input"),
        }
    }
}

/// Render a token stream back to source text
///
/// Tokens are separated by single spaces, so lexing the result yields the same
/// token kinds again.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::EndOfInput)
        .map(|token| token.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
