//! Parsing
//!
//! This module is responsible for turning the source code from its string form into an AST.
//! The main interface is [parse] which takes a string and generates an [ast::UntypedProgram].
//!
//! Internally, parsing works in two phases:
//! - the [lexer] walks a [CharacterStream] and turns it into a list of [Token]s
//! - the [parser] builds the AST from these tokens by recursive descent
//!
//! Both phases stop at the first error.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::{ast, DiagnosticRecord, Severity, Span};

mod lexer;
mod parser;
mod stream;
mod token;

pub use lexer::LexError;
pub use stream::CharacterStream;
pub use token::{render_tokens, Keyword, Operator, Punctuation, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ParsingError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexical(#[from] LexError),

    #[error("Syntax error: expected {expected}, got {found}")]
    UnexpectedToken {
        expected: String,
        found: String,

        #[label("here")]
        span: Span,
    },

    #[error("Syntax error: {found} cannot start a statement")]
    #[diagnostic(help(
        "Statements are declarations, assignments, calls, `func`, `return`, `if` or blocks"
    ))]
    InvalidStatementStart {
        found: String,

        #[label("here")]
        span: Span,
    },

    #[error("Syntax error: nesting is too deep")]
    #[diagnostic(help("Split deeply nested expressions or blocks into separate statements"))]
    NestingTooDeep {
        #[label("too deep here")]
        span: Span,
    },
}

impl ParsingError {
    pub fn span(&self) -> Span {
        match self {
            ParsingError::Lexical(err) => err.span(),
            ParsingError::UnexpectedToken { span, .. }
            | ParsingError::InvalidStatementStart { span, .. }
            | ParsingError::NestingTooDeep { span } => *span,
        }
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord::new(Severity::Error, self.to_string(), self.span())
    }
}

/// Turn source text into tokens, the last one is always [TokenKind::EndOfInput]
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    debug!(count = tokens.len(), "lexing finished");
    Ok(tokens)
}

/// Build the untyped AST from a token list
pub fn parse_tokens(tokens: Vec<Token>) -> Result<ast::UntypedProgram, ParsingError> {
    let program = parser::Parser::new(tokens).parse_program()?;
    debug!(statements = program.statements.len(), "parsing finished");
    Ok(program)
}

/// Parse plover source code into an AST
pub fn parse(source: &str) -> Result<ast::UntypedProgram, ParsingError> {
    parse_tokens(lex(source)?)
}
