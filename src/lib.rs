//! The plover compiler front end
//!
//! Source text flows strictly forward through four stages:
//!
//! 1. [parsing::lex] turns the text into [parsing::Token]s,
//! 2. [parsing::parse_tokens] builds the untyped [ast],
//! 3. [analysis::analyze] resolves scopes, infers and checks types,
//! 4. [lowering::lower] produces an [ir::Module] made of basic blocks.
//!
//! [compile] runs the whole pipeline.

pub mod analysis;
pub mod ast;
pub mod builtin;
pub mod ir;
pub mod lowering;
pub mod parsing;
mod util;

pub use analysis::{analyze, Analysis, AnalysisFailure, SemanticError, SemanticWarning};
pub use lowering::{lower, LoweringError};
pub use parsing::{lex, parse, parse_tokens, ParsingError};
pub use util::{ScopeStack, Span, Variable};

use miette::Diagnostic;
use thiserror::Error;

/// The nominal types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Int,
    Float,
    Bool,
}

impl Type {
    /// Map a type keyword to its type
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "void" => Some(Type::Void),
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "bool" => Some(Type::Bool),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

/// Severity of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic flattened to plain data for whoever presents it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl DiagnosticRecord {
    pub fn new(severity: Severity, message: String, span: Span) -> Self {
        Self {
            severity,
            message,
            line: span.line,
            column: span.column,
        }
    }
}

/// Any error that stops the pipeline
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parsing(#[from] ParsingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Analysis(#[from] AnalysisFailure),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lowering(#[from] LoweringError),
}

impl CompileError {
    /// Every diagnostic of the failed run, errors first
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        match self {
            CompileError::Parsing(err) => vec![err.record()],
            CompileError::Analysis(failure) => failure.records(),
            CompileError::Lowering(err) => vec![err.record()],
        }
    }
}

/// Output of a successful [compile] run
#[derive(Debug)]
pub struct Compilation {
    pub module: ir::Module,
    pub warnings: Vec<SemanticWarning>,
}

impl Compilation {
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.warnings.iter().map(SemanticWarning::record).collect()
    }
}

/// Run the whole pipeline on `source`, tagging the result with `module_name`
pub fn compile(source: &str, module_name: &str) -> Result<Compilation, CompileError> {
    let program = parse(source)?;
    let Analysis { program, warnings } = analyze(&program)?;
    let module = lower(&program, module_name)?;

    Ok(Compilation { module, warnings })
}
