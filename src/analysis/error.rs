use miette::Diagnostic;
use thiserror::Error;

use crate::ast::BinaryOperation;
use crate::{DiagnosticRecord, Severity, Span, Type};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SemanticError {
    #[error("`{name}` is already defined at {previous}")]
    Redefinition {
        name: String,

        #[label("defined again here")]
        span: Span,

        previous: Span,
    },

    #[error("{kind} cannot be in global scope")]
    #[diagnostic(help("Only variable declarations and function definitions may appear at the top level"))]
    IllegalGlobalStatement {
        kind: &'static str,

        #[label("not allowed here")]
        span: Span,
    },

    #[error("Cannot set variable `{name}` to itself in its declaration")]
    SelfReference {
        name: String,

        #[label("self reference")]
        span: Span,
    },

    #[error("Global variable `{name}` has an unsupported initializer")]
    #[diagnostic(help("Globals may only be initialized with a literal or an earlier global"))]
    UnsupportedGlobalInitializer {
        name: String,

        #[label("not a constant")]
        span: Span,
    },

    #[error("Variable `{name}` is not defined")]
    UndefinedVariable {
        name: String,

        #[label("unknown variable")]
        span: Span,
    },

    #[error("Function `{name}` is not defined")]
    UndefinedFunction {
        name: String,

        #[label("unknown function")]
        span: Span,
    },

    #[error("The return type of `{name}` is not known at this point")]
    #[diagnostic(help("Declare the return type of the called function explicitly"))]
    UnknownReturnType {
        name: String,

        #[label("called here")]
        span: Span,
    },

    #[error("Wrong number of arguments for `{name}`: expected {expected}, got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,

        #[label("this call")]
        span: Span,
    },

    #[error("Argument {position} of `{name}` must be of type '{expected}', got '{found}'")]
    ArgumentType {
        name: String,
        position: usize,
        expected: Type,
        found: Type,

        #[label("this argument")]
        span: Span,
    },

    #[error("Function `{function}` returns '{expected}' but this returns '{found}'")]
    ReturnTypeMismatch {
        function: String,
        expected: Type,
        found: Type,

        #[label("this return")]
        span: Span,
    },

    #[error("Function `{name}` does not return on all paths")]
    #[diagnostic(help("A function with a non-void return type needs a `return` statement"))]
    MissingReturn {
        name: String,
        typ: Type,

        #[label("this function")]
        span: Span,
    },

    #[error("Function `{name}` cannot be defined inside another function")]
    NestedFunction {
        name: String,

        #[label("nested definition")]
        span: Span,
    },

    #[error("Type mismatch in definition of variable `{name}`: declared '{declared}', got '{found}'")]
    TypeMismatch {
        name: String,
        declared: Type,
        found: Type,

        #[label("this declaration")]
        span: Span,
    },

    #[error("Type mismatch in assignment to `{name}`: expected '{expected}', got '{found}'")]
    AssignmentType {
        name: String,
        expected: Type,
        found: Type,

        #[label("this assignment")]
        span: Span,
    },

    #[error("Conditional expressions must be of type 'bool', got '{found}'")]
    NonBoolCondition {
        found: Type,

        #[label("this condition")]
        span: Span,
    },

    #[error("Operands of `{op}` have different types: '{lhs}' and '{rhs}'")]
    OperandMismatch {
        op: BinaryOperation,
        lhs: Type,
        rhs: Type,

        #[label("this expression")]
        span: Span,
    },

    #[error("Operator `{op}` cannot be applied to operands of type '{typ}'")]
    InvalidOperands {
        op: BinaryOperation,
        typ: Type,

        #[label("this expression")]
        span: Span,
    },

    #[error("`{name}` cannot be of type 'void'")]
    VoidBinding {
        name: String,

        #[label("void binding")]
        span: Span,
    },

    #[error("A 'void' value cannot be passed to `{function}`")]
    VoidArgument {
        function: String,

        #[label("this argument")]
        span: Span,
    },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::Redefinition { span, .. }
            | SemanticError::IllegalGlobalStatement { span, .. }
            | SemanticError::SelfReference { span, .. }
            | SemanticError::UnsupportedGlobalInitializer { span, .. }
            | SemanticError::UndefinedVariable { span, .. }
            | SemanticError::UndefinedFunction { span, .. }
            | SemanticError::UnknownReturnType { span, .. }
            | SemanticError::ArgumentCount { span, .. }
            | SemanticError::ArgumentType { span, .. }
            | SemanticError::ReturnTypeMismatch { span, .. }
            | SemanticError::MissingReturn { span, .. }
            | SemanticError::NestedFunction { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::AssignmentType { span, .. }
            | SemanticError::NonBoolCondition { span, .. }
            | SemanticError::OperandMismatch { span, .. }
            | SemanticError::InvalidOperands { span, .. }
            | SemanticError::VoidBinding { span, .. }
            | SemanticError::VoidArgument { span, .. } => *span,
        }
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord::new(Severity::Error, self.to_string(), self.span())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SemanticWarning {
    #[error("Variable `{name}` was already defined in a parent scope at {previous}")]
    #[diagnostic(severity(Warning), help("This may cause unexpected behavior"))]
    Shadowing {
        name: String,

        #[label("shadows an outer definition")]
        span: Span,

        previous: Span,
    },

    #[error("Found code after a return statement in `{function}`")]
    #[diagnostic(severity(Warning))]
    UnreachableCode {
        function: String,

        #[label("never executed")]
        span: Span,
    },
}

impl SemanticWarning {
    pub fn span(&self) -> Span {
        match self {
            SemanticWarning::Shadowing { span, .. }
            | SemanticWarning::UnreachableCode { span, .. } => *span,
        }
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord::new(Severity::Warning, self.to_string(), self.span())
    }
}
