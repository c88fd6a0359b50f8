//! Semantic analysis
//!
//! Resolves names, infers missing types and checks the untyped AST. The result is a
//! [TypedProgram] in which every declaration, function and expression carries its [Type].
//!
//! Analysis runs in four phases:
//! 1. collect global variables and functions into symbol tables
//! 2. infer the types of global variables, in source order
//! 3. infer and check every function body ([function])
//! 4. check declarations, assignments and conditions on the typed tree ([check])
//!
//! A phase only runs if all phases before it finished without errors. Inside one phase
//! as many errors as possible are collected.

use std::mem;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::ast::*;
use crate::{DiagnosticRecord, ScopeStack, Type};

mod check;
mod error;
mod function;
mod symbols;
mod typing;

pub use error::{SemanticError, SemanticWarning};
pub use typing::{binary_result, OperandError};

use function::is_self_reference;
use symbols::{Binding, FunctionSymbol, GlobalSymbol, SymbolTable};

/// Successful analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub program: TypedProgram,
    pub warnings: Vec<SemanticWarning>,
}

impl Analysis {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.warnings.iter().map(SemanticWarning::record).collect()
    }
}

/// Analysis stopped after a phase that found errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("Semantic analysis failed with {} error(s)", .errors.len())]
pub struct AnalysisFailure {
    #[related]
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
}

impl AnalysisFailure {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors first, then warnings
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.errors
            .iter()
            .map(SemanticError::record)
            .chain(self.warnings.iter().map(SemanticWarning::record))
            .collect()
    }
}

/// Analyze `program`, see the [module documentation](self)
pub fn analyze(program: &UntypedProgram) -> Result<Analysis, AnalysisFailure> {
    let mut analyzer = Analyzer {
        scopes: ScopeStack::new(),
        ..Default::default()
    };

    analyzer.collect_globals(program);
    analyzer.finish_phase("collect globals")?;

    let globals = analyzer.infer_globals();
    analyzer.finish_phase("global inference")?;

    let functions = analyzer.infer_functions();
    analyzer.finish_phase("function inference")?;

    let program = TypedProgram { globals, functions };
    analyzer.check_program(&program);
    analyzer.finish_phase("final check")?;

    Ok(Analysis {
        program,
        warnings: analyzer.warnings,
    })
}

#[derive(Debug, Default)]
struct Analyzer<'ast> {
    globals: SymbolTable<GlobalSymbol<'ast>>,
    functions: SymbolTable<FunctionSymbol<'ast>>,

    /// The outermost scope holds the globals
    scopes: ScopeStack<Binding>,

    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
}

impl<'ast> Analyzer<'ast> {
    fn finish_phase(&mut self, phase: &'static str) -> Result<(), AnalysisFailure> {
        debug!(
            phase,
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "analysis phase finished"
        );

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AnalysisFailure {
                errors: mem::take(&mut self.errors),
                warnings: mem::take(&mut self.warnings),
            })
        }
    }

    /// Run `f` inside a fresh scope, the scope is left on every path out of `f`
    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.enter_scope();
        let result = f(self);
        self.scopes.leave_scope();
        result
    }

    fn collect_globals(&mut self, program: &'ast UntypedProgram) {
        for statement in &program.statements {
            match statement {
                Statement::VariableDecl(decl) => {
                    if let Err(first) = self.globals.insert(decl.name.as_str(), GlobalSymbol { decl }) {
                        self.errors.push(SemanticError::Redefinition {
                            name: decl.name.name.clone(),
                            span: decl.name.span,
                            previous: first.span(),
                        });
                    }
                }
                Statement::FunctionDef(def) => {
                    if let Err(first) = self
                        .functions
                        .insert(def.name.as_str(), FunctionSymbol::new(def))
                    {
                        self.errors.push(SemanticError::Redefinition {
                            name: def.name.name.clone(),
                            span: def.name.span,
                            previous: first.span(),
                        });
                    }
                }
                other => self.errors.push(SemanticError::IllegalGlobalStatement {
                    kind: other.kind_name(),
                    span: other.span(),
                }),
            }
        }

        debug!(
            globals = self.globals.len(),
            functions = self.functions.len(),
            "symbols collected"
        );
    }

    fn infer_globals(&mut self) -> Vec<VariableDecl<Type>> {
        let decls: Vec<_> = self.globals.iter().map(|g| g.decl).collect();
        decls
            .into_iter()
            .filter_map(|decl| self.infer_global(decl))
            .collect()
    }

    fn infer_global(&mut self, decl: &'ast VariableDecl<NoTypeContext>) -> Option<VariableDecl<Type>> {
        let mut failed = false;

        let value = match &decl.value {
            None => None,
            Some(value) if is_self_reference(decl, value) => {
                self.errors.push(SemanticError::SelfReference {
                    name: decl.name.name.clone(),
                    span: value.span,
                });
                failed = true;
                None
            }
            Some(
                value @ Expression {
                    kind: ExpressionKind::Literal(_) | ExpressionKind::Identifier(_),
                    ..
                },
            ) => {
                let typed = self.type_expression(value);
                failed |= typed.is_none();
                typed
            }
            Some(value) => {
                self.errors.push(SemanticError::UnsupportedGlobalInitializer {
                    name: decl.name.name.clone(),
                    span: value.span,
                });
                failed = true;
                None
            }
        };

        let typ = decl
            .declared
            .map(|t| t.typ)
            .or(value.as_ref().map(|v| v.type_context));
        if typ == Some(Type::Void) {
            self.errors.push(SemanticError::VoidBinding {
                name: decl.name.name.clone(),
                span: decl.name.span,
            });
            failed = true;
        }

        self.scopes.add_to_scope(
            decl.name.as_str(),
            Binding {
                span: decl.name.span,
                typ,
            },
        );

        if failed {
            return None;
        }
        Some(VariableDecl {
            name: decl.name.clone(),
            declared: decl.declared,
            value,
            typ: typ?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn analyze_src(src: &str) -> Result<Analysis, AnalysisFailure> {
        analyze(&parse(src).expect("test source should parse"))
    }

    fn errors(src: &str) -> Vec<SemanticError> {
        analyze_src(src).expect_err("analysis should fail").errors
    }

    #[test]
    fn global_and_main() {
        let analysis = analyze_src("x: int = 5; func main() int { return x; };").unwrap();

        assert_eq!(analysis.program.globals.len(), 1);
        assert_eq!(analysis.program.globals[0].typ, Type::Int);
        assert_eq!(analysis.program.functions[0].return_type, Type::Int);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn return_type_inference() {
        let analysis = analyze_src("func f() { return 1; };").unwrap();
        assert_eq!(analysis.program.functions[0].return_type, Type::Int);

        let analysis = analyze_src("func f() { };").unwrap();
        assert_eq!(analysis.program.functions[0].return_type, Type::Void);
    }

    #[test]
    fn global_inference_from_identifier() {
        let analysis = analyze_src("a: = 2.5; b: = a; c: = b;").unwrap();
        let types: Vec<_> = analysis.program.globals.iter().map(|g| g.typ).collect();

        assert_eq!(types, vec![Type::Float; 3]);
    }

    #[test]
    fn declared_type_mismatch() {
        let errors = errors("x: bool = true; y: int = x;");

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            SemanticError::TypeMismatch {
                name,
                declared: Type::Int,
                found: Type::Bool,
                ..
            } if name == "y"
        ));
        assert!(errors[0].to_string().contains("Type mismatch"));
    }

    #[test]
    fn inferred_from_bool_global() {
        let analysis = analyze_src("x: bool = true; y: = x;").unwrap();
        assert_eq!(analysis.program.globals[1].typ, Type::Bool);
    }

    #[test]
    fn condition_must_be_bool() {
        let errors = errors("func f() { if (1) { }; };");

        assert_eq!(
            errors,
            vec![SemanticError::NonBoolCondition {
                found: Type::Int,
                span: crate::Span::new(15, 16, 1, 16),
            }]
        );
    }

    #[test]
    fn argument_count() {
        let src = "func g(a: int, b: int) int { return a + b; }; func h() int { return g(1, 2, 3); };";

        assert!(matches!(
            errors(src)[..],
            [SemanticError::ArgumentCount {
                expected: 2,
                found: 3,
                ..
            }]
        ));
    }

    #[test]
    fn argument_type() {
        let src = "func g(a: int, b: bool) { }; func h() { g(1, 2); };";

        assert!(matches!(
            errors(src)[..],
            [SemanticError::ArgumentType {
                position: 2,
                expected: Type::Bool,
                found: Type::Int,
                ..
            }]
        ));
    }

    #[test]
    fn printf_is_variadic() {
        analyze_src("func main() int { printf(1); printf(1.5, true, 3); return 0; };").unwrap();
    }

    #[test]
    fn printf_rejects_void() {
        let errors = errors("func v() { }; func main() int { printf(v()); return 0; };");
        assert!(matches!(errors[..], [SemanticError::VoidArgument { .. }]));
    }

    #[test]
    fn illegal_global_statements() {
        let errors = errors("x: int; x = 1; f(); { }; return 1; if (true) { };");
        let kinds: Vec<_> = errors
            .iter()
            .map(|e| match e {
                SemanticError::IllegalGlobalStatement { kind, .. } => *kind,
                other => panic!("unexpected error {other:?}"),
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                "Variable assignments",
                "Function-call statements",
                "Block statements",
                "Return statements",
                "Conditional statements"
            ]
        );
    }

    #[test]
    fn duplicates_keep_first() {
        let errors = errors("x: int = 1; x: float = 2.0; func f() { }; func f() { };");

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            SemanticError::Redefinition { previous, .. } if previous.start == 0
        ));
    }

    #[test]
    fn phase_gating() {
        // the type errors would be found by later phases
        let errors = errors("x: int = 1; x: int = 2; y: int = true; func f() int { return true; };");

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SemanticError::Redefinition { .. }));
    }

    #[test]
    fn global_self_reference() {
        let errors = errors("x: = x;");
        assert!(matches!(errors[..], [SemanticError::SelfReference { .. }]));
    }

    #[test]
    fn global_forward_reference() {
        let errors = errors("a: = b; b: int = 1;");
        assert!(matches!(errors[..], [SemanticError::UndefinedVariable { .. }]));
    }

    #[test]
    fn global_binary_initializer() {
        let errors = errors("a: int = 1 + 2;");
        assert!(matches!(
            errors[..],
            [SemanticError::UnsupportedGlobalInitializer { .. }]
        ));
    }

    #[test]
    fn redefinition_and_shadowing() {
        let failure = analyze_src("func f(a: int) { a: int = 1; };").unwrap_err();
        assert!(matches!(failure.errors[..], [SemanticError::Redefinition { .. }]));

        let analysis = analyze_src("x: int = 1; func f() { x: float = 1.0; { x: bool = true; }; };").unwrap();
        assert_eq!(analysis.warning_count(), 2);
        assert!(analysis
            .warnings
            .iter()
            .all(|w| matches!(w, SemanticWarning::Shadowing { .. })));
    }

    #[test]
    fn unreachable_once_per_function() {
        let analysis = analyze_src("func f() int { return 1; x: = 2; y: = 3; };").unwrap();

        assert_eq!(analysis.warnings.len(), 1);
        assert!(matches!(
            analysis.warnings[0],
            SemanticWarning::UnreachableCode { .. }
        ));
    }

    #[test]
    fn missing_return() {
        let errors = errors("func f() int { x: = 1; };");
        assert!(matches!(errors[..], [SemanticError::MissingReturn { .. }]));

        // the check only looks for any return
        analyze_src("func f(a: bool) int { if (a) { return 1; }; };").unwrap();
    }

    #[test]
    fn return_type_mismatch() {
        let errors = errors("func f() int { return true; };");
        assert!(matches!(
            errors[..],
            [SemanticError::ReturnTypeMismatch {
                expected: Type::Int,
                found: Type::Bool,
                ..
            }]
        ));

        let errors = self::errors("func f(a: bool) { if (a) { return 1; }; return 2.0; };");
        assert!(matches!(errors[..], [SemanticError::ReturnTypeMismatch { .. }]));
    }

    #[test]
    fn calls_need_known_return_type() {
        let errors = errors("func f() int { return g(); }; func g() { return 1; };");
        assert!(matches!(errors[..], [SemanticError::UnknownReturnType { .. }]));

        analyze_src("func f() int { return g(); }; func g() int { return 1; };").unwrap();
        analyze_src("func g() { return 1; }; func f() int { return g(); };").unwrap();
    }

    #[test]
    fn operand_errors() {
        let errors = errors("func f() { x: = 1 + 2.0; y: = true < false; };");

        assert!(matches!(
            errors[..],
            [
                SemanticError::OperandMismatch { .. },
                SemanticError::InvalidOperands { .. }
            ]
        ));
    }

    #[test]
    fn assignment_checks() {
        let errors = errors("func f() { x: int = 1; x = 2.0; y = 1; };");

        assert!(matches!(
            errors[..],
            [
                SemanticError::AssignmentType {
                    expected: Type::Int,
                    found: Type::Float,
                    ..
                },
                SemanticError::UndefinedVariable { .. }
            ]
        ));
    }

    #[test]
    fn void_bindings() {
        let errors = errors("func f(a: void) { }; func g() { }; func h() { x: = g(); };");
        assert!(matches!(
            errors[..],
            [
                SemanticError::VoidBinding { .. },
                SemanticError::VoidBinding { .. }
            ]
        ));
    }

    #[test]
    fn nested_function() {
        let errors = errors("func f() { func g() { }; };");
        assert!(matches!(errors[..], [SemanticError::NestedFunction { .. }]));
    }

    #[test]
    fn scopes_end_with_their_block() {
        let errors = errors("func f() { { x: int = 1; }; x = 2; };");
        assert!(matches!(errors[..], [SemanticError::UndefinedVariable { .. }]));
    }

    #[test]
    fn deterministic() {
        let program = parse("a: = 1; b: = a; func f(x: float) { y: = x; z: = y < 2.0; };").unwrap();

        assert_eq!(analyze(&program), analyze(&program));
    }

    #[test]
    fn records() {
        let failure = analyze_src("func f() int { return 1; x: = 2; y = 3; };").unwrap_err();
        let records = failure.records();

        assert_eq!(failure.error_count(), 1);
        assert_eq!(failure.warning_count(), 1);
        assert_eq!(records[0].severity, crate::Severity::Error);
        assert_eq!(records[1].severity, crate::Severity::Warning);
        assert_eq!((records[1].line, records[1].column), (1, 26));
    }
}
