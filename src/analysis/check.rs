//! Final check over the typed program
//!
//! Every type is known by now, this pass only compares them.

use super::symbols::Binding;
use super::{Analyzer, SemanticError};
use crate::ast::*;
use crate::Type;

impl Analyzer<'_> {
    pub(super) fn check_program(&mut self, program: &TypedProgram) {
        for decl in &program.globals {
            self.check_declaration(decl);
        }

        for def in &program.functions {
            self.with_scope(|this| {
                for param in &def.params {
                    this.bind(&param.name, param.typ.typ);
                }
                this.check_statements(&def.body.statements);
            });
        }
    }

    fn check_statements(&mut self, statements: &[Statement<Type>]) {
        for statement in statements {
            self.check_statement(statement);
        }
    }

    fn check_statement(&mut self, statement: &Statement<Type>) {
        match statement {
            Statement::Block(block) => {
                self.with_scope(|this| this.check_statements(&block.statements));
            }
            Statement::VariableDecl(decl) => {
                self.check_declaration(decl);
                self.bind(&decl.name, decl.typ);
            }
            Statement::VariableAssign(assign) => self.check_assignment(assign),
            Statement::Conditional(cond) => self.check_conditional(cond),
            Statement::Call(_) | Statement::Return(_) | Statement::FunctionDef(_) => {}
        }
    }

    fn check_declaration(&mut self, decl: &VariableDecl<Type>) {
        let (Some(declared), Some(value)) = (decl.declared, &decl.value) else {
            return;
        };

        if declared.typ != value.type_context {
            self.errors.push(SemanticError::TypeMismatch {
                name: decl.name.name.clone(),
                declared: declared.typ,
                found: value.type_context,
                span: decl.name.span,
            });
        }
    }

    fn check_assignment(&mut self, assign: &VariableAssign<Type>) {
        let found = assign.value.type_context;
        match self.scopes.lookup(assign.name.as_str()).map(|b| b.typ) {
            None => self.errors.push(SemanticError::UndefinedVariable {
                name: assign.name.name.clone(),
                span: assign.name.span,
            }),
            Some(Some(expected)) if expected != found => {
                self.errors.push(SemanticError::AssignmentType {
                    name: assign.name.name.clone(),
                    expected,
                    found,
                    span: assign.name.span,
                })
            }
            Some(_) => {}
        }
    }

    fn check_conditional(&mut self, cond: &Conditional<Type>) {
        if cond.condition.type_context != Type::Bool {
            self.errors.push(SemanticError::NonBoolCondition {
                found: cond.condition.type_context,
                span: cond.condition.span,
            });
        }

        self.with_scope(|this| this.check_statements(&cond.then_branch.statements));
        match cond.else_branch.as_deref() {
            Some(ElseBranch::Block(block)) => {
                self.with_scope(|this| this.check_statements(&block.statements));
            }
            Some(ElseBranch::If(nested)) => self.check_conditional(nested),
            None => {}
        }
    }

    fn bind(&mut self, name: &Ident, typ: Type) {
        self.scopes.add_to_scope(
            name.as_str(),
            Binding {
                span: name.span,
                typ: Some(typ),
            },
        );
    }
}
