//! Per-function inference
//!
//! Walks every function body once, in source order. Return types of functions
//! without a declared type are fixed here, so a function can only use the
//! return value of such a function once it has been analyzed.

use tracing::trace;

use super::symbols::Binding;
use super::{Analyzer, SemanticError, SemanticWarning};
use crate::ast::*;
use crate::Type;

/// State of the function that is currently walked
#[derive(Debug)]
pub(super) struct FunctionContext {
    name: String,
    return_type: Option<Type>,
    returned: bool,
    unreachable_reported: bool,
}

impl FunctionContext {
    fn new(def: &FunctionDef<NoTypeContext>) -> Self {
        Self {
            name: def.name.name.clone(),
            return_type: def.declared_return.map(|t| t.typ),
            returned: false,
            unreachable_reported: false,
        }
    }
}

impl<'ast> Analyzer<'ast> {
    pub(super) fn infer_functions(&mut self) -> Vec<FunctionDef<Type>> {
        let defs: Vec<_> = self.functions.iter().map(|f| f.def).collect();

        defs.into_iter()
            .filter_map(|def| self.infer_function(def))
            .collect()
    }

    fn infer_function(&mut self, def: &'ast FunctionDef<NoTypeContext>) -> Option<FunctionDef<Type>> {
        let mut ctx = FunctionContext::new(def);

        let statements = self.with_scope(|this| {
            for param in &def.params {
                this.declare_parameter(param);
            }
            this.infer_statements(&mut ctx, &def.body.statements)
        });

        let return_type = match ctx.return_type {
            Some(typ) if typ != Type::Void && !ctx.returned => {
                self.errors.push(SemanticError::MissingReturn {
                    name: ctx.name.clone(),
                    typ,
                    span: def.name.span,
                });
                Some(typ)
            }
            Some(typ) => Some(typ),
            None if !ctx.returned => Some(Type::Void),
            // every return failed to type check
            None => None,
        };

        if let Some(function) = self.functions.get_mut(def.name.as_str()) {
            function.return_type = return_type;
        }
        trace!(function = %def.name, return_type = ?return_type, "function analyzed");

        Some(FunctionDef {
            name: def.name.clone(),
            params: def.params.clone(),
            declared_return: def.declared_return,
            body: Block {
                statements: statements?,
                span: def.body.span,
            },
            return_type: return_type?,
        })
    }

    fn declare_parameter(&mut self, param: &Parameter) {
        if param.typ.typ == Type::Void {
            self.errors.push(SemanticError::VoidBinding {
                name: param.name.name.clone(),
                span: param.name.span,
            });
        }
        self.declare(&param.name, Some(param.typ.typ));
    }

    /// Bind `name` in the innermost scope
    ///
    /// A name may only be bound once per scope, hiding an outer binding is a warning.
    fn declare(&mut self, name: &Ident, typ: Option<Type>) -> bool {
        if let Some(existing) = self.scopes.lookup_current(name.as_str()) {
            self.errors.push(SemanticError::Redefinition {
                name: name.name.clone(),
                span: name.span,
                previous: existing.span,
            });
            return false;
        }

        if let Some(outer) = self.scopes.lookup_enclosing(name.as_str()) {
            self.warnings.push(SemanticWarning::Shadowing {
                name: name.name.clone(),
                span: name.span,
                previous: outer.span,
            });
        }

        self.scopes.add_to_scope(
            name.as_str(),
            Binding {
                span: name.span,
                typ,
            },
        );
        true
    }

    fn infer_statements(
        &mut self,
        ctx: &mut FunctionContext,
        statements: &[Statement<NoTypeContext>],
    ) -> Option<Vec<Statement<Type>>> {
        let mut typed = Vec::with_capacity(statements.len());
        let mut failed = false;
        let mut after_return = false;

        for statement in statements {
            if after_return && !ctx.unreachable_reported {
                ctx.unreachable_reported = true;
                self.warnings.push(SemanticWarning::UnreachableCode {
                    function: ctx.name.clone(),
                    span: statement.span(),
                });
            }

            match self.infer_statement(ctx, statement) {
                Some(statement) => typed.push(statement),
                None => failed = true,
            }
            after_return |= matches!(statement, Statement::Return(_));
        }

        (!failed).then_some(typed)
    }

    fn infer_statement(
        &mut self,
        ctx: &mut FunctionContext,
        statement: &Statement<NoTypeContext>,
    ) -> Option<Statement<Type>> {
        match statement {
            Statement::Block(block) => self
                .with_scope(|this| this.infer_block(ctx, block))
                .map(Statement::Block),
            Statement::VariableDecl(decl) => self.infer_local(decl).map(Statement::VariableDecl),
            Statement::VariableAssign(assign) => {
                let value = self.type_expression(&assign.value)?;
                Some(Statement::VariableAssign(VariableAssign {
                    name: assign.name.clone(),
                    value,
                }))
            }
            Statement::Call(call) => self.type_call(call).map(|(call, _)| Statement::Call(call)),
            Statement::FunctionDef(def) => {
                self.errors.push(SemanticError::NestedFunction {
                    name: def.name.name.clone(),
                    span: def.name.span,
                });
                None
            }
            Statement::Return(ret) => self.infer_return(ctx, ret).map(Statement::Return),
            Statement::Conditional(cond) => self
                .infer_conditional(ctx, cond)
                .map(Statement::Conditional),
        }
    }

    fn infer_block(
        &mut self,
        ctx: &mut FunctionContext,
        block: &Block<NoTypeContext>,
    ) -> Option<Block<Type>> {
        let statements = self.infer_statements(ctx, &block.statements)?;
        Some(Block {
            statements,
            span: block.span,
        })
    }

    fn infer_local(&mut self, decl: &VariableDecl<NoTypeContext>) -> Option<VariableDecl<Type>> {
        let declared = decl.declared.map(|t| t.typ);

        let mut failed = false;
        let value = match &decl.value {
            Some(value) if is_self_reference(decl, value) => {
                self.errors.push(SemanticError::SelfReference {
                    name: decl.name.name.clone(),
                    span: value.span,
                });
                failed = true;
                None
            }
            Some(value) => {
                let typed = self.type_expression(value);
                failed |= typed.is_none();
                typed
            }
            None => None,
        };

        let typ = declared.or(value.as_ref().map(|v| v.type_context));
        if typ == Some(Type::Void) {
            self.errors.push(SemanticError::VoidBinding {
                name: decl.name.name.clone(),
                span: decl.name.span,
            });
            failed = true;
        }

        failed |= !self.declare(&decl.name, typ);

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

    fn infer_return(
        &mut self,
        ctx: &mut FunctionContext,
        ret: &Return<NoTypeContext>,
    ) -> Option<Return<Type>> {
        ctx.returned = true;

        let value = match &ret.value {
            Some(value) => Some(self.type_expression(value)?),
            None => None,
        };
        let found = value.as_ref().map_or(Type::Void, |v| v.type_context);

        match ctx.return_type {
            None => ctx.return_type = Some(found),
            Some(expected) if expected != found => {
                self.errors.push(SemanticError::ReturnTypeMismatch {
                    function: ctx.name.clone(),
                    expected,
                    found,
                    span: ret.span,
                });
                return None;
            }
            Some(_) => {}
        }

        Some(Return {
            value,
            span: ret.span,
        })
    }

    fn infer_conditional(
        &mut self,
        ctx: &mut FunctionContext,
        cond: &Conditional<NoTypeContext>,
    ) -> Option<Conditional<Type>> {
        let condition = self.type_expression(&cond.condition);
        let then_branch = self.with_scope(|this| this.infer_block(ctx, &cond.then_branch));

        let else_branch = match cond.else_branch.as_deref() {
            None => Some(None),
            Some(ElseBranch::Block(block)) => self
                .with_scope(|this| this.infer_block(ctx, block))
                .map(|block| Some(Box::new(ElseBranch::Block(block)))),
            Some(ElseBranch::If(nested)) => self
                .infer_conditional(ctx, nested)
                .map(|nested| Some(Box::new(ElseBranch::If(nested)))),
        };

        Some(Conditional {
            condition: condition?,
            then_branch: then_branch?,
            else_branch: else_branch?,
            span: cond.span,
        })
    }
}

/// `x: = x;`
pub(super) fn is_self_reference(
    decl: &VariableDecl<NoTypeContext>,
    value: &Expression<NoTypeContext>,
) -> bool {
    matches!(&value.kind, ExpressionKind::Identifier(ident) if ident.name == decl.name.name)
}
