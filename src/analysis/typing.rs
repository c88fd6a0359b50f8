//! Expression typing
//!
//! Shared by every phase that needs the type of an expression. Errors are pushed
//! onto the analyzer and `None` is returned, so callers only have to stop.

use super::{Analyzer, SemanticError};
use crate::ast::*;
use crate::builtin::BuiltinFunction;
use crate::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandError {
    /// Both sides must have the same type
    Mismatch,

    /// The operator is not defined for this operand type
    Invalid,
}

/// Result type of `lhs op rhs`
///
/// | operators           | operands           | result   |
/// |---------------------|--------------------|----------|
/// | `+ - * /`           | `int`, `float`     | operand  |
/// | `< <= > >= == !=`   | `int`, `float`     | `bool`   |
/// | `== !=`             | `bool`             | `bool`   |
/// | `&& \|\|`           | `bool`             | `bool`   |
pub fn binary_result(op: BinaryOperation, lhs: Type, rhs: Type) -> Result<Type, OperandError> {
    if lhs != rhs {
        return Err(OperandError::Mismatch);
    }

    use BinaryOperation as Op;
    match (op, lhs) {
        (Op::Add | Op::Sub | Op::Mul | Op::Div, Type::Int | Type::Float) => Ok(lhs),
        (
            Op::Less | Op::LessEq | Op::Greater | Op::GreaterEq | Op::Equals | Op::NotEquals,
            Type::Int | Type::Float,
        ) => Ok(Type::Bool),
        (Op::Equals | Op::NotEquals, Type::Bool) => Ok(Type::Bool),
        (Op::And | Op::Or, Type::Bool) => Ok(Type::Bool),
        _ => Err(OperandError::Invalid),
    }
}

impl Analyzer<'_> {
    pub(super) fn type_expression(
        &mut self,
        expr: &Expression<NoTypeContext>,
    ) -> Option<Expression<Type>> {
        let (kind, typ) = match &expr.kind {
            ExpressionKind::Literal(literal) => (ExpressionKind::Literal(*literal), literal.typ()),
            ExpressionKind::Identifier(ident) => {
                let typ = self.variable_type(ident)?;
                (ExpressionKind::Identifier(ident.clone()), typ)
            }
            ExpressionKind::Call(call) => {
                let (call, typ) = self.type_call(call)?;
                let Some(typ) = typ else {
                    self.errors.push(SemanticError::UnknownReturnType {
                        name: call.function.name.clone(),
                        span: call.span,
                    });
                    return None;
                };
                (ExpressionKind::Call(call), typ)
            }
            ExpressionKind::Binary { op, lhs, rhs } => {
                let lhs = self.type_expression(lhs);
                let rhs = self.type_expression(rhs);
                let (lhs, rhs) = (lhs?, rhs?);

                let typ = match binary_result(*op, lhs.type_context, rhs.type_context) {
                    Ok(typ) => typ,
                    Err(OperandError::Mismatch) => {
                        self.errors.push(SemanticError::OperandMismatch {
                            op: *op,
                            lhs: lhs.type_context,
                            rhs: rhs.type_context,
                            span: expr.span,
                        });
                        return None;
                    }
                    Err(OperandError::Invalid) => {
                        self.errors.push(SemanticError::InvalidOperands {
                            op: *op,
                            typ: lhs.type_context,
                            span: expr.span,
                        });
                        return None;
                    }
                };

                let kind = ExpressionKind::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                (kind, typ)
            }
        };

        Some(Expression {
            kind,
            span: expr.span,
            type_context: typ,
        })
    }

    /// Type a call and check it against the callee's signature
    ///
    /// Also yields the callee's return type, which may still be unknown.
    pub(super) fn type_call(
        &mut self,
        call: &Call<NoTypeContext>,
    ) -> Option<(Call<Type>, Option<Type>)> {
        let name = call.function.as_str();
        let args: Vec<_> = call
            .args
            .iter()
            .map(|arg| self.type_expression(arg))
            .collect();

        if let Some(builtin) = BuiltinFunction::from_name(name) {
            for arg in args.iter().flatten() {
                if arg.type_context == Type::Void {
                    self.errors.push(SemanticError::VoidArgument {
                        function: name.to_owned(),
                        span: arg.span,
                    });
                    return None;
                }
            }

            let args = args.into_iter().collect::<Option<Vec<_>>>()?;
            return Some((typed_call(call, args), Some(builtin.return_type())));
        }

        let Some(function) = self.functions.get(name) else {
            self.errors.push(SemanticError::UndefinedFunction {
                name: name.to_owned(),
                span: call.function.span,
            });
            return None;
        };
        let params = function.params.clone();
        let return_type = function.return_type;

        if params.len() != args.len() {
            self.errors.push(SemanticError::ArgumentCount {
                name: name.to_owned(),
                expected: params.len(),
                found: args.len(),
                span: call.span,
            });
            return None;
        }

        let args = args.into_iter().collect::<Option<Vec<_>>>()?;

        let mismatch = args
            .iter()
            .zip(&params)
            .enumerate()
            .find(|(_, (arg, param))| arg.type_context != **param);
        if let Some((i, (arg, param))) = mismatch {
            self.errors.push(SemanticError::ArgumentType {
                name: name.to_owned(),
                position: i + 1,
                expected: *param,
                found: arg.type_context,
                span: arg.span,
            });
            return None;
        }

        Some((typed_call(call, args), return_type))
    }

    fn variable_type(&mut self, ident: &Ident) -> Option<Type> {
        match self.scopes.lookup(ident.as_str()) {
            Some(binding) => binding.typ,
            None => {
                self.errors.push(SemanticError::UndefinedVariable {
                    name: ident.name.clone(),
                    span: ident.span,
                });
                None
            }
        }
    }
}

fn typed_call(call: &Call<NoTypeContext>, args: Vec<Expression<Type>>) -> Call<Type> {
    Call {
        function: call.function.clone(),
        args,
        span: call.span,
    }
}
