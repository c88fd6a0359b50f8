//! Recursive descent parser
//!
//! ```text
//! Stmt        := (VarDecl | VarAssign | Call | FuncDef | Return | Conditional | Block) ';'
//! VarDecl     := Id ':' Type? ('=' Expr)?
//! VarAssign   := Id '=' Expr
//! FuncDef     := 'func' Id '(' (Id ':' Type (',' Id ':' Type)*)? ')' Type? Block
//! Return      := 'return' Expr?
//! Conditional := 'if' '(' Expr ')' Block ('else' (Block | Conditional))?
//! Block       := '{' Stmt* '}'
//! Expr        := Term (BinOp Term)*
//! Term        := Literal | Id | Call | '(' Expr ')'
//! Call        := Id '(' (Expr (',' Expr)*)? ')'
//! ```
//!
//! The `;` is optional after statements ending in a block. Parsing stops at the
//! first error, there is no recovery.

use tracing::trace;

use super::token::{Keyword, Operator, Punctuation, Token, TokenKind};
use super::ParsingError;
use crate::ast::*;
use crate::Span;

type Result<T> = std::result::Result<T, ParsingError>;

/// Deepest nesting of blocks, conditionals and expressions
const MAX_NESTING: usize = 128;

type Stmt = Statement<NoTypeContext>;
type Expr = Expression<NoTypeContext>;

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    /// `tokens` should end with [TokenKind::EndOfInput], one is added otherwise
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::EndOfInput) {
            let end = tokens
                .last()
                .map(|t| Span::marker(t.span.end, t.span.line, t.span.column))
                .unwrap_or_default();
            tokens.push(Token::new(TokenKind::EndOfInput, end));
        }

        Self {
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<UntypedProgram> {
        let mut statements = Vec::new();
        while !self.at(&TokenKind::EndOfInput) {
            statements.push(self.parse_statement()?);
        }

        Ok(UntypedProgram { statements })
    }

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + offset).min(last)]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek(0).kind == kind
    }

    fn get(&mut self) -> Token {
        let token = self.peek(0).clone();
        if token.kind != TokenKind::EndOfInput {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(&kind) {
            Ok(self.get())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn expect_punctuation(&mut self, punct: Punctuation) -> Result<Token> {
        self.expect(TokenKind::Punctuation(punct))
    }

    fn expect_operator(&mut self, op: Operator) -> Result<Token> {
        self.expect(TokenKind::Operator(op))
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParsingError {
        let token = self.peek(0);
        ParsingError::UnexpectedToken {
            expected: expected.into(),
            found: token.kind.describe(),
            span: token.span,
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.depth >= MAX_NESTING {
            return Err(ParsingError::NestingTooDeep {
                span: self.peek(0).span,
            });
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let statement = match &self.peek(0).kind {
            TokenKind::Ident(_) => match &self.peek(1).kind {
                TokenKind::Punctuation(Punctuation::ParenOpen) => Statement::Call(self.parse_call()?),
                TokenKind::Operator(Operator::Assign) => {
                    Statement::VariableAssign(self.parse_var_assign()?)
                }
                TokenKind::Operator(Operator::Colon) => {
                    Statement::VariableDecl(self.parse_var_decl()?)
                }
                other => {
                    let token = self.peek(1);
                    return Err(ParsingError::UnexpectedToken {
                        expected: String::from("':', '=' or '(' after identifier"),
                        found: other.describe(),
                        span: token.span,
                    });
                }
            },
            TokenKind::Keyword(Keyword::Func) => Statement::FunctionDef(self.parse_func_def()?),
            TokenKind::Keyword(Keyword::Return) => Statement::Return(self.parse_return()?),
            TokenKind::Keyword(Keyword::If) => Statement::Conditional(self.parse_conditional()?),
            TokenKind::Punctuation(Punctuation::CurlyOpen) => Statement::Block(self.parse_block()?),
            other => {
                return Err(ParsingError::InvalidStatementStart {
                    found: other.describe(),
                    span: self.peek(0).span,
                })
            }
        };

        if statement.ends_with_block() {
            if self.at(&TokenKind::EndOfStatement) {
                self.get();
            }
        } else {
            self.expect(TokenKind::EndOfStatement)?;
        }

        trace!(kind = statement.kind_name(), span = %statement.span(), "statement");
        Ok(statement)
    }

    fn parse_block(&mut self) -> Result<Block<NoTypeContext>> {
        let open = self.expect_punctuation(Punctuation::CurlyOpen)?;

        let statements = self.nested(|this| {
            let mut statements = Vec::new();
            while !this.at(&TokenKind::Punctuation(Punctuation::CurlyClose)) {
                if this.at(&TokenKind::EndOfInput) {
                    return Err(this.unexpected(Punctuation::CurlyClose.to_string()));
                }
                statements.push(this.parse_statement()?);
            }
            Ok(statements)
        })?;
        self.get();

        Ok(Block {
            statements,
            span: open.span,
        })
    }

    fn parse_var_decl(&mut self) -> Result<VariableDecl<NoTypeContext>> {
        let name = self.parse_ident()?;
        self.expect_operator(Operator::Colon)?;

        let declared = self.parse_type();
        let value = if declared.is_none() || self.at(&TokenKind::Operator(Operator::Assign)) {
            self.expect_operator(Operator::Assign)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(VariableDecl {
            name,
            declared,
            value,
            typ: NoTypeContext,
        })
    }

    fn parse_var_assign(&mut self) -> Result<VariableAssign<NoTypeContext>> {
        let name = self.parse_ident()?;
        self.expect_operator(Operator::Assign)?;
        let value = self.parse_expression()?;

        Ok(VariableAssign { name, value })
    }

    fn parse_func_def(&mut self) -> Result<FunctionDef<NoTypeContext>> {
        self.expect(TokenKind::Keyword(Keyword::Func))?;
        let name = self.parse_ident()?;
        let params = self.parse_def_params()?;
        let declared_return = self.parse_type();
        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            declared_return,
            body,
            return_type: NoTypeContext,
        })
    }

    fn parse_def_params(&mut self) -> Result<Vec<Parameter>> {
        self.expect_punctuation(Punctuation::ParenOpen)?;

        let mut params = Vec::new();
        while !self.at(&TokenKind::Punctuation(Punctuation::ParenClose)) {
            if !params.is_empty() {
                self.expect_punctuation(Punctuation::Comma)?;
            }

            let name = self.parse_ident()?;
            self.expect_operator(Operator::Colon)?;
            let typ = self
                .parse_type()
                .ok_or_else(|| self.unexpected("a type"))?;
            params.push(Parameter { name, typ });
        }
        self.get();

        Ok(params)
    }

    fn parse_return(&mut self) -> Result<Return<NoTypeContext>> {
        let keyword = self.expect(TokenKind::Keyword(Keyword::Return))?;

        let value = if self.at(&TokenKind::EndOfStatement) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        Ok(Return {
            value,
            span: keyword.span,
        })
    }

    fn parse_conditional(&mut self) -> Result<Conditional<NoTypeContext>> {
        let keyword = self.expect(TokenKind::Keyword(Keyword::If))?;

        self.expect_punctuation(Punctuation::ParenOpen)?;
        let condition = self.parse_expression()?;
        self.expect_punctuation(Punctuation::ParenClose)?;

        let then_branch = self.parse_block()?;

        let else_branch = if self.at(&TokenKind::Keyword(Keyword::Else)) {
            self.get();
            let branch = if self.at(&TokenKind::Keyword(Keyword::If)) {
                ElseBranch::If(self.nested(Self::parse_conditional)?)
            } else {
                ElseBranch::Block(self.parse_block()?)
            };
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Conditional {
            condition,
            then_branch,
            else_branch,
            span: keyword.span,
        })
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.nested(|this| this.parse_binary(0))
    }

    /// Precedence climbing, all operators are left associative
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut lhs = self.parse_term()?;

        while let Some(op) = self.peek_binary_operation() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.get();

            let rhs = self.parse_binary(precedence + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Expression::untyped(
                ExpressionKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(lhs)
    }

    fn peek_binary_operation(&self) -> Option<BinaryOperation> {
        match self.peek(0).kind {
            TokenKind::Operator(op) => op.binary_operation(),
            _ => None,
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let token = self.peek(0).clone();

        let literal = match token.kind {
            TokenKind::Int(i) => Some(Literal::Int(i)),
            TokenKind::Float(x) => Some(Literal::Float(x)),
            TokenKind::Bool(b) => Some(Literal::Bool(b)),
            _ => None,
        };
        if let Some(literal) = literal {
            self.get();
            return Ok(Expression::untyped(ExpressionKind::Literal(literal), token.span));
        }

        match token.kind {
            TokenKind::Ident(_) => {
                if self.peek(1).kind == TokenKind::Punctuation(Punctuation::ParenOpen) {
                    let call = self.parse_call()?;
                    let span = call.span;
                    Ok(Expression::untyped(ExpressionKind::Call(call), span))
                } else {
                    let ident = self.parse_ident()?;
                    let span = ident.span;
                    Ok(Expression::untyped(ExpressionKind::Identifier(ident), span))
                }
            }
            TokenKind::Punctuation(Punctuation::ParenOpen) => {
                self.get();
                let inner = self.parse_expression()?;
                self.expect_punctuation(Punctuation::ParenClose)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_call(&mut self) -> Result<Call<NoTypeContext>> {
        let function = self.parse_ident()?;
        self.expect_punctuation(Punctuation::ParenOpen)?;

        let mut args = Vec::new();
        while !self.at(&TokenKind::Punctuation(Punctuation::ParenClose)) {
            if !args.is_empty() {
                self.expect_punctuation(Punctuation::Comma)?;
            }
            args.push(self.parse_expression()?);
        }
        let close = self.get();

        let span = function.span.to(close.span);
        Ok(Call {
            function,
            args,
            span,
        })
    }

    /// A type keyword, if there is one
    fn parse_type(&mut self) -> Option<TypeRef> {
        match self.peek(0).kind {
            TokenKind::TypeKeyword(typ) => {
                let token = self.get();
                Some(TypeRef {
                    typ,
                    span: token.span,
                })
            }
            _ => None,
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        match &self.peek(0).kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let token = self.get();
                Ok(Ident {
                    name,
                    span: token.span,
                })
            }
            _ => Err(self.unexpected("[ID]")),
        }
    }
}
