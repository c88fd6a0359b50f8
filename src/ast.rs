//! Abstract syntax tree
//!
//! The tree is generic over its type annotation `T`. The parser produces an
//! [UntypedProgram] where every annotation is [NoTypeContext]; semantic analysis
//! turns it into a [TypedProgram] where every annotation is a resolved [Type].
//! Types therefore cannot be read before analysis has produced them.

use std::borrow::Cow;
use std::{fmt, io};

use ptree::{Style, TreeItem};

use crate::{Span, Type};

/// Annotation of a tree that has not been type checked yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoTypeContext;

/// The program as it comes out of the parser
#[derive(Debug, Clone, PartialEq)]
pub struct UntypedProgram {
    pub statements: Vec<Statement<NoTypeContext>>,
}

/// The program after semantic analysis
///
/// Only declarations survive at global scope, so the top level is split into
/// the global variable table and the function table (both in source order).
#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub globals: Vec<VariableDecl<Type>>,
    pub functions: Vec<FunctionDef<Type>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// A type written in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef {
    pub typ: Type,
    pub span: Span,
}

/// A parameter in a function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Ident,
    pub typ: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<T> {
    Block(Block<T>),
    VariableDecl(VariableDecl<T>),
    VariableAssign(VariableAssign<T>),
    Call(Call<T>),
    FunctionDef(FunctionDef<T>),
    Return(Return<T>),
    Conditional(Conditional<T>),
}

impl<T> Statement<T> {
    /// Position used when reporting something about the whole statement
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(block) => block.span,
            Statement::VariableDecl(decl) => decl.name.span,
            Statement::VariableAssign(assign) => assign.name.span,
            Statement::Call(call) => call.function.span,
            Statement::FunctionDef(def) => def.name.span,
            Statement::Return(ret) => ret.span,
            Statement::Conditional(cond) => cond.span,
        }
    }

    /// Statements ending in a `}` may omit the trailing `;`
    pub fn ends_with_block(&self) -> bool {
        matches!(
            self,
            Statement::Block(_) | Statement::FunctionDef(_) | Statement::Conditional(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Block(_) => "Block statements",
            Statement::VariableDecl(_) => "Variable declarations",
            Statement::VariableAssign(_) => "Variable assignments",
            Statement::Call(_) => "Function-call statements",
            Statement::FunctionDef(_) => "Function definitions",
            Statement::Return(_) => "Return statements",
            Statement::Conditional(_) => "Conditional statements",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    pub statements: Vec<Statement<T>>,
    /// The opening brace
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl<T> {
    pub name: Ident,
    pub declared: Option<TypeRef>,
    pub value: Option<Expression<T>>,
    pub typ: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssign<T> {
    pub name: Ident,
    pub value: Expression<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call<T> {
    pub function: Ident,
    pub args: Vec<Expression<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef<T> {
    pub name: Ident,
    pub params: Vec<Parameter>,
    pub declared_return: Option<TypeRef>,
    pub body: Block<T>,
    pub return_type: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return<T> {
    pub value: Option<Expression<T>>,
    /// The `return` keyword
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional<T> {
    pub condition: Expression<T>,
    pub then_branch: Block<T>,
    pub else_branch: Option<Box<ElseBranch<T>>>,
    /// The `if` keyword
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch<T> {
    Block(Block<T>),
    If(Conditional<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression<T> {
    pub kind: ExpressionKind<T>,
    pub span: Span,
    pub type_context: T,
}

impl Expression<NoTypeContext> {
    pub fn untyped(kind: ExpressionKind<NoTypeContext>, span: Span) -> Self {
        Self {
            kind,
            span,
            type_context: NoTypeContext,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind<T> {
    Identifier(Ident),
    Literal(Literal),
    Call(Call<T>),
    Binary {
        op: BinaryOperation,
        lhs: Box<Expression<T>>,
        rhs: Box<Expression<T>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    pub fn typ(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
    Add,
    Sub,
    Mul,
    Div,

    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equals,
    NotEquals,

    And,
    Or,
}

impl BinaryOperation {
    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Or => 1,
            BinaryOperation::And => 2,
            BinaryOperation::Equals | BinaryOperation::NotEquals => 3,
            BinaryOperation::Less
            | BinaryOperation::LessEq
            | BinaryOperation::Greater
            | BinaryOperation::GreaterEq => 4,
            BinaryOperation::Add | BinaryOperation::Sub => 5,
            BinaryOperation::Mul | BinaryOperation::Div => 6,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOperation::Add => "+",
            BinaryOperation::Sub => "-",
            BinaryOperation::Mul => "*",
            BinaryOperation::Div => "/",
            BinaryOperation::Less => "<",
            BinaryOperation::LessEq => "<=",
            BinaryOperation::Greater => ">",
            BinaryOperation::GreaterEq => ">=",
            BinaryOperation::Equals => "==",
            BinaryOperation::NotEquals => "!=",
            BinaryOperation::And => "&&",
            BinaryOperation::Or => "||",
        };
        f.write_str(text)
    }
}

/// A type annotation that can be shown in the tree view
pub trait Annotation {
    fn describe(&self) -> Option<String>;
}

impl Annotation for NoTypeContext {
    fn describe(&self) -> Option<String> {
        None
    }
}

impl Annotation for Type {
    fn describe(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Borrowed view of any node, used to print the tree with [ptree]
pub enum Node<'a, T> {
    Statement(&'a Statement<T>),
    Expression(&'a Expression<T>),
    Parameter(&'a Parameter),
    Else(&'a ElseBranch<T>),
}

impl<T> Clone for Node<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Node<'_, T> {}

impl UntypedProgram {
    /// Write the tree view of every top level statement to `out`
    pub fn write_tree<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for statement in &self.statements {
            ptree::write_tree(&Node::Statement(statement), &mut *out)?;
        }
        Ok(())
    }
}

impl TypedProgram {
    /// Like [UntypedProgram::write_tree], with every node showing its type
    pub fn write_tree<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for global in &self.globals {
            let statement = Statement::VariableDecl(global.clone());
            ptree::write_tree(&Node::Statement(&statement), &mut *out)?;
        }
        for function in &self.functions {
            let statement = Statement::FunctionDef(function.clone());
            ptree::write_tree(&Node::Statement(&statement), &mut *out)?;
        }
        Ok(())
    }
}

fn with_type<T: Annotation>(text: String, annotation: &T) -> String {
    match annotation.describe() {
        Some(typ) => format!("{text} : {typ}"),
        None => text,
    }
}

fn block_children<T>(block: &Block<T>) -> Vec<Node<'_, T>> {
    block.statements.iter().map(Node::Statement).collect()
}

impl<'a, T: Annotation> TreeItem for Node<'a, T> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        let text = match self {
            Node::Statement(Statement::Block(_)) => String::from("BLOCK"),
            Node::Statement(Statement::VariableDecl(decl)) => {
                let declared = decl
                    .declared
                    .map_or_else(|| String::from("auto"), |t| t.typ.to_string());
                with_type(format!("DECL {}: {declared}", decl.name), &decl.typ)
            }
            Node::Statement(Statement::VariableAssign(assign)) => {
                format!("ASSIGN {}", assign.name)
            }
            Node::Statement(Statement::Call(call)) => format!("CALL {}", call.function),
            Node::Statement(Statement::FunctionDef(def)) => {
                let declared = def
                    .declared_return
                    .map_or_else(|| String::from("auto"), |t| t.typ.to_string());
                with_type(format!("FUNC {} -> {declared}", def.name), &def.return_type)
            }
            Node::Statement(Statement::Return(_)) => String::from("RETURN"),
            Node::Statement(Statement::Conditional(_)) => String::from("IF"),
            Node::Expression(expr) => {
                let text = match &expr.kind {
                    ExpressionKind::Identifier(ident) => ident.name.clone(),
                    ExpressionKind::Literal(literal) => literal.to_string(),
                    ExpressionKind::Call(call) => format!("CALL {}", call.function),
                    ExpressionKind::Binary { op, .. } => op.to_string(),
                };
                with_type(text, &expr.type_context)
            }
            Node::Parameter(param) => format!("PARAM {}: {}", param.name, param.typ.typ),
            Node::Else(_) => String::from("ELSE"),
        };

        write!(f, "{}", style.paint(text))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let children = match *self {
            Node::Statement(statement) => match statement {
                Statement::Block(block) => block_children(block),
                Statement::VariableDecl(decl) => {
                    decl.value.iter().map(Node::Expression).collect()
                }
                Statement::VariableAssign(assign) => vec![Node::Expression(&assign.value)],
                Statement::Call(call) => call.args.iter().map(Node::Expression).collect(),
                Statement::FunctionDef(def) => def
                    .params
                    .iter()
                    .map(Node::Parameter)
                    .chain(block_children(&def.body))
                    .collect(),
                Statement::Return(ret) => ret.value.iter().map(Node::Expression).collect(),
                Statement::Conditional(cond) => {
                    let mut children = vec![Node::Expression(&cond.condition)];
                    children.extend(block_children(&cond.then_branch));
                    if let Some(else_branch) = &cond.else_branch {
                        children.push(Node::Else(else_branch));
                    }
                    children
                }
            },
            Node::Expression(expr) => match &expr.kind {
                ExpressionKind::Identifier(_) | ExpressionKind::Literal(_) => vec![],
                ExpressionKind::Call(call) => call.args.iter().map(Node::Expression).collect(),
                ExpressionKind::Binary { lhs, rhs, .. } => {
                    vec![Node::Expression(lhs), Node::Expression(rhs)]
                }
            },
            Node::Parameter(_) => vec![],
            Node::Else(ElseBranch::Block(block)) => block_children(block),
            Node::Else(ElseBranch::If(cond)) => {
                let mut children = vec![Node::Expression(&cond.condition)];
                children.extend(block_children(&cond.then_branch));
                if let Some(else_branch) = &cond.else_branch {
                    children.push(Node::Else(else_branch));
                }
                children
            }
        };

        Cow::from(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_view_mentions_every_node() {
        let program = crate::parse("x: int = 1 + 2; func f(a: bool) { if (a) { f(a); }; };").unwrap();

        let mut out = Vec::new();
        program.write_tree(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        for needle in ["DECL x: int", "+", "FUNC f -> auto", "PARAM a: bool", "IF", "CALL f"] {
            assert!(out.contains(needle), "{needle} missing in\n{out}");
        }
    }

    #[test]
    fn typed_tree_shows_types() {
        let program = crate::parse("x: = 2.5; func f() { return x < 1.0; };").unwrap();
        let analysis = crate::analyze(&program).unwrap();

        let mut out = Vec::new();
        analysis.program.write_tree(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("DECL x: auto : float"), "{out}");
        assert!(out.contains("FUNC f -> auto : bool"), "{out}");
        assert!(out.contains("< : bool"), "{out}");
    }

    #[test]
    fn precedence_order() {
        assert!(BinaryOperation::Mul.precedence() > BinaryOperation::Add.precedence());
        assert!(BinaryOperation::Add.precedence() > BinaryOperation::Less.precedence());
        assert!(BinaryOperation::Less.precedence() > BinaryOperation::Equals.precedence());
        assert!(BinaryOperation::Equals.precedence() > BinaryOperation::And.precedence());
        assert!(BinaryOperation::And.precedence() > BinaryOperation::Or.precedence());
    }
}
