//! Lowering
//!
//! This module is responsible for lowering the typed AST down to our intermediate
//! representation ([ir]). The main interface is the [lower] function.
//!
//! Lowering happens in passes over the program:
//! 1. globals, with their initializers folded to constants
//! 2. extern declarations of the builtins
//! 3. all function signatures, so calls to functions defined later resolve
//! 4. all function bodies
//!
//! Operators are selected by the types attached during analysis. A combination that
//! analysis should have rejected is reported as [LoweringError::Internal].

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::*;
use crate::builtin::{self, BuiltinFunction};
use crate::ir::{self, BlockId, Constant, Instruction, Operand, Place, Slot, Terminator};
use crate::{DiagnosticRecord, ScopeStack, Severity, Span, Type, Variable};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum LoweringError {
    #[error("Global variable `{name}` cannot be initialized with a constant")]
    #[diagnostic(help("Globals may only be initialized with a literal or an earlier global"))]
    UnsupportedGlobalInitializer {
        name: String,

        #[label("this initializer")]
        span: Span,
    },

    #[error("internal compiler error: {context}")]
    Internal {
        context: String,

        #[label("while lowering this")]
        span: Span,
    },
}

impl LoweringError {
    pub fn span(&self) -> Span {
        match self {
            LoweringError::UnsupportedGlobalInitializer { span, .. }
            | LoweringError::Internal { span, .. } => *span,
        }
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord::new(Severity::Error, self.to_string(), self.span())
    }
}

fn internal(context: impl Into<String>, span: Span) -> LoweringError {
    LoweringError::Internal {
        context: context.into(),
        span,
    }
}

type Result<T> = std::result::Result<T, LoweringError>;

/// Turn the typed AST into an IR module called `module_name`
pub fn lower(program: &TypedProgram, module_name: &str) -> Result<ir::Module> {
    let mut lowerer = Lowerer::new(module_name);
    lowerer.lower_program(program)?;

    let module = lowerer.module;
    debug!(
        globals = module.globals.len(),
        functions = module.functions.len(),
        strings = module.strings.len(),
        "lowering finished"
    );
    Ok(module)
}

/// The module under construction and the signatures known so far
struct Lowerer {
    module: ir::Module,
    return_types: HashMap<String, Type>,
}

impl Lowerer {
    fn new(module_name: &str) -> Self {
        Self {
            module: ir::Module {
                name: module_name.to_owned(),
                globals: Vec::new(),
                strings: Vec::new(),
                externs: Vec::new(),
                functions: Vec::new(),
            },
            return_types: HashMap::new(),
        }
    }

    fn lower_program(&mut self, program: &TypedProgram) -> Result<()> {
        for decl in &program.globals {
            let init = self.fold_global(decl)?;
            self.module.globals.push(ir::Global {
                name: decl.name.name.clone(),
                typ: decl.typ,
                init,
            });
        }

        self.module.externs.push(BuiltinFunction::Print.prototype());

        for def in &program.functions {
            self.return_types
                .insert(def.name.name.clone(), def.return_type);
        }

        for def in &program.functions {
            let function = self.lower_function(def)?;
            self.module.functions.push(function);
        }

        Ok(())
    }

    /// Constant value of a global
    fn fold_global(&self, decl: &VariableDecl<Type>) -> Result<Constant> {
        let Some(value) = &decl.value else {
            return Constant::zero(decl.typ)
                .ok_or_else(|| internal("global of type void", decl.name.span));
        };

        match &value.kind {
            ExpressionKind::Literal(literal) => Ok(constant(*literal)),
            ExpressionKind::Identifier(ident) => self
                .module
                .global(ident.as_str())
                .map(|global| global.init)
                .ok_or_else(|| internal(format!("global `{ident}` is not lowered yet"), ident.span)),
            ExpressionKind::Call(_) | ExpressionKind::Binary { .. } => {
                Err(LoweringError::UnsupportedGlobalInitializer {
                    name: decl.name.name.clone(),
                    span: value.span,
                })
            }
        }
    }

    fn lower_function(&mut self, def: &FunctionDef<Type>) -> Result<ir::Function> {
        let mut builder = FunctionBuilder::new(
            &self.module.globals,
            &mut self.module.strings,
            &self.return_types,
            def.return_type,
        );

        let entry = builder.create_block(String::from("entry"));
        builder.switch_to(entry);

        for (i, param) in def.params.iter().enumerate() {
            let slot = builder.allocate(&param.name, param.typ.typ);
            builder.emit(Instruction::Store {
                target: Place::Slot(slot),
                value: Operand::Param(i),
            });
        }

        builder.lower_statements(&def.body.statements)?;

        let blocks = builder.finish();
        trace!(function = %def.name, blocks = blocks.len(), "function lowered");

        Ok(ir::Function {
            name: def.name.name.clone(),
            params: def.params.iter().map(|p| p.typ.typ).collect(),
            return_type: def.return_type,
            blocks,
        })
    }
}

fn constant(literal: Literal) -> Constant {
    match literal {
        Literal::Int(i) => Constant::Int(i),
        Literal::Float(x) => Constant::Float(x),
        Literal::Bool(b) => Constant::Bool(b),
    }
}

#[derive(Debug)]
struct PendingBlock {
    label: String,
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

/// Lowers the body of a single function
///
/// Blocks are created up front and laid out in the order they are first
/// switched to. Once a block is terminated there is no current block, the
/// next instruction opens an `unreachable.N` block.
struct FunctionBuilder<'a> {
    globals: &'a [ir::Global],
    strings: &'a mut Vec<ir::StringConstant>,
    return_types: &'a HashMap<String, Type>,
    return_type: Type,

    blocks: Vec<PendingBlock>,
    layout: Vec<BlockId>,
    current: Option<BlockId>,

    scopes: ScopeStack<Slot>,
    fresh_variable: Variable,
    next_slot: usize,
    conditionals: usize,
    unreachable: usize,
}

impl<'a> FunctionBuilder<'a> {
    fn new(
        globals: &'a [ir::Global],
        strings: &'a mut Vec<ir::StringConstant>,
        return_types: &'a HashMap<String, Type>,
        return_type: Type,
    ) -> Self {
        Self {
            globals,
            strings,
            return_types,
            return_type,
            blocks: Vec::new(),
            layout: Vec::new(),
            current: None,
            scopes: ScopeStack::new(),
            fresh_variable: Variable::default(),
            next_slot: 0,
            conditionals: 0,
            unreachable: 0,
        }
    }

    fn create_block(&mut self, label: String) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(PendingBlock {
            label,
            instructions: Vec::new(),
            terminator: None,
        });
        id
    }

    fn switch_to(&mut self, id: BlockId) {
        if !self.layout.contains(&id) {
            self.layout.push(id);
        }
        self.current = Some(id);
    }

    /// The block instructions currently go to
    fn current_block(&mut self) -> BlockId {
        match self.current {
            Some(id) => id,
            None => {
                let id = self.create_block(format!("unreachable.{}", self.unreachable));
                self.unreachable += 1;
                self.switch_to(id);
                id
            }
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        let id = self.current_block();
        self.blocks[id.0].instructions.push(instruction);
    }

    fn terminate(&mut self, terminator: Terminator) {
        let id = self.current_block();
        self.blocks[id.0].terminator = Some(terminator);
        self.current = None;
    }

    /// Branch to `target` unless the current block is already terminated
    fn branch_if_open(&mut self, target: BlockId) {
        if self.current.is_some() {
            self.terminate(Terminator::Branch(target));
        }
    }

    fn fresh_variable(&mut self) -> Variable {
        let var = self.fresh_variable;
        self.fresh_variable.advance();
        var
    }

    fn allocate(&mut self, name: &Ident, typ: Type) -> Slot {
        let slot = Slot(self.next_slot);
        self.next_slot += 1;

        self.emit(Instruction::Alloca {
            slot,
            typ,
            name: name.name.clone(),
        });
        self.scopes.add_to_scope(name.as_str(), slot);
        slot
    }

    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.enter_scope();
        let result = f(self);
        self.scopes.leave_scope();
        result
    }

    /// Close the last block and lay out all blocks
    fn finish(mut self) -> Vec<ir::BasicBlock> {
        if self.current.is_some() {
            let value = Constant::zero(self.return_type).map(Operand::Const);
            self.terminate(Terminator::Return(value));
        }

        let mut blocks: Vec<_> = self.blocks.into_iter().map(Some).collect();
        self.layout
            .into_iter()
            .filter_map(|id| {
                let block = blocks[id.0].take()?;
                Some(ir::BasicBlock {
                    id,
                    label: block.label,
                    instructions: block.instructions,
                    terminator: block
                        .terminator
                        .unwrap_or(Terminator::Return(None)),
                })
            })
            .collect()
    }

    fn place(&self, ident: &Ident) -> Result<Place> {
        if let Some(slot) = self.scopes.lookup(ident.as_str()) {
            return Ok(Place::Slot(*slot));
        }

        if self.globals.iter().any(|g| g.name == ident.name) {
            Ok(Place::Global(ident.name.clone()))
        } else {
            Err(internal(format!("unbound variable `{ident}`"), ident.span))
        }
    }

    /// Name of the string constant holding `value`, added on first use
    fn intern(&mut self, value: String) -> String {
        if let Some(existing) = self.strings.iter().find(|s| s.value == value) {
            return existing.name.clone();
        }

        let name = format!("str.{}", self.strings.len());
        self.strings.push(ir::StringConstant {
            name: name.clone(),
            value,
        });
        name
    }

    fn lower_statements(&mut self, statements: &[Statement<Type>]) -> Result<()> {
        for statement in statements {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &Statement<Type>) -> Result<()> {
        match statement {
            Statement::Block(block) => {
                self.with_scope(|this| this.lower_statements(&block.statements))
            }
            Statement::VariableDecl(decl) => {
                let value = match &decl.value {
                    Some(value) => self.lower_value(value)?,
                    None => Constant::zero(decl.typ)
                        .map(Operand::Const)
                        .ok_or_else(|| internal("variable of type void", decl.name.span))?,
                };
                let slot = self.allocate(&decl.name, decl.typ);
                self.emit(Instruction::Store {
                    target: Place::Slot(slot),
                    value,
                });
                Ok(())
            }
            Statement::VariableAssign(assign) => {
                let target = self.place(&assign.name)?;
                let value = self.lower_value(&assign.value)?;
                self.emit(Instruction::Store { target, value });
                Ok(())
            }
            Statement::Call(call) => self.lower_call(call).map(|_| ()),
            Statement::Return(ret) => self.lower_return(ret),
            Statement::Conditional(cond) => self.lower_conditional(cond),
            Statement::FunctionDef(def) => {
                Err(internal("nested function definition", def.name.span))
            }
        }
    }

    fn lower_return(&mut self, ret: &Return<Type>) -> Result<()> {
        let value = match &ret.value {
            Some(value) if value.type_context == Type::Void => {
                self.lower_expression(value)?;
                None
            }
            Some(value) => Some(self.lower_value(value)?),
            None => None,
        };

        self.terminate(Terminator::Return(value));
        Ok(())
    }

    fn lower_conditional(&mut self, cond: &Conditional<Type>) -> Result<()> {
        let condition = self.lower_value(&cond.condition)?;

        let n = self.conditionals;
        self.conditionals += 1;

        let then_block = self.create_block(format!("then.{n}"));
        let else_block = cond
            .else_branch
            .as_ref()
            .map(|_| self.create_block(format!("else.{n}")));
        let merge_block = self.create_block(format!("merge.{n}"));

        self.terminate(Terminator::CondBranch {
            cond: condition,
            then_block,
            else_block: else_block.unwrap_or(merge_block),
        });

        self.switch_to(then_block);
        self.with_scope(|this| this.lower_statements(&cond.then_branch.statements))?;
        self.branch_if_open(merge_block);

        if let (Some(else_block), Some(branch)) = (else_block, cond.else_branch.as_deref()) {
            self.switch_to(else_block);
            match branch {
                ElseBranch::Block(block) => {
                    self.with_scope(|this| this.lower_statements(&block.statements))?
                }
                ElseBranch::If(nested) => self.lower_conditional(nested)?,
            }
            self.branch_if_open(merge_block);
        }

        self.switch_to(merge_block);
        Ok(())
    }

    /// Lower an expression that has to produce a value
    fn lower_value(&mut self, expr: &Expression<Type>) -> Result<Operand> {
        self.lower_expression(expr)?
            .ok_or_else(|| internal("expression of type void used as a value", expr.span))
    }

    fn lower_expression(&mut self, expr: &Expression<Type>) -> Result<Option<Operand>> {
        match &expr.kind {
            ExpressionKind::Literal(literal) => Ok(Some(Operand::Const(constant(*literal)))),
            ExpressionKind::Identifier(ident) => {
                let source = self.place(ident)?;
                let dest = self.fresh_variable();
                self.emit(Instruction::Load {
                    dest,
                    typ: expr.type_context,
                    source,
                });
                Ok(Some(Operand::Temp(dest)))
            }
            ExpressionKind::Call(call) => self.lower_call(call),
            ExpressionKind::Binary { op, lhs, rhs } => {
                let op = select_binary(*op, lhs.type_context, rhs.type_context)
                    .ok_or_else(|| {
                        internal(
                            format!(
                                "no instruction for `{} {op} {}`",
                                lhs.type_context, rhs.type_context
                            ),
                            expr.span,
                        )
                    })?;

                let lhs = self.lower_value(lhs)?;
                let rhs = self.lower_value(rhs)?;
                let dest = self.fresh_variable();
                self.emit(Instruction::Binary { dest, op, lhs, rhs });
                Ok(Some(Operand::Temp(dest)))
            }
        }
    }

    /// Arguments are evaluated left to right, `printf` gets its format string first
    fn lower_call(&mut self, call: &Call<Type>) -> Result<Option<Operand>> {
        let mut args = Vec::with_capacity(call.args.len() + 1);
        for arg in &call.args {
            args.push(self.lower_value(arg)?);
        }

        let name = call.function.as_str();
        let (function, return_type) = match BuiltinFunction::from_name(name) {
            Some(builtin) => {
                let types: Vec<_> = call.args.iter().map(|a| a.type_context).collect();
                let format = self.intern(builtin::format_string(&types));
                args.insert(0, Operand::Str(format));
                (builtin.symbol().to_owned(), builtin.return_type())
            }
            None => {
                let return_type = self.return_types.get(name).copied().ok_or_else(|| {
                    internal(format!("call to unknown function `{name}`"), call.span)
                })?;
                (name.to_owned(), return_type)
            }
        };

        let dest = (return_type != Type::Void).then(|| self.fresh_variable());
        self.emit(Instruction::Call {
            dest,
            function,
            args,
        });
        Ok(dest.map(Operand::Temp))
    }
}

/// Instruction for `lhs op rhs`, `None` if the operand types do not allow `op`
fn select_binary(op: BinaryOperation, lhs: Type, rhs: Type) -> Option<ir::BinaryInstr> {
    use ir::BinaryInstr as I;
    use BinaryOperation as Op;

    if lhs != rhs {
        return None;
    }

    let instr = match (lhs, op) {
        (Type::Int, Op::Add) => I::IAdd,
        (Type::Int, Op::Sub) => I::ISub,
        (Type::Int, Op::Mul) => I::IMul,
        (Type::Int, Op::Div) => I::SDiv,
        (Type::Float, Op::Add) => I::FAdd,
        (Type::Float, Op::Sub) => I::FSub,
        (Type::Float, Op::Mul) => I::FMul,
        (Type::Float, Op::Div) => I::FDiv,
        (Type::Int, _) => I::ICmp(comparison(op)?),
        (Type::Float, _) => I::FCmp(comparison(op)?),
        (Type::Bool, Op::Equals) => I::ICmp(ir::CmpOp::Eq),
        (Type::Bool, Op::NotEquals) => I::ICmp(ir::CmpOp::Ne),
        (Type::Bool, Op::And) => I::And,
        (Type::Bool, Op::Or) => I::Or,
        _ => return None,
    };
    Some(instr)
}

fn comparison(op: BinaryOperation) -> Option<ir::CmpOp> {
    match op {
        BinaryOperation::Less => Some(ir::CmpOp::Lt),
        BinaryOperation::LessEq => Some(ir::CmpOp::Le),
        BinaryOperation::Greater => Some(ir::CmpOp::Gt),
        BinaryOperation::GreaterEq => Some(ir::CmpOp::Ge),
        BinaryOperation::Equals => Some(ir::CmpOp::Eq),
        BinaryOperation::NotEquals => Some(ir::CmpOp::Ne),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyze, parse};

    fn lower_src(src: &str) -> ir::Module {
        let program = parse(src).unwrap();
        let analysis = analyze(&program).unwrap();
        lower(&analysis.program, "test").unwrap()
    }

    fn labels(function: &ir::Function) -> Vec<&str> {
        function.blocks.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn global_and_main() {
        let module = lower_src("x: int = 5; func main() int { return x; };");

        assert_eq!(
            module.globals,
            vec![ir::Global {
                name: String::from("x"),
                typ: Type::Int,
                init: Constant::Int(5),
            }]
        );

        let main = module.function("main").unwrap();
        assert_eq!(main.blocks.len(), 1);
        assert_eq!(
            main.blocks[0].instructions,
            vec![Instruction::Load {
                dest: Variable::new(0),
                typ: Type::Int,
                source: Place::Global(String::from("x")),
            }]
        );
        assert_eq!(
            main.blocks[0].terminator,
            Terminator::Return(Some(Operand::Temp(Variable::new(0))))
        );
    }

    #[test]
    fn global_folding() {
        let module = lower_src("a: = 2.5; b: = a; c: bool;");

        let inits: Vec<_> = module.globals.iter().map(|g| g.init).collect();
        assert_eq!(
            inits,
            vec![
                Constant::Float(2.5),
                Constant::Float(2.5),
                Constant::Bool(false)
            ]
        );
    }

    #[test]
    fn binary_global_rejected() {
        let decl = VariableDecl {
            name: Ident {
                name: String::from("x"),
                span: Span::default(),
            },
            declared: None,
            value: Some(Expression {
                kind: ExpressionKind::Binary {
                    op: BinaryOperation::Add,
                    lhs: Box::new(int_expr(1)),
                    rhs: Box::new(int_expr(2)),
                },
                span: Span::default(),
                type_context: Type::Int,
            }),
            typ: Type::Int,
        };
        let program = TypedProgram {
            globals: vec![decl],
            functions: Vec::new(),
        };

        let err = lower(&program, "test").unwrap_err();
        assert!(matches!(err, LoweringError::UnsupportedGlobalInitializer { .. }));

        let record = err.record();
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(
            record.message,
            "Global variable `x` cannot be initialized with a constant"
        );
    }

    fn int_expr(value: i64) -> Expression<Type> {
        Expression {
            kind: ExpressionKind::Literal(Literal::Int(value)),
            span: Span::default(),
            type_context: Type::Int,
        }
    }

    #[test]
    fn if_else_blocks() {
        let module = lower_src(
            "func max(a: int, b: int) int { if (a > b) { return a; } else { return b; }; };",
        );
        let max = module.function("max").unwrap();

        assert_eq!(labels(max), vec!["entry", "then.0", "else.0", "merge.0"]);
        assert!(matches!(
            max.blocks[0].terminator,
            Terminator::CondBranch {
                then_block: BlockId(1),
                else_block: BlockId(2),
                ..
            }
        ));
        assert_eq!(
            max.blocks[3].terminator,
            Terminator::Return(Some(Operand::Const(Constant::Int(0))))
        );
    }

    #[test]
    fn if_without_else_branches_to_merge() {
        let module = lower_src("func f(a: bool) { if (a) { printf(1); }; };");
        let f = module.function("f").unwrap();

        assert_eq!(labels(f), vec!["entry", "then.0", "merge.0"]);
        assert!(matches!(
            f.blocks[0].terminator,
            Terminator::CondBranch {
                then_block: BlockId(1),
                else_block: BlockId(2),
                ..
            }
        ));
        assert_eq!(f.blocks[1].terminator, Terminator::Branch(f.blocks[2].id));
        assert_eq!(f.blocks[2].terminator, Terminator::Return(None));
    }

    #[test]
    fn else_if_chain_layout() {
        let src = "func f(a: int) int { if (a < 0) { return 0; } else if (a > 9) { return 9; }; return a; };";
        let module = lower_src(src);
        let f = module.function("f").unwrap();

        assert_eq!(
            labels(f),
            vec!["entry", "then.0", "else.0", "then.1", "merge.1", "merge.0"]
        );
        // merge.1 falls through to the outer merge
        assert_eq!(f.blocks[4].terminator, Terminator::Branch(f.blocks[5].id));
    }

    #[test]
    fn every_successor_exists() {
        let src = "func f(a: int) int { if (a < 0) { if (a < 5) { a = 5; }; } else { a = 1; }; return a; };";
        let module = lower_src(src);
        let f = module.function("f").unwrap();

        for block in &f.blocks {
            for successor in block.terminator.successors() {
                assert!(f.block(successor).is_some(), "{} jumps nowhere", block.label);
            }
        }
    }

    #[test]
    fn code_after_return() {
        let module = lower_src("func f() int { return 1; x: = 2; };");
        let f = module.function("f").unwrap();

        assert_eq!(labels(f), vec!["entry", "unreachable.0"]);
        assert_eq!(f.blocks[1].instructions.len(), 2);
        assert_eq!(
            f.blocks[1].terminator,
            Terminator::Return(Some(Operand::Const(Constant::Int(0))))
        );
    }

    #[test]
    fn parameters_get_slots() {
        let module = lower_src("func f(a: int, b: float) { };");
        let f = module.function("f").unwrap();

        assert_eq!(f.params, vec![Type::Int, Type::Float]);
        assert_eq!(
            f.blocks[0].instructions[..2],
            [
                Instruction::Alloca {
                    slot: Slot(0),
                    typ: Type::Int,
                    name: String::from("a"),
                },
                Instruction::Store {
                    target: Place::Slot(Slot(0)),
                    value: Operand::Param(0),
                },
            ]
        );
    }

    #[test]
    fn operator_selection() {
        let module = lower_src(
            "func f(a: float, b: float, c: bool) { x: = a / b; y: = a <= b; z: = c == true; w: = c && y; };",
        );
        let f = module.function("f").unwrap();

        let ops: Vec<_> = f.blocks[0]
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Binary { op, .. } => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                ir::BinaryInstr::FDiv,
                ir::BinaryInstr::FCmp(ir::CmpOp::Le),
                ir::BinaryInstr::ICmp(ir::CmpOp::Eq),
                ir::BinaryInstr::And,
            ]
        );
    }

    #[test]
    fn unsupported_operands_are_internal_errors() {
        assert_eq!(select_binary(BinaryOperation::Add, Type::Bool, Type::Bool), None);
        assert_eq!(select_binary(BinaryOperation::Add, Type::Int, Type::Float), None);
        assert_eq!(select_binary(BinaryOperation::Less, Type::Void, Type::Void), None);
    }

    #[test]
    fn printf_format_strings() {
        let module = lower_src(
            "func main() int { printf(1, 2.0); printf(3, 4.5); printf(true); return 0; };",
        );

        let formats: Vec<_> = module.strings.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(formats, vec!["%lld %f\n", "%d\n"]);

        let main = module.function("main").unwrap();
        assert_eq!(
            main.blocks[0].instructions[0],
            Instruction::Call {
                dest: Some(Variable::new(0)),
                function: String::from("printf"),
                args: vec![
                    Operand::Str(String::from("str.0")),
                    Operand::Const(Constant::Int(1)),
                    Operand::Const(Constant::Float(2.0)),
                ],
            }
        );
    }

    #[test]
    fn void_calls() {
        let module = lower_src("func v() { }; func f() { v(); return v(); };");
        let f = module.function("f").unwrap();

        let call = Instruction::Call {
            dest: None,
            function: String::from("v"),
            args: Vec::new(),
        };
        assert_eq!(f.blocks[0].instructions, vec![call.clone(), call]);
        assert_eq!(f.blocks[0].terminator, Terminator::Return(None));
    }

    #[test]
    fn forward_calls() {
        let module = lower_src("func main() int { return add(1, 2); }; func add(a: int, b: int) int { return a + b; };");
        let main = module.function("main").unwrap();

        assert!(matches!(
            &main.blocks[0].instructions[0],
            Instruction::Call { function, dest: Some(_), .. } if function == "add"
        ));
    }

    #[test]
    fn locals_shadow_globals() {
        let module = lower_src("x: int = 1; func f() int { x: int = 2; return x; };");
        let f = module.function("f").unwrap();

        assert!(f.blocks[0].instructions.iter().any(|i| matches!(
            i,
            Instruction::Load {
                source: Place::Slot(_),
                ..
            }
        )));
    }
}
