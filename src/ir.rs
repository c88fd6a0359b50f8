//! Intermediate representation
//!
//! A [Module] holds globals, interned string constants, extern declarations and
//! functions. Function bodies are lists of [BasicBlock]s, each a straight run of
//! [Instruction]s closed by exactly one [Terminator]. Locals live in stack slots
//! ([Slot]), values produced by instructions are numbered temporaries ([Variable]).
//!
//! The [fmt::Display] implementations render a stable text form:
//!
//! ```text
//! module demo
//!
//! global @x: int = 5
//! extern @printf(...) -> int
//!
//! func @main() -> int {
//! entry:
//!     %0 = load int @x
//!     ret %0
//! }
//! ```

use std::fmt;

use crate::{Type, Variable};

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub globals: Vec<Global>,
    pub strings: Vec<StringConstant>,
    pub externs: Vec<ExternFunction>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub typ: Type,
    pub init: Constant,
}

/// Null terminated string data, referenced as [Operand::Str]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConstant {
    pub name: String,
    pub value: String,
}

/// A function provided by the link environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternFunction {
    pub name: String,
    pub params: Vec<Type>,
    pub variadic: bool,
    pub return_type: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Type,

    /// The first block is the entry block
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

/// Stack storage of a local variable or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(pub usize);

/// Something that can be loaded from and stored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Place {
    Slot(Slot),
    Global(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Const(Constant),
    Temp(Variable),

    /// Incoming parameter by position
    Param(usize),

    /// Address of a string constant
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Constant {
    /// Value of a declaration without initializer
    pub fn zero(typ: Type) -> Option<Self> {
        match typ {
            Type::Int => Some(Constant::Int(0)),
            Type::Float => Some(Constant::Float(0.0)),
            Type::Bool => Some(Constant::Bool(false)),
            Type::Void => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        slot: Slot,
        typ: Type,
        /// Source name, only kept for readability
        name: String,
    },
    Load {
        dest: Variable,
        typ: Type,
        source: Place,
    },
    Store {
        target: Place,
        value: Operand,
    },
    Binary {
        dest: Variable,
        op: BinaryInstr,
        lhs: Operand,
        rhs: Operand,
    },
    Call {
        dest: Option<Variable>,
        function: String,
        args: Vec<Operand>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryInstr {
    IAdd,
    ISub,
    IMul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
    ICmp(CmpOp),
    FCmp(CmpOp),
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Branch(BlockId),
    CondBranch {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(Option<Operand>),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch(target) => vec![*target],
            Terminator::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.name)?;

        if !(self.globals.is_empty() && self.strings.is_empty() && self.externs.is_empty()) {
            writeln!(f)?;
        }
        for global in &self.globals {
            writeln!(f, "global @{}: {} = {}", global.name, global.typ, global.init)?;
        }
        for string in &self.strings {
            writeln!(f, "const @{} = {:?}", string.name, string.value)?;
        }
        for ext in &self.externs {
            writeln!(f, "{ext}")?;
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }

        Ok(())
    }
}

impl fmt::Display for ExternFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params: Vec<String> = self.params.iter().map(Type::to_string).collect();
        if self.variadic {
            params.push(String::from("..."));
        }
        write!(
            f,
            "extern @{}({}) -> {}",
            self.name,
            params.join(", "),
            self.return_type
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, typ)| format!("{}: {typ}", Operand::Param(i)))
            .collect();
        writeln!(
            f,
            "func @{}({}) -> {} {{",
            self.name,
            params.join(", "),
            self.return_type
        )?;

        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for instruction in &block.instructions {
                writeln!(f, "    {instruction}")?;
            }
            write!(f, "    ")?;
            self.write_terminator(f, &block.terminator)?;
            writeln!(f)?;
        }

        writeln!(f, "}}")
    }
}

impl Function {
    /// Terminators refer to blocks by id, but are printed with labels
    fn write_terminator(&self, f: &mut fmt::Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        let label = |id: &BlockId| match self.block(*id) {
            Some(block) => block.label.clone(),
            None => id.to_string(),
        };

        match terminator {
            Terminator::Branch(target) => write!(f, "br {}", label(target)),
            Terminator::CondBranch {
                cond,
                then_block,
                else_block,
            } => write!(f, "br {cond}, {}, {}", label(then_block), label(else_block)),
            Terminator::Return(Some(value)) => write!(f, "ret {value}"),
            Terminator::Return(None) => write!(f, "ret"),
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { slot, typ, name } => write!(f, "{slot} = alloca {typ} ; {name}"),
            Instruction::Load { dest, typ, source } => write!(f, "{dest} = load {typ} {source}"),
            Instruction::Store { target, value } => write!(f, "store {value}, {target}"),
            Instruction::Binary { dest, op, lhs, rhs } => write!(f, "{dest} = {op} {lhs}, {rhs}"),
            Instruction::Call {
                dest,
                function,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                let args: Vec<String> = args.iter().map(Operand::to_string).collect();
                write!(f, "call @{function}({})", args.join(", "))
            }
        }
    }
}

impl fmt::Display for BinaryInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryInstr::IAdd => write!(f, "add"),
            BinaryInstr::ISub => write!(f, "sub"),
            BinaryInstr::IMul => write!(f, "mul"),
            BinaryInstr::SDiv => write!(f, "sdiv"),
            BinaryInstr::FAdd => write!(f, "fadd"),
            BinaryInstr::FSub => write!(f, "fsub"),
            BinaryInstr::FMul => write!(f, "fmul"),
            BinaryInstr::FDiv => write!(f, "fdiv"),
            BinaryInstr::ICmp(op) => write!(f, "icmp {op}"),
            BinaryInstr::FCmp(op) => write!(f, "fcmp {op}"),
            BinaryInstr::And => write!(f, "and"),
            BinaryInstr::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "lt",
            CmpOp::Le => "le",
            CmpOp::Gt => "gt",
            CmpOp::Ge => "ge",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Slot(slot) => write!(f, "{slot}"),
            Place::Global(name) => write!(f, "@{name}"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(constant) => write!(f, "{constant}"),
            Operand::Temp(var) => write!(f, "{var}"),
            Operand::Param(i) => write!(f, "%arg{i}"),
            Operand::Str(name) => write!(f, "@{name}"),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Float(x) => write!(f, "{x:?}"),
            Constant::Bool(b) => write!(f, "{b}"),
        }
    }
}
