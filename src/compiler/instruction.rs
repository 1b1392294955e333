//! VM instruction definitions and the append-only instruction sink

use super::registers::Register;
use crate::ast::{Expr, NodeId, Statement};
use std::fmt;

/// VM opcode vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Load constant: LOAD dst value
    Load,
    /// Copy register: COPY src dst
    Copy,
    /// Push register onto the VM stack
    Push,
    /// Pop VM stack into register
    Pop,
    /// Boolean negation: NOT src dst
    Not,
    /// Addition: ADD lhs rhs dst
    Add,
    /// Subtraction: SUB lhs rhs dst
    Sub,
    /// Multiplication: MUL lhs rhs dst
    Mul,
    /// Division: DIV lhs rhs dst
    Div,
    /// Modulo: MOD lhs rhs dst
    Mod,
    /// Equality: EQUAL lhs rhs dst
    Equal,
    /// Less than: LT lhs rhs dst
    Lt,
    /// Less than or equal: LTE lhs rhs dst
    Lte,
    /// Greater than: GT lhs rhs dst
    Gt,
    /// Greater than or equal: GTE lhs rhs dst
    Gte,
    /// Call a VM built-in by name
    ExtCall,
    /// Create a call context for a contract
    Ctx,
    /// Switch execution into a call context
    Switch,
    /// Abort execution with a message
    Throw,
    /// Return from the current method
    Ret,
}

impl Opcode {
    /// Assembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Load => "LOAD",
            Opcode::Copy => "COPY",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Not => "NOT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Equal => "EQUAL",
            Opcode::Lt => "LT",
            Opcode::Lte => "LTE",
            Opcode::Gt => "GT",
            Opcode::Gte => "GTE",
            Opcode::ExtCall => "EXTCALL",
            Opcode::Ctx => "CTX",
            Opcode::Switch => "SWITCH",
            Opcode::Throw => "THROW",
            Opcode::Ret => "RET",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Register handle
    Reg(Register),
    /// String constant, emitted quoted
    Str(String),
    /// Raw constant text (numbers, booleans, hex)
    Raw(String),
}

impl Operand {
    /// Register held by this operand
    pub fn register(&self) -> Option<Register> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Reg(reg)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Operand::Raw(s) => f.write_str(s),
        }
    }
}

/// Node an instruction or register was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// Originating node
    pub node: NodeId,
    /// Source line of that node
    pub line: usize,
}

impl Origin {
    /// Origin of an expression node
    pub fn of(expr: &Expr) -> Self {
        Self {
            node: expr.id,
            line: expr.line,
        }
    }

    /// Origin of a statement node
    pub fn of_stmt(stmt: &Statement) -> Self {
        Self {
            node: stmt.id,
            line: stmt.line,
        }
    }
}

/// A single emitted instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode
    pub opcode: Opcode,
    /// Positional operands
    pub operands: Vec<Operand>,
    /// Originating node
    pub origin: Origin,
}

impl Instruction {
    /// Registers mentioned by this instruction, in operand order
    pub fn registers(&self) -> Vec<Register> {
        self.operands.iter().filter_map(Operand::register).collect()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Append-only instruction sink
#[derive(Debug, Clone, Default)]
pub struct CodeBuffer {
    instructions: Vec<Instruction>,
}

impl CodeBuffer {
    /// Creates an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction
    pub fn emit(&mut self, origin: Origin, opcode: Opcode, operands: Vec<Operand>) {
        self.instructions.push(Instruction {
            opcode,
            operands,
            origin,
        });
    }

    /// Offset of the next instruction
    pub fn position(&self) -> usize {
        self.instructions.len()
    }

    /// All instructions emitted so far
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Consume the buffer
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}

impl fmt::Display for CodeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instr in &self.instructions {
            writeln!(f, "{}", instr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin {
            node: NodeId(0),
            line: 1,
        }
    }

    #[test]
    fn test_positional_syntax() {
        let mut buf = CodeBuffer::new();
        buf.emit(
            origin(),
            Opcode::Load,
            vec![Register::new(0).into(), Operand::Str("Runtime.Time".into())],
        );
        buf.emit(
            origin(),
            Opcode::Add,
            vec![
                Register::new(0).into(),
                Register::new(1).into(),
                Register::new(2).into(),
            ],
        );
        buf.emit(origin(), Opcode::Ret, vec![]);

        assert_eq!(buf.to_string(), "LOAD r0 \"Runtime.Time\"\nADD r0 r1 r2\nRET\n");
        assert_eq!(buf.position(), 3);
    }

    #[test]
    fn test_string_operands_are_escaped() {
        let op = Operand::Str("say \"hi\"".to_string());
        assert_eq!(op.to_string(), "\"say \\\"hi\\\"\"");
        assert_eq!(Operand::Raw("0x1234".into()).to_string(), "0x1234");
    }
}
