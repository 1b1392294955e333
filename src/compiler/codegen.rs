//! Code Generator - lowers expression trees to VM instructions
//!
//! Every expression evaluates into exactly one register, which the caller
//! owns and must release once the value has been consumed. Temporaries are
//! released as soon as the instruction consuming them has been emitted, so
//! the live register count after evaluating a tree is the count before plus
//! one.
//!
//! ## Calling conventions
//!
//! | Binding | Sequence |
//! |---------|----------|
//! | External | `LOAD r "alias"`, `EXTCALL r`, `POP r` |
//! | Contract | `LOAD r "alias"`, `PUSH r`, `LOAD r "contract"`, `CTX r r`, `SWITCH r`, `POP r` |
//! | Custom | `THROW "..."` |
//!
//! Arguments are pushed right to left before any of these, so the callee pops
//! them in declared order.

use super::instruction::{CodeBuffer, Opcode, Operand, Origin};
use super::registers::{Register, RegisterAllocator};
use super::CompileOptions;
use crate::ast::{
    BinaryOp, ConstId, Declarations, Expr, ExprKind, MethodBinding, MethodImplementation,
    Statement, StmtKind, ValueKind, VarId,
};
use crate::{Error, Result};

/// Built-in that turns raw address bytes into a runtime address
pub const ADDRESS_CONSTRUCTOR: &str = "Address()";

/// What happened to a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
    /// Register handed out
    Allocated,
    /// Register returned to the pool
    Released,
}

/// Journal entry recording a register event relative to the instruction stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterEvent {
    /// Number of instructions emitted when the event happened
    pub position: usize,
    /// Event kind
    pub action: RegisterAction,
    /// Register concerned
    pub register: Register,
}

/// Expression code generator for one compilation unit
pub struct CodeGenerator {
    registers: RegisterAllocator,
    output: CodeBuffer,
    journal: Vec<RegisterEvent>,
    /// Tag variable and parameter registers with their names
    debug_names: bool,
}

impl CodeGenerator {
    /// Create a generator with default options
    pub fn new() -> Self {
        Self::with_options(&CompileOptions::default())
    }

    /// Create a generator configured from compile options
    pub fn with_options(options: &CompileOptions) -> Self {
        let registers = match options.max_registers {
            Some(limit) => RegisterAllocator::with_limit(limit),
            None => RegisterAllocator::new(),
        };
        Self {
            registers,
            output: CodeBuffer::new(),
            journal: Vec::new(),
            debug_names: options.debug_names,
        }
    }

    /// Register pool
    pub fn registers(&self) -> &RegisterAllocator {
        &self.registers
    }

    /// Instructions emitted so far
    pub fn output(&self) -> &CodeBuffer {
        &self.output
    }

    /// Allocation and release events in the order they happened
    pub fn register_events(&self) -> &[RegisterEvent] {
        &self.journal
    }

    /// Consume the generator, keeping its output
    pub fn into_output(self) -> CodeBuffer {
        self.output
    }

    /// Allocate a register for `origin`. Variable names are only kept when
    /// `debug_names` is set.
    pub fn alloc_reg(&mut self, origin: Origin, name: Option<&str>) -> Result<Register> {
        let name = if self.debug_names { name } else { None };
        self.alloc_tagged(origin, name)
    }

    fn alloc_tagged(&mut self, origin: Origin, name: Option<&str>) -> Result<Register> {
        let reg = self.registers.allocate(origin, name)?;
        self.record(RegisterAction::Allocated, reg);
        Ok(reg)
    }

    /// Release a register whose value has been consumed
    pub fn release(&mut self, reg: Register) -> Result<()> {
        self.registers.release(reg)?;
        self.record(RegisterAction::Released, reg);
        Ok(())
    }

    fn record(&mut self, action: RegisterAction, register: Register) {
        self.journal.push(RegisterEvent {
            position: self.output.position(),
            action,
            register,
        });
    }

    /// Append an instruction
    pub fn emit(&mut self, origin: Origin, opcode: Opcode, operands: Vec<Operand>) {
        self.output.emit(origin, opcode, operands);
    }

    /// Generate code for an expression; the returned register belongs to the caller
    pub fn generate_expr(&mut self, decls: &Declarations, expr: &Expr) -> Result<Register> {
        let origin = Origin::of(expr);
        match &expr.kind {
            ExprKind::Negation(operand) => {
                let reg = self.generate_expr(decls, operand)?;
                self.emit(origin, Opcode::Not, vec![reg.into(), reg.into()]);
                Ok(reg)
            }

            ExprKind::Binary { op, left, right } => {
                let opcode = binary_opcode(*op).ok_or_else(|| Error::UnsupportedOperator {
                    node: expr.id,
                    op: op.to_string(),
                })?;

                // Left strictly before right: either side may contain calls.
                let left_reg = self.generate_expr(decls, left)?;
                let right_reg = self.generate_expr(decls, right)?;
                let dst = self.alloc_reg(origin, None)?;

                self.emit(
                    origin,
                    opcode,
                    vec![left_reg.into(), right_reg.into(), dst.into()],
                );

                self.release(right_reg)?;
                self.release(left_reg)?;
                Ok(dst)
            }

            ExprKind::MethodCall { binding, args } => self.generate_call(decls, origin, binding, args),

            ExprKind::Literal { value, kind } => {
                let reg = self.alloc_reg(origin, None)?;
                self.emit(origin, Opcode::Load, vec![reg.into(), constant_operand(value, kind)]);

                if *kind == ValueKind::Address {
                    self.emit(origin, Opcode::Push, vec![reg.into()]);
                    self.emit(
                        origin,
                        Opcode::ExtCall,
                        vec![Operand::Str(ADDRESS_CONSTRUCTOR.to_string())],
                    );
                    self.emit(origin, Opcode::Pop, vec![reg.into()]);
                }
                Ok(reg)
            }

            ExprKind::Macro(name) => Err(Error::UnexpandedMacro {
                node: expr.id,
                name: name.clone(),
            }),

            ExprKind::VarRef(var) => self.generate_var_ref(decls, origin, *var),

            ExprKind::ConstRef(constant) => self.generate_const_ref(decls, origin, *constant),
        }
    }

    fn generate_var_ref(
        &mut self,
        decls: &Declarations,
        origin: Origin,
        var: VarId,
    ) -> Result<Register> {
        let decl = decls.variable(var);
        // Bound registers must still be live.
        let src = decl
            .register()
            .filter(|reg| self.registers.is_live(*reg))
            .ok_or_else(|| Error::UninitializedVariable {
                node: origin.node,
                line: origin.line,
                name: decl.name.clone(),
            })?;

        // Always a fresh handle, so the caller may release it.
        let dst = self.alloc_reg(origin, None)?;
        self.emit(origin, Opcode::Copy, vec![src.into(), dst.into()]);
        Ok(dst)
    }

    fn generate_const_ref(
        &mut self,
        decls: &Declarations,
        origin: Origin,
        constant: ConstId,
    ) -> Result<Register> {
        let decl = decls.constant(constant);
        // Constant registers always carry the constant's name.
        let reg = self.alloc_tagged(origin, Some(&decl.name))?;
        self.emit(
            origin,
            Opcode::Load,
            vec![reg.into(), constant_operand(&decl.value, &decl.kind)],
        );
        Ok(reg)
    }

    fn generate_call(
        &mut self,
        decls: &Declarations,
        origin: Origin,
        binding: &MethodBinding,
        args: &[Expr],
    ) -> Result<Register> {
        for arg in args.iter().rev() {
            let arg_reg = self.generate_expr(decls, arg)?;
            self.emit(Origin::of(arg), Opcode::Push, vec![arg_reg.into()]);
            self.release(arg_reg)?;
        }

        let reg = self.alloc_reg(origin, None)?;

        match &binding.implementation {
            MethodImplementation::ExternalCall => {
                self.emit(
                    origin,
                    Opcode::Load,
                    vec![reg.into(), Operand::Str(binding.alias.clone())],
                );
                self.emit(origin, Opcode::ExtCall, vec![reg.into()]);
                self.emit(origin, Opcode::Pop, vec![reg.into()]);
            }

            MethodImplementation::ContractCall { contract } => {
                self.emit(
                    origin,
                    Opcode::Load,
                    vec![reg.into(), Operand::Str(binding.alias.clone())],
                );
                self.emit(origin, Opcode::Push, vec![reg.into()]);
                self.emit(
                    origin,
                    Opcode::Load,
                    vec![reg.into(), Operand::Str(contract.clone())],
                );
                self.emit(origin, Opcode::Ctx, vec![reg.into(), reg.into()]);
                self.emit(origin, Opcode::Switch, vec![reg.into()]);
                self.emit(origin, Opcode::Pop, vec![reg.into()]);
            }

            MethodImplementation::Custom => {
                tracing::debug!(
                    "call to unimplemented method {} at line {} will abort at run time",
                    binding.alias,
                    origin.line
                );
                self.emit(
                    origin,
                    Opcode::Throw,
                    vec![Operand::Str(format!(
                        "method {} is not implemented",
                        binding.alias
                    ))],
                );
            }
        }

        Ok(reg)
    }

    /// Generate code for a statement
    pub fn generate_statement(&mut self, decls: &mut Declarations, stmt: &Statement) -> Result<()> {
        let origin = Origin::of_stmt(stmt);
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                let reg = self.generate_expr(decls, expr)?;
                self.release(reg)
            }

            StmtKind::Assign { target, value } => {
                let value_reg = self.generate_expr(decls, value)?;

                let target_reg = match decls.variable(*target).register() {
                    Some(reg) => reg,
                    None => {
                        let name = decls.variable(*target).name.clone();
                        let reg = self.alloc_reg(origin, Some(&name))?;
                        decls.bind_register(*target, reg)?;
                        reg
                    }
                };

                self.emit(origin, Opcode::Copy, vec![value_reg.into(), target_reg.into()]);
                self.release(value_reg)
            }

            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    let reg = self.generate_expr(decls, expr)?;
                    self.emit(origin, Opcode::Push, vec![reg.into()]);
                    self.release(reg)?;
                }
                self.emit(origin, Opcode::Ret, vec![]);
                Ok(())
            }

            StmtKind::Block(body) => {
                for s in body {
                    self.generate_statement(decls, s)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Opcode for a binary operator, if the VM has one
pub fn binary_opcode(op: BinaryOp) -> Option<Opcode> {
    match op {
        BinaryOp::Add => Some(Opcode::Add),
        BinaryOp::Sub => Some(Opcode::Sub),
        BinaryOp::Mul => Some(Opcode::Mul),
        BinaryOp::Div => Some(Opcode::Div),
        BinaryOp::Mod => Some(Opcode::Mod),
        BinaryOp::Equal => Some(Opcode::Equal),
        BinaryOp::Less => Some(Opcode::Lt),
        BinaryOp::LessOrEqual => Some(Opcode::Lte),
        BinaryOp::Greater => Some(Opcode::Gt),
        BinaryOp::GreaterOrEqual => Some(Opcode::Gte),
        BinaryOp::NotEqual | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => None,
    }
}

fn constant_operand(value: &str, kind: &ValueKind) -> Operand {
    if kind.is_quoted() {
        Operand::Str(value.to_string())
    } else {
        Operand::Raw(value.to_string())
    }
}
