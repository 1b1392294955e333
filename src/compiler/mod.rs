//! # contractc Compiler - expressions to VM instructions
//!
//! Lowers type-resolved expression trees into the instruction stream of a
//! register/stack contract VM.
//!
//! ## Architecture
//!
//! ```text
//! AST + bindings → Macro expansion → Code generation → Instructions + Interface
//! ```
//!
//! Macro expansion runs over the whole module before any code is generated;
//! a macro node that survives into code generation is an internal error.
//!
//! ## Usage
//!
//! ```ignore
//! use contractc::compiler::{Compiler, CompileOptions};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let compiled = compiler.compile_module(&mut decls, module)?;
//! println!("{}", compiled.listing());
//! println!("{}", compiled.interface.to_json()?);
//! ```

pub mod abi;
pub mod codegen;
pub mod debug;
pub mod entry;
pub mod instruction;
pub mod macros;
pub mod registers;

pub use abi::{ContractEvent, ContractInterface, ContractMethod, ContractParameter, StandardInterface};
pub use codegen::{CodeGenerator, RegisterAction, RegisterEvent};
pub use debug::{dump_code, format_listing};
pub use instruction::{CodeBuffer, Instruction, Opcode, Operand, Origin};
pub use macros::MacroExpander;
pub use registers::{Register, RegisterAllocator};

use crate::ast::{Declarations, Expr, ExprKind, MethodImplementation, ModuleDecl};
use crate::Result;

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Interleave `// line N` comments in listings
    pub source_map: bool,
    /// Tag variable and parameter registers with their names. Constant
    /// registers are always tagged.
    pub debug_names: bool,
    /// Maximum simultaneously live registers (None = unbounded)
    pub max_registers: Option<usize>,
    /// Force a standard interface rewrite regardless of module kind
    pub standard: Option<StandardInterface>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_map: false,
            debug_names: true,
            max_registers: None,
            standard: None, // Derived from the module kind
        }
    }
}

/// Compilation result for one module
#[derive(Debug)]
pub struct CompiledModule {
    /// Generated instructions
    pub instructions: Vec<Instruction>,
    /// Exported interface
    pub interface: ContractInterface,
    /// Warnings generated during compilation
    pub warnings: Vec<String>,
    /// Highest number of simultaneously live registers
    pub peak_registers: usize,
    source_map: bool,
}

impl CompiledModule {
    /// Assembly listing of the module
    pub fn listing(&self) -> String {
        format_listing(&self.instructions, self.source_map)
    }
}

/// Module compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options this compiler was created with
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile every method of a module and build its exported interface
    pub fn compile_module(
        &self,
        decls: &mut Declarations,
        mut module: ModuleDecl,
    ) -> Result<CompiledModule> {
        // Phase 1: Macro expansion, to completion
        MacroExpander::new(decls).expand_module(&mut module)?;

        let mut warnings = Vec::new();
        for method in &module.methods {
            for stmt in &method.body {
                for expr in stmt.expressions() {
                    collect_unimplemented_calls(expr, &mut warnings);
                }
            }
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        // Phase 2: Code generation
        let mut gen = CodeGenerator::with_options(&self.options);
        let mut interface = ContractInterface::new();
        for method in &module.methods {
            let exported = entry::compile_method(&mut gen, decls, method)?;
            if method.public {
                interface.methods.push(exported);
            }
        }
        interface.events = module.events.iter().map(ContractEvent::from).collect();

        // Phase 3: Standard interface normalization
        let standard = self.options.standard.or_else(|| {
            decls
                .module_of(module.scope)
                .and_then(|m| StandardInterface::for_module(m.kind))
        });
        if let Some(standard) = standard {
            interface.apply_standard(standard);
        }

        let peak_registers = gen.registers().peak();
        Ok(CompiledModule {
            instructions: gen.into_output().into_instructions(),
            interface,
            warnings,
            peak_registers,
            source_map: self.options.source_map,
        })
    }

    /// Expand and compile one top-level expression. The returned register is
    /// still live; releasing it is the caller's job.
    pub fn compile_expression(
        &self,
        gen: &mut CodeGenerator,
        decls: &Declarations,
        expr: &mut Expr,
    ) -> Result<Register> {
        MacroExpander::new(decls).expand_all(expr)?;
        gen.generate_expr(decls, expr)
    }
}

fn collect_unimplemented_calls(expr: &Expr, warnings: &mut Vec<String>) {
    match &expr.kind {
        ExprKind::MethodCall { binding, args } => {
            if binding.implementation == MethodImplementation::Custom {
                warnings.push(format!(
                    "line {}: method {} is not implemented and will abort when called",
                    expr.line, binding.alias
                ));
            }
            for arg in args {
                collect_unimplemented_calls(arg, warnings);
            }
        }
        ExprKind::Negation(operand) => collect_unimplemented_calls(operand, warnings),
        ExprKind::Binary { left, right, .. } => {
            collect_unimplemented_calls(left, warnings);
            collect_unimplemented_calls(right, warnings);
        }
        ExprKind::Literal { .. } | ExprKind::Macro(_) | ExprKind::VarRef(_) | ExprKind::ConstRef(_) => {}
    }
}
