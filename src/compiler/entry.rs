//! Entry point compilation
//!
//! Callers push arguments right to left, so an entry point pops its
//! parameters in declared order, each into a fresh register bound to the
//! parameter's declaration.

use super::abi::{ContractMethod, ContractParameter};
use super::codegen::CodeGenerator;
use super::instruction::{Opcode, Origin};
use crate::ast::{Declarations, MethodDecl, Statement, ValueKind};
use crate::{Error, Result};

fn method_origin(method: &MethodDecl) -> Origin {
    Origin {
        node: method.id,
        line: method.line,
    }
}

/// Pop every declared parameter into its own register
pub fn bind_parameters(
    gen: &mut CodeGenerator,
    decls: &mut Declarations,
    method: &MethodDecl,
) -> Result<()> {
    let origin = method_origin(method);
    for param in &method.parameters {
        let name = decls.variable(*param).name.clone();
        let reg = gen.alloc_reg(origin, Some(&name))?;
        gen.emit(origin, Opcode::Pop, vec![reg.into()]);
        decls.bind_register(*param, reg)?;
    }
    Ok(())
}

/// Close an entry point: methods returning nothing get a bare `RET`, all
/// others must contain a return statement somewhere in their body.
pub fn finish_entry_point(gen: &mut CodeGenerator, method: &MethodDecl) -> Result<()> {
    if method.return_kind == ValueKind::None {
        gen.emit(method_origin(method), Opcode::Ret, vec![]);
        return Ok(());
    }

    if method.body.iter().any(Statement::has_return) {
        Ok(())
    } else {
        Err(Error::MissingReturn {
            node: method.id,
            line: method.line,
            method: method.name.clone(),
        })
    }
}

/// Compile a method and describe it for the exported interface
pub fn compile_method(
    gen: &mut CodeGenerator,
    decls: &mut Declarations,
    method: &MethodDecl,
) -> Result<ContractMethod> {
    tracing::debug!("compiling method {} (line {})", method.name, method.line);

    let offset = gen.output().position();
    let live_before = gen.registers().live_registers();

    bind_parameters(gen, decls, method)?;
    for stmt in &method.body {
        gen.generate_statement(decls, stmt)?;
    }
    finish_entry_point(gen, method)?;

    // Parameters and locals live until the method ends; their declarations
    // must not outlive the registers.
    let released: Vec<_> = gen
        .registers()
        .live_registers()
        .into_iter()
        .filter(|reg| !live_before.contains(reg))
        .collect();
    for reg in &released {
        gen.release(*reg)?;
    }
    decls.unbind_registers(&released);

    let parameters = method
        .parameters
        .iter()
        .map(|param| {
            let decl = decls.variable(*param);
            ContractParameter {
                name: decl.name.clone(),
                kind: decl.kind.clone(),
            }
        })
        .collect();

    Ok(ContractMethod {
        name: method.name.clone(),
        return_kind: method.return_kind.clone(),
        offset,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ExprKind, ModuleInfo, NodeId, StmtKind};

    fn method(decls: &mut Declarations, return_kind: ValueKind, body: Vec<Statement>) -> MethodDecl {
        let module = decls.add_module(ModuleInfo::contract("bank"));
        let scope = decls.add_scope("transfer", module);
        let from = decls.declare_variable("from", ValueKind::Address);
        let amount = decls.declare_variable("amount", ValueKind::Number);
        MethodDecl {
            id: NodeId(900),
            line: 10,
            name: "transfer".to_string(),
            scope,
            parameters: vec![from, amount],
            return_kind,
            body,
            public: true,
        }
    }

    #[test]
    fn test_parameters_popped_in_declared_order() {
        let mut decls = Declarations::new();
        let m = method(&mut decls, ValueKind::None, vec![]);
        let mut gen = CodeGenerator::new();

        let abi = compile_method(&mut gen, &mut decls, &m).unwrap();

        let text: Vec<String> = gen
            .output()
            .instructions()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(text, vec!["POP r0", "POP r1", "RET"]);
        assert_eq!(abi.offset, 0);
        assert_eq!(abi.parameters[0].name, "from");
        assert_eq!(abi.parameters[1].kind, ValueKind::Number);
        assert_eq!(gen.registers().live_count(), 0);
    }

    #[test]
    fn test_missing_return_is_user_error() {
        let mut decls = Declarations::new();
        let m = method(&mut decls, ValueKind::Number, vec![]);
        let mut gen = CodeGenerator::new();

        let err = compile_method(&mut gen, &mut decls, &m).unwrap_err();
        assert!(matches!(err, Error::MissingReturn { .. }));
        assert_eq!(err.node(), Some(NodeId(900)));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_nested_return_satisfies_check() {
        let mut decls = Declarations::new();
        let value = Expr::new(
            NodeId(1),
            11,
            Declarations::ROOT,
            ExprKind::Literal {
                value: "5".into(),
                kind: ValueKind::Number,
            },
        );
        let ret = Statement::new(NodeId(2), 11, StmtKind::Return(Some(value)));
        let block = Statement::new(NodeId(3), 11, StmtKind::Block(vec![ret]));
        let m = method(&mut decls, ValueKind::Number, vec![block]);
        let mut gen = CodeGenerator::new();

        compile_method(&mut gen, &mut decls, &m).unwrap();
        let last = gen.output().instructions().last().unwrap();
        assert_eq!(last.opcode, Opcode::Ret);
    }
}
