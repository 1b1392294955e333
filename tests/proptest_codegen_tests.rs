//! Property-based tests for expression code generation
//!
//! Random arithmetic/comparison trees with nested calls are lowered and the
//! generated stream is checked for:
//! 1. No register leaks: exactly one extra live register per tree
//! 2. No aliasing: a register is never handed out while live
//! 3. Left-to-right operands, right-to-left call arguments
//! 4. Argument registers released right after they are pushed

use contractc::ast::{
    BinaryOp, Declarations, Expr, ExprKind, MethodBinding, NodeId, ValueKind,
};
use contractc::compiler::{CodeGenerator, Opcode, Operand, Origin, RegisterAction};
use contractc::Register;
use proptest::prelude::*;
use std::collections::HashSet;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

#[derive(Debug, Clone)]
enum Shape {
    Num(i64),
    Not(Box<Shape>),
    Bin(BinaryOp, Box<Shape>, Box<Shape>),
    Call(Vec<Shape>),
}

fn supported_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
        Just(BinaryOp::Mod),
        Just(BinaryOp::Equal),
        Just(BinaryOp::Less),
        Just(BinaryOp::LessOrEqual),
        Just(BinaryOp::Greater),
        Just(BinaryOp::GreaterOrEqual),
    ]
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (-1000i64..1000i64).prop_map(Shape::Num);
    leaf.prop_recursive(5, 48, 4, |inner| {
        prop_oneof![
            (supported_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Shape::Bin(op, Box::new(l), Box::new(r))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Shape::Call),
            inner.prop_map(|s| Shape::Not(Box::new(s))),
        ]
    })
}

fn value_kind() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::Bool),
        Just(ValueKind::Number),
        Just(ValueKind::String),
        Just(ValueKind::Address),
    ]
}

fn build(shape: &Shape, next: &mut u32) -> Expr {
    *next += 1;
    let id = NodeId(*next);
    let kind = match shape {
        Shape::Num(n) => ExprKind::Literal {
            value: n.to_string(),
            kind: ValueKind::Number,
        },
        Shape::Not(inner) => ExprKind::Negation(Box::new(build(inner, next))),
        Shape::Bin(op, l, r) => ExprKind::Binary {
            op: *op,
            left: Box::new(build(l, next)),
            right: Box::new(build(r, next)),
        },
        Shape::Call(args) => ExprKind::MethodCall {
            binding: MethodBinding::external("sum", "Math.Sum", ValueKind::Number),
            args: args.iter().map(|a| build(a, next)).collect(),
        },
    };
    Expr::new(id, 1, Declarations::ROOT, kind)
}

/// Leaf values in the order the generated code must load them
fn evaluation_order(shape: &Shape, out: &mut Vec<String>) {
    match shape {
        Shape::Num(n) => out.push(n.to_string()),
        Shape::Not(inner) => evaluation_order(inner, out),
        Shape::Bin(_, l, r) => {
            evaluation_order(l, out);
            evaluation_order(r, out);
        }
        Shape::Call(args) => {
            for arg in args.iter().rev() {
                evaluation_order(arg, out);
            }
        }
    }
}

fn literal(value: &str, kind: ValueKind, id: u32) -> Expr {
    Expr::new(
        NodeId(id),
        1,
        Declarations::ROOT,
        ExprKind::Literal {
            value: value.to_string(),
            kind,
        },
    )
}

// =============================================================================
// REGISTER DISCIPLINE
// =============================================================================

proptest! {
    #[test]
    fn prop_one_live_register_per_tree(s in shape(), held in 0usize..4) {
        let decls = Declarations::new();
        let expr = build(&s, &mut 0);
        let mut gen = CodeGenerator::new();

        // Registers live before the tree must survive it untouched
        let mut outer = Vec::new();
        for _ in 0..held {
            outer.push(gen.alloc_reg(Origin::of(&expr), None).unwrap());
        }

        let result = gen.generate_expr(&decls, &expr).unwrap();

        prop_assert_eq!(gen.registers().live_count(), held + 1);
        prop_assert!(!outer.contains(&result));
        for reg in &outer {
            prop_assert!(gen.registers().is_live(*reg));
        }

        gen.release(result).unwrap();
        prop_assert_eq!(gen.registers().live_count(), held);
    }

    #[test]
    fn prop_live_registers_never_alias(s in shape()) {
        let decls = Declarations::new();
        let expr = build(&s, &mut 0);
        let mut gen = CodeGenerator::new();
        gen.generate_expr(&decls, &expr).unwrap();

        let mut live: HashSet<Register> = HashSet::new();
        for event in gen.register_events() {
            match event.action {
                RegisterAction::Allocated => prop_assert!(live.insert(event.register)),
                RegisterAction::Released => prop_assert!(live.remove(&event.register)),
            }
        }
        prop_assert_eq!(live.len(), 1);
    }

    #[test]
    fn prop_pushed_registers_released_immediately(s in shape()) {
        let decls = Declarations::new();
        let expr = build(&s, &mut 0);
        let mut gen = CodeGenerator::new();
        gen.generate_expr(&decls, &expr).unwrap();

        let events = gen.register_events();
        for (i, instr) in gen.output().instructions().iter().enumerate() {
            if instr.opcode != Opcode::Push {
                continue;
            }
            let pushed = instr.registers()[0];
            let released = events.iter().any(|e| {
                e.position == i + 1
                    && e.action == RegisterAction::Released
                    && e.register == pushed
            });
            prop_assert!(released, "PUSH {} at {} not followed by its release", pushed, i);
        }
    }
}

// =============================================================================
// EVALUATION ORDER
// =============================================================================

proptest! {
    #[test]
    fn prop_leaves_loaded_in_evaluation_order(s in shape()) {
        let decls = Declarations::new();
        let expr = build(&s, &mut 0);
        let mut gen = CodeGenerator::new();
        gen.generate_expr(&decls, &expr).unwrap();

        let loaded: Vec<String> = gen
            .output()
            .instructions()
            .iter()
            .filter(|i| i.opcode == Opcode::Load)
            .filter_map(|i| match &i.operands[1] {
                Operand::Raw(value) => Some(value.clone()),
                _ => None,
            })
            .collect();

        let mut expected = Vec::new();
        evaluation_order(&s, &mut expected);
        prop_assert_eq!(loaded, expected);
    }

    #[test]
    fn prop_generation_is_deterministic(s in shape()) {
        let decls = Declarations::new();
        let expr = build(&s, &mut 0);

        let mut first = CodeGenerator::new();
        let mut second = CodeGenerator::new();
        first.generate_expr(&decls, &expr).unwrap();
        second.generate_expr(&decls, &expr).unwrap();

        prop_assert_eq!(first.output().to_string(), second.output().to_string());
    }
}

// =============================================================================
// RESULT KINDS
// =============================================================================

proptest! {
    #[test]
    fn prop_binary_kind_follows_left_operand(
        op in supported_op(),
        left in value_kind(),
        right in value_kind(),
    ) {
        let decls = Declarations::new();
        let expr = Expr::new(
            NodeId(3),
            1,
            Declarations::ROOT,
            ExprKind::Binary {
                op,
                left: Box::new(literal("a", left.clone(), 1)),
                right: Box::new(literal("b", right, 2)),
            },
        );

        let expected = if op.is_logical() { ValueKind::Bool } else { left };
        prop_assert_eq!(expr.result_kind(&decls), expected);
    }
}

#[test]
fn test_mixed_kind_addition_takes_left_kind() {
    let decls = Declarations::new();
    let expr = Expr::new(
        NodeId(3),
        1,
        Declarations::ROOT,
        ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(literal("1", ValueKind::Number, 1)),
            right: Box::new(literal("x", ValueKind::String, 2)),
        },
    );
    assert_eq!(expr.result_kind(&decls), ValueKind::Number);
}
