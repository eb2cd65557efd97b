//! Property-based tests for selection over optimized functions.
//!
//! Random blocks mixing arithmetic, memory, calls and a conditional exit
//! are built, optimized and selected. Selection must never run out of tiles
//! and must produce identical output for identical input.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Proptest macros generate code with these patterns"
)]

use l3_ir::{FuncRef, Function, Item, ProgramBuilder, Runtime, SourceOp, VarId};
use l3_isel::{emit_function, Selector};
use proptest::prelude::*;

const VARS: u32 = 5;

#[derive(Clone, Debug)]
enum Operand {
    Var(u32),
    Num(i64),
}

#[derive(Clone, Debug)]
enum Step {
    Assign(u32, Operand),
    Op(u32, Operand, SourceOp, Operand),
    Load(u32, u32),
    Store(u32, Operand),
    Print(Operand),
    Call(u32, Vec<Operand>),
    Exit(u32),
}

fn operand_strategy() -> impl Strategy<Value = Operand> {
    prop_oneof![
        3 => (0..VARS).prop_map(Operand::Var),
        1 => prop_oneof![Just(1i64), Just(8), -16i64..64].prop_map(Operand::Num),
    ]
}

fn op_strategy() -> impl Strategy<Value = SourceOp> {
    prop_oneof![
        Just(SourceOp::Add),
        Just(SourceOp::Sub),
        Just(SourceOp::Mul),
        Just(SourceOp::And),
        Just(SourceOp::Shl),
        Just(SourceOp::Shr),
        Just(SourceOp::Lt),
        Just(SourceOp::Le),
        Just(SourceOp::Eq),
        Just(SourceOp::Gt),
        Just(SourceOp::Ge),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => (0..VARS, operand_strategy()).prop_map(|(d, s)| Step::Assign(d, s)),
        6 => (0..VARS, operand_strategy(), op_strategy(), operand_strategy())
            .prop_map(|(d, l, op, r)| Step::Op(d, l, op, r)),
        1 => (0..VARS, 0..VARS).prop_map(|(d, a)| Step::Load(d, a)),
        1 => (0..VARS, operand_strategy()).prop_map(|(a, s)| Step::Store(a, s)),
        1 => operand_strategy().prop_map(Step::Print),
        1 => (0..VARS, prop::collection::vec(operand_strategy(), 0..9))
            .prop_map(|(d, args)| Step::Call(d, args)),
        1 => (0..VARS).prop_map(Step::Exit),
    ]
}

fn build(steps: &[Step], ret: u32) -> Function {
    let mut pb = ProgramBuilder::new();
    let mut fb = pb.function("main").unwrap();
    let vars: Vec<VarId> = (0..VARS).map(|n| fb.param(&format!("v{n}"))).collect();
    let exit = fb.label("exit");
    let item = |o: &Operand| match *o {
        Operand::Var(n) => Item::Var(vars[n as usize]),
        Operand::Num(n) => Item::Num(n),
    };

    for step in steps {
        match step {
            Step::Assign(d, s) => fb.assign(vars[*d as usize], item(s)),
            Step::Op(d, l, op, r) => fb.op_assign(vars[*d as usize], item(l), *op, item(r)),
            Step::Load(d, a) => fb.load(vars[*d as usize], vars[*a as usize]),
            Step::Store(a, s) => fb.store(vars[*a as usize], item(s)),
            Step::Print(s) => fb.call(None, Item::Func(FuncRef::Runtime(Runtime::Print)), vec![item(s)]),
            Step::Call(d, args) => {
                fb.call_user(Some(vars[*d as usize]), "g", args.iter().map(item).collect());
            }
            Step::Exit(c) => fb.cond_branch(vars[*c as usize].into(), exit),
        }
    }
    fb.ret(Some(vars[ret as usize].into()));
    fb.define_label(exit).unwrap();
    fb.ret(None);
    fb.finish().unwrap();
    pb.finish().functions.remove(0)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Every surviving instruction is covered, one pattern each.
    #[test]
    fn prop_selection_is_total(
        steps in prop::collection::vec(step_strategy(), 1..24),
        ret in 0..VARS,
    ) {
        let mut func = build(&steps, ret);
        l3_opt::optimize_function(&mut func);
        let count = func.instruction_count();

        let patterns = Selector::new().select_function(&mut func);
        prop_assert_eq!(patterns.len(), count);
        prop_assert!(patterns.iter().all(|p| !p.lines().is_empty()));
    }

    /// Selecting the same function twice gives the same L2 text.
    #[test]
    fn prop_selection_is_deterministic(
        steps in prop::collection::vec(step_strategy(), 1..24),
        ret in 0..VARS,
    ) {
        let mut first = build(&steps, ret);
        l3_opt::optimize_function(&mut first);
        let mut second = first.clone();

        let selector = Selector::new();
        let a = selector.select_function(&mut first);
        let b = selector.select_function(&mut second);
        prop_assert_eq!(emit_function(&first, &a), emit_function(&second, &b));
    }
}
