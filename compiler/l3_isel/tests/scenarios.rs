//! End-to-end selection scenarios: build, optimize, select, render.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;

use l3_ir::{Function, FuncRef, FunctionBuilder, Item, ProgramBuilder, Runtime, SourceOp};
use l3_isel::Selector;

fn lower(body: impl FnOnce(&mut FunctionBuilder<'_>)) -> Vec<String> {
    let mut pb = ProgramBuilder::new();
    let mut fb = pb.function("main").unwrap();
    body(&mut fb);
    fb.finish().unwrap();
    let mut func: Function = pb.finish().functions.remove(0);

    l3_opt::optimize_function(&mut func);
    Selector::new()
        .select_function(&mut func)
        .iter()
        .flat_map(|p| p.lines())
        .collect()
}

/// An increment folded into a following decrement reuses the destination.
#[test]
fn add_folds_into_subtract() {
    let lines = lower(|fb| {
        let (a, b, c) = (fb.param("a"), fb.var("b"), fb.var("c"));
        fb.op_assign(b, a.into(), SourceOp::Add, Item::Num(1));
        fb.op_assign(c, b.into(), SourceOp::Sub, Item::Num(1));
        fb.ret(Some(c.into()));
    });
    assert_eq!(
        lines,
        vec!["%v2 <- %v0", "%v2++", "%v2--", "rax <- %v2", "return"]
    );
}

/// A scaled index folded into a load address becomes `@`.
#[test]
fn scaled_address_becomes_lea() {
    let lines = lower(|fb| {
        let (p, i) = (fb.param("p"), fb.param("i"));
        let (t, addr, d) = (fb.var("t"), fb.var("addr"), fb.var("d"));
        fb.op_assign(t, i.into(), SourceOp::Mul, Item::Num(8));
        fb.op_assign(addr, p.into(), SourceOp::Add, t.into());
        fb.load(d, addr);
        fb.ret(Some(d.into()));
    });
    assert_eq!(
        lines,
        vec!["%v3 @ %v0 %v1 8", "%v4 <- mem %v3 0", "rax <- %v4", "return"]
    );
}

/// Without a scaled index the address is computed, then loaded at offset 0.
#[test]
fn plain_address_loads_at_offset_zero() {
    let lines = lower(|fb| {
        let (p, x) = (fb.param("p"), fb.param("x"));
        let (addr, d) = (fb.var("addr"), fb.var("d"));
        fb.op_assign(addr, p.into(), SourceOp::Add, x.into());
        fb.load(d, addr);
        fb.ret(Some(d.into()));
    });
    assert_eq!(
        lines,
        vec![
            "%v2 <- %v0",
            "%v2 += %v1",
            "%v3 <- mem %v2 0",
            "rax <- %v3",
            "return"
        ]
    );
}

/// A word-aligned constant offset folds into the load.
#[test]
fn constant_offset_folds_into_load() {
    let lines = lower(|fb| {
        let p = fb.param("p");
        let (addr, d) = (fb.var("addr"), fb.var("d"));
        fb.op_assign(addr, p.into(), SourceOp::Add, Item::Num(24));
        fb.load(d, addr);
        fb.ret(Some(d.into()));
    });
    assert_eq!(lines, vec!["%v2 <- mem %v0 24", "rax <- %v2", "return"]);
}

/// Decoding both sides of a comparison is stripped from the branch.
#[test]
fn shared_shift_is_stripped_from_branch() {
    let lines = lower(|fb| {
        let (a, b) = (fb.param("a"), fb.param("b"));
        let (x, y, c) = (fb.var("x"), fb.var("y"), fb.var("c"));
        let done = fb.label("done");
        fb.op_assign(x, a.into(), SourceOp::Shr, Item::Num(1));
        fb.op_assign(y, b.into(), SourceOp::Shr, Item::Num(1));
        fb.op_assign(c, x.into(), SourceOp::Lt, y.into());
        fb.cond_branch(c.into(), done);
        fb.define_label(done).unwrap();
        fb.ret(Some(Item::Num(0)));
    });
    assert_eq!(
        lines,
        vec!["cjump %v0 < %v1 :l0", ":l0", "rax <- 0", "return"]
    );
}

/// Eight arguments: six in registers, two on the stack.
#[test]
fn eight_argument_call() {
    let lines = lower(|fb| {
        let r = fb.var("r");
        let args = (1..=8).map(Item::Num).collect();
        fb.call_user(Some(r), "g", args);
        fb.ret(Some(r.into()));
    });
    assert_eq!(
        lines,
        vec![
            "mem rsp -8 <- :l0",
            "rdi <- 1",
            "rsi <- 2",
            "rdx <- 3",
            "rcx <- 4",
            "r8 <- 5",
            "r9 <- 6",
            "mem rsp -16 <- 7",
            "mem rsp -24 <- 8",
            "call @g 8",
            ":l0",
            "%v0 <- rax",
            "rax <- %v0",
            "return",
        ]
    );
}

/// A copy folded into an update becomes a move plus an in-place op.
#[test]
fn copy_then_update_fuses() {
    let lines = lower(|fb| {
        let (a, y) = (fb.param("a"), fb.param("y"));
        let (t, w) = (fb.var("t"), fb.var("w"));
        fb.assign(t, a.into());
        fb.op_assign(w, t.into(), SourceOp::Sub, y.into());
        fb.store(a, w.into());
        fb.ret(None);
    });
    assert_eq!(
        lines,
        vec!["%v3 <- %v0", "%v3 -= %v1", "mem %v0 0 <- %v3", "return"]
    );
}

/// Runtime calls skip the return-address protocol.
#[test]
fn print_call() {
    let lines = lower(|fb| {
        let a = fb.param("a");
        fb.call(None, Item::Func(FuncRef::Runtime(Runtime::Print)), vec![a.into()]);
        fb.ret(None);
    });
    assert_eq!(lines, vec!["rdi <- %v0", "call print 1", "return"]);
}

/// A copy is not folded into an update that reads the copy's destination.
#[test]
fn copy_into_shift_operand_keeps_the_temporary() {
    let lines = lower(|fb| {
        let (a, b) = (fb.param("a"), fb.param("b"));
        let c = fb.var("c");
        fb.op_assign(c, b.into(), SourceOp::Shl, a.into());
        fb.assign(a, c.into());
        fb.ret(Some(a.into()));
    });
    assert_eq!(
        lines,
        vec![
            "%v2 <- %v1",
            "%v2 <<= %v0",
            "%v0 <- %v2",
            "rax <- %v0",
            "return"
        ]
    );
}
