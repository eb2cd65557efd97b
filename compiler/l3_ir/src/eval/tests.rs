use pretty_assertions::assert_eq;

use crate::{ArithOp, CmpOp, Item, Op, Tree, VarId};

use super::Machine;

fn v(n: u32) -> VarId {
    VarId::new(n)
}

fn leaf(n: u32) -> Tree {
    Tree::leaf(v(n))
}

fn num(n: i64) -> Tree {
    Tree::leaf(Item::Num(n))
}

#[test]
fn arithmetic_wraps() {
    let mut m = Machine::new();
    m.set(v(1), i64::MAX);
    m.run(&Tree::new(
        Some(v(0).into()),
        Op::ArithImm(ArithOp::Add),
        vec![leaf(1), num(1)],
    ));
    assert_eq!(m.get(v(0)), i64::MIN);
}

#[test]
fn shift_right_is_arithmetic() {
    let mut m = Machine::new();
    m.set(v(1), -16);
    m.run(&Tree::new(
        Some(v(0).into()),
        Op::ArithImm(ArithOp::Shr),
        vec![leaf(1), num(2)],
    ));
    assert_eq!(m.get(v(0)), -4);
}

#[test]
fn comparisons_produce_zero_or_one() {
    let mut m = Machine::new();
    m.set(v(1), 3);
    m.run(&Tree::new(Some(v(0).into()), Op::Cmp(CmpOp::Le), vec![leaf(1), num(3)]));
    m.run(&Tree::new(Some(v(2).into()), Op::Cmp(CmpOp::Lt), vec![leaf(1), num(3)]));
    assert_eq!((m.get(v(0)), m.get(v(2))), (1, 0));
}

/// Nested nodes write their own roots as well as feeding their parent.
#[test]
fn nested_nodes_write_roots() {
    let mut m = Machine::new();
    m.set(v(0), 5);
    let inner = Tree::new(
        Some(v(1).into()),
        Op::ArithImm(ArithOp::Add),
        vec![leaf(0), num(1)],
    );
    m.run(&Tree::new(
        Some(v(2).into()),
        Op::ArithImm(ArithOp::Sub),
        vec![inner, num(1)],
    ));
    assert_eq!((m.get(v(1)), m.get(v(2))), (6, 5));
}

#[test]
fn memory_round_trips_through_store_and_load() {
    let mut m = Machine::new();
    m.set(v(0), 64);
    m.run(&Tree::new(None, Op::Store, vec![leaf(0), num(9)]));
    m.run(&Tree::new(Some(v(1).into()), Op::Load, vec![leaf(0)]));
    assert_eq!(m.get(v(1)), 9);
    assert_eq!(m.read_word(128), 0);
}

#[test]
fn run_all_stops_at_return() {
    let mut m = Machine::new();
    let trees = [
        Tree::new(Some(v(0).into()), Op::Assign, vec![num(7)]),
        Tree::new(None, Op::Return, vec![leaf(0)]),
        Tree::new(Some(v(0).into()), Op::Assign, vec![num(8)]),
    ];
    m.run_all(&trees);
    assert_eq!(m.returned(), Some(Some(7)));
    assert_eq!(m.get(v(0)), 7);
}

#[test]
#[should_panic(expected = "cannot evaluate")]
fn control_flow_is_rejected() {
    let mut m = Machine::new();
    m.run(&Tree::new(
        Some(crate::LabelId::new(0).into()),
        Op::Branch,
        Vec::new(),
    ));
}
