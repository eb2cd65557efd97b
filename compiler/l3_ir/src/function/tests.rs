use pretty_assertions::assert_eq;

use crate::{Context, Function, Item, Op, ProgramBuilder, SeqId, SourceOp, Tree};

use super::VerifyError;

/// #0 i <- 3 | #1 :top | #2 i <- i - 1, #3 br i :top | #4 return
fn countdown() -> Function {
    let mut pb = ProgramBuilder::new();
    let mut fb = pb.function("f").unwrap();
    let i = fb.var("i");
    let top = fb.label("top");
    fb.assign(i, Item::Num(3));
    fb.define_label(top).unwrap();
    fb.op_assign(i, i.into(), SourceOp::Sub, Item::Num(1));
    fb.cond_branch(i.into(), top);
    fb.ret(None);
    fb.finish().unwrap();
    pb.finish().functions.remove(0)
}

#[test]
fn built_function_verifies() {
    let f = countdown();
    assert_eq!(f.contexts.len(), 4);
    assert_eq!(f.verify(), Ok(()));
}

#[test]
fn empty_context_is_reported() {
    let mut f = countdown();
    f.contexts.push(Context::default());
    assert_eq!(f.verify(), Err(VerifyError::EmptyContext { context: 4 }));
}

#[test]
fn pruned_function_has_a_gap() {
    let mut f = countdown();
    f.contexts[2].instructions.remove(0);
    assert_eq!(
        f.verify(),
        Err(VerifyError::SequenceGap {
            found: SeqId::new(3),
            expected: 2,
        })
    );
}

#[test]
fn leaf_instruction_is_reported() {
    let mut f = countdown();
    f.contexts[0].instructions[0].tree = Tree::leaf(Item::Num(3));
    assert_eq!(
        f.verify(),
        Err(VerifyError::LeafInstruction { seq: SeqId::new(0) })
    );
}

#[test]
fn control_transfer_must_end_its_context() {
    let mut f = countdown();
    let top = f.labels["top"];
    f.contexts[2].instructions[0].tree = Tree::new(Some(Item::Label(top)), Op::Branch, vec![]);
    assert_eq!(
        f.verify(),
        Err(VerifyError::MidBlockTransfer {
            context: 2,
            seq: SeqId::new(2),
        })
    );
}

#[test]
fn tree_count_must_match() {
    let mut f = countdown();
    f.tree_count += 1;
    let err = f.verify().unwrap_err();
    assert_eq!(
        err,
        VerifyError::TreeCount {
            found: 5,
            tree_count: 6,
        }
    );
    assert_eq!(err.to_string(), "5 instructions found, tree_count is 6");
}

#[test]
fn label_must_resolve_to_a_label_instruction() {
    let mut f = countdown();
    let top = f.labels["top"];
    f.label_defs.insert(top, SeqId::new(2));
    let err = f.verify().unwrap_err();
    assert_eq!(
        err,
        VerifyError::MisplacedLabel {
            label: top,
            seq: SeqId::new(2),
        }
    );
    assert_eq!(
        err.to_string(),
        format!("label :l{} resolves to seq 2 which is not a label", top.raw())
    );
}
