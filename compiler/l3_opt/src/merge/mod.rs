//! Tree merging.
//!
//! Within a basic block, an instruction `i` that defines `v` is folded into
//! the first later instruction `j` that reads `v`, provided nothing in
//! between invalidates the move and `v` is not needed after `j`. The
//! producer's tree replaces the leaf reading `v`, and `i` disappears from
//! the block.
//!
//! The scan for a consumer stops early when an intermediate instruction
//! redefines `v`, redefines something `i` reads, or (when `i` reads memory)
//! writes memory.

use l3_ir::{Context, Function, Instruction, Item, Op, VarId};

use crate::liveness::Liveness;

/// Merge producers into their consumers in every context of `func`.
///
/// `liveness.gen` is updated as trees grow: a consumer's gen set absorbs
/// its producer's. Returns the number of merges performed.
pub fn merge_trees(func: &mut Function, liveness: &mut Liveness) -> usize {
    let mut merged = 0;
    for ctx in &mut func.contexts {
        merged += merge_context(ctx, liveness);
    }

    if merged > 0 {
        tracing::debug!(function = %func.name, merged, "trees merged");
    }
    merged
}

fn merge_context(ctx: &mut Context, liveness: &mut Liveness) -> usize {
    let instrs = &mut ctx.instructions;
    let mut merged = 0;
    let mut i = 0;

    // The last instruction is never a producer.
    while i + 1 < instrs.len() {
        let Some((var, j)) = fold_target(instrs, i, liveness) else {
            i += 1;
            continue;
        };

        let producer = instrs.remove(i);
        let consumer = &mut instrs[j - 1];

        let producer_gen = liveness.gen[producer.id.index()].clone();
        liveness.gen[consumer.id.index()].extend(producer_gen);

        tracing::trace!(
            producer = producer.id.raw(),
            consumer = consumer.id.raw(),
            var = var.raw(),
            "grafting"
        );
        consumer.tree.graft(var, producer.tree);
        merged += 1;
        // The next producer now sits at `i`.
    }
    merged
}

/// Find the consumer that instruction `i` folds into.
///
/// Returns the variable `i` defines and the consumer's position.
fn fold_target(instrs: &[Instruction], i: usize, liveness: &Liveness) -> Option<(VarId, usize)> {
    let producer = &instrs[i];
    let var = liveness.kill[producer.id.index()]?;
    let producer_gen = &liveness.gen[producer.id.index()];
    let reads_memory = producer.tree.contains_load();
    let target = Item::Var(var);

    for (j, consumer) in instrs.iter().enumerate().skip(i + 1) {
        let seq = consumer.id;
        let consumer_kill = liveness.kill[seq.index()];

        if liveness.gen[seq.index()].contains(&var) {
            let needed_after = liveness.is_live_out(seq, var) && consumer_kill != Some(var);
            let children = &consumer.tree.children;
            let duplicate_operands = children.len() == 2 && children[0].root == children[1].root;
            let has_leaf = children.iter().any(|c| c.is_leaf() && c.root_is(&target));

            if needed_after || duplicate_operands || !has_leaf {
                return None;
            }
            return Some((var, j));
        }

        if let Some(def) = consumer_kill {
            if def == var || producer_gen.contains(&def) {
                return None;
            }
        }
        if reads_memory && consumer.tree.op == Op::Store {
            return None;
        }
    }
    None
}
