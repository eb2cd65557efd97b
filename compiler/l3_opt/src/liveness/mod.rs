//! Backward dataflow liveness over sequence-numbered instructions.
//!
//! Every instruction is its own dataflow node, indexed by [`SeqId`]. Sets
//! are sized to `tree_count`, so ids removed by later passes simply keep
//! empty sets.
//!
//! # Algorithm
//!
//! 1. **Precompute gen/kill** for each instruction.
//!    - `gen(i)` = variables the instruction reads.
//!    - `kill(i)` = the variable it writes, if any.
//! 2. **Successors** in program order: fallthrough, branch target, both
//!    (conditional branch), or none (`return`, diverging calls, falling
//!    off the end).
//! 3. **Sweep** from the last instruction to the first:
//!    - `live_out(i) = ∪ live_in(s)` for each successor `s`.
//!    - `live_in(i) = gen(i) ∪ (live_out(i) - kill(i))`.
//!
//!    Repeat until a sweep changes nothing.

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};

use l3_ir::{Function, Item, LabelId, Op, SeqId, Tree, VarId};

/// Set of live variables at a program point.
pub type LiveSet = FxHashSet<VarId>;

/// Successor list of one instruction. At most two entries.
pub type Successors = SmallVec<[SeqId; 2]>;

/// Dataflow facts for every instruction of a function.
///
/// All vectors are indexed by [`SeqId::index`].
pub struct Liveness {
    pub gen: Vec<LiveSet>,
    pub kill: Vec<Option<VarId>>,
    pub live_in: Vec<LiveSet>,
    pub live_out: Vec<LiveSet>,
    pub successors: Vec<Successors>,
    /// Instruction ids in program order, the order sweeps walk backwards.
    order: Vec<SeqId>,
    /// Sweeps run so far, including the final unchanged one.
    pub sweeps: u32,
}

/// Compute liveness for every instruction of `func`.
///
/// # Panics
///
/// Panics if a branch targets a label with no definition.
pub fn compute_liveness(func: &Function) -> Liveness {
    let size = func.tree_count as usize;
    let order: Vec<SeqId> = func.instructions().map(|i| i.id).collect();

    tracing::debug!(function = %func.name, instructions = order.len(), "computing liveness");

    let mut gen: Vec<LiveSet> = (0..size).map(|_| LiveSet::default()).collect();
    let mut kill: Vec<Option<VarId>> = vec![None; size];
    let mut successors: Vec<Successors> = vec![Successors::new(); size];

    for (pos, instr) in func.instructions().enumerate() {
        let idx = instr.id.index();
        let tree = &instr.tree;

        gen[idx].extend(tree.read_vars());
        kill[idx] = tree.defined_var();

        let fallthrough = order.get(pos + 1).copied();
        successors[idx] = match tree.op {
            Op::Return => smallvec![],
            Op::Call if call_diverges(tree) => smallvec![],
            Op::Branch => smallvec![func.label_target(branch_label(tree))],
            Op::CondBranch => {
                let target = func.label_target(branch_label(tree));
                fallthrough.into_iter().chain([target]).collect()
            }
            Op::Leaf => panic!("leaf at instruction level in @{}", func.name),
            _ => fallthrough.into_iter().collect(),
        };
    }

    let mut liveness = Liveness {
        gen,
        kill,
        live_in: (0..size).map(|_| LiveSet::default()).collect(),
        live_out: (0..size).map(|_| LiveSet::default()).collect(),
        successors,
        order,
        sweeps: 0,
    };

    while liveness.sweep() {}

    tracing::debug!(
        function = %func.name,
        sweeps = liveness.sweeps,
        "liveness converged"
    );

    liveness
}

impl Liveness {
    /// Run one backward sweep over every instruction.
    ///
    /// Returns whether any IN or OUT set changed. Once the fixpoint is
    /// reached, further sweeps return `false`.
    pub fn sweep(&mut self) -> bool {
        self.sweeps += 1;
        let mut changed = false;

        for &seq in self.order.iter().rev() {
            let idx = seq.index();

            let mut new_out = LiveSet::default();
            for succ in &self.successors[idx] {
                new_out.extend(self.live_in[succ.index()].iter().copied());
            }

            let mut new_in = self.gen[idx].clone();
            new_in.extend(
                new_out
                    .iter()
                    .copied()
                    .filter(|&var| self.kill[idx] != Some(var)),
            );

            if new_in != self.live_in[idx] || new_out != self.live_out[idx] {
                changed = true;
                self.live_in[idx] = new_in;
                self.live_out[idx] = new_out;
            }
        }

        tracing::trace!(sweep = self.sweeps, changed, "liveness sweep");
        changed
    }

    /// Whether `var` is live on exit from `seq`.
    #[inline]
    pub fn is_live_out(&self, seq: SeqId, var: VarId) -> bool {
        self.live_out[seq.index()].contains(&var)
    }
}

fn branch_label(tree: &Tree) -> LabelId {
    match tree.root {
        Some(Item::Label(label)) => label,
        ref other => panic!("branch without a label target: {other:?}"),
    }
}

/// A call never returns when its callee (the last child) is a diverging
/// runtime entry point.
fn call_diverges(tree: &Tree) -> bool {
    matches!(
        tree.children.last().and_then(|c| c.root.as_ref()),
        Some(Item::Func(f)) if f.diverges()
    )
}
