//! Reference evaluator for straight-line trees.
//!
//! [`Machine`] gives merged trees a meaning that can be compared against the
//! flat instructions they were built from. It understands arithmetic,
//! comparisons, assignments, memory and `return`; anything that transfers
//! control is outside its domain.

use rustc_hash::FxHashMap;

use crate::item::{Item, VarId};
use crate::op::Op;
use crate::tree::Tree;

/// Variable environment plus a word-addressed memory.
///
/// Unwritten variables and memory words read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Machine {
    env: FxHashMap<VarId, i64>,
    memory: FxHashMap<i64, i64>,
    returned: Option<Option<i64>>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, var: VarId, value: i64) {
        self.env.insert(var, value);
    }

    pub fn get(&self, var: VarId) -> i64 {
        self.env.get(&var).copied().unwrap_or(0)
    }

    pub fn write_word(&mut self, addr: i64, value: i64) {
        self.memory.insert(addr, value);
    }

    pub fn read_word(&self, addr: i64) -> i64 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    /// The operand of the last `return` executed, if any ran.
    pub fn returned(&self) -> Option<Option<i64>> {
        self.returned
    }

    /// The memory image, for comparing two runs.
    pub fn memory(&self) -> &FxHashMap<i64, i64> {
        &self.memory
    }

    /// Execute one instruction-level tree.
    pub fn run(&mut self, tree: &Tree) {
        self.eval(tree);
    }

    /// Execute trees in order, stopping after a `return`.
    pub fn run_all<'a>(&mut self, trees: impl IntoIterator<Item = &'a Tree>) {
        for tree in trees {
            self.run(tree);
            if self.returned.is_some() {
                break;
            }
        }
    }

    /// Evaluate `tree` and return its value.
    ///
    /// # Panics
    ///
    /// Panics on control-flow ops and on label or function operands.
    fn eval(&mut self, tree: &Tree) -> i64 {
        if tree.op == Op::Leaf {
            return match &tree.root {
                Some(Item::Var(v)) => self.get(*v),
                Some(Item::Num(n)) => *n,
                other => panic!("cannot evaluate operand {other:?}"),
            };
        }

        let args: Vec<i64> = tree.children.iter().map(|c| self.eval(c)).collect();
        let value = match (tree.op, args.as_slice()) {
            (Op::Arith(op) | Op::ArithImm(op), &[a, b]) => op.apply(a, b),
            (Op::Cmp(op), &[a, b]) => i64::from(op.apply(a, b)),
            (Op::Assign, &[a]) => a,
            (Op::Load, &[addr]) => self.read_word(addr),
            (Op::Store, &[addr, value]) => {
                self.write_word(addr, value);
                return 0;
            }
            (Op::Return, args) => {
                self.returned = Some(args.first().copied());
                return 0;
            }
            (op, args) => panic!("cannot evaluate {op:?} with {} operands", args.len()),
        };

        if let Some(var) = tree.root_var() {
            self.set(var, value);
        }
        value
    }
}

#[cfg(test)]
mod tests;
