//! Functions, basic blocks and programs.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::item::{LabelId, SeqId, VarId};
use crate::op::Op;
use crate::tree::Instruction;

/// A basic block.
///
/// Only the last instruction may transfer control. The optimizer removes
/// instructions from the vector as it prunes and merges; sequence ids of
/// the survivors are never renumbered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub instructions: Vec<Instruction>,
}

impl Context {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// A function in L3 tree form.
#[derive(Clone, Debug)]
pub struct Function {
    /// Name without the leading `@`.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<VarId>,
    /// Basic blocks in program order.
    pub contexts: Vec<Context>,
    /// Interned variable names (without `%`).
    pub vars: FxHashMap<String, VarId>,
    /// Interned label names (without `:`).
    pub labels: FxHashMap<String, LabelId>,
    /// Where each label is defined.
    pub label_defs: FxHashMap<LabelId, SeqId>,
    /// Number of variables allocated, including builder temporaries.
    pub var_count: u32,
    /// Number of instructions created. Sequence ids are `0..tree_count`.
    pub tree_count: u32,
}

impl Function {
    /// All surviving instructions in program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.contexts.iter().flat_map(|c| c.instructions.iter())
    }

    /// Number of surviving instructions.
    pub fn instruction_count(&self) -> usize {
        self.contexts.iter().map(Context::len).sum()
    }

    /// The instruction defining `label`.
    ///
    /// # Panics
    ///
    /// Panics if the label has no definition. The builder rejects such
    /// functions, so this only fires on hand-built IR.
    pub fn label_target(&self, label: LabelId) -> SeqId {
        match self.label_defs.get(&label) {
            Some(&seq) => seq,
            None => panic!(
                "label :l{} is not defined in @{}",
                label.raw(),
                self.name
            ),
        }
    }

    /// Checks the structural invariants established by the builder.
    ///
    /// Only meaningful before optimization: pruning and merging leave gaps
    /// in the sequence ids. Reports the first violation found.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let mut expected = 0u32;
        for (context, ctx) in self.contexts.iter().enumerate() {
            if ctx.is_empty() {
                return Err(VerifyError::EmptyContext { context });
            }
            let last = ctx.len() - 1;
            for (pos, instr) in ctx.instructions.iter().enumerate() {
                if instr.id.raw() != expected {
                    return Err(VerifyError::SequenceGap {
                        found: instr.id,
                        expected,
                    });
                }
                expected += 1;
                if instr.tree.op == Op::Leaf {
                    return Err(VerifyError::LeafInstruction { seq: instr.id });
                }
                if pos != last && instr.tree.op.is_control() {
                    return Err(VerifyError::MidBlockTransfer {
                        context,
                        seq: instr.id,
                    });
                }
            }
        }
        if expected != self.tree_count {
            return Err(VerifyError::TreeCount {
                found: expected,
                tree_count: self.tree_count,
            });
        }
        for (&label, &seq) in &self.label_defs {
            let defines = self
                .instructions()
                .any(|i| i.id == seq && i.tree.op == Op::Label);
            if !defines {
                return Err(VerifyError::MisplacedLabel { label, seq });
            }
        }
        Ok(())
    }
}

/// A broken structural invariant of a [`Function`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("context {context} is empty")]
    EmptyContext { context: usize },
    #[error("sequence id {} found where {expected} was expected", .found.raw())]
    SequenceGap { found: SeqId, expected: u32 },
    #[error("leaf at instruction level (seq {})", .seq.raw())]
    LeafInstruction { seq: SeqId },
    #[error("control transfer at seq {} in the middle of context {context}", .seq.raw())]
    MidBlockTransfer { context: usize, seq: SeqId },
    #[error("{found} instructions found, tree_count is {tree_count}")]
    TreeCount { found: u32, tree_count: u32 },
    #[error("label :l{} resolves to seq {} which is not a label", .label.raw(), .seq.raw())]
    MisplacedLabel { label: LabelId, seq: SeqId },
}

/// A whole L3 program.
#[derive(Clone, Debug)]
pub struct Program {
    pub functions: Vec<Function>,
    /// Entry point name without the `@`.
    pub entry: String,
    /// Number of labels allocated across all functions.
    pub label_count: u32,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for concise assertions")]
mod tests;
