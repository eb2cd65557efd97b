//! Instruction trees.
//!
//! A [`Tree`] starts life as a flat instruction (one operator node whose
//! children are all leaves). The optimizer grows it by grafting the trees of
//! earlier instructions in place of the leaves that read their results, so
//! after merging a single tree can describe a whole expression.

use std::mem;

use crate::item::{Item, SeqId, VarId};
use crate::op::Op;

/// One IR node.
///
/// `root` is the variable the node writes (for value-producing ops), the
/// label (for `Branch`, `CondBranch` and `Label`), the operand (for `Leaf`),
/// or `None` (for `Store`, `Return`, and calls without a destination).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tree {
    pub root: Option<Item>,
    pub op: Op,
    pub children: Vec<Tree>,
}

impl Tree {
    pub fn new(root: Option<Item>, op: Op, children: Vec<Tree>) -> Self {
        Tree { root, op, children }
    }

    /// A terminal operand.
    pub fn leaf(item: impl Into<Item>) -> Self {
        Tree {
            root: Some(item.into()),
            op: Op::Leaf,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.op == Op::Leaf
    }

    /// The constant this node holds, if it is a `Num` leaf.
    #[inline]
    pub fn constant(&self) -> Option<i64> {
        if self.is_leaf() {
            self.root.as_ref().and_then(Item::as_num)
        } else {
            None
        }
    }

    /// The root as a variable, regardless of op.
    #[inline]
    pub fn root_var(&self) -> Option<VarId> {
        self.root.as_ref().and_then(Item::as_var)
    }

    /// The variable this instruction-level node defines.
    ///
    /// Control ops carry a label in their root and define nothing.
    pub fn defined_var(&self) -> Option<VarId> {
        match self.op {
            Op::Branch | Op::CondBranch | Op::Label | Op::Leaf => None,
            _ => self.root_var(),
        }
    }

    /// Whether the root of this node equals `item`.
    #[inline]
    pub fn root_is(&self, item: &Item) -> bool {
        self.root.as_ref() == Some(item)
    }

    /// Whether `var` appears anywhere in this tree, as a root or in any
    /// descendant.
    pub fn mentions(&self, var: VarId) -> bool {
        self.root_var() == Some(var) || self.children.iter().any(|c| c.mentions(var))
    }

    /// Whether any node of this tree reads memory.
    pub fn contains_load(&self) -> bool {
        self.op == Op::Load || self.children.iter().any(Tree::contains_load)
    }

    /// The variables read directly by this node's children.
    ///
    /// For a flat instruction this is exactly the set of variables the
    /// instruction uses.
    pub fn read_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.children.iter().filter_map(Tree::root_var)
    }

    /// Move this tree out, leaving a placeholder leaf behind.
    ///
    /// Used while restructuring a tree in place; the placeholder is always
    /// overwritten before the restructuring returns.
    pub fn take(&mut self) -> Tree {
        mem::replace(self, Tree::leaf(Item::Num(0)))
    }

    /// Replace every direct leaf child reading `var` with `producer`.
    ///
    /// Returns how many children were replaced. All but the last replacement
    /// receive a clone; the last one receives `producer` itself.
    pub fn graft(&mut self, var: VarId, producer: Tree) -> usize {
        let target = Item::Var(var);
        let slots: Vec<usize> = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_leaf() && c.root_is(&target))
            .map(|(idx, _)| idx)
            .collect();

        let Some((&last, rest)) = slots.split_last() else {
            return 0;
        };
        for &idx in rest {
            self.children[idx] = producer.clone();
        }
        self.children[last] = producer;
        slots.len()
    }
}

/// An instruction: a tree plus its sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub id: SeqId,
    pub tree: Tree,
}

impl Instruction {
    pub fn new(id: SeqId, tree: Tree) -> Self {
        Instruction { id, tree }
    }
}
