//! Tree rewrites applied before tile selection.
//!
//! Each rewrite is a stateless rule that walks a whole instruction tree and
//! restructures the nodes it matches in place. The selector applies every
//! rule once per tree, in catalog order, so a later rule sees the output of
//! the earlier ones.
//!
//! Rewrites drop the roots of the interior nodes they remove. That is sound
//! because an interior root is, by construction of merging, dead once its
//! consumer has run.

use l3_ir::{ArithOp, Item, Op, Tree};

/// A tree-to-tree transformation.
pub trait Rewrite: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Rewrite `tree` and all of its descendants.
    fn apply(&self, tree: &mut Tree);
}

// ── Matching helpers ────────────────────────────────────────────────

/// The constant right operand of `tree`, if it is `_ op N`.
fn imm_rhs(tree: &Tree, op: ArithOp) -> Option<i64> {
    if tree.op != Op::ArithImm(op) {
        return None;
    }
    tree.children.get(1).and_then(Tree::constant)
}

/// The left operand of `tree`, if it is `left op n`.
fn imm_lhs(tree: &Tree, op: ArithOp, n: i64) -> Option<&Tree> {
    (imm_rhs(tree, op)? == n).then(|| &tree.children[0])
}

fn recurse(rule: &dyn Rewrite, tree: &mut Tree) {
    for child in &mut tree.children {
        rule.apply(child);
    }
}

// ── Encode/decode collapse ──────────────────────────────────────────

/// `((x << 1) + 1) >> 1` becomes `x`.
pub struct CollapseEncodeDecode;

impl Rewrite for CollapseEncodeDecode {
    fn name(&self) -> &'static str {
        "collapse-encode-decode"
    }

    fn apply(&self, tree: &mut Tree) {
        let round_trip = imm_lhs(tree, ArithOp::Shr, 1)
            .and_then(|t| imm_lhs(t, ArithOp::Add, 1))
            .and_then(|t| imm_lhs(t, ArithOp::Shl, 1))
            .is_some();
        if round_trip {
            let value = tree.children[0].children[0].children[0].take();
            tree.op = Op::Assign;
            tree.children = vec![value];
        }
        recurse(self, tree);
    }
}

// ── Assignment inlining ─────────────────────────────────────────────

/// `w <- (t <- expr)` becomes `w <- expr`.
///
/// Declines when a right-hand operand of `expr` reads `w`: `expr` is
/// rendered as `w <- lhs` followed by an update by `rhs`, which would then
/// read the overwritten `w`.
pub struct InlineAssign;

impl InlineAssign {
    fn inlinable(tree: &Tree) -> bool {
        let [inner] = tree.children.as_slice() else {
            return false;
        };
        let Some(dst) = tree.root_var() else {
            return false;
        };
        tree.op == Op::Assign
            && !inner.is_leaf()
            && inner.root_var().is_some()
            && !inner.children.iter().skip(1).any(|c| c.mentions(dst))
    }
}

impl Rewrite for InlineAssign {
    fn name(&self) -> &'static str {
        "inline-assign"
    }

    fn apply(&self, tree: &mut Tree) {
        while Self::inlinable(tree) {
            let inner = tree.children[0].take();
            tree.op = inner.op;
            tree.children = inner.children;
        }
        recurse(self, tree);
    }
}

// ── Operand canonicalization ────────────────────────────────────────

/// Put operands where the tiles expect them.
///
/// For commutative ops a constant moves right and an operand equal to the
/// destination moves left. Afterwards a non-leaf left operand is retargeted
/// to write the destination directly, unless the destination is still read
/// by the right operand or by the left operand's own right child.
pub struct CanonicalizeOperands;

impl CanonicalizeOperands {
    fn order(tree: &mut Tree) {
        let Op::Arith(op) = tree.op else { return };
        if !op.is_commutative() || tree.children.len() != 2 {
            return;
        }
        let (lhs, rhs) = (&tree.children[0], &tree.children[1]);
        if lhs.constant().is_some() && rhs.constant().is_none() {
            tree.children.swap(0, 1);
            tree.op = Op::ArithImm(op);
        } else if rhs.root == tree.root && lhs.root != tree.root {
            tree.children.swap(0, 1);
        }
    }

    fn reuse_destination(tree: &mut Tree) {
        let Some(dst) = tree.root_var() else { return };
        let [lhs, rhs] = tree.children.as_mut_slice() else {
            return;
        };
        if lhs.is_leaf() || lhs.root_var() == Some(dst) || rhs.mentions(dst) {
            return;
        }
        if lhs.children.get(1).is_some_and(|c| c.mentions(dst)) {
            return;
        }
        tracing::trace!(dst = dst.raw(), "reusing destination for left operand");
        lhs.root = Some(Item::Var(dst));
    }
}

impl Rewrite for CanonicalizeOperands {
    fn name(&self) -> &'static str {
        "canonicalize-operands"
    }

    fn apply(&self, tree: &mut Tree) {
        if tree.op.arith().is_some() {
            Self::order(tree);
            Self::reuse_destination(tree);
        }
        recurse(self, tree);
    }
}

// ── Constant multiplication folding ─────────────────────────────────

/// Fold chains of constant multiplies and shifts into at most one of each,
/// and drop a multiply by an initial `1`.
pub struct FoldMultiplications;

/// The folded shape of a `* c` / `<< c` chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Folded {
    Shift(i64),
    Multiply(i64),
    MultiplyShift(i64, i64),
}

impl FoldMultiplications {
    /// `((acc <- 1) * y) * z` becomes `y * z`.
    fn drop_unit_accumulator(tree: &mut Tree) {
        if tree.op != Op::Arith(ArithOp::Mul) {
            return;
        }
        let Some(inner) = tree.children.first() else {
            return;
        };
        let unit_start = inner.op == Op::Arith(ArithOp::Mul)
            && inner.children.first().is_some_and(|acc| {
                acc.op == Op::Assign && acc.children.first().and_then(Tree::constant) == Some(1)
            });
        if unit_start {
            let factor = tree.children[0].children[1].take();
            tree.children[0] = factor;
        }
    }

    /// Walk the chain starting at `tree`, returning the fold and the depth
    /// of the first node that is not part of it.
    fn measure(tree: &Tree) -> Option<(Folded, usize)> {
        let mut multiplier: i64 = 1;
        let mut shift: i64 = 0;
        let mut depth = 0;
        let mut cursor = tree;

        loop {
            if let Some(c) = imm_rhs(cursor, ArithOp::Mul) {
                multiplier = multiplier.checked_mul(c)?;
            } else if let Some(c) = imm_rhs(cursor, ArithOp::Shl) {
                if !(0..64).contains(&c) {
                    return None;
                }
                shift += c;
            } else {
                break;
            }
            depth += 1;
            cursor = &cursor.children[0];
        }

        if depth < 2 || shift >= 64 {
            return None;
        }
        let folded = match (multiplier, shift) {
            (1, s) if s > 0 => Folded::Shift(s),
            (m, 0) if m > 1 => Folded::Multiply(m),
            (m, s) if m > 1 => Folded::MultiplyShift(m, s),
            _ => return None,
        };
        Some((folded, depth))
    }

    fn fold_chain(tree: &mut Tree) {
        let Some((folded, depth)) = Self::measure(tree) else {
            return;
        };

        let base = {
            let mut node = &mut *tree;
            for _ in 0..depth {
                node = &mut node.children[0];
            }
            node.take()
        };
        let num = |n: i64| Tree::leaf(Item::Num(n));

        match folded {
            Folded::Shift(s) => {
                tree.op = Op::ArithImm(ArithOp::Shl);
                tree.children = vec![base, num(s)];
            }
            Folded::Multiply(m) => {
                tree.op = Op::ArithImm(ArithOp::Mul);
                tree.children = vec![base, num(m)];
            }
            Folded::MultiplyShift(m, s) => {
                let mut inner = tree.children[0].take();
                inner.op = Op::ArithImm(ArithOp::Mul);
                inner.children = vec![base, num(m)];
                tree.op = Op::ArithImm(ArithOp::Shl);
                tree.children = vec![inner, num(s)];
            }
        }
        tracing::trace!(?folded, depth, "folded multiplication chain");
    }
}

impl Rewrite for FoldMultiplications {
    fn name(&self) -> &'static str {
        "fold-multiplications"
    }

    fn apply(&self, tree: &mut Tree) {
        Self::drop_unit_accumulator(tree);
        Self::fold_chain(tree);
        recurse(self, tree);
    }
}

// ── Strength reduction ──────────────────────────────────────────────

/// Shift-based idioms over tagged integers.
///
/// - `((((b >> 1) + n) << 1) + 1)` becomes `b + 2n`.
/// - `((((p >> 1) + (q >> 1)) << 1) + 1)` becomes `(p + q) - 1`, unless
///   `p` or `q` is itself a constant subtraction.
pub struct StrengthReduce;

impl StrengthReduce {
    /// `2n` for the increment idiom.
    fn shifted_increment(tree: &Tree) -> Option<i64> {
        let shl = imm_lhs(tree, ArithOp::Add, 1)?;
        let add = imm_lhs(shl, ArithOp::Shl, 1)?;
        let n = imm_rhs(add, ArithOp::Add)?;
        imm_lhs(&add.children[0], ArithOp::Shr, 1)?;
        n.checked_mul(2)
    }

    fn is_shifted_sum(tree: &Tree) -> bool {
        let Some(sum) = imm_lhs(tree, ArithOp::Add, 1).and_then(|t| imm_lhs(t, ArithOp::Shl, 1))
        else {
            return false;
        };
        sum.op == Op::Arith(ArithOp::Add)
            && sum.children.iter().all(|half| {
                imm_lhs(half, ArithOp::Shr, 1).is_some_and(|v| v.op != Op::ArithImm(ArithOp::Sub))
            })
    }

    fn reduce(tree: &mut Tree) {
        if let Some(step) = Self::shifted_increment(tree) {
            // tree(+1) -> shl -> add(+n) -> shr -> b
            let base = tree.children[0].children[0].children[0].children[0].take();
            tree.children = vec![base, Tree::leaf(Item::Num(step))];
            return;
        }
        if Self::is_shifted_sum(tree) {
            let mut sum = tree.children[0].children[0].take();
            let halves: Vec<Tree> = sum
                .children
                .iter_mut()
                .map(|half| half.children[0].take())
                .collect();
            let shl = &mut tree.children[0];
            shl.op = Op::Arith(ArithOp::Add);
            shl.children = halves;
            tree.op = Op::ArithImm(ArithOp::Sub);
        }
    }
}

impl Rewrite for StrengthReduce {
    fn name(&self) -> &'static str {
        "strength-reduce"
    }

    fn apply(&self, tree: &mut Tree) {
        Self::reduce(tree);
        recurse(self, tree);
    }
}
