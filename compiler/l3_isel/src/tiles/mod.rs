//! The tile catalog.
//!
//! Each tile recognizes one tree shape and instantiates an [`L2Tile`] for
//! it. Tiles are tried in the order the [`Selector`] registers them; the
//! first one whose `try_cover` returns a pattern wins. A tile that matches
//! covers its non-leaf operands through [`Selector::cover_operands`].

use l3_ir::{ArithOp, CmpOp, Item, Op, Tree};

use crate::pattern::{L2Tile, Pattern};
use crate::selector::Selector;

/// A stateless covering strategy for one tree shape.
pub trait Tile: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Cover `tree`, or return `None` if this tile does not apply.
    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern>;
}

// ── Matching helpers ────────────────────────────────────────────────

/// The constant right operand of `tree`, if it is `_ op N`.
fn imm_rhs(tree: &Tree, op: ArithOp) -> Option<i64> {
    if tree.op != Op::ArithImm(op) {
        return None;
    }
    tree.children.get(1).and_then(Tree::constant)
}

/// `(lhs, rhs)` of a binary node.
fn operands(tree: &Tree) -> Option<(&Tree, &Tree)> {
    match tree.children.as_slice() {
        [lhs, rhs] => Some((lhs, rhs)),
        _ => None,
    }
}

/// The item a subtree contributes to its parent: its root.
fn item(tree: &Tree) -> Option<Item> {
    tree.root.clone()
}

/// Split a `base + M` address with `M` a multiple of 8.
fn split_offset(addr: &Tree) -> (&Tree, i64) {
    match imm_rhs(addr, ArithOp::Add) {
        Some(offset) if offset % 8 == 0 => (&addr.children[0], offset),
        _ => (addr, 0),
    }
}

// ── Addressing ──────────────────────────────────────────────────────

/// `w <- base + (index << k)` with `k` in 1..=3.
pub struct LeaTile;

impl LeaTile {
    fn scale(tree: &Tree) -> Option<u8> {
        match imm_rhs(tree, ArithOp::Shl)? {
            1 => Some(2),
            2 => Some(4),
            3 => Some(8),
            _ => None,
        }
    }
}

impl Tile for LeaTile {
    fn name(&self) -> &'static str {
        "lea"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Arith(ArithOp::Add) {
            return None;
        }
        let (lhs, rhs) = operands(tree)?;
        let (shifted, base) = if Self::scale(rhs).is_some() {
            (rhs, lhs)
        } else {
            (lhs, rhs)
        };
        let scale = Self::scale(shifted)?;
        let index = &shifted.children[0];
        let (base_item, index_item) = (item(base)?, item(index)?);
        if base_item.as_var().is_none() || index_item.as_var().is_none() {
            return None;
        }

        let tile = L2Tile::Lea {
            dst: item(tree)?,
            base: base_item,
            index: index_item,
            scale,
        };
        Some(Pattern::new(tile, selector.cover_operands([index, base])))
    }
}

// ── Control transfer ────────────────────────────────────────────────

/// `br cond :l` as a single `cjump`.
pub struct CondJumpTile;

impl Tile for CondJumpTile {
    fn name(&self) -> &'static str {
        "cjump"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::CondBranch {
            return None;
        }
        let target = item(tree)?;
        let cond = tree.children.first()?;

        let Op::Cmp(cmp) = cond.op else {
            let tile = L2Tile::CondJump {
                lhs: item(cond)?,
                cmp: CmpOp::Eq,
                rhs: Item::Num(1),
                target,
            };
            return Some(Pattern::new(tile, selector.cover_operands([cond])));
        };

        let (mut lhs, mut rhs) = operands(cond)?;
        if let (Some(a), Some(b)) = (imm_rhs(lhs, ArithOp::Shr), imm_rhs(rhs, ArithOp::Shr)) {
            if a == b {
                lhs = &lhs.children[0];
                rhs = &rhs.children[0];
            }
        }
        let tile = L2Tile::CondJump {
            lhs: item(lhs)?,
            cmp,
            rhs: item(rhs)?,
            target,
        };
        Some(Pattern::new(tile, selector.cover_operands([lhs, rhs])))
    }
}

// ── Memory ──────────────────────────────────────────────────────────

/// `w <- mem x M`
pub struct LoadTile;

impl Tile for LoadTile {
    fn name(&self) -> &'static str {
        "load"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Load {
            return None;
        }
        let (base, offset) = split_offset(tree.children.first()?);
        let tile = L2Tile::Load {
            dst: item(tree)?,
            base: item(base)?,
            offset,
        };
        Some(Pattern::new(tile, selector.cover_operands([base])))
    }
}

/// `mem x M <- s`
pub struct StoreTile;

impl Tile for StoreTile {
    fn name(&self) -> &'static str {
        "store"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Store {
            return None;
        }
        let (addr, value) = operands(tree)?;
        let (base, offset) = split_offset(addr);
        let tile = L2Tile::Store {
            base: item(base)?,
            offset,
            value: item(value)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([base, value])))
    }
}

// ── Arithmetic ──────────────────────────────────────────────────────

/// `w <- (t <- s) op y` as `w <- s; w op= y`.
pub struct SelfUpdateTile;

impl Tile for SelfUpdateTile {
    fn name(&self) -> &'static str {
        "self-update"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        let op = tree.op.arith()?;
        let dst = tree.root_var()?;
        let (lhs, rhs) = operands(tree)?;
        if lhs.op != Op::Assign || rhs.mentions(dst) {
            return None;
        }
        let src = lhs.children.first()?;

        let tile = L2Tile::SelfUpdate {
            dst: Item::Var(dst),
            src: item(src)?,
            op,
            rhs: item(rhs)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([src, rhs])))
    }
}

/// `x <- x + 1` and `x <- x - 1`.
pub struct IncDecTile;

impl Tile for IncDecTile {
    fn name(&self) -> &'static str {
        "inc-dec"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        let Op::ArithImm(op) = tree.op else {
            return None;
        };
        let (lhs, rhs) = operands(tree)?;
        let dst = Item::Var(tree.root_var()?);
        if rhs.constant() != Some(1) || !lhs.root_is(&dst) {
            return None;
        }

        let tile = match op {
            ArithOp::Add => L2Tile::Increment { dst },
            ArithOp::Sub => L2Tile::Decrement { dst },
            _ => return None,
        };
        Some(Pattern::new(tile, selector.cover_operands([lhs])))
    }
}

/// `x <- x op y` as `x op= y`.
pub struct CompoundTile;

impl Tile for CompoundTile {
    fn name(&self) -> &'static str {
        "compound"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        let op = tree.op.arith()?;
        let (lhs, rhs) = operands(tree)?;
        let dst = Item::Var(tree.root_var()?);
        if !lhs.root_is(&dst) {
            return None;
        }

        let tile = L2Tile::Compound {
            dst,
            op,
            rhs: item(rhs)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([lhs, rhs])))
    }
}

/// `w <- a op b` as `w <- a; w op= b`.
pub struct BinaryTile;

impl Tile for BinaryTile {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        let op = tree.op.arith()?;
        let (lhs, rhs) = operands(tree)?;
        let tile = L2Tile::Binary {
            dst: item(tree)?,
            lhs: item(lhs)?,
            op,
            rhs: item(rhs)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([lhs, rhs])))
    }
}

// ── Plain moves and comparisons ─────────────────────────────────────

/// `w <- s`
pub struct MoveTile;

impl Tile for MoveTile {
    fn name(&self) -> &'static str {
        "move"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Assign {
            return None;
        }
        let src = tree.children.first()?;
        let tile = L2Tile::Move {
            dst: item(tree)?,
            src: item(src)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([src])))
    }
}

/// `w <- a cmp b`
pub struct CompareTile;

impl Tile for CompareTile {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        let Op::Cmp(cmp) = tree.op else {
            return None;
        };
        let (lhs, rhs) = operands(tree)?;
        let tile = L2Tile::Compare {
            dst: item(tree)?,
            lhs: item(lhs)?,
            cmp,
            rhs: item(rhs)?,
        };
        Some(Pattern::new(tile, selector.cover_operands([lhs, rhs])))
    }
}

// ── Function-level control ──────────────────────────────────────────

/// `return` and `return t`.
pub struct ReturnTile;

impl Tile for ReturnTile {
    fn name(&self) -> &'static str {
        "return"
    }

    fn try_cover(&self, tree: &Tree, selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Return {
            return None;
        }
        let Some(value) = tree.children.first() else {
            return Some(Pattern::single(L2Tile::Return { value: None }));
        };
        let tile = L2Tile::Return {
            value: Some(item(value)?),
        };
        Some(Pattern::new(tile, selector.cover_operands([value])))
    }
}

/// `br :l` and `:l`, passed through.
pub struct LabelTile;

impl Tile for LabelTile {
    fn name(&self) -> &'static str {
        "label"
    }

    fn try_cover(&self, tree: &Tree, _selector: &Selector) -> Option<Pattern> {
        let tile = match tree.op {
            Op::Branch => L2Tile::Goto {
                target: item(tree)?,
            },
            Op::Label => L2Tile::Label { label: item(tree)? },
            _ => return None,
        };
        Some(Pattern::single(tile))
    }
}

/// A call with its argument marshalling.
///
/// Children are `[args.., return label, callee]`, all leaves.
pub struct CallTile;

impl Tile for CallTile {
    fn name(&self) -> &'static str {
        "call"
    }

    fn try_cover(&self, tree: &Tree, _selector: &Selector) -> Option<Pattern> {
        if tree.op != Op::Call {
            return None;
        }
        let (callee, rest) = tree.children.split_last()?;
        let (ret, args) = rest.split_last()?;
        let args = args.iter().map(item).collect::<Option<Vec<_>>>()?;

        let tile = L2Tile::Call {
            callee: item(callee)?,
            args,
            ret: item(ret)?,
            dst: tree.root.clone(),
        };
        Some(Pattern::single(tile))
    }
}
