//! Selected L2 instruction sequences.
//!
//! A [`Pattern`] records which tile covered a tree node ([`L2Tile`]) and the
//! patterns covering that node's non-leaf operands. Rendering is post-order:
//! operand code comes first, then the tile's own lines.

use std::fmt;

use l3_ir::{ArithOp, CmpOp, FuncRef, Item};

/// L2 argument registers, in calling-convention order.
pub const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Stack offset of the first argument that does not fit in a register.
const FIRST_STACK_ARG: i64 = -16;

/// An instantiated tile: the L2 instructions for one covered node, with its
/// operands resolved to items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum L2Tile {
    /// `dst @ base index scale`
    Lea {
        dst: Item,
        base: Item,
        index: Item,
        scale: u8,
    },
    /// `cjump lhs cmp rhs target`
    CondJump {
        lhs: Item,
        cmp: CmpOp,
        rhs: Item,
        target: Item,
    },
    /// `dst <- mem base offset`
    Load { dst: Item, base: Item, offset: i64 },
    /// `mem base offset <- value`
    Store { base: Item, offset: i64, value: Item },
    /// `dst <- src` then an in-place update by `rhs`.
    SelfUpdate {
        dst: Item,
        src: Item,
        op: ArithOp,
        rhs: Item,
    },
    /// `dst++`
    Increment { dst: Item },
    /// `dst--`
    Decrement { dst: Item },
    /// `dst op= rhs`
    Compound { dst: Item, op: ArithOp, rhs: Item },
    /// `dst <- lhs` then an in-place update by `rhs`.
    Binary {
        dst: Item,
        lhs: Item,
        op: ArithOp,
        rhs: Item,
    },
    /// `dst <- src`
    Move { dst: Item, src: Item },
    /// `dst <- lhs cmp rhs`
    Compare {
        dst: Item,
        lhs: Item,
        cmp: CmpOp,
        rhs: Item,
    },
    /// Optional `rax <- value`, then `return`.
    Return { value: Option<Item> },
    /// `goto target`
    Goto { target: Item },
    /// `label`
    Label { label: Item },
    /// Argument marshalling, the call itself, and the result move.
    Call {
        callee: Item,
        args: Vec<Item>,
        ret: Item,
        dst: Option<Item>,
    },
}

impl L2Tile {
    /// The L2 lines this tile stands for, without indentation.
    pub fn lines(&self) -> Vec<String> {
        match self {
            L2Tile::Lea {
                dst,
                base,
                index,
                scale,
            } => vec![format!("{dst} @ {base} {index} {scale}")],
            L2Tile::CondJump {
                lhs,
                cmp,
                rhs,
                target,
            } => vec![format!("cjump {lhs} {} {rhs} {target}", cmp.symbol())],
            L2Tile::Load { dst, base, offset } => vec![format!("{dst} <- mem {base} {offset}")],
            L2Tile::Store {
                base,
                offset,
                value,
            } => vec![format!("mem {base} {offset} <- {value}")],
            L2Tile::SelfUpdate { dst, src, op, rhs } => {
                vec![format!("{dst} <- {src}"), update(dst, *op, rhs)]
            }
            L2Tile::Increment { dst } => vec![format!("{dst}++")],
            L2Tile::Decrement { dst } => vec![format!("{dst}--")],
            L2Tile::Compound { dst, op, rhs } => vec![update(dst, *op, rhs)],
            L2Tile::Binary { dst, lhs, op, rhs } => {
                vec![format!("{dst} <- {lhs}"), update(dst, *op, rhs)]
            }
            L2Tile::Move { dst, src } => vec![format!("{dst} <- {src}")],
            L2Tile::Compare { dst, lhs, cmp, rhs } => {
                vec![format!("{dst} <- {lhs} {} {rhs}", cmp.symbol())]
            }
            L2Tile::Return { value } => {
                let mut lines = Vec::with_capacity(2);
                if let Some(value) = value {
                    lines.push(format!("rax <- {value}"));
                }
                lines.push("return".to_owned());
                lines
            }
            L2Tile::Goto { target } => vec![format!("goto {target}")],
            L2Tile::Label { label } => vec![label.to_string()],
            L2Tile::Call {
                callee,
                args,
                ret,
                dst,
            } => call_lines(callee, args, ret, dst.as_ref()),
        }
    }
}

impl fmt::Display for L2Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// `dst op= rhs`, spelled `dst++` / `dst--` for a unit step.
fn update(dst: &Item, op: ArithOp, rhs: &Item) -> String {
    match (op, rhs) {
        (ArithOp::Add, Item::Num(1)) => format!("{dst}++"),
        (ArithOp::Sub, Item::Num(1)) => format!("{dst}--"),
        _ => format!("{dst} {}= {rhs}", op.symbol()),
    }
}

/// Whether a call through `callee` follows the L2 user calling convention
/// (return address on the stack, return label after the call).
fn is_user_callee(callee: &Item) -> bool {
    matches!(callee, Item::Var(_) | Item::Func(FuncRef::User(_)))
}

fn call_lines(callee: &Item, args: &[Item], ret: &Item, dst: Option<&Item>) -> Vec<String> {
    let user = is_user_callee(callee);
    let mut lines = Vec::with_capacity(args.len() + 4);

    if user {
        lines.push(format!("mem rsp -8 <- {ret}"));
    }
    for (reg, arg) in ARG_REGISTERS.iter().zip(args) {
        lines.push(format!("{reg} <- {arg}"));
    }
    let mut offset = FIRST_STACK_ARG;
    for arg in args.iter().skip(ARG_REGISTERS.len()) {
        lines.push(format!("mem rsp {offset} <- {arg}"));
        offset -= 8;
    }
    lines.push(format!("call {callee} {}", args.len()));
    if user {
        lines.push(ret.to_string());
    }
    if let Some(dst) = dst {
        lines.push(format!("{dst} <- rax"));
    }
    lines
}

/// A tile together with the patterns covering its non-leaf operands.
///
/// `operands` are stored in source operand order and rendered right to
/// left, so the rightmost operand is computed first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub tile: L2Tile,
    pub operands: Vec<Pattern>,
}

impl Pattern {
    pub fn new(tile: L2Tile, operands: Vec<Pattern>) -> Self {
        Pattern { tile, operands }
    }

    /// A pattern with no covered operands.
    pub fn single(tile: L2Tile) -> Self {
        Pattern::new(tile, Vec::new())
    }

    /// Post-order rendering: operand code first, then this tile.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut Vec<String>) {
        for operand in self.operands.iter().rev() {
            operand.render_into(out);
        }
        out.extend(self.tile.lines());
    }

    /// Number of tiles in this pattern, including operand patterns.
    pub fn tile_count(&self) -> usize {
        1 + self.operands.iter().map(Pattern::tile_count).sum::<usize>()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
