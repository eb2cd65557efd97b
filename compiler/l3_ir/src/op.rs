//! Operator tags.

/// Arithmetic, bitwise and shift operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    And,
    Shl,
    Shr,
}

impl ArithOp {
    /// Evaluate on 64-bit two's-complement integers.
    ///
    /// Arithmetic wraps; shift amounts are taken modulo 64 and `Shr` is an
    /// arithmetic shift.
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation,
        reason = "shift amounts are masked to 0..64 by wrapping_shl/wrapping_shr"
    )]
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mul => lhs.wrapping_mul(rhs),
            ArithOp::And => lhs & rhs,
            ArithOp::Shl => lhs.wrapping_shl(rhs as u32),
            ArithOp::Shr => lhs.wrapping_shr(rhs as u32),
        }
    }

    /// `a op b == b op a`.
    pub fn is_commutative(self) -> bool {
        matches!(self, ArithOp::Add | ArithOp::Mul | ArithOp::And)
    }

    /// Source spelling (`+`, `<<`, ...).
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::And => "&",
            ArithOp::Shl => "<<",
            ArithOp::Shr => ">>",
        }
    }
}

/// Comparison operators. Greater-than forms never reach the IR; the builder
/// swaps their operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
}

impl CmpOp {
    pub fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Eq => lhs == rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "=",
        }
    }
}

/// Operator tag of a [`Tree`](crate::Tree) node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// `dst <- a op b` with a variable (or non-constant) right operand.
    Arith(ArithOp),
    /// `dst <- a op N`; the right child is always a constant leaf.
    ArithImm(ArithOp),
    /// `dst <- a cmp b`.
    Cmp(CmpOp),
    /// `dst <- s`.
    Assign,
    /// `dst <- load addr`.
    Load,
    /// `store addr <- s`; no destination.
    Store,
    /// `return` with zero or one operand.
    Return,
    /// `br :label`; the root is the target label.
    Branch,
    /// `br t :label`; the root is the target label, the child the condition.
    CondBranch,
    /// `:label` definition; the root is the label.
    Label,
    /// `[dst <-] call callee(args)`; children are the arguments, the return
    /// label and the callee, in that order.
    Call,
    /// Terminal operand wrapper. Matching never recurses into a leaf.
    Leaf,
}

impl Op {
    /// The arithmetic operator of either arithmetic form.
    #[inline]
    pub fn arith(self) -> Option<ArithOp> {
        match self {
            Op::Arith(op) | Op::ArithImm(op) => Some(op),
            _ => None,
        }
    }

    /// Whether this operator may end a basic block.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            Op::Return | Op::Branch | Op::CondBranch | Op::Label | Op::Call
        )
    }
}
