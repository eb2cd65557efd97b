//! L3 tree IR.
//!
//! This crate provides:
//!
//! - **Operands** ([`Item`]): variables, constants, labels and function
//!   references, with the dense id newtypes [`VarId`], [`LabelId`] and
//!   [`SeqId`].
//!
//! - **Instruction trees** ([`Tree`], [`Op`]): one node per L3 instruction,
//!   with operand children. The optimizer grows these trees by grafting
//!   producers into their consumers; the instruction selector covers them
//!   with tiles.
//!
//! - **Program structure** ([`Instruction`], [`Context`], [`Function`],
//!   [`Program`]): basic blocks of sequence-numbered instructions.
//!
//! - **Construction** ([`builder`]): the only way to populate a
//!   [`Program`]. The builder interns names, assigns sequence ids, splits
//!   basic blocks and applies the front-end normalizations (constant
//!   folding, comparison swapping, operand ordering).
//!
//! - **Evaluation** ([`eval`]): a reference evaluator for straight-line
//!   trees, used to check that tree rewriting preserves semantics.
//!
//! # Crate Dependencies
//!
//! `l3_ir` is the leaf of the workspace. The parser, optimizer and selector
//! all depend on it; it depends on none of them.

pub mod builder;
pub mod eval;
mod function;
mod item;
mod op;
mod tree;

pub use builder::{BuildError, FunctionBuilder, ProgramBuilder, SourceOp};
pub use function::{Context, Function, Program, VerifyError};
pub use item::{FuncRef, Item, LabelId, Runtime, SeqId, VarId};
pub use op::{ArithOp, CmpOp, Op};
pub use tree::{Instruction, Tree};
