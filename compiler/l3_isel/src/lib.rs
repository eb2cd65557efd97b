//! Instruction selection for L3 trees.
//!
//! Selection runs in two phases per instruction tree:
//!
//! 1. **Rewriting** ([`Rewrite`]): a fixed catalog of tree-to-tree
//!    transformations that expose better tiles: encode/decode collapse,
//!    assignment inlining, operand canonicalization, constant
//!    multiplication folding and shift-based strength reduction.
//!
//! 2. **Covering** ([`Tile`]): maximal munch. The catalog is tried in
//!    priority order and the first tile that matches the node wins. Tiles
//!    cover non-leaf operands by calling back into the [`Selector`].
//!
//! The result is a [`Pattern`] tree whose post-order rendering is the L2
//! instruction sequence. [`emit`] wraps patterns into L2 function and
//! program text.

pub mod emit;
mod pattern;
pub mod rewrite;
mod selector;
pub mod tiles;

pub use emit::{emit_function, emit_program};
pub use pattern::{L2Tile, Pattern, ARG_REGISTERS};
pub use rewrite::Rewrite;
pub use selector::{global_selector, Selector};
pub use tiles::Tile;
