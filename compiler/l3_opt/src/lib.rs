//! Liveness-driven cleanup for L3 trees.
//!
//! Three passes run over each function, in order:
//!
//! 1. [`compute_liveness`]: per-instruction GEN/KILL/IN/OUT sets by
//!    backward fixpoint iteration.
//! 2. [`eliminate_dead_stores`]: drop instructions whose destination is
//!    dead on exit (never the last instruction of a block).
//! 3. [`merge_trees`]: fold single-use producers into their consumers,
//!    turning flat instruction lists into expression trees.
//!
//! All passes mutate the function's contexts in place. Sequence ids are
//! never renumbered, so liveness facts stay addressable after deletions.

mod liveness;
mod merge;
mod prune;
#[cfg(test)]
mod test_helpers;

use l3_ir::{Function, Program};

pub use liveness::{compute_liveness, LiveSet, Liveness, Successors};
pub use merge::merge_trees;
pub use prune::eliminate_dead_stores;

/// What the optimizer did to one function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Instructions deleted as dead stores.
    pub dead: usize,
    /// Producers folded into consumers.
    pub merged: usize,
    /// Liveness sweeps until the fixpoint.
    pub sweeps: u32,
}

impl std::ops::AddAssign for OptStats {
    fn add_assign(&mut self, rhs: Self) {
        self.dead += rhs.dead;
        self.merged += rhs.merged;
        self.sweeps += rhs.sweeps;
    }
}

/// Run liveness, dead-store elimination and merging over `func`.
pub fn optimize_function(func: &mut Function) -> OptStats {
    let mut liveness = compute_liveness(func);
    let dead = eliminate_dead_stores(func, &liveness);
    let merged = merge_trees(func, &mut liveness);

    let stats = OptStats {
        dead,
        merged,
        sweeps: liveness.sweeps,
    };
    tracing::debug!(
        function = %func.name,
        dead,
        merged,
        sweeps = stats.sweeps,
        remaining = func.instruction_count(),
        "function optimized"
    );
    stats
}

/// Optimize every function of `program`, returning the combined statistics.
pub fn optimize_program(program: &mut Program) -> OptStats {
    let mut total = OptStats::default();
    for func in &mut program.functions {
        total += optimize_function(func);
    }
    total
}
