//! Dead-store elimination.

use l3_ir::Function;

use crate::liveness::Liveness;

/// Delete instructions whose destination is dead on exit.
///
/// The last instruction of every context is kept regardless: it either
/// transfers control or falls through into the next block, and the merge
/// pass never moves it. Returns how many instructions were deleted.
pub fn eliminate_dead_stores(func: &mut Function, liveness: &Liveness) -> usize {
    let mut removed = 0;
    for ctx in &mut func.contexts {
        let Some(last) = ctx.instructions.last().map(|i| i.id) else {
            continue;
        };
        let before = ctx.instructions.len();
        ctx.instructions.retain(|instr| {
            if instr.id == last {
                return true;
            }
            match instr.tree.defined_var() {
                Some(var) => liveness.is_live_out(instr.id, var),
                None => true,
            }
        });
        removed += before - ctx.instructions.len();
    }

    if removed > 0 {
        tracing::debug!(function = %func.name, removed, "dead stores eliminated");
    }
    removed
}
