//! Shared test utilities for the optimizer passes.

use l3_ir::{Function, FunctionBuilder, ProgramBuilder, SeqId, VarId};

/// Shorthand for `VarId::new(n)`.
pub(crate) fn v(n: u32) -> VarId {
    VarId::new(n)
}

/// Shorthand for `SeqId::new(n)`.
pub(crate) fn s(n: u32) -> SeqId {
    SeqId::new(n)
}

/// Build a single function `@f` from `body`.
///
/// # Panics
///
/// Panics if the body does not form a valid function.
pub(crate) fn build(body: impl FnOnce(&mut FunctionBuilder<'_>)) -> Function {
    let mut pb = ProgramBuilder::new();
    let mut fb = match pb.function("f") {
        Ok(fb) => fb,
        Err(e) => panic!("{e}"),
    };
    body(&mut fb);
    if let Err(e) = fb.finish() {
        panic!("{e}");
    }
    let mut program = pb.finish();
    program.functions.remove(0)
}
