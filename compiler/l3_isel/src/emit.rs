//! L2 text emission.
//!
//! A function renders as
//!
//! ```text
//! (@name
//!     N
//!     <parameter moves>
//!     <selected patterns>
//! )
//! ```
//!
//! and a program wraps its functions in `(@main ... )`.

use l3_ir::{Function, Program, VarId};

use crate::pattern::{Pattern, ARG_REGISTERS};

/// The moves that bring each parameter into its variable.
///
/// The first six arrive in registers. The rest are read from `stack-arg`
/// slots; the last parameter sits at offset 0.
fn parameter_moves(params: &[VarId]) -> impl Iterator<Item = String> + '_ {
    let n = params.len();
    params.iter().enumerate().map(move |(i, param)| match ARG_REGISTERS.get(i) {
        Some(reg) => format!("%v{} <- {reg}", param.raw()),
        None => format!("%v{} <- stack-arg {}", param.raw(), 8 * (n - i - 1)),
    })
}

/// Render one function from its selected patterns.
pub fn emit_function(func: &Function, patterns: &[Pattern]) -> String {
    let mut out = format!("(@{}\n\t{}\n", func.name, func.params.len());
    let body = parameter_moves(&func.params).chain(patterns.iter().flat_map(Pattern::lines));
    for line in body {
        out.push('\t');
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(")\n");
    out
}

/// Render a whole program. `selected[i]` holds the patterns of
/// `program.functions[i]`.
pub fn emit_program(program: &Program, selected: &[Vec<Pattern>]) -> String {
    let mut out = format!("(@{}\n", program.entry);
    for (func, patterns) in program.functions.iter().zip(selected) {
        out.push_str(&emit_function(func, patterns));
    }
    out.push_str(")\n");
    out
}
