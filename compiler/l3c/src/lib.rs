//! The L3 compiler driver.
//!
//! Wires the pipeline together: parse, optimize each function, select
//! tiles, and render L2. Functions are independent after parsing, so with
//! [`CompileOptions::parallel`] each one is lowered on its own rayon task.

pub mod cli;

use std::path::{Path, PathBuf};
use std::sync::Once;

use l3_ir::{Function, Program};
use l3_isel::{emit_program, global_selector, Pattern};
use l3_opt::OptStats;
use l3_parse::ParseError;
use rayon::prelude::*;
use thiserror::Error;

/// Default output path when `-o` is not given.
pub const DEFAULT_OUTPUT: &str = "prog.L2";

/// Driver settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Lower functions concurrently.
    pub parallel: bool,
    /// Where the L2 program is written.
    pub output: PathBuf,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            parallel: false,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Anything that stops a compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error(transparent)]
    Source(#[from] ParseError),

    #[error("{0}")]
    Usage(String),
}

/// Compile L3 source text to L2 text.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let mut program = l3_parse::parse_program(source)?;
    Ok(compile_program(&mut program, options.parallel))
}

/// Optimize, select and render an already built program.
pub fn compile_program(program: &mut Program, parallel: bool) -> String {
    let (total, selected) = if parallel {
        let lowered: Vec<(OptStats, Vec<Pattern>)> =
            program.functions.par_iter_mut().map(lower_function).collect();
        let mut total = OptStats::default();
        let mut selected = Vec::with_capacity(lowered.len());
        for (stats, patterns) in lowered {
            total += stats;
            selected.push(patterns);
        }
        (total, selected)
    } else {
        let total = l3_opt::optimize_program(program);
        (total, global_selector().select_program(program))
    };
    tracing::debug!(
        functions = program.functions.len(),
        dead = total.dead,
        merged = total.merged,
        parallel,
        "program lowered"
    );

    emit_program(program, &selected)
}

fn lower_function(func: &mut Function) -> (OptStats, Vec<Pattern>) {
    let stats = l3_opt::optimize_function(func);
    let patterns = global_selector().select_function(func);
    (stats, patterns)
}

/// Read `input`, compile it, and write the result to `options.output`.
pub fn compile_file(input: &Path, options: &CompileOptions) -> Result<(), CompileError> {
    let source = std::fs::read_to_string(input).map_err(|source| CompileError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let l2 = compile_source(&source, options).map_err(|err| match err {
        CompileError::Source(source) => CompileError::Parse {
            path: input.to_path_buf(),
            source,
        },
        other => other,
    })?;

    std::fs::write(&options.output, l2).map_err(|source| CompileError::Write {
        path: options.output.clone(),
        source,
    })?;
    tracing::info!(
        input = %input.display(),
        output = %options.output.display(),
        "wrote L2 program"
    );
    Ok(())
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber.
///
/// Only installs when `RUST_LOG` is set; the filter is read from it.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}
