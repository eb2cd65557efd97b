//! Command-line handling for the `l3c` binary.

use std::path::PathBuf;

use crate::{CompileError, CompileOptions};

pub const USAGE: &str = "\
Usage: l3c <input.L3> [options]

Options:
  -o <path>     Output file (default: prog.L2)
  --parallel    Lower functions in parallel
  -h, --help    Show this message

Set RUST_LOG (e.g. RUST_LOG=l3_opt=debug) to enable logging.";

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Compile {
        input: PathBuf,
        options: CompileOptions,
    },
}

/// Parse the arguments that follow the program name.
pub fn parse_args<I>(args: I) -> Result<Invocation, CompileError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CompileOptions::default();
    let mut input = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "--parallel" => options.parallel = true,
            "-o" => {
                let Some(path) = args.next() else {
                    return Err(CompileError::Usage("`-o` needs a path".to_owned()));
                };
                options.output = PathBuf::from(path);
            }
            flag if flag.starts_with('-') => {
                return Err(CompileError::Usage(format!("unknown option `{flag}`")));
            }
            _ if input.is_some() => {
                return Err(CompileError::Usage(format!("unexpected argument `{arg}`")));
            }
            _ => input = Some(PathBuf::from(arg)),
        }
    }

    match input {
        Some(input) => Ok(Invocation::Compile { input, options }),
        None => Err(CompileError::Usage("missing input file".to_owned())),
    }
}
