//! L3 compiler CLI.

use l3c::cli::{parse_args, Invocation, USAGE};
use l3c::{compile_file, init_tracing, CompileError};

fn main() {
    init_tracing();

    match parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Help) => println!("{USAGE}"),
        Ok(Invocation::Compile { input, options }) => {
            if let Err(err) = compile_file(&input, &options) {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        Err(err @ CompileError::Usage(_)) => {
            eprintln!("error: {err}");
            eprintln!();
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
