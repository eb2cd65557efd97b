//! L3 front end.
//!
//! [`parse_program`] turns L3 source text into an [`l3_ir::Program`]. The
//! lexer ([`Token`]) is generated by `logos`; the parser is hand-written
//! recursive descent that feeds the IR builder directly, so every builder
//! normalization applies to parsed programs as well.
//!
//! Errors carry byte [`Span`]s into the source.

mod error;
mod parser;
mod token;

pub use error::ParseError;
pub use parser::parse_program;
pub use token::{Span, Token};
