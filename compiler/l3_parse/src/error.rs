//! Parse errors.

use l3_ir::BuildError;
use thiserror::Error;

use crate::token::Span;

/// Why parsing failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{span}: expected {expected}, found `{found}`")]
    Unexpected {
        expected: &'static str,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    Eof { expected: &'static str },

    #[error("{span}: invalid token `{text}`")]
    InvalidToken { text: String, span: Span },

    #[error("{span}: integer `{text}` does not fit in 64 bits")]
    IntOutOfRange { text: String, span: Span },

    #[error(transparent)]
    Build(#[from] BuildError),
}
