//! L3 tokens.

use std::fmt;

use logos::Logos;

/// A byte range in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "sources larger than 4 GiB are not supported"
    )]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Span {
            start: range.start as u32,
            end: range.end as u32,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Sigil-prefixed names carry their text without the sigil.
#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"([ \t\r\n]+|//[^\n]*)")]
pub enum Token<'s> {
    // Keywords
    #[token("define")]
    Define,
    #[token("return")]
    Return,
    #[token("call")]
    Call,
    #[token("br")]
    Br,
    #[token("load")]
    Load,
    #[token("store")]
    Store,

    // Runtime entry points
    #[token("print")]
    Print,
    #[token("input")]
    Input,
    #[token("allocate")]
    Allocate,
    #[token("tensor-error")]
    TensorError,

    // Names
    #[regex(r"%[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Var(&'s str),
    #[regex(r":[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Label(&'s str),
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Func(&'s str),

    /// Unsigned digits; a preceding sign is a separate token.
    #[regex(r"[0-9]+", |lex| lex.slice())]
    Int(&'s str),

    // Operators
    #[token("<-")]
    Arrow,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Define => f.write_str("define"),
            Token::Return => f.write_str("return"),
            Token::Call => f.write_str("call"),
            Token::Br => f.write_str("br"),
            Token::Load => f.write_str("load"),
            Token::Store => f.write_str("store"),
            Token::Print => f.write_str("print"),
            Token::Input => f.write_str("input"),
            Token::Allocate => f.write_str("allocate"),
            Token::TensorError => f.write_str("tensor-error"),
            Token::Var(name) => write!(f, "%{name}"),
            Token::Label(name) => write!(f, ":{name}"),
            Token::Func(name) => write!(f, "@{name}"),
            Token::Int(digits) => f.write_str(digits),
            Token::Arrow => f.write_str("<-"),
            Token::Shl => f.write_str("<<"),
            Token::Shr => f.write_str(">>"),
            Token::Le => f.write_str("<="),
            Token::Ge => f.write_str(">="),
            Token::Lt => f.write_str("<"),
            Token::Gt => f.write_str(">"),
            Token::Eq => f.write_str("="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Amp => f.write_str("&"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::Comma => f.write_str(","),
        }
    }
}
