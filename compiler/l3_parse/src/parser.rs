//! Recursive-descent parser for L3.
//!
//! ```text
//! p ::= f+         f ::= define @N ( vars ) { i+ }
//! i ::= var <- s | var <- t op t | var <- load var | store var <- s
//!     | return | return t | :L | br :L | br t :L
//!     | call u ( args ) | var <- call u ( args )
//! u ::= var | @N | print | input | allocate | tensor-error
//! t ::= var | number     s ::= t | :L | @N
//! ```
//!
//! The parser drives the IR builder as it goes; it never materializes an
//! AST.

use l3_ir::{FuncRef, FunctionBuilder, Item, Program, ProgramBuilder, Runtime, SourceOp};
use logos::Logos;

use crate::error::ParseError;
use crate::token::{Span, Token};

/// Parse a whole L3 program.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut program = ProgramBuilder::new();

    loop {
        parser.function(&mut program)?;
        if parser.at_end() {
            break;
        }
    }

    let program = program.finish();
    tracing::debug!(
        functions = program.functions.len(),
        labels = program.label_count,
        "program parsed"
    );
    Ok(program)
}

fn lex(source: &str) -> Result<Vec<(Token<'_>, Span)>, ParseError> {
    Token::lexer(source)
        .spanned()
        .map(|(token, range)| match token {
            Ok(token) => Ok((token, Span::from_range(range))),
            Err(()) => Err(ParseError::InvalidToken {
                text: source[range.clone()].to_owned(),
                span: Span::from_range(range),
            }),
        })
        .collect()
}

struct Parser<'s> {
    tokens: Vec<(Token<'s>, Span)>,
    pos: usize,
}

impl<'s> Parser<'s> {
    // ── Cursor ──────────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token<'s>> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<Token<'s>> {
        self.tokens.get(self.pos + offset).map(|&(token, _)| token)
    }

    fn bump(&mut self, expected: &'static str) -> Result<(Token<'s>, Span), ParseError> {
        let Some(&next) = self.tokens.get(self.pos) else {
            return Err(ParseError::Eof { expected });
        };
        self.pos += 1;
        Ok(next)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(&(token, span)) => ParseError::Unexpected {
                expected,
                found: token.to_string(),
                span,
            },
            None => ParseError::Eof { expected },
        }
    }

    fn expect(&mut self, want: Token<'_>, expected: &'static str) -> Result<(), ParseError> {
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat(&mut self, want: Token<'_>) -> bool {
        let hit = self.peek() == Some(want);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn var_name(&mut self) -> Result<&'s str, ParseError> {
        match self.peek() {
            Some(Token::Var(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("variable")),
        }
    }

    fn label_name(&mut self) -> Result<&'s str, ParseError> {
        match self.peek() {
            Some(Token::Label(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("label")),
        }
    }

    // ── Functions ───────────────────────────────────────────────

    fn function(&mut self, program: &mut ProgramBuilder) -> Result<(), ParseError> {
        self.expect(Token::Define, "`define`")?;
        let name = match self.peek() {
            Some(Token::Func(name)) => {
                self.pos += 1;
                name
            }
            _ => return Err(self.unexpected("function name")),
        };
        let mut fb = program.function(name)?;

        self.expect(Token::LParen, "`(`")?;
        if !self.eat(Token::RParen) {
            loop {
                let param = self.var_name()?;
                fb.param(param);
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen, "`)` or `,`")?;
        }

        self.expect(Token::LBrace, "`{`")?;
        while !self.eat(Token::RBrace) {
            self.instruction(&mut fb)?;
        }
        fb.finish()?;
        Ok(())
    }

    // ── Instructions ────────────────────────────────────────────

    fn instruction(&mut self, fb: &mut FunctionBuilder<'_>) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token::Var(name)) => {
                self.pos += 1;
                self.expect(Token::Arrow, "`<-`")?;
                let dst = fb.var(name);
                self.assignment(fb, dst)
            }
            Some(Token::Store) => {
                self.pos += 1;
                let addr = self.var_name()?;
                let addr = fb.var(addr);
                self.expect(Token::Arrow, "`<-`")?;
                let value = self.s(fb)?;
                fb.store(addr, value);
                Ok(())
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.starts_return_value() {
                    Some(self.t(fb)?)
                } else {
                    None
                };
                fb.ret(value);
                Ok(())
            }
            Some(Token::Label(name)) => {
                self.pos += 1;
                let label = fb.label(name);
                fb.define_label(label)?;
                Ok(())
            }
            Some(Token::Br) => {
                self.pos += 1;
                if let Some(Token::Label(name)) = self.peek() {
                    self.pos += 1;
                    let target = fb.label(name);
                    fb.branch(target);
                } else {
                    let cond = self.t(fb)?;
                    let target = self.label_name()?;
                    let target = fb.label(target);
                    fb.cond_branch(cond, target);
                }
                Ok(())
            }
            Some(Token::Call) => {
                self.pos += 1;
                self.call(fb, None)
            }
            _ => Err(self.unexpected("instruction")),
        }
    }

    /// Whether the token after `return` is its operand rather than the start
    /// of the next instruction.
    fn starts_return_value(&self) -> bool {
        match self.peek() {
            Some(Token::Var(_)) => self.peek_at(1) != Some(Token::Arrow),
            Some(Token::Int(_) | Token::Minus | Token::Plus) => true,
            _ => false,
        }
    }

    /// The right-hand side of `dst <- ...`.
    fn assignment(&mut self, fb: &mut FunctionBuilder<'_>, dst: l3_ir::VarId) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token::Load) => {
                self.pos += 1;
                let addr = self.var_name()?;
                let addr = fb.var(addr);
                fb.load(dst, addr);
                Ok(())
            }
            Some(Token::Call) => {
                self.pos += 1;
                self.call(fb, Some(dst))
            }
            Some(Token::Label(_) | Token::Func(_)) => {
                let value = self.s(fb)?;
                fb.assign(dst, value);
                Ok(())
            }
            _ => {
                let lhs = self.t(fb)?;
                match self.peek().and_then(source_op) {
                    Some(op) => {
                        self.pos += 1;
                        let rhs = self.t(fb)?;
                        fb.op_assign(dst, lhs, op, rhs);
                    }
                    None => fb.assign(dst, lhs),
                }
                Ok(())
            }
        }
    }

    /// `call u ( args )`, after the `call` keyword.
    fn call(&mut self, fb: &mut FunctionBuilder<'_>, dst: Option<l3_ir::VarId>) -> Result<(), ParseError> {
        let (token, span) = self.bump("callee")?;
        let callee = match token {
            Token::Var(name) => Item::Var(fb.var(name)),
            Token::Func(name) => Item::Func(FuncRef::User(name.to_owned())),
            other => {
                let found = other.to_string();
                match Runtime::from_keyword(&found) {
                    Some(rt) => Item::Func(FuncRef::Runtime(rt)),
                    None => {
                        return Err(ParseError::Unexpected {
                            expected: "callee",
                            found,
                            span,
                        })
                    }
                }
            }
        };

        self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.eat(Token::RParen) {
            loop {
                args.push(self.t(fb)?);
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen, "`)` or `,`")?;
        }

        fb.call(dst, callee, args);
        Ok(())
    }

    // ── Operands ────────────────────────────────────────────────

    /// `t ::= var | number`
    fn t(&mut self, fb: &mut FunctionBuilder<'_>) -> Result<Item, ParseError> {
        match self.peek() {
            Some(Token::Var(name)) => {
                self.pos += 1;
                Ok(Item::Var(fb.var(name)))
            }
            Some(Token::Int(_) | Token::Minus | Token::Plus) => self.number().map(Item::Num),
            _ => Err(self.unexpected("variable or number")),
        }
    }

    /// `s ::= t | :L | @N`
    fn s(&mut self, fb: &mut FunctionBuilder<'_>) -> Result<Item, ParseError> {
        match self.peek() {
            Some(Token::Label(name)) => {
                self.pos += 1;
                Ok(Item::Label(fb.label(name)))
            }
            Some(Token::Func(name)) => {
                self.pos += 1;
                Ok(Item::Func(FuncRef::User(name.to_owned())))
            }
            _ => self.t(fb),
        }
    }

    /// An optionally signed decimal integer.
    fn number(&mut self) -> Result<i64, ParseError> {
        let negative = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                true
            }
            Some(Token::Plus) => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        let (token, span) = self.bump("number")?;
        let Token::Int(digits) = token else {
            return Err(ParseError::Unexpected {
                expected: "number",
                found: token.to_string(),
                span,
            });
        };

        let out_of_range = || ParseError::IntOutOfRange {
            text: if negative { format!("-{digits}") } else { digits.to_owned() },
            span,
        };
        let magnitude: i128 = digits.parse().map_err(|_| out_of_range())?;
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value).map_err(|_| out_of_range())
    }
}

fn source_op(token: Token<'_>) -> Option<SourceOp> {
    Some(match token {
        Token::Plus => SourceOp::Add,
        Token::Minus => SourceOp::Sub,
        Token::Star => SourceOp::Mul,
        Token::Amp => SourceOp::And,
        Token::Shl => SourceOp::Shl,
        Token::Shr => SourceOp::Shr,
        Token::Lt => SourceOp::Lt,
        Token::Le => SourceOp::Le,
        Token::Eq => SourceOp::Eq,
        Token::Ge => SourceOp::Ge,
        Token::Gt => SourceOp::Gt,
        _ => return None,
    })
}
