//! Token stream to forms.
//!
//! The parser consumes tokens and emits an ordered sequence of forms, each
//! form a [`Value`]: atoms pass through, `(` opens a nested list, and the
//! `'` marker arms a one-shot flag that quotes the next appended form.
//! Two entry points: [`Parser::parse_all`] consumes to end of input,
//! [`Parser::parse_one`] returns after a single top-level form and signals
//! exhaustion as [`ErrorKind::Eof`], distinct from a parse error.

use crate::lexer::{Lexer, Token};
use crate::value::Value;
use crate::ErrorKind;

/// Form parser over a source text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

/// Parse a whole source text into its top-level forms.
pub fn parse(input: &str) -> Result<Vec<Value>, ErrorKind> {
    Parser::new(input).parse_all()
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(input),
        }
    }

    /// Consume the input to EOF and return every top-level form.
    pub fn parse_all(&mut self) -> Result<Vec<Value>, ErrorKind> {
        self.parse_forms(false, false)
    }

    /// Parse a single top-level form. `EOF` means the stream is exhausted.
    pub fn parse_one(&mut self) -> Result<Value, ErrorKind> {
        let forms = self.parse_forms(false, true)?;
        forms.into_iter().next().ok_or(ErrorKind::Eof)
    }

    fn parse_forms(&mut self, nested: bool, one: bool) -> Result<Vec<Value>, ErrorKind> {
        let mut forms = Vec::new();
        // Number of pending `'` markers; consumed by the next appended form.
        let mut quote_depth = 0usize;

        loop {
            let Some(token) = self.lexer.next_token()? else {
                if nested {
                    // The enclosing list was never closed.
                    return Err(ErrorKind::Eof);
                }
                return Ok(forms);
            };

            let mut form = match token {
                Token::LParen => Value::List(self.parse_forms(true, false)?),
                Token::RParen => {
                    if !nested {
                        return Err(ErrorKind::InvalidToken);
                    }
                    if quote_depth > 0 {
                        // Quoting "nothing" yields nil.
                        forms.push(Value::Nil);
                    }
                    return Ok(forms);
                }
                Token::QuoteMark => {
                    quote_depth += 1;
                    continue;
                }
                Token::Ident(name) => ident(name),
                Token::Int(n) => Value::Int(n),
                Token::Float(x) => Value::Float(x),
                Token::Str(s) => Value::Str(s),
                Token::Op(op) => Value::Op(op),
                Token::Cmp(op) => Value::Cmp(op),
            };

            while quote_depth > 0 {
                form = Value::quoted(form);
                quote_depth -= 1;
            }
            forms.push(form);

            if one && !nested {
                return Ok(forms);
            }
        }
    }
}

/// `true` and `nil` are the boolean literals; anything else is a symbol.
fn ident(name: String) -> Value {
    match name.as_str() {
        "true" => Value::True,
        "nil" => Value::Nil,
        _ => Value::Symbol(name),
    }
}
