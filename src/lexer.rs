//! Byte stream to token stream.
//!
//! Tokens are parens, the quote mark, identifiers, numeric and string
//! literals, and the operator punctuation. One character of lookahead
//! settles the ambiguous spots: `<`/`>` against `<=`/`>=`, and a leading
//! `+`/`-` against a signed numeric literal. An identifier ends only at
//! whitespace, a paren, or end of input.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, opt, recognize, value},
    sequence::{delimited, pair},
    IResult, Parser,
};

use crate::value::{ArithOp, CmpOp};
use crate::ErrorKind;

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    /// The `'` quote marker.
    QuoteMark,
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Op(ArithOp),
    Cmp(CmpOp),
}

/// Pull-based tokenizer over an in-memory source text.
pub struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer { rest: input }
    }

    /// Produce the next token, `None` at end of input, or `invalid-token`
    /// for a byte no rule accepts.
    pub fn next_token(&mut self) -> Result<Option<Token>, ErrorKind> {
        self.rest = self.rest.trim_start();
        if self.rest.is_empty() {
            return Ok(None);
        }
        match lex_token(self.rest) {
            Ok((rest, token)) => {
                self.rest = rest;
                Ok(Some(token))
            }
            Err(_) => Err(ErrorKind::InvalidToken),
        }
    }
}

fn lex_token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::QuoteMark, char('\'')),
        lex_string,
        lex_raw_string,
        // Numbers before operators so that a sign followed by a digit or
        // `.` lexes as a signed literal rather than `+`/`-`.
        lex_number,
        lex_comparator,
        lex_operator,
        lex_ident,
    ))
    .parse(input)
}

fn lex_error(input: &str, kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

/// A decimal integer or float literal with an optional sign.
fn lex_number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize((
        opt(one_of("+-")),
        alt((
            recognize((digit1, opt(pair(char('.'), digit0)), opt(exponent))),
            recognize((char('.'), digit1, opt(exponent))),
        )),
    ))
    .parse(input)?;

    if text.contains(['.', 'e', 'E']) {
        match text.parse::<f64>() {
            Ok(x) => Ok((rest, Token::Float(x))),
            Err(_) => Err(lex_error(input, nom::error::ErrorKind::Float)),
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => Ok((rest, Token::Int(n))),
            // Out of i64 range: fall back to a float literal.
            Err(_) => match text.parse::<f64>() {
                Ok(x) => Ok((rest, Token::Float(x))),
                Err(_) => Err(lex_error(input, nom::error::ErrorKind::Digit)),
            },
        }
    }
}

fn lex_comparator(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Cmp(CmpOp::Le), tag("<=")),
        value(Token::Cmp(CmpOp::Ge), tag(">=")),
        value(Token::Cmp(CmpOp::Lt), char('<')),
        value(Token::Cmp(CmpOp::Gt), char('>')),
        value(Token::Cmp(CmpOp::Eq), char('=')),
    ))
    .parse(input)
}

fn lex_operator(input: &str) -> IResult<&str, Token> {
    map(one_of("+-*/%"), |c| {
        Token::Op(match c {
            '+' => ArithOp::Add,
            '-' => ArithOp::Sub,
            '*' => ArithOp::Mul,
            '/' => ArithOp::Div,
            _ => ArithOp::Rem,
        })
    })
    .parse(input)
}

/// A double-quoted string literal with escape decoding.
fn lex_string(input: &str) -> IResult<&str, Token> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut out = String::new();

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), Token::Str(out))),
            Some('\\') => {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    // Unknown escape, or a backslash at end of input.
                    _ => return Err(lex_error(remaining, nom::error::ErrorKind::Char)),
                }
                remaining = chars.as_str();
            }
            Some(c) => {
                out.push(c);
                remaining = chars.as_str();
            }
            // Unterminated string.
            None => return Err(lex_error(remaining, nom::error::ErrorKind::Char)),
        }
    }
}

/// A backtick-delimited raw string literal; no escape processing.
fn lex_raw_string(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('`'), take_while(|c| c != '`'), char('`')),
        |s: &str| Token::Str(s.to_owned()),
    )
    .parse(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '$' | ':')
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// An identifier: a letter or connector (`_`, `$`, `:`) followed by
/// anything up to the next separator.
fn lex_ident(input: &str) -> IResult<&str, Token> {
    let (rest, text) = take_while1(|c: char| !is_separator(c)).parse(input)?;
    if text.chars().next().is_some_and(is_ident_start) {
        Ok((rest, Token::Ident(text.to_owned())))
    } else {
        Err(lex_error(input, nom::error::ErrorKind::Alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Result<Vec<Token>, ErrorKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(token) = lexer.next_token()? {
            out.push(token);
        }
        Ok(out)
    }

    #[test]
    fn token_stream_comprehensive() {
        use Token::*;

        let cases: Vec<(&str, Vec<Token>)> = vec![
            ("", vec![]),
            ("   \t\r\n ", vec![]),
            ("()", vec![LParen, RParen]),
            ("'", vec![QuoteMark]),
            ("foo", vec![Ident("foo".into())]),
            ("x_1 $y :z", vec![
                Ident("x_1".into()),
                Ident("$y".into()),
                Ident(":z".into()),
            ]),
            ("42", vec![Int(42)]),
            ("-42", vec![Int(-42)]),
            ("+42", vec![Int(42)]),
            ("1.5", vec![Float(1.5)]),
            ("-1.5", vec![Float(-1.5)]),
            (".5", vec![Float(0.5)]),
            ("-.5", vec![Float(-0.5)]),
            ("2.", vec![Float(2.0)]),
            ("1e3", vec![Float(1000.0)]),
            ("2.5e-1", vec![Float(0.25)]),
            // A sign not followed by a digit or `.` is an operator.
            ("+ - * / %", vec![
                Op(ArithOp::Add),
                Op(ArithOp::Sub),
                Op(ArithOp::Mul),
                Op(ArithOp::Div),
                Op(ArithOp::Rem),
            ]),
            ("- 3", vec![Op(ArithOp::Sub), Int(3)]),
            ("-x", vec![Op(ArithOp::Sub), Ident("x".into())]),
            // One character of lookahead splits `<` from `<=`.
            ("= < <= > >=", vec![
                Cmp(CmpOp::Eq),
                Cmp(CmpOp::Lt),
                Cmp(CmpOp::Le),
                Cmp(CmpOp::Gt),
                Cmp(CmpOp::Ge),
            ]),
            ("<x", vec![Cmp(CmpOp::Lt), Ident("x".into())]),
            ("\"hello\"", vec![Str("hello".into())]),
            ("\"\"", vec![Str("".into())]),
            (r#""a\nb\t\"c\\""#, vec![Str("a\nb\t\"c\\".into())]),
            // Raw strings keep backslashes as-is.
            (r"`a\nb`", vec![Str(r"a\nb".into())]),
            ("(+ 1 2)", vec![LParen, Op(ArithOp::Add), Int(1), Int(2), RParen]),
            ("(<= n 1)", vec![
                LParen,
                Cmp(CmpOp::Le),
                Ident("n".into()),
                Int(1),
                RParen,
            ]),
            ("'(a b)", vec![
                QuoteMark,
                LParen,
                Ident("a".into()),
                Ident("b".into()),
                RParen,
            ]),
            // An identifier ends only at whitespace, parens, or EOF.
            ("abc+def", vec![Ident("abc+def".into())]),
            ("foo(bar)", vec![
                Ident("foo".into()),
                LParen,
                Ident("bar".into()),
                RParen,
            ]),
        ];

        for (input, expected) in cases {
            assert_eq!(tokens(input).unwrap(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn unknown_bytes_are_invalid_tokens() {
        for input in [";", "#", "@foo", "\"unterminated", r#""bad\escape""#, "`open"] {
            assert_eq!(tokens(input), Err(ErrorKind::InvalidToken), "input: {input:?}");
        }
    }

    #[test]
    fn huge_integer_literal_widens_to_float() {
        match tokens("99999999999999999999").unwrap().as_slice() {
            [Token::Float(x)] => assert!(*x > 9.9e19),
            other => panic!("unexpected tokens: {other:?}"),
        }
    }

    #[test]
    fn lexer_is_incremental() {
        let mut lexer = Lexer::new("(a) (b)");
        assert_eq!(lexer.next_token().unwrap(), Some(Token::LParen));
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Ident("a".into())));
        assert_eq!(lexer.next_token().unwrap(), Some(Token::RParen));
        assert_eq!(lexer.next_token().unwrap(), Some(Token::LParen));
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Ident("b".into())));
        assert_eq!(lexer.next_token().unwrap(), Some(Token::RParen));
        assert_eq!(lexer.next_token().unwrap(), None);
        assert_eq!(lexer.next_token().unwrap(), None);
    }
}
