//! Wisp - a minimal interpreter for a small Lisp-like expression language.
//!
//! A source text (a string, a file, or an interactive stream) is tokenized
//! into atoms and parenthesized lists, then walked and evaluated in a
//! lexically-scoped environment, producing one value per top-level form.
//!
//! ```lisp
//! (setq fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))
//! (fact 5)                  ; 120
//! (let (x y) (setq x 3) (setq y 4) (+ (* x x) (* y y)))   ; 25
//! (first (rest (list 10 20 30)))                          ; 20
//! ```
//!
//! The language has:
//! - integers (i64), floats (f64), strings, the booleans `true` and `nil`
//!   (`nil` is the only false-like value), symbols, and heterogeneous lists
//! - variadic arithmetic (`+ - * / %`) typed by the first operand, and
//!   chained comparisons (`= < <= > >=`)
//! - special forms `quote` `setq` `if` `while` `begin` `let` `lambda`
//!   `and` `or` `not` `eval`, which receive their operands unevaluated
//! - first-class anonymous functions closing over their definition
//!   environment
//! - a fixed set of built-in procedures for I/O, timing, randomness, and
//!   list manipulation, augmentable through [`builtins::register`]
//!
//! Failures are ordinary values: a builtin that is handed the wrong kind of
//! operand returns [`Value::Error`] and the error propagates to the top
//! level like any other result.
//!
//! ## Modules
//!
//! - [`lexer`]: byte stream -> token stream
//! - [`parser`]: token stream -> forms (atoms and nested lists)
//! - [`value`]: the tagged value universe
//! - [`env`]: lexically chained name-to-value frames
//! - [`evaluator`]: the tree-walking evaluator
//! - [`builtins`]: the builtin registry and the standard set
//!
//! [`Value::Error`]: value::Value::Error

use std::fmt;

/// The error vocabulary of the language.
///
/// Errors travel in-band as [`value::Value::Error`] during evaluation; the
/// lexer and parser return them on the `Err` side of `Result` so that
/// end-of-stream can be told apart from a rejected token.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The lexer rejected the input.
    InvalidToken,
    /// A builtin required more operands than were supplied.
    MissingParameter,
    /// An operand did not provide the capability the operation required.
    InvalidParameterType,
    /// Nothing more to read (also reported for a list left open at EOF).
    Eof,
    /// A symbol had no binding and the environment is strict.
    UndefinedSymbol(String),
    /// An I/O failure from `readfile`/`readlines`, wrapping the OS error.
    System(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidToken => write!(f, "invalid-token"),
            ErrorKind::MissingParameter => write!(f, "missing-parameter"),
            ErrorKind::InvalidParameterType => write!(f, "invalid-parameter-type"),
            ErrorKind::Eof => write!(f, "EOF"),
            ErrorKind::UndefinedSymbol(name) => write!(f, "undefined-symbol: {name}"),
            ErrorKind::System(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ErrorKind {}

pub mod builtins;
pub mod env;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_display_symbolic_names() {
        let cases = [
            (ErrorKind::InvalidToken, "invalid-token"),
            (ErrorKind::MissingParameter, "missing-parameter"),
            (ErrorKind::InvalidParameterType, "invalid-parameter-type"),
            (ErrorKind::Eof, "EOF"),
            (
                ErrorKind::UndefinedSymbol("x".into()),
                "undefined-symbol: x",
            ),
            (ErrorKind::System("no such file".into()), "no such file"),
        ];

        for (kind, expected) in cases {
            assert_eq!(kind.to_string(), expected);
        }
    }
}
