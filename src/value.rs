//! The value universe: the tagged sum every other module works in terms of.
//!
//! [`Value`] covers the primitive atoms (booleans, numbers, strings,
//! symbols), the compound forms produced by the parser (quoted values,
//! operator and comparator markers, lists), first-class lambdas, and
//! in-band errors. Each variant exposes three partial capabilities as
//! needed: textual rendering (`Display`), coercion ([`Value::as_int`],
//! [`Value::as_float`], [`Value::as_bool`]), and ordered comparison
//! ([`Value::compare`]). Attempting a coercion or comparison a variant does
//! not support reports the failure to the caller instead of producing a
//! silent zero.

use std::fmt;
use std::rc::Rc;

use crate::env::Env;
use crate::ErrorKind;

/// An arithmetic operator, only meaningful in head position of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// A comparison operator, only meaningful in head position of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ord == Equal,
            CmpOp::Lt => ord == Less,
            CmpOp::Le => ord != Greater,
            CmpOp::Gt => ord == Greater,
            CmpOp::Ge => ord != Less,
        }
    }
}

/// An anonymous function: parameter names, body forms, and the environment
/// it was defined in. The captured environment is shared, not copied, so a
/// closure observes later mutation of the bindings it closed over.
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Vec<Value>,
    pub env: Rc<Env>,
}

impl fmt::Debug for Lambda {
    // The captured environment is omitted: a lambda stored in the frame it
    // captured would make the straightforward rendering recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Core value type of the interpreter.
///
/// `Nil` and `True` are the two booleans; `Nil` is the sole false-like
/// value. `Quoted` shields its payload from evaluation exactly once.
/// `Op` and `Cmp` are produced by the lexer and only meaningful at index 0
/// of an enclosing `List`. `Error` carries the in-band failure vocabulary.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    True,
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    Quoted(Box<Value>),
    Op(ArithOp),
    Cmp(CmpOp),
    List(Vec<Value>),
    Lambda(Rc<Lambda>),
    Error(ErrorKind),
}

impl Value {
    /// Quote a value: symbols, lists, and already-quoted values gain a
    /// `Quoted` wrapper, everything else passes through untouched (quoting
    /// a literal is a no-op). Wrapping a `Quoted` again is what lets
    /// `''x` survive one evaluation as `'x`.
    pub fn quoted(v: Value) -> Value {
        match v {
            Value::Symbol(_) | Value::List(_) | Value::Quoted(_) => Value::Quoted(Box::new(v)),
            other => other,
        }
    }

    /// Build a boolean from a Rust `bool`.
    pub fn bool(b: bool) -> Value {
        if b {
            Value::True
        } else {
            Value::Nil
        }
    }

    /// Integer coercion. Floats truncate toward zero.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Float coercion. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean coercion. Numbers and strings are always true, a list is
    /// true iff non-empty, and the remaining variants cannot coerce.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Nil => Some(false),
            Value::True => Some(true),
            Value::Int(_) | Value::Float(_) | Value::Str(_) => Some(true),
            Value::List(items) => Some(!items.is_empty()),
            _ => None,
        }
    }

    /// Whether this value can serve as the base of a comparison chain.
    pub fn comparable(&self) -> bool {
        matches!(
            self,
            Value::Nil | Value::True | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Ordered comparison against `other`, dispatched on `self`.
    ///
    /// Integer and float compare numerically (the integer widens), strings
    /// compare lexicographically, booleans compare by truth value against
    /// anything boolean-coercible. Every other pairing fails the
    /// comparison, which a chain reports as `nil`.
    pub fn compare(&self, op: CmpOp, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => op.holds(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => float_cmp(op, *a as f64, *b),
            (Value::Float(a), Value::Int(b)) => float_cmp(op, *a, *b as f64),
            (Value::Float(a), Value::Float(b)) => float_cmp(op, *a, *b),
            (Value::Str(a), Value::Str(b)) => op.holds(a.as_str().cmp(b.as_str())),
            (Value::Nil | Value::True, _) => match other.as_bool() {
                Some(b) => {
                    let a = matches!(self, Value::True);
                    op.holds((a as u8).cmp(&(b as u8)))
                }
                None => false,
            },
            _ => false,
        }
    }
}

fn float_cmp(op: CmpOp, a: f64, b: f64) -> bool {
    match a.partial_cmp(&b) {
        Some(ord) => op.holds(ord),
        None => false,
    }
}

// From conversions for embedders and tests.

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Helper for building symbols in tests and embedder code.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym(name: &str) -> Value {
    Value::Symbol(name.to_owned())
}

/// Helper for building values from Rust literals.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(v: T) -> Value {
    v.into()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::True, Value::True) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Quoted(a), Value::Quoted(b)) => a == b,
            (Value::Op(a), Value::Op(b)) => a == b,
            (Value::Cmp(a), Value::Cmp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::True => write!(f, "true"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Quoted(inner) => write!(f, "'{inner}"),
            Value::Op(op) => write!(f, "\"{}\"", op.symbol()),
            Value::Cmp(op) => write!(f, "\"{}\"", op.symbol()),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Lambda(l) => {
                write!(f, "(lambda [{}] [", l.params.join(" "))?;
                for (i, form) in l.body.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{form}")?;
                }
                write!(f, "])")
            }
            Value::Error(kind) => write!(f, "{kind}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rendering() {
        let cases: Vec<(Value, &str)> = vec![
            (Value::Nil, "nil"),
            (Value::True, "true"),
            (val(42), "42"),
            (val(-7), "-7"),
            (val(1.5), "1.5"),
            (val(3.0), "3"),
            (val("hello"), "hello"),
            (sym("foo"), "foo"),
            (Value::quoted(sym("foo")), "'foo"),
            (Value::Op(ArithOp::Add), "\"+\""),
            (Value::Cmp(CmpOp::Le), "\"<=\""),
            (val(vec![val(1), sym("a"), val("b")]), "(1 a b)"),
            (val(Vec::new()), "()"),
            (Value::Error(ErrorKind::MissingParameter), "missing-parameter"),
        ];

        for (value, expected) in cases {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn lambda_rendering_brackets_params_and_body() {
        let l = Lambda {
            params: vec!["n".to_owned()],
            body: vec![val(vec![Value::Op(ArithOp::Mul), sym("n"), sym("n")])],
            env: Env::root(),
        };
        assert_eq!(
            Value::Lambda(Rc::new(l)).to_string(),
            "(lambda [n] [(\"*\" n n)])"
        );
    }

    #[test]
    fn quoting_wraps_symbols_lists_and_quotes() {
        assert_eq!(Value::quoted(sym("x")), Value::Quoted(Box::new(sym("x"))));
        assert_eq!(
            Value::quoted(val(vec![val(1)])),
            Value::Quoted(Box::new(val(vec![val(1)])))
        );
        // Quoting a quoted value nests.
        assert_eq!(
            Value::quoted(Value::quoted(sym("x"))),
            Value::Quoted(Box::new(Value::Quoted(Box::new(sym("x")))))
        );
        // Literals pass through untouched.
        assert_eq!(Value::quoted(val(1)), val(1));
        assert_eq!(Value::quoted(val("s")), val("s"));
        assert_eq!(Value::quoted(Value::Nil), Value::Nil);
        assert_eq!(Value::quoted(Value::True), Value::True);
    }

    #[test]
    fn coercion_capabilities() {
        // Integer coercion: floats truncate toward zero.
        assert_eq!(val(3).as_int(), Some(3));
        assert_eq!(val(2.9).as_int(), Some(2));
        assert_eq!(val(-2.9).as_int(), Some(-2));
        assert_eq!(val("3").as_int(), None);
        assert_eq!(Value::Nil.as_int(), None);

        // Float coercion: integers widen.
        assert_eq!(val(3).as_float(), Some(3.0));
        assert_eq!(val(1.5).as_float(), Some(1.5));
        assert_eq!(val("x").as_float(), None);

        // Boolean coercion.
        assert_eq!(Value::Nil.as_bool(), Some(false));
        assert_eq!(Value::True.as_bool(), Some(true));
        assert_eq!(val(0).as_bool(), Some(true));
        assert_eq!(val("").as_bool(), Some(true));
        assert_eq!(val(Vec::new()).as_bool(), Some(false));
        assert_eq!(val(vec![val(1)]).as_bool(), Some(true));
        assert_eq!(sym("x").as_bool(), None);
        assert_eq!(Value::Error(ErrorKind::Eof).as_bool(), None);
    }

    #[test]
    fn comparison_capability() {
        use CmpOp::*;

        let cases: Vec<(Value, CmpOp, Value, bool)> = vec![
            // Same-type numeric.
            (val(1), Lt, val(2), true),
            (val(2), Lt, val(1), false),
            (val(2), Le, val(2), true),
            (val(3), Gt, val(2), true),
            (val(3), Ge, val(3), true),
            (val(1), Eq, val(1), true),
            // Cross-numeric comparisons widen the integer.
            (val(1), Eq, val(1.0), true),
            (val(1), Eq, val(1.9), false),
            (val(1.0), Eq, val(1), true),
            (val(1), Lt, val(1.5), true),
            // Strings compare lexicographically.
            (val("a"), Lt, val("b"), true),
            (val("b"), Lt, val("a"), false),
            (val("a"), Eq, val("a"), true),
            // Booleans compare by truth value; nil sorts before true.
            (Value::Nil, Eq, Value::Nil, true),
            (Value::Nil, Lt, Value::True, true),
            (Value::True, Eq, Value::True, true),
            // ... against anything boolean-coercible.
            (Value::Nil, Eq, val(Vec::new()), true),
            (Value::True, Eq, val(1), true),
            // Cross-variant pairings fail.
            (val("a"), Eq, val(1), false),
            (val(1), Eq, val("a"), false),
            (val(1), Eq, Value::True, false),
            (val("a"), Lt, val(1), false),
        ];

        for (left, op, right, expected) in cases {
            assert_eq!(
                left.compare(op, &right),
                expected,
                "({} {} {})",
                op.symbol(),
                left,
                right
            );
        }
    }

    #[test]
    fn comparable_variants() {
        assert!(Value::Nil.comparable());
        assert!(Value::True.comparable());
        assert!(val(1).comparable());
        assert!(val(1.5).comparable());
        assert!(val("s").comparable());
        assert!(!sym("s").comparable());
        assert!(!val(vec![val(1)]).comparable());
        assert!(!Value::quoted(sym("s")).comparable());
        assert!(!Value::Op(ArithOp::Add).comparable());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(val(vec![val(1), val("a")]), val(vec![val(1), val("a")]));
        assert_ne!(val(1), val(1.0)); // structural equality is variant-strict
        assert_ne!(val("1"), val(1));
        assert_eq!(Value::quoted(sym("x")), Value::quoted(sym("x")));

        let l = Rc::new(Lambda {
            params: vec![],
            body: vec![],
            env: Env::root(),
        });
        assert_eq!(Value::Lambda(l.clone()), Value::Lambda(l.clone()));
        let other = Rc::new(Lambda {
            params: vec![],
            body: vec![],
            env: Env::root(),
        });
        assert_ne!(Value::Lambda(l), Value::Lambda(other));
    }
}
