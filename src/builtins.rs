//! The builtin registry and the standard set of builtins.
//!
//! A process-wide table maps names to callables of one shape:
//! `(environment, unevaluated operands) -> value`. Every entry receives its
//! operands **unevaluated** and decides which ones to evaluate, which is
//! what lets special forms (`if`, `while`, `setq`, ...) share the table
//! with ordinary procedures (`first`, `append`, `sleep`, ...). The
//! evaluator consults this table before the environment when a symbol
//! heads a list.
//!
//! Embedders extend the language through [`register`]; a late registration
//! simply wins over the previous entry of the same name. [`names`] lists
//! the current table for completion and diagnostics.

use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;
use std::sync::{Arc, LazyLock, RwLock};
use std::time::Duration;

use rand::Rng;

use crate::env::Env;
use crate::evaluator;
use crate::value::{Lambda, Value};
use crate::ErrorKind;

/// The callable shape shared by procedures and special forms.
pub type BuiltinFn = dyn Fn(&Rc<Env>, &[Value]) -> Value + Send + Sync;

static REGISTRY: LazyLock<RwLock<HashMap<String, Arc<BuiltinFn>>>> =
    LazyLock::new(|| RwLock::new(standard_set()));

/// Look up a builtin by name.
pub fn lookup(name: &str) -> Option<Arc<BuiltinFn>> {
    REGISTRY
        .read()
        .expect("builtin registry lock poisoned")
        .get(name)
        .cloned()
}

/// Register a builtin, overriding any existing entry of the same name.
///
/// The callable receives the current environment and its operands
/// unevaluated; use [`Env::resolve`] on the operands it wants evaluated.
/// Registrations racing with evaluation need external ordering; the
/// registry itself only guarantees that the last write wins.
pub fn register<F>(name: &str, call: F)
where
    F: Fn(&Rc<Env>, &[Value]) -> Value + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .expect("builtin registry lock poisoned")
        .insert(name.to_owned(), Arc::new(call));
}

/// Names of every registered builtin, sorted.
pub fn names() -> Vec<String> {
    let mut names: Vec<String> = REGISTRY
        .read()
        .expect("builtin registry lock poisoned")
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

fn standard_set() -> HashMap<String, Arc<BuiltinFn>> {
    let table: &[(&str, fn(&Rc<Env>, &[Value]) -> Value)] = &[
        // I/O and timing
        ("print", builtin_print),
        ("println", builtin_println),
        ("format", builtin_format),
        ("readfile", builtin_readfile),
        ("readlines", builtin_readlines),
        ("sleep", builtin_sleep),
        // Randomness
        ("rand", builtin_rand),
        // Binding and control
        ("quote", builtin_quote),
        ("setq", builtin_setq),
        ("not", builtin_not),
        ("or", builtin_or),
        ("and", builtin_and),
        ("if", builtin_if),
        ("while", builtin_while),
        ("begin", builtin_begin),
        ("let", builtin_let),
        ("lambda", builtin_lambda),
        ("eval", builtin_eval),
        // Lists and text
        ("list", builtin_list),
        ("first", builtin_first),
        ("last", builtin_last),
        ("nth", builtin_nth),
        ("rest", builtin_rest),
        ("append", builtin_append),
        ("find", builtin_find),
        ("contains", builtin_contains),
    ];

    table
        .iter()
        .map(|&(name, call)| (name.to_owned(), Arc::new(call) as Arc<BuiltinFn>))
        .collect()
}

fn missing() -> Value {
    Value::Error(ErrorKind::MissingParameter)
}

fn invalid_type() -> Value {
    Value::Error(ErrorKind::InvalidParameterType)
}

//
// I/O and timing
//

/// `(print a ...)`: render the evaluated arguments space-separated without
/// a newline; return the last one (nil when empty).
fn builtin_print(env: &Rc<Env>, args: &[Value]) -> Value {
    let args = env.resolve_all(args);
    print!("{}", render(&args));
    args.last().cloned().unwrap_or(Value::Nil)
}

/// `(println a ...)`: like `print`, with a trailing newline.
fn builtin_println(env: &Rc<Env>, args: &[Value]) -> Value {
    let args = env.resolve_all(args);
    println!("{}", render(&args));
    args.last().cloned().unwrap_or(Value::Nil)
}

fn render(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(format fmt args ...)`: printf-like formatting with the verbs
/// `%v` (any value), `%d` (integer), `%f` (float), `%s` (string),
/// `%q` (quoted string), and `%%`.
fn builtin_format(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return missing();
    };
    let Value::Str(fmt) = env.resolve(first) else {
        return invalid_type();
    };
    format_values(&fmt, &env.resolve_all(&args[1..]))
}

fn format_values(fmt: &str, args: &[Value]) -> Value {
    let mut out = String::new();
    let mut next = 0usize;
    let mut chars = fmt.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb @ ('v' | 'd' | 'f' | 's' | 'q')) => {
                let Some(arg) = args.get(next) else {
                    return missing();
                };
                next += 1;
                match verb {
                    'd' => match arg.as_int() {
                        Some(n) => out.push_str(&n.to_string()),
                        None => return invalid_type(),
                    },
                    'f' => match arg.as_float() {
                        Some(x) => out.push_str(&format!("{x:.6}")),
                        None => return invalid_type(),
                    },
                    'q' => match arg {
                        Value::Str(s) => out.push_str(&format!("{s:?}")),
                        other => out.push_str(&format!("\"{other}\"")),
                    },
                    // %v and %s both take the textual rendering.
                    _ => out.push_str(&arg.to_string()),
                }
            }
            // An unknown verb passes through untouched.
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }

    Value::Str(out)
}

/// Read the whole named file, or stdin when no path is given.
fn read_source(env: &Rc<Env>, args: &[Value]) -> Result<String, Value> {
    match args.first() {
        Some(first) => {
            let Value::Str(path) = env.resolve(first) else {
                return Err(invalid_type());
            };
            std::fs::read_to_string(&path)
                .map_err(|e| Value::Error(ErrorKind::System(e.to_string())))
        }
        None => {
            let mut content = String::new();
            match std::io::stdin().read_to_string(&mut content) {
                Ok(_) => Ok(content),
                Err(e) => Err(Value::Error(ErrorKind::System(e.to_string()))),
            }
        }
    }
}

/// `(readfile [path])`: file (or stdin) contents as one string.
fn builtin_readfile(env: &Rc<Env>, args: &[Value]) -> Value {
    match read_source(env, args) {
        Ok(content) => Value::Str(content),
        Err(e) => e,
    }
}

/// `(readlines [path])`: file (or stdin) contents as a list of line
/// strings.
fn builtin_readlines(env: &Rc<Env>, args: &[Value]) -> Value {
    match read_source(env, args) {
        Ok(content) => Value::List(content.lines().map(|l| Value::Str(l.to_owned())).collect()),
        Err(e) => e,
    }
}

/// `(sleep ms)`: block the interpreting thread; returns the evaluated
/// millisecond count.
fn builtin_sleep(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return missing();
    };
    let v = env.resolve(first);
    match v.as_int() {
        Some(ms) => {
            std::thread::sleep(Duration::from_millis(ms.max(0) as u64));
            v
        }
        None => invalid_type(),
    }
}

//
// Randomness
//

/// `(rand)` -> float in [0,1); `(rand n)` -> integer in [0,n);
/// `(rand a b c ...)` -> one of the arguments chosen uniformly,
/// **unevaluated** (handy for quoted choices, surprising for symbols).
fn builtin_rand(env: &Rc<Env>, args: &[Value]) -> Value {
    let mut rng = rand::rng();
    match args.len() {
        0 => Value::Float(rng.random::<f64>()),
        1 => match env.resolve(&args[0]).as_int() {
            Some(n) if n > 0 => Value::Int(rng.random_range(0..n)),
            _ => invalid_type(),
        },
        n => args[rng.random_range(0..n)].clone(),
    }
}

//
// Binding and control
//

/// `(quote x)`: shield `x` from one evaluation.
fn builtin_quote(_env: &Rc<Env>, args: &[Value]) -> Value {
    match args.first() {
        Some(v) => Value::quoted(v.clone()),
        None => Value::Nil,
    }
}

/// `(setq name value [name value ...])`: assign pairwise; each name must be
/// a symbol. Overwrites the nearest binding, else creates at the root.
/// Returns the last assigned value.
fn builtin_setq(env: &Rc<Env>, args: &[Value]) -> Value {
    if args.is_empty() || args.len() % 2 != 0 {
        return missing();
    }

    let mut ret = Value::Nil;
    for pair in args.chunks(2) {
        let Value::Symbol(name) = &pair[0] else {
            return invalid_type();
        };
        ret = env.resolve(&pair[1]);
        env.put(name, ret.clone());
    }
    ret
}

/// `(not x)`: boolean negation; `true` with no arguments, `nil` for a
/// value that does not coerce to boolean.
fn builtin_not(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return Value::True;
    };
    match env.resolve(first).as_bool() {
        Some(b) => Value::bool(!b),
        None => Value::Nil,
    }
}

/// `(or x ...)`: evaluate left to right, stop at the first truthy operand.
fn builtin_or(env: &Rc<Env>, args: &[Value]) -> Value {
    for arg in args {
        if env.resolve(arg).as_bool() == Some(true) {
            return Value::True;
        }
    }
    Value::Nil
}

/// `(and x ...)`: evaluate left to right, stop at the first falsy operand.
fn builtin_and(env: &Rc<Env>, args: &[Value]) -> Value {
    for arg in args {
        if env.resolve(arg).as_bool() == Some(false) {
            return Value::Nil;
        }
    }
    Value::True
}

/// `(if c t [c t ...] e)`: chained if/elif/else over (cond, then) pairs
/// with an optional trailing else. A condition that does not coerce to
/// boolean is returned as-is, so `(if x)` behaves like identity.
fn builtin_if(env: &Rc<Env>, args: &[Value]) -> Value {
    let mut args = args;
    loop {
        let Some((cond_form, rest)) = args.split_first() else {
            return Value::Nil;
        };
        let cond = env.resolve(cond_form);
        args = rest;

        let Some(truth) = cond.as_bool() else {
            return cond;
        };

        if truth {
            return match args.first() {
                Some(then) => env.resolve(then),
                None => cond,
            };
        }

        match args.len() {
            // A then-branch with nothing after it: the chain is exhausted.
            0 | 1 => return Value::Nil,
            // (cond then else): the else branch.
            2 => return env.resolve(&args[1]),
            // Skip the then-branch and continue with the next pair.
            _ => args = &args[1..],
        }
    }
}

/// `(while cond body ...)`: iterate while the condition is truthy; returns
/// the last body value, or `nil` if the body never ran.
fn builtin_while(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some((cond, body)) = args.split_first() else {
        return Value::Nil;
    };

    let mut ret = Value::Nil;
    while env.resolve(cond).as_bool() == Some(true) {
        for form in body {
            ret = evaluator::eval(env, form);
        }
    }
    ret
}

/// `(begin body ...)`: evaluate in order, return the last value.
fn builtin_begin(env: &Rc<Env>, args: &[Value]) -> Value {
    let mut ret = Value::Nil;
    for form in args {
        ret = evaluator::eval(env, form);
    }
    ret
}

/// `(let (locals) body ...)`: evaluate the body in a new frame with every
/// local pre-bound to `nil`.
fn builtin_let(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some((locals, body)) = args.split_first() else {
        return missing();
    };
    let Value::List(locals) = locals else {
        return invalid_type();
    };

    let frame = Env::nested(env);
    for local in locals {
        let Value::Symbol(name) = local else {
            return invalid_type();
        };
        frame.put_local(name, Value::Nil);
    }

    let mut ret = Value::Nil;
    for form in body {
        ret = evaluator::eval(&frame, form);
    }
    ret
}

/// `(lambda (params) body ...)`: build a function closing over the current
/// environment. Parameters must all be symbols.
fn builtin_lambda(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some((params, body)) = args.split_first() else {
        return missing();
    };
    let Value::List(params) = params else {
        return invalid_type();
    };

    let mut names = Vec::with_capacity(params.len());
    for param in params {
        let Value::Symbol(name) = param else {
            return invalid_type();
        };
        names.push(name.clone());
    }

    Value::Lambda(Rc::new(Lambda {
        params: names,
        body: body.to_vec(),
        env: env.clone(),
    }))
}

/// `(eval form)`: resolve the operand, then evaluate the result.
fn builtin_eval(env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return missing();
    };
    let form = env.resolve(first);
    evaluator::eval(env, &form)
}

//
// Lists and text
//

/// `(list x ...)`: a fresh list of the evaluated arguments.
fn builtin_list(env: &Rc<Env>, args: &[Value]) -> Value {
    Value::List(env.resolve_all(args))
}

/// Resolve the single list operand shared by `first`/`last`/`rest`.
fn list_arg(env: &Rc<Env>, args: &[Value]) -> Result<Vec<Value>, Value> {
    let Some(first) = args.first() else {
        return Err(missing());
    };
    match env.resolve(first) {
        Value::List(items) => Ok(items),
        _ => Err(invalid_type()),
    }
}

/// `(first l)`: head of the list, or `nil` when empty.
fn builtin_first(env: &Rc<Env>, args: &[Value]) -> Value {
    match list_arg(env, args) {
        Ok(items) => items.first().cloned().unwrap_or(Value::Nil),
        Err(e) => e,
    }
}

/// `(last l)`: final element, or `nil` when empty.
fn builtin_last(env: &Rc<Env>, args: &[Value]) -> Value {
    match list_arg(env, args) {
        Ok(items) => items.last().cloned().unwrap_or(Value::Nil),
        Err(e) => e,
    }
}

/// `(nth n l)`: element at index `n`, `nil` when out of range.
fn builtin_nth(env: &Rc<Env>, args: &[Value]) -> Value {
    if args.len() < 2 {
        return missing();
    }
    let Some(n) = env.resolve(&args[0]).as_int() else {
        return invalid_type();
    };
    let Value::List(items) = env.resolve(&args[1]) else {
        return invalid_type();
    };

    if n < 0 || n as usize >= items.len() {
        return Value::Nil;
    }
    items[n as usize].clone()
}

/// `(rest l)`: everything after the head; `nil` for an empty list.
fn builtin_rest(env: &Rc<Env>, args: &[Value]) -> Value {
    match list_arg(env, args) {
        Ok(items) => {
            if items.is_empty() {
                Value::Nil
            } else {
                Value::List(items[1..].to_vec())
            }
        }
        Err(e) => e,
    }
}

/// `(append (string|list) ...)`: same-kind concatenation, typed by the
/// first argument. No arguments yields an empty list.
fn builtin_append(env: &Rc<Env>, args: &[Value]) -> Value {
    if args.is_empty() {
        return Value::List(Vec::new());
    }
    let args = env.resolve_all(args);

    match &args[0] {
        Value::Str(first) => {
            let mut out = first.clone();
            for v in &args[1..] {
                let Value::Str(s) = v else {
                    return invalid_type();
                };
                out.push_str(s);
            }
            Value::Str(out)
        }
        Value::List(first) => {
            let mut out = first.clone();
            for v in &args[1..] {
                let Value::List(items) = v else {
                    return invalid_type();
                };
                out.extend(items.iter().cloned());
            }
            Value::List(out)
        }
        _ => invalid_type(),
    }
}

/// `(find needle haystack)`: byte offset in a string haystack, element
/// index in a list haystack; `nil` when absent. Index 0 is a hit.
fn builtin_find(env: &Rc<Env>, args: &[Value]) -> Value {
    if args.len() != 2 {
        return missing();
    }
    let needle = env.resolve(&args[0]);
    let haystack = env.resolve(&args[1]);

    match &haystack {
        Value::Str(s) => match &needle {
            Value::Str(n) => match s.find(n.as_str()) {
                Some(pos) => Value::Int(pos as i64),
                None => Value::Nil,
            },
            _ => invalid_type(),
        },
        Value::List(items) => match items.iter().position(|item| *item == needle) {
            Some(pos) => Value::Int(pos as i64),
            None => Value::Nil,
        },
        _ => invalid_type(),
    }
}

/// `(contains needle haystack)`: membership test over a string or a list.
fn builtin_contains(env: &Rc<Env>, args: &[Value]) -> Value {
    if args.len() != 2 {
        return missing();
    }
    let needle = env.resolve(&args[0]);
    let haystack = env.resolve(&args[1]);

    match &haystack {
        Value::Str(s) => match &needle {
            Value::Str(n) => Value::bool(s.contains(n.as_str())),
            _ => invalid_type(),
        },
        Value::List(items) => Value::bool(items.contains(&needle)),
        _ => invalid_type(),
    }
}
