//! The tree-walking evaluator.
//!
//! One entry point, [`eval`], dispatching on the runtime variant of the
//! form. Literals, operators, lambdas, and errors evaluate to themselves;
//! a quoted value loses exactly one layer of quotation; a symbol resolves
//! through the environment; a list dispatches on its head: a registered
//! builtin gets the remaining items unevaluated, a symbol bound to a
//! lambda becomes a call, an operator or comparator marker folds its
//! operands, and anything else is an undefined form evaluating to `nil`.

use std::rc::Rc;

use crate::builtins;
use crate::env::Env;
use crate::value::{ArithOp, CmpOp, Lambda, Value};
use crate::ErrorKind;

/// Evaluate one form in the given environment.
pub fn eval(env: &Rc<Env>, form: &Value) -> Value {
    match form {
        Value::Nil
        | Value::True
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Op(_)
        | Value::Cmp(_)
        | Value::Lambda(_)
        | Value::Error(_) => form.clone(),

        Value::Quoted(inner) => (**inner).clone(),

        Value::Symbol(name) => env.get(name),

        Value::List(items) => {
            let Some(head) = items.first() else {
                return Value::Nil;
            };
            match head {
                Value::Symbol(name) => {
                    // The registry wins over the environment, so builtin
                    // names cannot be shadowed into special forms losing
                    // their unevaluated-argument protocol.
                    if let Some(call) = builtins::lookup(name) {
                        return call(env, &items[1..]);
                    }
                    match env.get(name) {
                        Value::Lambda(lambda) => call_lambda(&lambda, env, &items[1..]),
                        // Calling a non-lambda surfaces the resolved value.
                        other => other,
                    }
                }
                Value::Op(op) => apply_operator(*op, env, &items[1..]),
                Value::Cmp(op) => apply_comparator(*op, env, &items[1..]),
                // Undefined form.
                _ => Value::Nil,
            }
        }
    }
}

/// Invoke a lambda: arguments evaluate in the caller's environment and bind
/// positionally in a fresh frame whose parent is the lambda's captured
/// environment. Parameters beyond the supplied arguments bind to `nil`;
/// surplus arguments are dropped. Returns the last body value.
pub fn call_lambda(lambda: &Lambda, caller: &Rc<Env>, args: &[Value]) -> Value {
    let args = caller.resolve_all(args);

    let frame = Env::nested(&lambda.env);
    for (i, param) in lambda.params.iter().enumerate() {
        frame.put_local(param, args.get(i).cloned().unwrap_or(Value::Nil));
    }

    let mut ret = Value::Nil;
    for form in &lambda.body {
        ret = eval(&frame, form);
    }
    ret
}

/// Left-fold arithmetic. The numeric kind of the first operand picks the
/// accumulator type; later operands coerce to it or the fold stops with
/// `invalid-parameter-type`. Division and remainder by zero report the same
/// error; overflow wraps.
pub fn apply_operator(op: ArithOp, env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return match op {
            ArithOp::Add => Value::Int(0),
            _ => Value::Error(ErrorKind::MissingParameter),
        };
    };

    match env.resolve(first) {
        Value::Int(mut acc) => {
            for arg in &args[1..] {
                let Some(n) = env.resolve(arg).as_int() else {
                    return Value::Error(ErrorKind::InvalidParameterType);
                };
                acc = match op {
                    ArithOp::Add => acc.wrapping_add(n),
                    ArithOp::Sub => acc.wrapping_sub(n),
                    ArithOp::Mul => acc.wrapping_mul(n),
                    ArithOp::Div => {
                        if n == 0 {
                            return Value::Error(ErrorKind::InvalidParameterType);
                        }
                        acc.wrapping_div(n)
                    }
                    ArithOp::Rem => {
                        if n == 0 {
                            return Value::Error(ErrorKind::InvalidParameterType);
                        }
                        acc.wrapping_rem(n)
                    }
                };
            }
            Value::Int(acc)
        }

        Value::Float(mut acc) => {
            for arg in &args[1..] {
                let Some(x) = env.resolve(arg).as_float() else {
                    return Value::Error(ErrorKind::InvalidParameterType);
                };
                acc = match op {
                    ArithOp::Add => acc + x,
                    ArithOp::Sub => acc - x,
                    ArithOp::Mul => acc * x,
                    ArithOp::Div => acc / x,
                    ArithOp::Rem => {
                        // Float remainder truncates both sides to integer
                        // and widens the integer remainder back; not fmod.
                        let divisor = x as i64;
                        if divisor == 0 {
                            return Value::Error(ErrorKind::InvalidParameterType);
                        }
                        (acc as i64).wrapping_rem(divisor) as f64
                    }
                };
            }
            Value::Float(acc)
        }

        _ => Value::Error(ErrorKind::InvalidParameterType),
    }
}

/// Chained comparison: every adjacent pair must satisfy the comparator.
/// The first violation yields `nil`. A base value that does not support
/// ordered comparison - at the head or mid-chain - stops the walk with
/// `true`.
pub fn apply_comparator(op: CmpOp, env: &Rc<Env>, args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return Value::True;
    };

    let mut base = env.resolve(first);
    if !base.comparable() {
        return Value::True;
    }

    for arg in &args[1..] {
        let next = env.resolve(arg);
        if !base.compare(op, &next) {
            return Value::Nil;
        }
        if !next.comparable() {
            return Value::True;
        }
        base = next;
    }

    Value::True
}
