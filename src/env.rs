//! Lexically chained name-to-value frames.
//!
//! A frame maps identifier names to values and optionally points at a
//! parent frame; the chain is a strict tree rooted at the outermost frame.
//! Frames are shared (`Rc`) so a lambda keeps its defining chain alive, and
//! bindings are interior-mutable (`RefCell`) so `setq` written through one
//! holder of the frame is observed by every other holder.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::evaluator;
use crate::value::Value;
use crate::ErrorKind;

/// One level of the environment chain.
pub struct Env {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Env>>,
    strict: bool,
}

impl Env {
    /// Create a root frame. Unknown symbols resolve to `nil`.
    pub fn root() -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            strict: false,
        })
    }

    /// Create a root frame in which unknown symbols are an
    /// `undefined-symbol` error instead of `nil`. Frames nested under it
    /// inherit the behavior.
    pub fn strict_root() -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            strict: true,
        })
    }

    /// Create a frame whose parent is `parent`. Used on entering a `let`
    /// body and on lambda invocation.
    pub fn nested(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            strict: parent.strict,
        })
    }

    /// Create or overwrite a binding in this frame only. Ancestors are
    /// never searched.
    pub fn put_local(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_owned(), value);
    }

    /// Assign semantics: overwrite the nearest frame that already binds
    /// `name`; if none does, create the binding in the root frame.
    /// Intermediate frames never gain a binding from `put`.
    pub fn put(&self, name: &str, value: Value) {
        let mut frame = self;
        loop {
            if frame.bindings.borrow().contains_key(name) {
                frame.bindings.borrow_mut().insert(name.to_owned(), value);
                return;
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => {
                    frame.bindings.borrow_mut().insert(name.to_owned(), value);
                    return;
                }
            }
        }
    }

    /// Walk from this frame up and return the first binding found.
    /// An unbound name is `nil`, or an `undefined-symbol` error under a
    /// strict root.
    pub fn get(&self, name: &str) -> Value {
        let mut frame = self;
        loop {
            if let Some(value) = frame.bindings.borrow().get(name) {
                return value.clone();
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => {
                    return if frame.strict {
                        Value::Error(ErrorKind::UndefinedSymbol(name.to_owned()))
                    } else {
                        Value::Nil
                    };
                }
            }
        }
    }

    /// Resolve a form: symbols go through [`Env::get`], everything else is
    /// handed to the evaluator.
    pub fn resolve(self: &Rc<Self>, form: &Value) -> Value {
        match form {
            Value::Symbol(name) => self.get(name),
            other => evaluator::eval(self, other),
        }
    }

    /// Resolve every form in a slice, in order.
    pub fn resolve_all(self: &Rc<Self>, forms: &[Value]) -> Vec<Value> {
        forms.iter().map(|form| self.resolve(form)).collect()
    }
}
