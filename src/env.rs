//! Variable environments.
//!
//! An environment is an insertion-ordered list of name/value bindings plus
//! an optional parent link. Lookups walk the chain outward; writes always
//! land in a specific scope (`put` in this one, `define` in the outermost).
//!
//! Environments are shared through [`EnvRef`], a cheap reference-counted
//! handle. The evaluator hands out handles freely: the global environment,
//! a function's captured environment, and the scope a call executes in are
//! all the same type. Full application temporarily links a function's
//! environment to the *calling* scope via [`EnvRef::set_parent`], which is
//! why the parent is a runtime-mutable field rather than a constructor
//! argument.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Value;

struct Env {
    /// Bindings in insertion order. Linear scan is fine at the scale this
    /// language runs at, and it keeps first-defined-first iteration order.
    bindings: Vec<(String, Value)>,
    parent: Option<EnvRef>,
}

/// Shared handle to an environment. Cloning the handle aliases the same
/// scope; use [`EnvRef::deep_copy`] to duplicate the bindings.
#[derive(Clone)]
pub struct EnvRef(Rc<RefCell<Env>>);

impl EnvRef {
    /// A fresh scope with no bindings and no parent.
    pub fn new() -> EnvRef {
        EnvRef(Rc::new(RefCell::new(Env {
            bindings: Vec::new(),
            parent: None,
        })))
    }

    /// Look up `name`, walking the parent chain outward. Returns a deep
    /// copy of the bound value, so callers can never alias stored state.
    pub fn get(&self, name: &str) -> Option<Value> {
        let env = self.0.borrow();
        for (key, value) in &env.bindings {
            if key == name {
                return Some(value.clone());
            }
        }
        match &env.parent {
            Some(parent) => parent.get(name),
            None => None,
        }
    }

    /// Bind `name` in this scope: replace an existing binding in place or
    /// append a new one. Parents are never touched. Stores a deep copy.
    pub fn put(&self, name: &str, value: &Value) {
        let mut env = self.0.borrow_mut();
        for (key, slot) in &mut env.bindings {
            if key == name {
                *slot = value.clone();
                return;
            }
        }
        env.bindings.push((name.to_owned(), value.clone()));
    }

    /// Bind `name` in the outermost (global) scope.
    pub fn define(&self, name: &str, value: &Value) {
        let mut scope = self.clone();
        loop {
            let parent = scope.0.borrow().parent.clone();
            match parent {
                Some(up) => scope = up,
                None => break,
            }
        }
        scope.put(name, value);
    }

    /// Replace this scope's parent link. Used to attach a function's
    /// environment to the calling scope at full application.
    pub fn set_parent(&self, parent: &EnvRef) {
        self.0.borrow_mut().parent = Some(parent.clone());
    }

    /// Duplicate this scope's bindings into a new scope that shares the
    /// same parent handle. The copy and the original evolve independently.
    pub fn deep_copy(&self) -> EnvRef {
        let env = self.0.borrow();
        EnvRef(Rc::new(RefCell::new(Env {
            bindings: env.bindings.clone(),
            parent: env.parent.clone(),
        })))
    }

    /// True when both handles refer to the same scope.
    pub fn same_scope(&self, other: &EnvRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for EnvRef {
    fn default() -> Self {
        EnvRef::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::num;

    #[test]
    fn test_get_walks_parent_chain() {
        let global = EnvRef::new();
        global.put("x", &num(1));
        let inner = EnvRef::new();
        inner.set_parent(&global);

        assert_eq!(inner.get("x"), Some(num(1)));
        assert_eq!(inner.get("y"), None);
    }

    #[test]
    fn test_put_shadows_without_touching_parent() {
        let global = EnvRef::new();
        global.put("x", &num(1));
        let inner = EnvRef::new();
        inner.set_parent(&global);

        inner.put("x", &num(2));
        assert_eq!(inner.get("x"), Some(num(2)));
        assert_eq!(global.get("x"), Some(num(1)));
    }

    #[test]
    fn test_put_replaces_in_place() {
        let env = EnvRef::new();
        env.put("a", &num(1));
        env.put("b", &num(2));
        env.put("a", &num(3));

        assert_eq!(env.get("a"), Some(num(3)));
        assert_eq!(env.get("b"), Some(num(2)));
        // Replacement keeps insertion order: "a" still resolves first even
        // after being rebound, so a later duplicate cannot mask it.
        assert_eq!(env.0.borrow().bindings[0].0, "a");
        assert_eq!(env.0.borrow().bindings.len(), 2);
    }

    #[test]
    fn test_define_writes_to_root() {
        let global = EnvRef::new();
        let middle = EnvRef::new();
        middle.set_parent(&global);
        let inner = EnvRef::new();
        inner.set_parent(&middle);

        inner.define("x", &num(7));
        assert_eq!(global.get("x"), Some(num(7)));
        assert_eq!(middle.0.borrow().bindings.len(), 0);
        assert_eq!(inner.0.borrow().bindings.len(), 0);
    }

    #[test]
    fn test_deep_copy_is_independent_but_shares_parent() {
        let global = EnvRef::new();
        global.put("g", &num(1));
        let scope = EnvRef::new();
        scope.set_parent(&global);
        scope.put("x", &num(10));

        let copy = scope.deep_copy();
        assert!(!copy.same_scope(&scope));
        scope.put("x", &num(20));

        assert_eq!(copy.get("x"), Some(num(10)));
        assert_eq!(scope.get("x"), Some(num(20)));
        // Parent is shared, so later global definitions are visible to both
        global.put("g2", &num(2));
        assert_eq!(copy.get("g2"), Some(num(2)));
    }

    #[test]
    fn test_get_returns_copy_not_alias() {
        let env = EnvRef::new();
        env.put("xs", &crate::ast::Value::Qexpr(vec![num(1)]));
        let fetched = env.get("xs");
        env.put("xs", &crate::ast::Value::Qexpr(vec![num(9)]));
        assert_eq!(fetched, Some(crate::ast::Value::Qexpr(vec![num(1)])));
    }
}
