//! Expression reduction and the function calling protocol.
//!
//! Evaluation never returns a Rust error: every failure is a
//! [`Value::Error`] flowing back as an ordinary value. The rules are
//! small:
//!
//! - numbers, strings, functions and Q-expressions evaluate to themselves
//! - a symbol evaluates to its binding, or an unbound-symbol error
//! - an S-expression evaluates all of its children, then applies the first
//!   to the rest
//!
//! Calling a user function binds arguments positionally. Supplying fewer
//! arguments than required parameters is not an error: it produces a new
//! function with those parameters already bound (partial application). A
//! rest parameter collects any surplus arguments into a Q-expression. At
//! full application the function's environment is linked to the *calling*
//! scope and the body is evaluated there, so free variables in the body
//! resolve through the chain of active calls down to the globals.

use std::collections::VecDeque;

use crate::ast::Value;
use crate::env::EnvRef;

/// Reduce `value` in `env`. Symbols resolve, S-expressions apply, all
/// other variants pass through unchanged.
pub fn eval(env: &EnvRef, value: Value) -> Value {
    match value {
        Value::Symbol(name) => match env.get(&name) {
            Some(bound) => bound,
            None => Value::error(format!("unbound symbol '{name}'")),
        },
        Value::Sexpr(cells) => eval_sexpr(env, cells),
        other => other,
    }
}

fn eval_sexpr(env: &EnvRef, cells: Vec<Value>) -> Value {
    // Evaluate every child before inspecting any of them, so side effects
    // (like print) happen left to right even when a later child errors.
    let mut cells: Vec<Value> = cells
        .into_iter()
        .map(|cell| eval(env, cell))
        .collect();

    if let Some(pos) = cells.iter().position(Value::is_error) {
        return cells.swap_remove(pos);
    }

    if cells.is_empty() {
        return Value::empty();
    }
    if cells.len() == 1 {
        return cells.swap_remove(0);
    }

    let func = cells.remove(0);
    if !func.is_function() {
        return Value::error(format!(
            "s-expression starts with incorrect type. got {}, expected Function.",
            func.type_name()
        ));
    }
    call(env, func, cells)
}

/// Apply `func` to `args` in the calling environment `env`.
///
/// Builtins receive the calling environment directly. For user functions
/// the required parameters are consumed positionally; running out of
/// arguments early yields the partially-applied function, running out of
/// parameters early feeds the surplus to the rest parameter or errors.
pub fn call(env: &EnvRef, func: Value, args: Vec<Value>) -> Value {
    let (mut formals, body, fenv) = match func {
        Value::Builtin { func, .. } => return func(env, args),
        Value::Lambda { formals, body, env } => (formals, body, env),
        other => {
            return Value::error(format!(
                "s-expression starts with incorrect type. got {}, expected Function.",
                other.type_name()
            ));
        }
    };

    let given = args.len();
    let total = formals.arity();
    let mut args: VecDeque<Value> = args.into();

    while let Some(arg) = args.pop_front() {
        if formals.required.is_empty() {
            let Some(rest_name) = formals.rest.take() else {
                return Value::error(format!(
                    "function passed too many arguments. got {given}, expected {total}."
                ));
            };
            let mut collected = vec![arg];
            collected.extend(args.drain(..));
            fenv.put(&rest_name, &Value::Qexpr(collected));
            break;
        }
        let name = formals.required.remove(0);
        fenv.put(&name, &arg);
    }

    if !formals.required.is_empty() {
        // Not enough arguments yet: hand back the partially-bound function
        return Value::Lambda {
            formals,
            body,
            env: fenv,
        };
    }

    // No surplus arguments reached the rest parameter; it still binds
    if let Some(rest_name) = formals.rest.take() {
        fenv.put(&rest_name, &Value::Qexpr(Vec::new()));
    }

    fenv.set_parent(env);
    eval(&fenv, Value::Sexpr(body))
}
