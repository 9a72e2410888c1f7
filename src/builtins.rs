//! The primitive operation registry.
//!
//! Every builtin shares the signature [`BuiltinFn`]: calling environment
//! and owned argument vector in, reduced value out. Builtins validate
//! eagerly and return an Error value on the first violated precondition;
//! nothing here panics on bad input.
//!
//! Categories:
//!
//! - list surgery: `list head tail eval join`
//! - arithmetic (checked, left fold): `+ - * /`
//! - ordering and equality: `> < >= <=`, `== !=`
//! - variables and functions: `def = \`
//! - control: `if`
//! - I/O and errors: `print error load`

use std::fs;

use crate::ast::{BuiltinFn, Formals, NumberType, Value};
use crate::env::EnvRef;
use crate::evaluator::eval;

/// A named builtin operation.
pub struct BuiltinOp {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// The full registry, in the order the operations are introduced to a new
/// global environment.
pub static BUILTIN_OPS: &[BuiltinOp] = &[
    BuiltinOp { name: "list", func: builtin_list },
    BuiltinOp { name: "head", func: builtin_head },
    BuiltinOp { name: "tail", func: builtin_tail },
    BuiltinOp { name: "eval", func: builtin_eval },
    BuiltinOp { name: "join", func: builtin_join },
    BuiltinOp { name: "+", func: builtin_add },
    BuiltinOp { name: "-", func: builtin_sub },
    BuiltinOp { name: "*", func: builtin_mul },
    BuiltinOp { name: "/", func: builtin_div },
    BuiltinOp { name: ">", func: builtin_gt },
    BuiltinOp { name: "<", func: builtin_lt },
    BuiltinOp { name: ">=", func: builtin_ge },
    BuiltinOp { name: "<=", func: builtin_le },
    BuiltinOp { name: "==", func: builtin_eq },
    BuiltinOp { name: "!=", func: builtin_ne },
    BuiltinOp { name: "def", func: builtin_def },
    BuiltinOp { name: "=", func: builtin_put },
    BuiltinOp { name: "\\", func: builtin_lambda },
    BuiltinOp { name: "if", func: builtin_if },
    BuiltinOp { name: "print", func: builtin_print },
    BuiltinOp { name: "error", func: builtin_error },
    BuiltinOp { name: "load", func: builtin_load },
];

/// A fresh global environment with every builtin bound.
pub fn create_global_env() -> EnvRef {
    let env = EnvRef::new();
    for op in BUILTIN_OPS {
        env.put(
            op.name,
            &Value::Builtin {
                name: op.name,
                func: op.func,
            },
        );
    }
    env
}

// Validation error constructors. Argument indices are zero-based.

fn arity_error(func: &str, got: usize, expected: usize) -> Value {
    Value::error(format!(
        "function '{func}' passed incorrect number of arguments. got {got}, expected {expected}."
    ))
}

fn type_error(func: &str, index: usize, got: &Value, expected: &str) -> Value {
    Value::error(format!(
        "function '{func}' passed incorrect type for argument {index}. got {}, expected {expected}.",
        got.type_name()
    ))
}

fn empty_error(func: &str, index: usize) -> Value {
    Value::error(format!(
        "function '{func}' passed empty expression for argument {index}."
    ))
}

/// Validate a single Q-Expression argument and unwrap its cells.
fn take_single_qexpr(func: &str, mut args: Vec<Value>) -> Result<Vec<Value>, Value> {
    if args.len() != 1 {
        return Err(arity_error(func, args.len(), 1));
    }
    match args.remove(0) {
        Value::Qexpr(cells) => Ok(cells),
        other => Err(type_error(func, 0, &other, "Q-Expression")),
    }
}

fn builtin_list(_env: &EnvRef, args: Vec<Value>) -> Value {
    Value::Qexpr(args)
}

fn builtin_head(_env: &EnvRef, args: Vec<Value>) -> Value {
    let mut cells = match take_single_qexpr("head", args) {
        Ok(cells) => cells,
        Err(err) => return err,
    };
    if cells.is_empty() {
        return empty_error("head", 0);
    }
    cells.truncate(1);
    Value::Qexpr(cells)
}

fn builtin_tail(_env: &EnvRef, args: Vec<Value>) -> Value {
    let mut cells = match take_single_qexpr("tail", args) {
        Ok(cells) => cells,
        Err(err) => return err,
    };
    if cells.is_empty() {
        return empty_error("tail", 0);
    }
    cells.remove(0);
    Value::Qexpr(cells)
}

fn builtin_eval(env: &EnvRef, args: Vec<Value>) -> Value {
    match take_single_qexpr("eval", args) {
        Ok(cells) => eval(env, Value::Sexpr(cells)),
        Err(err) => err,
    }
}

fn builtin_join(_env: &EnvRef, args: Vec<Value>) -> Value {
    let mut joined = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        match arg {
            Value::Qexpr(cells) => joined.extend(cells),
            other => return type_error("join", i, &other, "Q-Expression"),
        }
    }
    Value::Qexpr(joined)
}

/// Shared left fold for the arithmetic operations. All arguments must be
/// Numbers; overflow and division by zero become Error values mid-fold.
fn numeric_fold(op: &'static str, args: Vec<Value>) -> Value {
    let mut numbers = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Number(n) => numbers.push(*n),
            other => return type_error(op, i, other, "Number"),
        }
    }

    let mut iter = numbers.into_iter();
    let Some(first) = iter.next() else {
        return arity_error(op, 0, 1);
    };

    // Unary minus negates
    let mut iter = iter.peekable();
    if op == "-" && iter.peek().is_none() {
        return match first.checked_neg() {
            Some(n) => Value::Number(n),
            None => Value::error(format!("integer overflow in function '{op}'")),
        };
    }

    let mut acc = first;
    for n in iter {
        let step = match op {
            "+" => acc.checked_add(n),
            "-" => acc.checked_sub(n),
            "*" => acc.checked_mul(n),
            "/" => {
                if n == 0 {
                    return Value::error("Division By Zero!");
                }
                acc.checked_div(n)
            }
            _ => unreachable!("unknown arithmetic operator"),
        };
        acc = match step {
            Some(n) => n,
            None => return Value::error(format!("integer overflow in function '{op}'")),
        };
    }
    Value::Number(acc)
}

fn builtin_add(_env: &EnvRef, args: Vec<Value>) -> Value {
    numeric_fold("+", args)
}

fn builtin_sub(_env: &EnvRef, args: Vec<Value>) -> Value {
    numeric_fold("-", args)
}

fn builtin_mul(_env: &EnvRef, args: Vec<Value>) -> Value {
    numeric_fold("*", args)
}

fn builtin_div(_env: &EnvRef, args: Vec<Value>) -> Value {
    numeric_fold("/", args)
}

/// Validate exactly two Number arguments for an ordering operation.
fn binary_numbers(op: &str, args: &[Value]) -> Result<(NumberType, NumberType), Value> {
    if args.len() != 2 {
        return Err(arity_error(op, args.len(), 2));
    }
    let Value::Number(a) = args[0] else {
        return Err(type_error(op, 0, &args[0], "Number"));
    };
    let Value::Number(b) = args[1] else {
        return Err(type_error(op, 1, &args[1], "Number"));
    };
    Ok((a, b))
}

macro_rules! ordering_op {
    ($fname:ident, $op:tt, $name:literal) => {
        fn $fname(_env: &EnvRef, args: Vec<Value>) -> Value {
            match binary_numbers($name, &args) {
                Ok((a, b)) => Value::Number(NumberType::from(a $op b)),
                Err(err) => err,
            }
        }
    };
}

ordering_op!(builtin_gt, >, ">");
ordering_op!(builtin_lt, <, "<");
ordering_op!(builtin_ge, >=, ">=");
ordering_op!(builtin_le, <=, "<=");

/// Structural equality over any two values; different variants are never
/// equal. Results are Numbers (1/0) like the ordering operations.
fn comparison(op: &str, args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error(op, args.len(), 2);
    }
    let equal = args[0] == args[1];
    let truth = if op == "==" { equal } else { !equal };
    Value::Number(NumberType::from(truth))
}

fn builtin_eq(_env: &EnvRef, args: Vec<Value>) -> Value {
    comparison("==", &args)
}

fn builtin_ne(_env: &EnvRef, args: Vec<Value>) -> Value {
    comparison("!=", &args)
}

/// Shared implementation of `def` (global scope) and `=` (local scope):
/// bind a Q-Expression of symbols to a matching count of values.
fn builtin_var(env: &EnvRef, mut args: Vec<Value>, func: &str) -> Value {
    if args.is_empty() {
        return arity_error(func, 0, 2);
    }
    let names = match args.remove(0) {
        Value::Qexpr(cells) => cells,
        other => return type_error(func, 0, &other, "Q-Expression"),
    };

    let mut symbols = Vec::with_capacity(names.len());
    for name in &names {
        match name {
            Value::Symbol(s) => symbols.push(s.clone()),
            other => {
                return Value::error(format!(
                    "function '{func}' cannot define non-symbol. got {}, expected Symbol.",
                    other.type_name()
                ));
            }
        }
    }

    if symbols.len() != args.len() {
        return Value::error(format!(
            "function '{func}' passed too many arguments for symbols. got {}, expected {}.",
            args.len(),
            symbols.len()
        ));
    }

    for (name, value) in symbols.iter().zip(&args) {
        if func == "def" {
            env.define(name, value);
        } else {
            env.put(name, value);
        }
    }
    Value::empty()
}

fn builtin_def(env: &EnvRef, args: Vec<Value>) -> Value {
    builtin_var(env, args, "def")
}

fn builtin_put(env: &EnvRef, args: Vec<Value>) -> Value {
    builtin_var(env, args, "=")
}

/// `\`: build a user function from a formals Q-Expression and a body
/// Q-Expression. The function starts from a fresh empty environment;
/// bindings arrive at call time.
fn builtin_lambda(_env: &EnvRef, mut args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error("\\", args.len(), 2);
    }
    for (index, arg) in args.iter().enumerate() {
        if !matches!(arg, Value::Qexpr(_)) {
            return type_error("\\", index, arg, "Q-Expression");
        }
    }
    let (Some(Value::Qexpr(body_cells)), Some(Value::Qexpr(formal_cells))) =
        (args.pop(), args.pop())
    else {
        unreachable!("argument types checked above");
    };

    let mut names = Vec::with_capacity(formal_cells.len());
    for cell in formal_cells {
        match cell {
            Value::Symbol(s) => names.push(s),
            other => {
                return Value::error(format!(
                    "cannot define non-symbol. got {}, expected Symbol.",
                    other.type_name()
                ));
            }
        }
    }

    match Formals::from_names(names) {
        Ok(formals) => Value::Lambda {
            formals,
            body: body_cells,
            env: EnvRef::new(),
        },
        Err(message) => Value::Error(message),
    }
}

/// `if (condition then-branch else-branch)`: the chosen Q-Expression is
/// evaluated as an S-Expression, the other is discarded unevaluated.
fn builtin_if(env: &EnvRef, mut args: Vec<Value>) -> Value {
    if args.len() != 3 {
        return arity_error("if", args.len(), 3);
    }
    let Value::Number(condition) = args[0] else {
        return type_error("if", 0, &args[0], "Number");
    };
    for index in [1, 2] {
        if !matches!(args[index], Value::Qexpr(_)) {
            return type_error("if", index, &args[index], "Q-Expression");
        }
    }

    let chosen = if condition != 0 {
        args.swap_remove(1)
    } else {
        args.swap_remove(2)
    };
    let Value::Qexpr(branch) = chosen else {
        unreachable!("branch type checked above");
    };
    eval(env, Value::Sexpr(branch))
}

fn builtin_print(_env: &EnvRef, args: Vec<Value>) -> Value {
    let rendered: Vec<String> = args.iter().map(|arg| format!("{arg}")).collect();
    println!("{}", rendered.join(" "));
    Value::empty()
}

fn builtin_error(_env: &EnvRef, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error("error", args.len(), 1);
    }
    match args.remove(0) {
        Value::Str(message) => Value::Error(message),
        other => type_error("error", 0, &other, "String"),
    }
}

/// `load`: read and parse a source file, evaluate each top-level form in
/// order, printing (not raising) Error results. Returns `()`.
fn builtin_load(env: &EnvRef, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error("load", args.len(), 1);
    }
    let path = match args.remove(0) {
        Value::Str(path) => path,
        other => return type_error("load", 0, &other, "String"),
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => return Value::error(format!("could not load library {path}. {e}")),
    };
    let root = match crate::parser::parse_program(&source) {
        Ok(root) => root,
        Err(e) => return Value::error(format!("could not load library {path}. {e}")),
    };

    let Value::Sexpr(forms) = crate::reader::read(&root) else {
        unreachable!("program root always reads as an S-Expression");
    };
    for form in forms {
        let result = eval(env, form);
        if result.is_error() {
            println!("{result}");
        }
    }
    Value::empty()
}
