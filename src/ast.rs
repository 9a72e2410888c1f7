//! Core value types for the interpreter.
//!
//! The main enum, [`Value`], covers every kind of datum the language can
//! produce: numbers, first-class errors, symbols, strings, builtin and
//! user-defined functions, and the two list forms. S-expressions (printed
//! with parentheses) are reduced when the evaluator reaches them;
//! Q-expressions (printed with braces) are literal data and are never
//! evaluated implicitly.
//!
//! Three pieces of behavior live here and are deliberately not derived:
//!
//! - **Deep copy**: `Clone` duplicates nested sequences recursively, and
//!   cloning a user function duplicates its captured environment's bindings
//!   (the parent link is shared). No two `Value` trees ever alias.
//! - **Equality**: values of different variants are never equal. Builtins
//!   compare by function identity; user functions compare by formals and
//!   body only, ignoring their captured environments.
//! - **Rendering**: `Display` produces the canonical textual form that the
//!   parser accepts back, so literals round-trip.

use std::fmt;

use crate::env::EnvRef;

/// Type alias for number values in the interpreter
pub type NumberType = i64;

/// Signature shared by every builtin operation: the calling environment and
/// an owned argument list in, a reduced value (possibly an Error) out.
/// Builtins own the validation and cleanup of their arguments.
pub type BuiltinFn = fn(&EnvRef, Vec<Value>) -> Value;

/// The formal parameter list of a user-defined function: an ordered list of
/// required names plus an optional rest name that captures any remaining
/// call arguments as a Q-expression.
///
/// The surface syntax marks the rest parameter with `&` (`{x & xs}`), but
/// the marker is resolved when the function literal is built rather than
/// being stored as a sentinel symbol inside the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formals {
    pub required: Vec<String>,
    pub rest: Option<String>,
}

impl Formals {
    /// Resolve a flat symbol list into required names plus an optional rest
    /// name. `&` must be followed by exactly one trailing symbol.
    pub fn from_names(names: Vec<String>) -> Result<Formals, String> {
        let mut required = Vec::new();
        let mut iter = names.into_iter();
        while let Some(name) = iter.next() {
            if name == "&" {
                return match (iter.next(), iter.next()) {
                    (Some(rest), None) => Ok(Formals {
                        required,
                        rest: Some(rest),
                    }),
                    _ => Err(
                        "function format invalid. symbol '&' not followed by a single symbol."
                            .to_owned(),
                    ),
                };
            }
            required.push(name);
        }
        Ok(Formals {
            required,
            rest: None,
        })
    }

    /// Number of required parameters still awaiting arguments.
    pub fn arity(&self) -> usize {
        self.required.len()
    }
}

impl fmt::Display for Formals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, name) in self.required.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{name}")?;
        }
        if let Some(rest) = &self.rest {
            if self.required.is_empty() {
                write!(f, "& {rest}")?;
            } else {
                write!(f, " & {rest}")?;
            }
        }
        write!(f, "}}")
    }
}

/// A language value. Everything the evaluator touches is one of these.
pub enum Value {
    /// Numbers (integers only); arithmetic overflow becomes an Error
    Number(NumberType),
    /// A first-class error carrying its message. Not a control-flow signal:
    /// errors propagate as ordinary values.
    Error(String),
    /// Symbols (identifiers); unresolved until evaluated
    Symbol(String),
    /// String literals
    Str(String),
    /// Builtin functions, compared by function identity
    Builtin { name: &'static str, func: BuiltinFn },
    /// User-defined functions: formals, body (a Q-expression's elements) and
    /// the environment that call-time bindings are written into
    Lambda {
        formals: Formals,
        body: Vec<Value>,
        env: EnvRef,
    },
    /// Symbolic expression: evaluated when reached by the evaluator
    Sexpr(Vec<Value>),
    /// Quoted expression: literal data, never auto-evaluated
    Qexpr(Vec<Value>),
}

impl Value {
    /// Human-readable name of this value's variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::Str(_) => "String",
            Value::Builtin { .. } | Value::Lambda { .. } => "Function",
            Value::Sexpr(_) => "S-Expression",
            Value::Qexpr(_) => "Q-Expression",
        }
    }

    /// An empty S-expression, the conventional "nothing useful" result.
    pub fn empty() -> Value {
        Value::Sexpr(Vec::new())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Builtin { .. } | Value::Lambda { .. })
    }

    /// Build an Error value from a format-style message.
    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(message.into())
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Number(n) => Value::Number(*n),
            Value::Error(msg) => Value::Error(msg.clone()),
            Value::Symbol(s) => Value::Symbol(s.clone()),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Builtin { name, func } => Value::Builtin { name, func: *func },
            // A user function owns its environment: copying the function
            // copies the bindings, while the parent link stays shared.
            Value::Lambda { formals, body, env } => Value::Lambda {
                formals: formals.clone(),
                body: body.clone(),
                env: env.deep_copy(),
            },
            Value::Sexpr(cells) => Value::Sexpr(cells.clone()),
            Value::Qexpr(cells) => Value::Qexpr(cells.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            // Builtins are equal iff they reference the same native operation
            (Value::Builtin { func: a, .. }, Value::Builtin { func: b, .. }) => {
                std::ptr::fn_addr_eq(*a, *b)
            }
            // User functions compare structurally by formals and body;
            // captured environments are not compared
            (
                Value::Lambda {
                    formals: fa,
                    body: ba,
                    ..
                },
                Value::Lambda {
                    formals: fb,
                    body: bb,
                    ..
                },
            ) => fa == fb && ba == bb,
            (Value::Sexpr(a), Value::Sexpr(b)) | (Value::Qexpr(a), Value::Qexpr(b)) => a == b,
            // Different variants are never equal
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Error(msg) => write!(f, "Error({msg:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Builtin { name, .. } => write!(f, "Builtin({name})"),
            Value::Lambda { formals, body, .. } => {
                write!(f, "Lambda(formals={formals}, body={body:?})")
            }
            Value::Sexpr(cells) => f.debug_tuple("Sexpr").field(cells).finish(),
            Value::Qexpr(cells) => f.debug_tuple("Qexpr").field(cells).finish(),
        }
    }
}

/// Render a sequence bracketed by `open`/`close` with single spaces between
/// elements and no trailing space.
fn fmt_seq(f: &mut fmt::Formatter<'_>, cells: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{cell}")?;
    }
    write!(f, "{close}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Error(msg) => write!(f, "Error: {msg}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Str(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::Builtin { .. } => write!(f, "<builtin>"),
            Value::Lambda { formals, body, .. } => {
                write!(f, "(\\ {formals} ")?;
                fmt_seq(f, body, '{', '}')?;
                write!(f, ")")
            }
            Value::Sexpr(cells) => fmt_seq(f, cells, '(', ')'),
            Value::Qexpr(cells) => fmt_seq(f, cells, '{', '}'),
        }
    }
}

/// Helper for creating symbols, convenient in mixed lists and tests.
pub fn sym(name: impl Into<String>) -> Value {
    Value::Symbol(name.into())
}

/// Helper for creating number values.
pub fn num(n: NumberType) -> Value {
    Value::Number(n)
}
