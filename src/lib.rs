//! qlisp - a tiny Lisp with Q-expressions
//!
//! This crate implements a small dynamically-typed, Lisp-family expression
//! language built around two list forms:
//!
//! ```lisp
//! ; S-expressions (parentheses) are evaluated
//! (+ 1 2 3)            ; 6
//! ; Q-expressions (braces) are literal data, never auto-evaluated
//! {+ 1 2 3}            ; {+ 1 2 3}
//! (eval {+ 1 2 3})     ; 6
//! ```
//!
//! User functions are built with `\` and support partial application and a
//! `&` rest parameter:
//!
//! ```lisp
//! (def {add} (\ {x y} {+ x y}))
//! (add 1 2)            ; 3
//! ((add 1) 2)          ; 3 - partial application yields a new callable
//! ((\ {x & xs} {xs}) 1 2 3)  ; {2 3}
//! ```
//!
//! Runtime failures are not exceptions: they are ordinary values of the
//! Error variant that short-circuit evaluation and print as
//! `Error: <message>`. The only Rust-side error type is [`ParseError`],
//! produced by the grammar front-end before any value exists.
//!
//! ## Modules
//!
//! - `ast`: the `Value` sum type, rendering, equality and deep copy
//! - `env`: chained, insertion-ordered variable environments
//! - `evaluator`: expression reduction and the closure calling protocol
//! - `builtins`: the primitive operation registry
//! - `parser`: text to generic parse tree (nom based)
//! - `reader`: generic parse tree to `Value` tree

use std::fmt;

/// Maximum parsing depth to prevent stack overflow from deeply nested input.
/// Evaluation depth is intentionally unbounded (host-stack limited); only the
/// front-end enforces a limit, since it faces raw untrusted text.
pub const MAX_PARSE_DEPTH: usize = 128;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (EOF, unterminated string, unclosed brackets)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 80 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
            found: None,
        }
    }

    /// Create a ParseError with context extracted from input at a given offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 80;

        // Show some context before the error position as well
        let context_start = error_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }

        // Newlines are replaced with visible markers for single-line display
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        let found = input.chars().nth(error_offset).map(|c| c.to_string());

        ParseError {
            kind,
            message: message.into(),
            context: Some(display_context),
            found,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, " (found '{found}')")?;
        }
        if let Some(context) = &self.context {
            write!(f, " near: {context}")?;
        }
        Ok(())
    }
}

pub mod ast;
pub mod builtins;
pub mod env;
pub mod evaluator;
pub mod parser;
pub mod reader;
