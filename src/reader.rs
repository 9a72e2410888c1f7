//! Reader: generic parse tree to value tree.
//!
//! The reader interprets the lexemes the parser left raw. Number nodes are
//! range-checked here (an out-of-range literal becomes an Error value, not
//! a parse failure), string nodes are unescaped, and bracket and comment
//! children are dropped. Matching on the tag is by substring so composite
//! rule tags from the grammar still dispatch correctly.

use crate::ast::{NumberType, Value};
use crate::parser::ParseNode;

/// Convert a parse tree into a value tree. The program root and `sexpr`
/// nodes become S-Expressions, `qexpr` nodes become Q-Expressions.
pub fn read(node: &ParseNode) -> Value {
    if node.tag.contains("number") {
        return read_number(node);
    }
    if node.tag.contains("symbol") {
        return Value::Symbol(node.contents.clone());
    }
    if node.tag.contains("string") {
        return read_string(node);
    }

    let mut cells = Vec::new();
    for child in &node.children {
        if child.is_bracket() || child.tag.contains("comment") {
            continue;
        }
        cells.push(read(child));
    }
    if node.tag.contains("qexpr") {
        Value::Qexpr(cells)
    } else {
        Value::Sexpr(cells)
    }
}

fn read_number(node: &ParseNode) -> Value {
    match node.contents.parse::<NumberType>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::error("invalid number"),
    }
}

/// Strip the surrounding quotes and resolve escape sequences. Unknown
/// escapes resolve to the escaped character itself.
fn read_string(node: &ParseNode) -> Value {
    let raw = &node.contents;
    let inner = &raw[1..raw.len() - 1];

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Value::Str(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{num, sym};
    use crate::parser::parse_program;

    fn read_str(input: &str) -> Value {
        let root = parse_program(input)
            .unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"));
        read(&root)
    }

    /// Read a single top-level form.
    fn read_form(input: &str) -> Value {
        match read_str(input) {
            Value::Sexpr(mut cells) if cells.len() == 1 => cells.remove(0),
            other => panic!("expected one form for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_read_leaves() {
        assert_eq!(read_form("42"), num(42));
        assert_eq!(read_form("-42"), num(-42));
        assert_eq!(read_form("head"), sym("head"));
        assert_eq!(read_form("\"hi\""), Value::Str("hi".into()));
    }

    #[test]
    fn test_out_of_range_number_becomes_error() {
        assert_eq!(
            read_form("99999999999999999999"),
            Value::error("invalid number")
        );
        // In-range extremes read fine
        assert_eq!(read_form("9223372036854775807"), num(i64::MAX));
        assert_eq!(read_form("-9223372036854775808"), num(i64::MIN));
    }

    #[test]
    fn test_string_unescaping() {
        let cases: &[(&str, &str)] = &[
            (r#""a\nb""#, "a\nb"),
            (r#""a\tb""#, "a\tb"),
            (r#""say \"hi\"""#, "say \"hi\""),
            (r#""back\\slash""#, "back\\slash"),
            // Unknown escapes resolve to the character itself
            (r#""\q""#, "q"),
            ("\"\"", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(
                read_form(input),
                Value::Str((*expected).into()),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_read_lists() {
        assert_eq!(
            read_form("(+ 1 2)"),
            Value::Sexpr(vec![sym("+"), num(1), num(2)])
        );
        assert_eq!(
            read_form("{1 {2} ()}"),
            Value::Qexpr(vec![num(1), Value::Qexpr(vec![num(2)]), Value::Sexpr(vec![])])
        );
    }

    #[test]
    fn test_comments_and_brackets_dropped() {
        assert_eq!(
            read_str("(+ 1 ; add\n 2) ; done"),
            Value::Sexpr(vec![Value::Sexpr(vec![sym("+"), num(1), num(2)])])
        );
        assert_eq!(read_str("; nothing here"), Value::Sexpr(vec![]));
    }

    #[test]
    fn test_render_read_round_trip() {
        // Rendering a read value and reading it back yields the same value
        let sources = [
            "42",
            "(+ 1 2 {3 4})",
            "{head {\"a\" \"b\\nc\"}}",
            "(\\ {x & xs} {+ x 1})",
            "{{} () {1 {2 {3}}}}",
        ];
        for source in sources {
            let first = read_str(source);
            let rendered = format!("{first}");
            let second = read_str(&rendered);
            assert_eq!(first, second, "source: {source}, rendered: {rendered}");
        }
    }
}
