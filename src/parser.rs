//! Grammar front-end: raw text to a generic parse tree.
//!
//! The parser is deliberately dumb about meaning. It produces [`ParseNode`]s
//! tagged with the grammar rule that matched (`number`, `symbol`, `string`,
//! `comment`, `sexpr`, `qexpr`, plus `char` leaves for the bracket tokens)
//! and leaves all interpretation — numeric range checks, string unescaping,
//! comment stripping — to the reader. String nodes carry their raw lexeme
//! including the surrounding quotes.
//!
//! Grammar:
//!
//! ```text
//! number  : -?[0-9]+
//! symbol  : [a-zA-Z0-9_+\-*/\\=<>!&]+
//! string  : "(\.|[^"])*"
//! comment : ;[^\r\n]*
//! sexpr   : '(' expr* ')'
//! qexpr   : '{' expr* '}'
//! program : expr* EOF
//! ```
//!
//! Nesting is limited to [`MAX_PARSE_DEPTH`]; parse failures come back as
//! structured [`ParseError`]s with a context snippet of the input.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{pair, preceded},
};

use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Characters allowed in symbols beyond ASCII alphanumerics.
pub const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&";

/// A generic parse tree node: the grammar rule tag, the matched lexeme for
/// leaves, and child nodes for the list rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub tag: &'static str,
    pub contents: String,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    fn leaf(tag: &'static str, contents: impl Into<String>) -> ParseNode {
        ParseNode {
            tag,
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    fn branch(tag: &'static str, children: Vec<ParseNode>) -> ParseNode {
        ParseNode {
            tag,
            contents: String::new(),
            children,
        }
    }

    /// Bracket tokens appear as leaf children of their list node so that
    /// consumers see the full matched text; they carry no meaning.
    pub fn is_bracket(&self) -> bool {
        self.tag == "char"
    }
}

/// Parse a whole program: any number of expressions up to end of input.
/// Returns the root node (tag `>`), with one child per top-level form.
pub fn parse_program(input: &str) -> Result<ParseNode, ParseError> {
    let mut remaining = input;
    let mut children = Vec::new();
    loop {
        let rest = remaining.trim_start();
        if rest.is_empty() {
            break;
        }
        match parse_expr(rest, 0) {
            Ok((rest, node)) => {
                children.push(node);
                remaining = rest;
            }
            Err(error) => {
                let mut converted = convert_error(input, error);
                // A failure after at least one complete form is trailing
                // garbage rather than a malformed program
                if converted.kind == ParseErrorKind::InvalidSyntax && !children.is_empty() {
                    converted.kind = ParseErrorKind::TrailingContent;
                    converted.message = "unexpected content after expression".into();
                }
                return Err(converted);
            }
        }
    }
    Ok(ParseNode::branch(">", children))
}

/// Convert nom parsing errors to structured `ParseError`s
fn convert_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::from_message(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                _ if position >= input.len() => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "unexpected end of input",
                    input,
                    position,
                ),
                _ => ParseError::with_context(
                    ParseErrorKind::InvalidSyntax,
                    "invalid syntax",
                    input,
                    position,
                ),
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "incomplete input")
        }
    }
}

fn parse_expr(input: &str, depth: usize) -> IResult<&str, ParseNode> {
    if depth >= MAX_PARSE_DEPTH {
        // Failure, not Error: the repetition combinators must not swallow
        // the depth violation and report a stray bracket instead
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            parse_comment,
            |i| parse_list(i, "sexpr", '(', ')', depth),
            |i| parse_list(i, "qexpr", '{', '}', depth),
            parse_number,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

fn parse_list<'a>(
    input: &'a str,
    tag: &'static str,
    open: char,
    close: char,
    depth: usize,
) -> IResult<&'a str, ParseNode> {
    let (input, _) = char(open).parse(input)?;
    let (input, elements) = many0(|i| parse_expr(i, depth + 1)).parse(input)?;
    // cut: after a matched opening bracket there is no valid backtrack
    let (input, _) = preceded(multispace0, cut(char(close))).parse(input)?;

    let mut children = Vec::with_capacity(elements.len() + 2);
    children.push(ParseNode::leaf("char", open));
    children.extend(elements);
    children.push(ParseNode::leaf("char", close));
    Ok((input, ParseNode::branch(tag, children)))
}

/// Parse a number lexeme. Range checking happens in the reader, so an
/// out-of-range literal still parses as a number node here.
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    let (rest, lexeme) = recognize(pair(opt(char('-')), digit1)).parse(input)?;
    Ok((rest, ParseNode::leaf("number", lexeme)))
}

fn parse_symbol(input: &str) -> IResult<&str, ParseNode> {
    let (rest, lexeme) = take_while1(|c: char| {
        c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
    })
    .parse(input)?;
    Ok((rest, ParseNode::leaf("symbol", lexeme)))
}

/// Parse a string literal, keeping the raw lexeme (quotes and escape
/// sequences included). Any character may follow a backslash; unescaping
/// is the reader's job.
fn parse_string(input: &str) -> IResult<&str, ParseNode> {
    let (body, _) = char('"').parse(input)?;

    let mut iter = body.chars();
    let mut consumed = 0;
    loop {
        match iter.next() {
            Some('"') => {
                consumed += 1;
                break;
            }
            Some('\\') => {
                consumed += 1;
                match iter.next() {
                    Some(escaped) => consumed += escaped.len_utf8(),
                    None => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            &input[input.len()..],
                            ErrorKind::Char,
                        )));
                    }
                }
            }
            Some(ch) => consumed += ch.len_utf8(),
            None => {
                // Unterminated string
                return Err(nom::Err::Failure(nom::error::Error::new(
                    &input[input.len()..],
                    ErrorKind::Char,
                )));
            }
        }
    }

    let total = 1 + consumed;
    Ok((&input[total..], ParseNode::leaf("string", &input[..total])))
}

fn parse_comment(input: &str) -> IResult<&str, ParseNode> {
    let (rest, lexeme) = recognize(pair(
        char(';'),
        take_while(|c: char| c != '\n' && c != '\r'),
    ))
    .parse(input)?;
    Ok((rest, ParseNode::leaf("comment", lexeme)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> ParseNode {
        parse_program(input).unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"))
    }

    fn parse_err_kind(input: &str) -> ParseErrorKind {
        match parse_program(input) {
            Ok(node) => panic!("expected failure for {input:?}, got {node:?}"),
            Err(e) => e.kind,
        }
    }

    /// The tags of a node's children, bracket leaves included.
    fn child_tags(node: &ParseNode) -> Vec<&'static str> {
        node.children.iter().map(|c| c.tag).collect()
    }

    #[test]
    fn test_top_level_structure() {
        let root = parse_ok("(+ 1 2)");
        assert_eq!(root.tag, ">");
        assert_eq!(child_tags(&root), vec!["sexpr"]);
        assert_eq!(
            child_tags(&root.children[0]),
            vec!["char", "symbol", "number", "number", "char"]
        );

        // Multiple forms, whitespace between them optional
        let root = parse_ok("(+ 1 2)(+ 3 4)");
        assert_eq!(child_tags(&root), vec!["sexpr", "sexpr"]);

        let root = parse_ok("  \n ");
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_leaf_lexemes() {
        let cases: &[(&str, &str, &str)] = &[
            ("42", "number", "42"),
            ("-7", "number", "-7"),
            ("-", "symbol", "-"),
            ("head", "symbol", "head"),
            ("<=", "symbol", "<="),
            ("\\", "symbol", "\\"),
            ("x_1", "symbol", "x_1"),
            // Strings keep their raw lexeme, quotes and escapes included
            ("\"hi\"", "string", "\"hi\""),
            ("\"a\\nb\"", "string", "\"a\\nb\""),
            ("\"\"", "string", "\"\""),
            ("; trailing words", "comment", "; trailing words"),
        ];
        for (input, tag, contents) in cases {
            let root = parse_ok(input);
            assert_eq!(root.children.len(), 1, "input: {input}");
            assert_eq!(root.children[0].tag, *tag, "input: {input}");
            assert_eq!(root.children[0].contents, *contents, "input: {input}");
        }
    }

    #[test]
    fn test_number_then_symbol_split() {
        // The grammar is token greedy: "5abc" is a number followed by a
        // symbol, not a parse error
        let root = parse_ok("5abc");
        assert_eq!(child_tags(&root), vec!["number", "symbol"]);
    }

    #[test]
    fn test_nested_lists() {
        let root = parse_ok("{1 {2 3} (+ 4 5)}");
        let qexpr = &root.children[0];
        assert_eq!(qexpr.tag, "qexpr");
        assert_eq!(
            child_tags(qexpr),
            vec!["char", "number", "qexpr", "sexpr", "char"]
        );
    }

    #[test]
    fn test_comments_inside_lists() {
        let root = parse_ok("(+ 1 ; add\n 2)");
        assert_eq!(
            child_tags(&root.children[0]),
            vec!["char", "symbol", "number", "comment", "number", "char"]
        );
    }

    #[test]
    fn test_parse_errors() {
        let cases: &[(&str, ParseErrorKind)] = &[
            ("(+ 1", ParseErrorKind::Incomplete),
            ("{1 2", ParseErrorKind::Incomplete),
            ("\"abc", ParseErrorKind::Incomplete),
            ("\"abc\\", ParseErrorKind::Incomplete),
            (")", ParseErrorKind::InvalidSyntax),
            ("(+ 1 2) )", ParseErrorKind::TrailingContent),
            ("(+ 1 2) ]", ParseErrorKind::TrailingContent),
            ("(1 ] 2)", ParseErrorKind::InvalidSyntax),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_err_kind(input), *expected, "input: {input}");
        }
    }

    #[test]
    fn test_depth_limit() {
        let under = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse_program(&under).is_ok());

        let over = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(parse_err_kind(&over), ParseErrorKind::TooDeeplyNested);
    }

    #[test]
    fn test_error_context_snippet() {
        let err = match parse_program("(+ 1 2) @") {
            Err(e) => e,
            Ok(node) => panic!("expected failure, got {node:?}"),
        };
        let context = err.context.unwrap_or_default();
        assert!(context.contains('@'), "context was: {context}");
    }
}
