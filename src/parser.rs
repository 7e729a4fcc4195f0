use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::types::Node;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{}', expected {expected}", found.kind)]
    UnexpectedToken { found: Token, expected: String },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),
    #[error(transparent)]
    Lexer(#[from] LexerError), // Propagated when parsing directly from a string
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: IntoIter<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter(),
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses a single expression starting from the given token.
    fn parse_expr_with_token(&mut self, token: Option<Token>) -> ParseResult<Node> {
        match token {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => {
                let (children, span) = self.parse_seq(span, TokenKind::RParen)?;
                Ok(Node::new_sexpr(children, span))
            }
            Some(Token {
                kind: TokenKind::LBrace,
                span,
            }) => {
                let (children, span) = self.parse_seq(span, TokenKind::RBrace)?;
                Ok(Node::new_qexpr(children, span))
            }
            Some(atom) => self.parse_atom(atom),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        let token = self.next_token();
        self.parse_expr_with_token(token)
    }

    /// Parses an atomic expression (number or symbol).
    fn parse_atom(&mut self, token: Token) -> ParseResult<Node> {
        match token.kind {
            TokenKind::Number(text) => Ok(read_number(&text, token.span)),
            TokenKind::Symbol(s) => Ok(Node::new_symbol(s, token.span)),
            other_kind => Err(ParseError::UnexpectedToken {
                found: Token {
                    kind: other_kind,
                    span: token.span,
                },
                expected: "an atom, '(' or '{'".to_string(),
            }),
        }
    }

    /// Parses the elements of a delimited sequence up to `terminator`.
    fn parse_seq(
        &mut self,
        open_span: Span,
        terminator: TokenKind,
    ) -> ParseResult<(Vec<Node>, Span)> {
        let mut children = Vec::new();
        loop {
            match self.next_token() {
                Some(token) if token.kind == terminator => {
                    return Ok((children, open_span.merge(token.span)));
                }
                Some(token) => children.push(self.parse_expr_with_token(Some(token))?),
                None => return Err(ParseError::UnexpectedEof(format!("'{}'", terminator))),
            }
        }
    }

    /// Parses exactly one expression; trailing tokens are an error.
    pub fn parse(mut self) -> ParseResult<Node> {
        let expr = self.parse_expr()?;

        if let Some(found) = self.next_token() {
            Err(ParseError::UnexpectedToken {
                found,
                expected: "end of input".to_string(),
            })
        } else {
            Ok(expr)
        }
    }

    /// Parses a whole program: every top-level expression, wrapped in one
    /// implicit root s-expression. This is what lets the read-loop accept
    /// `def {x} 100` without parentheses: the root reduces as a call.
    pub fn parse_program(mut self) -> ParseResult<Node> {
        let mut children = Vec::new();
        while let Some(token) = self.next_token() {
            children.push(self.parse_expr_with_token(Some(token))?);
        }
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(first.span.start, last.span.end),
            _ => Span::default(),
        };
        Ok(Node::new_sexpr(children, span))
    }
}

// Out-of-range literals become error values, not parse failures.
fn read_number(text: &str, span: Span) -> Node {
    match text.parse::<i64>() {
        Ok(n) => Node::new_number(n, span),
        Err(_) => Node::new_error(format!("invalid number '{}'", text), span),
    }
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Like [`parse_str`] but accepts any number of top-level expressions.
pub fn parse_program_str(input: &str) -> ParseResult<Node> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;
    use crate::types::Value;

    // Helper for asserting successful parsing
    fn assert_parse(input: &str, expected: Node) {
        match parse_str(input) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Helper for asserting parse errors
    fn assert_parse_error(input: &str, expected_error_variant: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => {
                // Compare enum variants, ignoring specific content for simplicity
                assert_eq!(
                    std::mem::discriminant(&e),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    fn node_number(n: i64, start: usize, end: usize) -> Node {
        Node::new_number(n, Span::new(start, end))
    }

    fn node_symbol(s: &str, start: usize, end: usize) -> Node {
        Node::new_symbol(s, Span::new(start, end))
    }

    fn node_sexpr(children: Vec<Node>, start: usize, end: usize) -> Node {
        Node::new_sexpr(children, Span::new(start, end))
    }

    fn node_qexpr(children: Vec<Node>, start: usize, end: usize) -> Node {
        Node::new_qexpr(children, Span::new(start, end))
    }

    #[test]
    fn test_parse_atoms() {
        assert_parse("123", node_number(123, 0, 3));
        assert_parse("-45", node_number(-45, 0, 3));
        assert_parse("symbol", node_symbol("symbol", 0, 6));
        assert_parse("+", node_symbol("+", 0, 1));
        assert_parse("\\", node_symbol("\\", 0, 1));
    }

    #[test]
    fn test_parse_empty_lists() {
        assert_parse("()", node_sexpr(vec![], 0, 2));
        assert_parse("( )", node_sexpr(vec![], 0, 3)); // With space
        assert_parse("{}", node_qexpr(vec![], 0, 2));
    }

    #[test]
    fn test_parse_simple_sexpr() {
        assert_parse(
            "(+ 10 20)",
            node_sexpr(
                vec![
                    node_symbol("+", 1, 2),
                    node_number(10, 3, 5),
                    node_number(20, 6, 8),
                ],
                0,
                9,
            ),
        );
    }

    #[test]
    fn test_parse_qexpr() {
        assert_parse(
            "{1 2 3}",
            node_qexpr(
                vec![
                    node_number(1, 1, 2),
                    node_number(2, 3, 4),
                    node_number(3, 5, 6),
                ],
                0,
                7,
            ),
        );
        // Q-expressions may hold arbitrary unevaluated expressions
        assert_parse(
            "{+ (1 2)}",
            node_qexpr(
                vec![
                    node_symbol("+", 1, 2),
                    node_sexpr(vec![node_number(1, 4, 5), node_number(2, 6, 7)], 3, 8),
                ],
                0,
                9,
            ),
        );
    }

    #[test]
    fn test_parse_nested() {
        assert_parse(
            "(a (b c) d)",
            node_sexpr(
                vec![
                    node_symbol("a", 1, 2),
                    node_sexpr(vec![node_symbol("b", 4, 5), node_symbol("c", 6, 7)], 3, 8),
                    node_symbol("d", 9, 10),
                ],
                0,
                11,
            ),
        );
        assert_parse(
            "(def {x} 10)",
            node_sexpr(
                vec![
                    node_symbol("def", 1, 4),
                    node_qexpr(vec![node_symbol("x", 6, 7)], 5, 8),
                    node_number(10, 9, 11),
                ],
                0,
                12,
            ),
        );
    }

    #[test]
    fn test_parse_invalid_number_becomes_error_value() {
        let node = parse_str("99999999999999999999999").expect("should parse");
        assert!(matches!(node.kind, Value::Error(_)));
        assert_eq!(
            node.to_string(),
            "Error: invalid number '99999999999999999999999'"
        );
    }

    #[test]
    fn test_parse_errors_unexpected_token() {
        assert_parse_error("(1 2", ParseError::UnexpectedEof("')'".to_string()));
        assert_parse_error("{1 2", ParseError::UnexpectedEof("'}'".to_string()));
        assert_parse_error(
            ")",
            ParseError::UnexpectedToken {
                found: Token {
                    kind: TokenKind::RParen,
                    span: Span::new(0, 1),
                },
                expected: "an atom, '(' or '{'".to_string(),
            },
        );
        assert_parse_error(
            "(1))",
            ParseError::UnexpectedToken {
                found: Token {
                    kind: TokenKind::RParen,
                    span: Span::new(3, 4),
                },
                expected: "end of input".to_string(),
            },
        );
        // Mismatched delimiters: '}' cannot close '('
        assert_parse_error(
            "(1 2}",
            ParseError::UnexpectedToken {
                found: Token {
                    kind: TokenKind::RBrace,
                    span: Span::new(4, 5),
                },
                expected: "an atom, '(' or '{'".to_string(),
            },
        );
    }

    #[test]
    fn test_parse_errors_eof() {
        assert_parse_error("", ParseError::UnexpectedEof("".to_string()));
        assert_parse_error("(", ParseError::UnexpectedEof("".to_string()));
    }

    #[test]
    fn test_parse_lexer_error_propagation() {
        assert_parse_error(
            "'",
            ParseError::Lexer(LexerError {
                error: crate::lexer::LexerErrorKind::InvalidToken,
                span: Span::new(0, 1),
            }),
        );
    }

    #[test]
    fn test_whitespace_and_comments_parsing() {
        // Parser operates on tokens; whitespace/comments are handled by lexer
        assert_parse(
            " ( + 1 2 ) ; comment",
            node_sexpr(
                vec![
                    node_symbol("+", 3, 4),
                    node_number(1, 5, 6),
                    node_number(2, 7, 8),
                ],
                1,
                10,
            ),
        );
    }

    #[test]
    fn test_parse_program_wraps_top_level() {
        let node = parse_program_str("def {x} 100").expect("should parse");
        match &node.kind {
            Value::Sexpr(children) => {
                assert_eq!(children.len(), 3);
                assert_eq!(children[0], node_symbol("def", 0, 3));
            }
            other => panic!("Expected implicit root s-expression, got {:?}", other),
        }
        assert_eq!(node.span, Span::new(0, 11));
    }

    #[test]
    fn test_parse_program_single_and_empty() {
        let single = parse_program_str("42").expect("should parse");
        match &single.kind {
            Value::Sexpr(children) => assert_eq!(children, &vec![node_number(42, 0, 2)]),
            other => panic!("Expected root s-expression, got {:?}", other),
        }

        let empty = parse_program_str("").expect("should parse");
        assert_eq!(empty, Node::new_sexpr(vec![], Span::default()));
    }
}
