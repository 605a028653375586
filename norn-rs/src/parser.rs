//! List expression lexer and parser.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! sequence    ::= definition (';' definition)*
//! definition  ::= (listname '=')? union
//! union       ::= difference (',' difference)*
//! difference  ::= intersect ('!' intersect)*
//! intersect   ::= primary ('*' primary)*
//! primary     ::= address | listname | '(' sequence ')' | <empty>
//! ```
//!
//! Input is lowercased before lexing, so parsing is case-insensitive.  An
//! empty operand (empty input, `()`, or nothing before/after an operator)
//! parses to [`ListExpr::Empty`].
//!
//! Parsing is a pure function of the input text: it never reads or writes
//! an environment.  Definitions only take effect when the resulting tree is
//! evaluated.

use std::fmt;

use crate::ast::{InvalidToken, ListExpr, ListName, Recipient};

// ── SyntaxError ───────────────────────────────────────────────────────────────

/// Malformed list expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    fn new(message: impl Into<String>) -> Self {
        SyntaxError {
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error: {}", self.message)
    }
}

impl std::error::Error for SyntaxError {}

impl From<InvalidToken> for SyntaxError {
    fn from(err: InvalidToken) -> Self {
        SyntaxError::new(err.to_string())
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// An address or list name; classified by the parser.
    Word(String),
    Comma,
    Bang,
    Star,
    Assign,
    Semi,
    LParen,
    RParen,
    /// Unrecognised input byte, reported by the parser.
    Unknown(char),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{w}'"),
            Token::Comma => f.write_str("','"),
            Token::Bang => f.write_str("'!'"),
            Token::Star => f.write_str("'*'"),
            Token::Assign => f.write_str("'='"),
            Token::Semi => f.write_str("';'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Unknown(c) => write!(f, "'{c}'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.src.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn read_word(&mut self, first: u8) -> Token {
        let mut s = String::new();
        s.push(first as char);
        while matches!(
            self.peek(),
            Some(b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'@')
        ) {
            s.push(self.advance().unwrap() as char);
        }
        Token::Word(s)
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Token::Eof,
            Some(c) => c,
        };

        match ch {
            b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'@' => self.read_word(ch),
            b',' => Token::Comma,
            b'!' => Token::Bang,
            b'*' => Token::Star,
            b'=' => Token::Assign,
            b';' => Token::Semi,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            c => Token::Unknown(c as char),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek2(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&Token::Eof)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_sequence(&mut self) -> Result<ListExpr, SyntaxError> {
        let mut expr = self.parse_definition()?;
        while self.eat(&Token::Semi) {
            let rhs = self.parse_definition()?;
            expr = ListExpr::sequence(expr, rhs);
        }
        Ok(expr)
    }

    fn parse_definition(&mut self) -> Result<ListExpr, SyntaxError> {
        // Look-ahead: a word followed by '=' starts a definition.
        if let (Token::Word(w), Token::Assign) = (self.peek(), self.peek2()) {
            let word = w.clone();
            if !word.contains('@') {
                self.pos += 2; // consume word + '='
                let name = ListName::new(&word)?;
                let value = self.parse_union()?;
                return Ok(ListExpr::definition(name, value));
            }
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<ListExpr, SyntaxError> {
        let mut expr = self.parse_difference()?;
        while self.eat(&Token::Comma) {
            let rhs = self.parse_difference()?;
            expr = ListExpr::union(expr, rhs);
        }
        Ok(expr)
    }

    fn parse_difference(&mut self) -> Result<ListExpr, SyntaxError> {
        let mut expr = self.parse_intersect()?;
        while self.eat(&Token::Bang) {
            let rhs = self.parse_intersect()?;
            expr = ListExpr::difference(expr, rhs);
        }
        Ok(expr)
    }

    fn parse_intersect(&mut self) -> Result<ListExpr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::Star) {
            let rhs = self.parse_primary()?;
            expr = ListExpr::intersect(expr, rhs);
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ListExpr, SyntaxError> {
        match self.peek().clone() {
            Token::Word(w) => {
                self.pos += 1;
                if w.contains('@') {
                    Ok(ListExpr::Recipient(Recipient::new(&w)?))
                } else {
                    Ok(ListExpr::Name(ListName::new(&w)?))
                }
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.parse_sequence()?;
                if !self.eat(&Token::RParen) {
                    return Err(SyntaxError::new(format!(
                        "expected ')', found {}",
                        self.peek()
                    )));
                }
                Ok(inner)
            }
            Token::Unknown(c) => Err(SyntaxError::new(format!("unexpected character '{c}'"))),
            // An absent operand is the empty list; leave the token for the
            // caller.
            _ => Ok(ListExpr::Empty),
        }
    }
}

/// Parse a list expression string into an AST.
pub fn parse(input: &str) -> Result<ListExpr, SyntaxError> {
    let lowered = input.to_lowercase();
    let tokens = Lexer::new(&lowered).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_sequence()?;
    if parser.peek() != &Token::Eof {
        return Err(SyntaxError::new(format!(
            "unexpected {} after expression",
            parser.peek()
        )));
    }
    Ok(expr)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ListName {
        ListName::new(s).unwrap()
    }

    fn name_expr(s: &str) -> ListExpr {
        ListExpr::Name(name(s))
    }

    fn recip(addr: &str) -> ListExpr {
        ListExpr::Recipient(Recipient::new(addr).unwrap())
    }

    #[test]
    fn empty_input_parses_to_empty() {
        assert_eq!(parse("").unwrap(), ListExpr::Empty);
        assert_eq!(parse("   ").unwrap(), ListExpr::Empty);
        assert_eq!(parse("()").unwrap(), ListExpr::Empty);
    }

    #[test]
    fn single_address_and_name() {
        assert_eq!(parse("a@b").unwrap(), recip("a@b"));
        assert_eq!(parse("cats").unwrap(), name_expr("cats"));
    }

    #[test]
    fn input_is_lowercased() {
        assert_eq!(parse("BEN@MIT.EDU").unwrap(), recip("ben@mit.edu"));
        assert_eq!(parse("CATS").unwrap(), name_expr("cats"));
    }

    #[test]
    fn union_is_left_associative() {
        assert_eq!(
            parse("a@b, c@d, e@f").unwrap(),
            ListExpr::union(ListExpr::union(recip("a@b"), recip("c@d")), recip("e@f"))
        );
    }

    #[test]
    fn parenthesization_changes_the_tree() {
        // Same recipient set, structurally different trees.
        let flat = parse("a@b, c@d, e@f").unwrap();
        let nested = parse("a@b, (c@d, e@f)").unwrap();
        assert_ne!(flat, nested);
    }

    #[test]
    fn precedence_star_over_bang_over_comma() {
        // a , b ! c * d  ==  a , (b ! (c * d))
        assert_eq!(
            parse("a@x, b@x ! c@x * d@x").unwrap(),
            ListExpr::union(
                recip("a@x"),
                ListExpr::difference(
                    recip("b@x"),
                    ListExpr::intersect(recip("c@x"), recip("d@x"))
                )
            )
        );
    }

    #[test]
    fn definition_binds_a_union() {
        assert_eq!(
            parse("x = a@b, c@d").unwrap(),
            ListExpr::definition(name("x"), ListExpr::union(recip("a@b"), recip("c@d")))
        );
    }

    #[test]
    fn sequence_splits_definitions() {
        // x = a,b ; y: the '=' captures only up to the ';'.
        assert_eq!(
            parse("x = a@b ; y").unwrap(),
            ListExpr::sequence(
                ListExpr::definition(name("x"), recip("a@b")),
                name_expr("y")
            )
        );
    }

    #[test]
    fn empty_operands_parse_to_empty() {
        assert_eq!(
            parse("a@b,").unwrap(),
            ListExpr::union(recip("a@b"), ListExpr::Empty)
        );
        assert_eq!(
            parse(",a@b").unwrap(),
            ListExpr::union(ListExpr::Empty, recip("a@b"))
        );
        assert_eq!(
            parse("x = ").unwrap(),
            ListExpr::definition(name("x"), ListExpr::Empty)
        );
    }

    #[test]
    fn definition_name_must_not_be_an_address() {
        assert!(parse("a@b = c@d").is_err());
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(parse("a@b@c").is_err());
        assert!(parse("@b").is_err());
        assert!(parse("a@").is_err());
    }

    #[test]
    fn unknown_characters_are_rejected() {
        assert!(parse("a#b").is_err());
        assert!(parse("a & b").is_err());
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert!(parse("a@b c@d").is_err());
        assert!(parse("(a@b) c@d").is_err());
        assert!(parse("a@b)").is_err());
    }

    #[test]
    fn unclosed_paren_is_rejected() {
        assert!(parse("(a@b, c@d").is_err());
    }

    #[test]
    fn display_round_trips() {
        for src in [
            "",
            "a@b",
            "cats",
            "(a@b, c@d)",
            "a@b, c@d ! e@f * g@h",
            "x = a@b, c@d",
            "x = a@b ; y = x, c@d ; (x * y)",
            "a@b, (x = c@d)",
        ] {
            let parsed = parse(src).unwrap();
            let reparsed = parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {src:?}");
        }
    }
}
