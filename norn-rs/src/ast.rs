//! List expression AST: recipients, list names, and the expression tree.
//!
//! All three types are immutable values.  Addresses and names are lowercased
//! at construction, so the derived structural equality and hashing of
//! [`ListExpr`] are automatically case-insensitive at the leaves.
//!
//! Equality is structural, not semantic: `(a, b)` and `(b, a)` evaluate to
//! the same recipient set but are distinct trees and compare unequal.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

// ── Recipient ─────────────────────────────────────────────────────────────────

/// A single email address, held in canonical lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Recipient(String);

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9._-]+@[a-z0-9._-]+$").unwrap())
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9._-]+$").unwrap())
}

/// Rejected address or list name text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidToken {
    pub text: String,
    pub expected: &'static str,
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not a valid {}", self.text, self.expected)
    }
}

impl std::error::Error for InvalidToken {}

impl Recipient {
    /// Create a recipient, lowercasing the address.
    ///
    /// The address must be `user@domain` where both sides are nonempty
    /// strings of letters, digits, underscores, dashes, and periods.
    pub fn new(address: &str) -> Result<Self, InvalidToken> {
        let address = address.to_lowercase();
        if !address_re().is_match(&address) {
            return Err(InvalidToken {
                text: address,
                expected: "email address",
            });
        }
        Ok(Recipient(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── ListName ──────────────────────────────────────────────────────────────────

/// The name of a defined mailing list, held in canonical lowercase form.
///
/// Used both as a [`ListExpr::Name`] leaf and as an environment key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListName(String);

impl ListName {
    /// Create a list name, lowercasing it.  Names are nonempty strings of
    /// letters, digits, underscores, dashes, and periods.
    pub fn new(name: &str) -> Result<Self, InvalidToken> {
        let name = name.to_lowercase();
        if !name_re().is_match(&name) {
            return Err(InvalidToken {
                text: name,
                expected: "list name",
            });
        }
        Ok(ListName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── ListExpr ──────────────────────────────────────────────────────────────────

/// An immutable list expression tree.
///
/// Evaluation semantics live in [`crate::eval`]; this type is pure data.
/// `Display` output is reparsable: for every tree `e`,
/// `parse(&e.to_string())` yields a tree equal to `e`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListExpr {
    /// The empty recipient set.
    Empty,
    /// A single email address.
    Recipient(Recipient),
    /// A named list, resolved through the environment at evaluation time.
    Name(ListName),
    /// `left , right`
    Union(Box<ListExpr>, Box<ListExpr>),
    /// `left ! right`
    Difference(Box<ListExpr>, Box<ListExpr>),
    /// `left * right`
    Intersect(Box<ListExpr>, Box<ListExpr>),
    /// `left ; right` - evaluate `left` for its definitions, yield `right`.
    Sequence(Box<ListExpr>, Box<ListExpr>),
    /// `name = value` - bind `name`, yield `value`'s recipients.
    Definition(ListName, Box<ListExpr>),
}

impl ListExpr {
    pub fn union(left: ListExpr, right: ListExpr) -> ListExpr {
        ListExpr::Union(Box::new(left), Box::new(right))
    }

    pub fn difference(left: ListExpr, right: ListExpr) -> ListExpr {
        ListExpr::Difference(Box::new(left), Box::new(right))
    }

    pub fn intersect(left: ListExpr, right: ListExpr) -> ListExpr {
        ListExpr::Intersect(Box::new(left), Box::new(right))
    }

    pub fn sequence(left: ListExpr, right: ListExpr) -> ListExpr {
        ListExpr::Sequence(Box::new(left), Box::new(right))
    }

    pub fn definition(name: ListName, value: ListExpr) -> ListExpr {
        ListExpr::Definition(name, Box::new(value))
    }
}

impl fmt::Display for ListExpr {
    /// Parenthesized so that nested definitions and sequences survive a
    /// reparse in operand position.  `Empty` prints as nothing, which the
    /// parser reads back as an empty operand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListExpr::Empty => Ok(()),
            ListExpr::Recipient(r) => write!(f, "{r}"),
            ListExpr::Name(n) => write!(f, "{n}"),
            ListExpr::Union(l, r) => write!(f, "({l}, {r})"),
            ListExpr::Difference(l, r) => write!(f, "({l} ! {r})"),
            ListExpr::Intersect(l, r) => write!(f, "({l} * {r})"),
            ListExpr::Sequence(l, r) => write!(f, "({l}; {r})"),
            ListExpr::Definition(n, v) => write!(f, "({n} = {v})"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
