//! Norn: a small expression language for mailing-list recipient sets.
//!
//! Expressions combine email addresses and named lists with set operators:
//! `,` (union), `!` (difference), `*` (intersection), `=` (definition), and
//! `;` (sequencing), with parentheses for grouping.  Definitions live in a
//! session-wide [`Environment`] that rejects mutually recursive
//! definitions (mail loops) at assignment time.
//!
//! # Quick start
//!
//! ```rust
//! use norn::{parse, recipients, Environment};
//!
//! let env = Environment::new();
//! let expr = parse("cats = a@mit.edu, b@mit.edu ; cats * b@mit.edu").unwrap();
//! let set = recipients(&expr, &env).unwrap();
//! assert_eq!(set.len(), 1);
//! ```

pub mod ast;
pub mod cli;
pub mod console;
pub mod environment;
pub mod eval;
pub mod parser;
pub mod session;
pub mod web;

// Re-exports for convenience.
pub use ast::{ListExpr, ListName, Recipient};
pub use environment::{Environment, MailLoopError};
pub use eval::recipients;
pub use parser::{parse, SyntaxError};
