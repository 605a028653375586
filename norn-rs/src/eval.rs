//! Recursive evaluation of list expressions into recipient sets.
//!
//! [`recipients`] is the single public entry point.  It takes the
//! environment lock once and holds it for the whole tree walk, so an
//! evaluation that installs definitions along the way (via `Definition` or
//! `Sequence` nodes) is atomic with respect to concurrent console and web
//! callers.
//!
//! Evaluation is total: undefined names resolve to the empty set, and a
//! name whose stored definition mentions itself (the permitted
//! self-reference) is cut off at the point of re-entry instead of recursing
//! forever.  The only error that can surface is a [`MailLoopError`] from a
//! nested definition's reassignment.

use std::collections::BTreeSet;

use crate::ast::{ListExpr, ListName, Recipient};
use crate::environment::{self, Bindings, Environment, MailLoopError};

/// The set of unique recipients denoted by `expr`, resolved against (and
/// possibly modifying) `env`.
pub fn recipients(
    expr: &ListExpr,
    env: &Environment,
) -> Result<BTreeSet<Recipient>, MailLoopError> {
    let mut table = env.lock();
    let mut expanding = Vec::new();
    eval(expr, &mut table, &mut expanding)
}

fn eval(
    expr: &ListExpr,
    table: &mut Bindings,
    expanding: &mut Vec<ListName>,
) -> Result<BTreeSet<Recipient>, MailLoopError> {
    match expr {
        ListExpr::Empty => Ok(BTreeSet::new()),

        ListExpr::Recipient(r) => {
            let mut set = BTreeSet::new();
            set.insert(r.clone());
            Ok(set)
        }

        ListExpr::Name(n) => {
            // Re-entering a name already being expanded can only happen
            // through a stored self-reference; it denotes the empty list.
            if expanding.contains(n) {
                return Ok(BTreeSet::new());
            }
            let Some(definition) = table.get(n).cloned() else {
                return Ok(BTreeSet::new());
            };
            expanding.push(n.clone());
            let result = eval(&definition, table, expanding);
            expanding.pop();
            result
        }

        ListExpr::Union(l, r) => {
            let mut set = eval(l, table, expanding)?;
            set.extend(eval(r, table, expanding)?);
            Ok(set)
        }

        ListExpr::Difference(l, r) => {
            let left = eval(l, table, expanding)?;
            let right = eval(r, table, expanding)?;
            Ok(left.difference(&right).cloned().collect())
        }

        ListExpr::Intersect(l, r) => {
            let left = eval(l, table, expanding)?;
            let right = eval(r, table, expanding)?;
            Ok(left.intersection(&right).cloned().collect())
        }

        ListExpr::Sequence(l, r) => {
            // Left side runs only for its definitions; its value is
            // discarded.
            eval(l, table, expanding)?;
            eval(r, table, expanding)
        }

        ListExpr::Definition(n, v) => {
            // Evaluate the value against the current table first, so a
            // right-hand side mentioning `n` resolves to the old binding,
            // then commit through the guarded reassignment.
            let result = eval(v, table, expanding)?;
            environment::reassign_locked(table, n, (**v).clone())?;
            Ok(result)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
