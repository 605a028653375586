//! The mutable name-binding environment shared by a whole session.
//!
//! An [`Environment`] maps list names to the expressions that define them.
//! Any name absent from the table denotes the empty list.  All reads and
//! writes go through one mutex so that a full expression evaluation (which
//! may install bindings along the way) observes and produces a consistent
//! table even with concurrent web requests.
//!
//! [`reassign`](Environment::reassign) guards the table's invariant: the
//! graph formed by following name references through current bindings never
//! contains a cycle of two or more distinct names (a "mail loop", which
//! would make evaluation non-terminating).  A name referencing itself
//! directly is legal, because definition evaluation resolves the right-hand
//! side against the old binding before the new one is installed.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::ast::{ListExpr, ListName};

/// The binding table proper.  Owned by [`Environment`] behind its lock;
/// the evaluator works directly on a locked table so that an entire
/// evaluation is one critical section.
pub(crate) type Bindings = HashMap<ListName, ListExpr>;

// ── MailLoopError ─────────────────────────────────────────────────────────────

/// A rejected reassignment: committing it would create a cycle of mutually
/// recursive list definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailLoopError {
    /// The names along the offending cycle, in dependency order, ending
    /// where the cycle closes.  Always at least two distinct names.
    pub names: Vec<ListName>,
}

impl fmt::Display for MailLoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = self.names.iter().map(ListName::as_str).collect();
        write!(f, "mail loop: {}", chain.join(" -> "))
    }
}

impl std::error::Error for MailLoopError {}

// ── Environment ───────────────────────────────────────────────────────────────

/// Thread-safe table of current list definitions for one session.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: Mutex<Bindings>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the binding table for the duration of one evaluation.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Bindings> {
        // Lock poisoning only happens if a panic escaped the evaluator,
        // which is itself a bug; propagating the panic is fine.
        self.bindings.lock().unwrap()
    }

    /// The expression bound to `name`, or [`ListExpr::Empty`] if unbound.
    pub fn get(&self, name: &ListName) -> ListExpr {
        self.lock().get(name).cloned().unwrap_or(ListExpr::Empty)
    }

    /// All currently bound names, sorted.
    pub fn names(&self) -> Vec<ListName> {
        let mut names: Vec<ListName> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Bind `name` to `expr`, returning the previous binding (`Empty` if
    /// there was none).
    ///
    /// The mail-loop check runs against the candidate table (current
    /// bindings plus the tentative one) before anything is committed, so a
    /// rejected reassignment leaves the environment untouched.
    pub fn reassign(&self, name: &ListName, expr: ListExpr) -> Result<ListExpr, MailLoopError> {
        reassign_locked(&mut self.lock(), name, expr)
    }
}

/// Check-then-commit on an already locked table.  The evaluator calls this
/// for nested definitions so the whole evaluation stays in one critical
/// section.
pub(crate) fn reassign_locked(
    table: &mut Bindings,
    name: &ListName,
    expr: ListExpr,
) -> Result<ListExpr, MailLoopError> {
    check_no_loops(table, name, &expr)?;
    let previous = table.insert(name.clone(), expr);
    Ok(previous.unwrap_or(ListExpr::Empty))
}

// ── Mail-loop detection ───────────────────────────────────────────────────────

/// Depth-first reachability walk over the candidate table.
///
/// Visit state is per call: `trail` holds the names currently being
/// expanded along one dependency chain, `finished` the names already proven
/// loop-free.  A name re-encountered while still on the trail closes a
/// cycle.  A direct self-edge (a name appearing inside its own definition)
/// is skipped rather than followed, which is exactly the degenerate 1-cycle
/// the invariant permits.
fn check_no_loops(
    table: &Bindings,
    reassigned: &ListName,
    expr: &ListExpr,
) -> Result<(), MailLoopError> {
    let candidate = Candidate {
        table,
        reassigned,
        expr,
    };
    let mut finished: HashSet<ListName> = HashSet::new();
    let mut trail: Vec<ListName> = Vec::new();

    // Every binding of the candidate table must stay loop-free, not just
    // the one being reassigned.
    candidate.visit(reassigned, &mut trail, &mut finished)?;
    for start in table.keys() {
        candidate.visit(start, &mut trail, &mut finished)?;
    }
    Ok(())
}

/// The binding table as it would look after the reassignment committed.
struct Candidate<'a> {
    table: &'a Bindings,
    reassigned: &'a ListName,
    expr: &'a ListExpr,
}

impl<'a> Candidate<'a> {
    fn get(&self, name: &ListName) -> Option<&'a ListExpr> {
        if name == self.reassigned {
            Some(self.expr)
        } else {
            self.table.get(name)
        }
    }

    fn visit(
        &self,
        name: &ListName,
        trail: &mut Vec<ListName>,
        finished: &mut HashSet<ListName>,
    ) -> Result<(), MailLoopError> {
        if finished.contains(name) {
            return Ok(());
        }
        if let Some(at) = trail.iter().position(|n| n == name) {
            let mut names = trail[at..].to_vec();
            names.push(name.clone());
            return Err(MailLoopError { names });
        }
        let Some(definition) = self.get(name) else {
            // Unbound names denote the empty list; nothing to follow.
            return Ok(());
        };
        trail.push(name.clone());
        let result = self.walk(definition, name, trail, finished);
        trail.pop();
        result?;
        finished.insert(name.clone());
        Ok(())
    }

    /// Walk one definition tree, following every name it mentions except
    /// the owner itself (the permitted self-reference).
    fn walk(
        &self,
        expr: &ListExpr,
        owner: &ListName,
        trail: &mut Vec<ListName>,
        finished: &mut HashSet<ListName>,
    ) -> Result<(), MailLoopError> {
        match expr {
            ListExpr::Empty | ListExpr::Recipient(_) => Ok(()),
            ListExpr::Name(n) => {
                if n == owner {
                    Ok(())
                } else {
                    self.visit(n, trail, finished)
                }
            }
            ListExpr::Union(l, r)
            | ListExpr::Difference(l, r)
            | ListExpr::Intersect(l, r)
            | ListExpr::Sequence(l, r) => {
                self.walk(l, owner, trail, finished)?;
                self.walk(r, owner, trail, finished)
            }
            ListExpr::Definition(n, v) => {
                if n != owner {
                    self.visit(n, trail, finished)?;
                }
                self.walk(v, owner, trail, finished)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
