//! Property tests for the expression algebra and the parser.
//!
//! Set-operator trees (no definitions, no sequencing) evaluate without
//! side effects, so each case runs against a fresh environment and the
//! evaluated sets can be compared against plain `BTreeSet` operations.

use std::collections::BTreeSet;

use proptest::prelude::*;

use norn::{parse, recipients, Environment, ListExpr, ListName, Recipient};

// ── Generators ────────────────────────────────────────────────────────────────

fn any_recipient() -> impl Strategy<Value = ListExpr> {
    "[a-z0-9][a-z0-9._-]{0,6}@[a-z0-9.-]{1,8}"
        .prop_map(|addr| ListExpr::Recipient(Recipient::new(&addr).unwrap()))
}

fn any_name() -> impl Strategy<Value = ListExpr> {
    "[a-z][a-z0-9._-]{0,6}".prop_map(|n| ListExpr::Name(ListName::new(&n).unwrap()))
}

/// Trees built only from leaves and the three set operators.
fn set_expr() -> impl Strategy<Value = ListExpr> {
    let leaf = prop_oneof![
        1 => Just(ListExpr::Empty),
        4 => any_recipient(),
        2 => any_name(),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::union(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::difference(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| ListExpr::intersect(l, r)),
        ]
    })
}

/// Arbitrary trees over the whole datatype, including definitions and
/// sequences.  Used for structural properties (display round trip), which
/// never evaluate.
fn any_expr() -> impl Strategy<Value = ListExpr> {
    let leaf = prop_oneof![
        1 => Just(ListExpr::Empty),
        4 => any_recipient(),
        2 => any_name(),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::union(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::difference(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::intersect(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| ListExpr::sequence(l, r)),
            ("[a-z][a-z0-9]{0,5}", inner).prop_map(|(n, v)| {
                ListExpr::definition(ListName::new(&n).unwrap(), v)
            }),
        ]
    })
}

fn eval_pure(expr: &ListExpr) -> BTreeSet<Recipient> {
    let env = Environment::new();
    recipients(expr, &env).unwrap()
}

// ── Properties ────────────────────────────────────────────────────────────────

proptest! {
    /// Evaluated unions are commutative even though the trees are not equal.
    #[test]
    fn union_of_sets_is_commutative(a in set_expr(), b in set_expr()) {
        let ab = eval_pure(&ListExpr::union(a.clone(), b.clone()));
        let ba = eval_pure(&ListExpr::union(b, a));
        prop_assert_eq!(ab, ba);
    }

    /// Difference of evaluated sets matches plain set difference.
    #[test]
    fn difference_matches_set_difference(a in set_expr(), b in set_expr()) {
        let via_expr = eval_pure(&ListExpr::difference(a.clone(), b.clone()));
        let expected: BTreeSet<Recipient> =
            eval_pure(&a).difference(&eval_pure(&b)).cloned().collect();
        prop_assert_eq!(via_expr, expected);
    }

    /// Intersection of evaluated sets matches plain set intersection.
    #[test]
    fn intersect_matches_set_intersection(a in set_expr(), b in set_expr()) {
        let via_expr = eval_pure(&ListExpr::intersect(a.clone(), b.clone()));
        let expected: BTreeSet<Recipient> =
            eval_pure(&a).intersection(&eval_pure(&b)).cloned().collect();
        prop_assert_eq!(via_expr, expected);
    }

    /// Union with the empty expression changes nothing.
    #[test]
    fn empty_is_a_union_identity(a in set_expr()) {
        let with_empty = eval_pure(&ListExpr::union(a.clone(), ListExpr::Empty));
        prop_assert_eq!(with_empty, eval_pure(&a));
    }

    /// Unbound names always evaluate to the empty set.
    #[test]
    fn unbound_names_are_empty(n in "[a-z][a-z0-9._-]{0,8}") {
        let expr = ListExpr::Name(ListName::new(&n).unwrap());
        prop_assert!(eval_pure(&expr).is_empty());
    }

    /// Display output reparses to a structurally equal tree.
    #[test]
    fn display_round_trips(expr in any_expr()) {
        let printed = expr.to_string();
        let reparsed = parse(&printed);
        prop_assert_eq!(reparsed.unwrap(), expr, "printed as {:?}", printed);
    }

    /// The parser returns Ok or Err but never panics.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let _ = parse(&s);
    }
}
