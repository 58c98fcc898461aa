//! Robinson unification with occurs check
//!
//! List patterns need no special case: `[H1, …, Hk | T]` is a chain of list
//! cells with an open tail, so matching it against a list of length `n >= k`
//! binds the heads pairwise and `T` to the remaining `n - k` elements, and two
//! patterns unify cell by cell.

use crate::substitution::Substitution;
use crate::term::Term;

/// Unify `left` with `right`, extending `substitution`
///
/// Returns `None` when the terms cannot be made equal. No partial bindings
/// escape a failed unification.
pub fn unify(left: &Term, right: &Term, substitution: Substitution) -> Option<Substitution> {
    let mut substitution = substitution;
    let mut pending = vec![(left.clone(), right.clone())];

    while let Some((left, right)) = pending.pop() {
        let left = substitution.walk(&left).clone();
        let right = substitution.walk(&right).clone();

        match (&left, &right) {
            (Term::Variable(a), Term::Variable(b)) if a == b => {}
            (Term::Variable(name), other) | (other, Term::Variable(name)) => {
                if occurs(name, other, &substitution) {
                    return None;
                }
                substitution = substitution.bind(name.clone(), other.clone());
            }
            (Term::Compound(a), Term::Compound(b)) => {
                if a.functor() != b.functor() || a.arity() != b.arity() {
                    return None;
                }
                // Pushed in reverse so arguments are visited left to right
                for pair in a.arguments().iter().zip(b.arguments()).rev() {
                    pending.push((pair.0.clone(), pair.1.clone()));
                }
            }
            (Term::List(a), Term::List(b)) => {
                pending.push((a.tail.clone(), b.tail.clone()));
                pending.push((a.head.clone(), b.head.clone()));
            }
            (Term::Compound(_), _) | (_, Term::Compound(_)) => return None,
            (Term::List(_), _) | (_, Term::List(_)) => return None,
            (a, b) if a == b => {}
            _ => return None,
        }
    }

    Some(substitution)
}

/// Does the variable `name` occur in `term` once bindings are followed?
pub fn occurs(name: &str, term: &Term, substitution: &Substitution) -> bool {
    let mut pending = vec![term];
    while let Some(term) = pending.pop() {
        match substitution.walk(term) {
            Term::Variable(candidate) => {
                if &**candidate == name {
                    return true;
                }
            }
            Term::Compound(compound) => pending.extend(compound.arguments()),
            Term::List(cell) => {
                pending.push(&cell.head);
                pending.push(&cell.tail);
            }
            Term::Atom(_) | Term::Number(_) | Term::String(_) | Term::Nil => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(items: &[i64]) -> Term {
        Term::list(items.iter().map(|item| Term::integer(*item)))
    }

    #[test]
    fn it_binds_variables_in_compounds() {
        let left = Term::compound("parent", [Term::var("X"), Term::atom("ann")]);
        let right = Term::compound("parent", [Term::atom("bob"), Term::var("Y")]);
        let substitution = unify(&left, &right, Substitution::new()).unwrap();
        assert_eq!(substitution.resolve(&left), substitution.resolve(&right));
        assert_eq!(substitution.resolve(&Term::var("X")), Term::atom("bob"));
    }

    #[test]
    fn it_rejects_functor_or_arity_mismatches() {
        let one = Term::compound("f", [Term::atom("a")]);
        let two = Term::compound("f", [Term::atom("a"), Term::atom("b")]);
        let other = Term::compound("g", [Term::atom("a")]);
        assert!(unify(&one, &two, Substitution::new()).is_none());
        assert!(unify(&one, &other, Substitution::new()).is_none());
    }

    #[test]
    fn it_performs_the_occurs_check() {
        let x = Term::var("X");
        let fx = Term::compound("f", [Term::var("X")]);
        assert!(unify(&x, &fx, Substitution::new()).is_none());
        assert!(unify(&fx, &x, Substitution::new()).is_none());
    }

    #[test]
    fn a_pattern_matches_lists_long_enough() {
        let pattern = Term::list_pattern([Term::var("A"), Term::var("B")], Term::var("T"));

        let substitution = unify(&pattern, &list(&[1, 2, 3]), Substitution::new()).unwrap();
        assert_eq!(substitution.resolve(&Term::var("A")), Term::integer(1));
        assert_eq!(substitution.resolve(&Term::var("T")), list(&[3]));

        let exact = unify(&pattern, &list(&[1, 2]), Substitution::new()).unwrap();
        assert_eq!(exact.resolve(&Term::var("T")), Term::Nil);

        assert!(unify(&pattern, &list(&[1]), Substitution::new()).is_none());
    }

    #[test]
    fn two_patterns_unify_cell_by_cell() {
        let left = Term::list_pattern([Term::integer(1)], Term::var("T"));
        let right = Term::list_pattern([Term::var("H"), Term::integer(2)], Term::var("R"));
        let substitution = unify(&left, &right, Substitution::new()).unwrap();
        assert_eq!(
            substitution.resolve(&left).to_string(),
            "[1, 2 | ?R]"
        );
    }

    #[test]
    fn plain_lists_need_equal_length() {
        assert!(unify(&list(&[1, 2]), &list(&[1, 2]), Substitution::new()).is_some());
        assert!(unify(&list(&[1, 2]), &list(&[1, 2, 3]), Substitution::new()).is_none());
    }

    #[test]
    fn numbers_unify_numerically() {
        assert!(unify(&Term::integer(2), &Term::float(2.0), Substitution::new()).is_some());
        assert!(unify(&Term::atom("a"), &Term::string("a"), Substitution::new()).is_none());
    }

    #[test]
    fn failure_leaves_no_partial_bindings() {
        let base = Substitution::new();
        let left = Term::compound("p", [Term::var("X"), Term::atom("a")]);
        let right = Term::compound("p", [Term::atom("b"), Term::atom("c")]);
        assert!(unify(&left, &right, base.clone()).is_none());
        assert!(base.is_empty());
    }
}
