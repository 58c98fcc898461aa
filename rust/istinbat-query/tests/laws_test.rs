use std::collections::HashMap;

use anyhow::Result;
use istinbat_query::{Engine, Fact, QueryResult, Rule, Solution, Substitution, Term, unify};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn atom(name: &str) -> Term {
    Term::atom(name)
}

fn var(name: &str) -> Term {
    Term::var(name)
}

fn call<const N: usize>(name: &str, arguments: [Term; N]) -> Term {
    Term::compound(name, arguments)
}

fn solve(engine: &Engine, query: Vec<Term>) -> QueryResult<Vec<Solution>> {
    engine.query(query).collect()
}

fn arbitrary_term() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["a", "b", "c"]).prop_map(Term::atom),
        prop::sample::select(vec!["X", "Y", "Z"]).prop_map(Term::var),
        (-3i64..3).prop_map(Term::integer),
        Just(Term::Nil),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (
                prop::sample::select(vec!["f", "g"]),
                prop::collection::vec(inner.clone(), 1..3)
            )
                .prop_map(|(functor, arguments)| Term::compound(functor, arguments)),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(heads, tail)| Term::list_pattern(heads, tail)),
        ]
    })
}

/// Structural equality up to a consistent renaming of variables
fn alpha_equivalent(left: &Term, right: &Term) -> bool {
    fn walk<'a>(
        left: &'a Term,
        right: &'a Term,
        forward: &mut HashMap<&'a str, &'a str>,
        backward: &mut HashMap<&'a str, &'a str>,
    ) -> bool {
        match (left, right) {
            (Term::Variable(a), Term::Variable(b)) => {
                *forward.entry(a).or_insert(b) == &**b && *backward.entry(b).or_insert(a) == &**a
            }
            (Term::Compound(a), Term::Compound(b)) => {
                a.functor() == b.functor()
                    && a.arity() == b.arity()
                    && a.arguments()
                        .iter()
                        .zip(b.arguments())
                        .all(|(x, y)| walk(x, y, forward, backward))
            }
            (Term::List(a), Term::List(b)) => {
                walk(&a.head, &b.head, forward, backward) && walk(&a.tail, &b.tail, forward, backward)
            }
            (a, b) => !a.is_variable() && !b.is_variable() && a == b,
        }
    }
    walk(left, right, &mut HashMap::new(), &mut HashMap::new())
}

proptest! {
    #[test]
    fn unification_is_symmetric(left in arbitrary_term(), right in arbitrary_term()) {
        let forward = unify(&left, &right, Substitution::new());
        let backward = unify(&right, &left, Substitution::new());
        prop_assert_eq!(forward.is_some(), backward.is_some());
        if let (Some(forward), Some(backward)) = (forward, backward) {
            let pair = call("pair", [left.clone(), right.clone()]);
            prop_assert_eq!(forward.resolve(&left), forward.resolve(&right));
            prop_assert_eq!(backward.resolve(&left), backward.resolve(&right));
            prop_assert!(alpha_equivalent(&forward.resolve(&pair), &backward.resolve(&pair)));
        }
    }

    #[test]
    fn a_variable_never_unifies_with_a_term_containing_it(context in arbitrary_term()) {
        let containing = call("f", [context, var("X")]);
        prop_assert!(unify(&var("X"), &containing, Substitution::new()).is_none());
        prop_assert!(unify(&containing, &var("X"), Substitution::new()).is_none());
    }

    #[test]
    fn mutations_in_a_fork_stay_in_the_fork(names in prop::collection::vec("[a-e]", 1..6)) {
        let mut engine = Engine::new();
        engine.assertz(Fact::new(call("seed", [atom("a")])).unwrap());
        prop_assert!(engine.create_world("B", Some("Reality")));
        prop_assert!(engine.switch_world("B"));
        for name in &names {
            engine.assertz(Fact::new(call("seed", [atom(name)])).unwrap());
        }
        engine.retract(&call("seed", [atom("a")]));

        prop_assert!(engine.switch_world("Reality"));
        let seeds = solve(&engine, vec![call("seed", [var("S")])]).unwrap();
        prop_assert_eq!(seeds.len(), 1);
        prop_assert_eq!(seeds[0].get("S"), Some(&atom("a")));
    }
}

#[test]
fn occurs_check_on_the_canonical_example() {
    assert!(unify(&var("X"), &call("f", [var("X")]), Substitution::new()).is_none());
}

#[test]
fn solving_twice_gives_the_same_bindings() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("edge", [atom("a"), atom("b")]))?);
    engine.assertz(Fact::new(call("edge", [atom("b"), atom("c")]))?);
    engine.assertz(Rule::new(
        call("path", [var("X"), var("Y")]),
        [call("edge", [var("X"), var("Y")])],
    )?);
    engine.assertz(Rule::new(
        call("path", [var("X"), var("Z")]),
        [call("edge", [var("X"), var("Y")]), call("path", [var("Y"), var("Z")])],
    )?);

    let query = vec![call("path", [atom("a"), var("End")])];
    let first = solve(&engine, query.clone())?;
    let second = solve(&engine, query)?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    Ok(())
}

#[test]
fn probability_is_the_product_of_consumed_facts() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(atom("cloudy"))?.with_probability(0.5)?);
    engine.assertz(Fact::new(atom("cold"))?.with_probability(0.6)?);
    engine.assertz(Rule::new(atom("snow"), [atom("cloudy"), atom("cold")])?);

    let solutions = solve(&engine, vec![atom("snow"), call("probability", [var("P")])])?;
    assert_eq!(solutions.len(), 1);
    assert!((solutions[0].probability() - 0.3).abs() < 1e-12);
    assert!(solutions[0].probability() <= 1.0);
    let reported = solutions[0].get("P").and_then(Term::as_number).map(|p| p.as_f64());
    assert!(reported.is_some_and(|p| (p - 0.3).abs() < 1e-12));
    Ok(())
}

#[test]
fn rule_probability_multiplies_in() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(atom("rain"))?.with_probability(0.5)?);
    engine.assertz(Rule::new(atom("wet"), [atom("rain")])?.with_probability(0.8)?);
    let solutions = solve(&engine, vec![atom("wet")])?;
    assert!((solutions[0].probability() - 0.4).abs() < 1e-12);
    Ok(())
}

#[test]
fn an_untouched_fork_has_no_differences() {
    let mut engine = Engine::new();
    engine.must("exists", [atom("oil")]);
    engine.assertz(Rule::new(atom("rich"), [call("exists", [atom("oil")])]).unwrap());
    assert!(engine.create_world("B", Some("Reality")));
    assert_eq!(engine.compare_worlds("Reality", "B"), Some(vec![]));
    assert_eq!(engine.compare_worlds("Reality", "Nowhere"), None);
}

#[test]
fn assert_then_retract_restores_answers() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("p", [atom("a")]))?);
    let query = vec![call("p", [var("X")])];
    let before = solve(&engine, query.clone())?;

    let extra = call("p", [atom("b")]);
    engine.assertz(Fact::new(extra.clone())?);
    assert!(engine.retract(&extra));
    assert_eq!(solve(&engine, query)?, before);
    Ok(())
}

#[test]
fn collection_predicates_honour_their_contracts() -> Result<()> {
    let mut engine = Engine::new();
    for value in [3, 1, 3, 2] {
        engine.assertz(Fact::new(call("n", [Term::integer(value)]))?);
    }
    let goal = call("n", [var("X")]);
    let collected = |name: &str| -> Result<Vec<Solution>> {
        Ok(solve(&engine, vec![Term::compound(name, [var("X"), goal.clone(), var("L")])])?)
    };
    let list = |values: &[i64]| Term::list(values.iter().map(|value| Term::integer(*value)));

    let findall = collected("findall")?;
    assert_eq!(findall.len(), 1);
    assert_eq!(findall[0].get("L"), Some(&list(&[3, 1, 3, 2])));

    let bagof = collected("bagof")?;
    assert_eq!(bagof[0].get("L"), Some(&list(&[3, 1, 3, 2])));

    let setof = collected("setof")?;
    assert_eq!(setof.len(), 1);
    assert_eq!(setof[0].get("L"), Some(&list(&[1, 2, 3])));

    let none = call("missing", [var("X")]);
    assert!(solve(&engine, vec![call("setof", [var("X"), none.clone(), var("L")])])?.is_empty());
    assert_eq!(solve(&engine, vec![call("findall", [var("X"), none, var("L")])])?.len(), 1);
    Ok(())
}

#[test]
fn setof_sorts_mixed_integers_and_floats() -> Result<()> {
    let mut engine = Engine::new();
    let values = [
        Term::integer(i64::MAX),
        Term::float(i64::MAX as f64),
        Term::integer(i64::MAX - 1),
        Term::integer(i64::MAX - 2),
        Term::float(1.0),
        Term::integer(i64::MAX - 3),
    ];
    for _ in 0..5 {
        for value in &values {
            engine.assertz(Fact::new(call("n", [value.clone()]))?);
        }
    }

    let solutions = solve(&engine, vec![call("setof", [var("X"), call("n", [var("X")]), var("L")])])?;
    assert_eq!(solutions.len(), 1);
    let expected = Term::list([
        Term::float(1.0),
        Term::integer(i64::MAX - 3),
        Term::integer(i64::MAX - 2),
        Term::integer(i64::MAX - 1),
        Term::integer(i64::MAX),
        Term::float(i64::MAX as f64),
    ]);
    assert_eq!(solutions[0].get("L"), Some(&expected));
    Ok(())
}

#[test]
fn long_lists_unify_with_facts() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("p", [var("X")]))?);
    let long = Term::list((0..50_000).map(Term::integer));
    assert!(engine.ask(call("p", [long.clone()]))?);

    engine.assertz(Fact::new(call("q", [long.clone()]))?);
    let solutions = solve(&engine, vec![call("q", [var("L")])])?;
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("L"), Some(&long));
    Ok(())
}

#[test]
fn cut_commits_the_clause_and_earlier_goals() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("a", [atom("x1")]))?);
    engine.assertz(Fact::new(call("a", [atom("x2")]))?);
    engine.assertz(Fact::new(call("b", [atom("x2")]))?);
    // p(X) :- a(X), !, b(X).
    engine.assertz(Rule::new(
        call("p", [var("X")]),
        [call("a", [var("X")]), Term::cut(), call("b", [var("X")])],
    )?);
    engine.assertz(Fact::new(call("p", [atom("fallback")]))?);

    // a(x1) succeeds, the cut commits, b(x1) fails: no x2, no fallback
    assert!(solve(&engine, vec![call("p", [var("X")])])?.is_empty());

    // Without the cut both alternatives would be found
    engine.retractall(&call("p", [var("_")]));
    engine.assertz(Rule::new(
        call("p", [var("X")]),
        [call("a", [var("X")]), call("b", [var("X")])],
    )?);
    engine.assertz(Fact::new(call("p", [atom("fallback")]))?);
    assert_eq!(solve(&engine, vec![call("p", [var("X")])])?.len(), 2);
    Ok(())
}

#[test]
fn cut_inside_findall_stays_local() -> Result<()> {
    let mut engine = Engine::new();
    for value in ["a", "b", "c"] {
        engine.assertz(Fact::new(call("item", [atom(value)]))?);
    }
    engine.assertz(Fact::new(call("choice", [atom("left")]))?);
    engine.assertz(Fact::new(call("choice", [atom("right")]))?);

    let inner = Term::conjunction([call("item", [var("X")]), Term::cut()]);
    let solutions = solve(
        &engine,
        vec![
            call("choice", [var("C")]),
            call("findall", [var("X"), inner, var("L")]),
        ],
    )?;
    // The cut trims the items to one, but both choices survive
    assert_eq!(solutions.len(), 2);
    for solution in &solutions {
        assert_eq!(solution.get("L"), Some(&Term::list([atom("a")])));
    }
    Ok(())
}

#[test]
fn negation_as_failure() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("bird", [atom("tweety")]))?);
    engine.assertz(Fact::new(call("bird", [atom("pingu")]))?);
    engine.assertz(Fact::new(call("penguin", [atom("pingu")]))?);
    engine.assertz(Rule::new(
        call("flies", [var("B")]),
        [call("bird", [var("B")]), call("not", [call("penguin", [var("B")])])],
    )?);

    let flyers = solve(&engine, vec![call("flies", [var("B")])])?;
    assert_eq!(flyers.len(), 1);
    assert_eq!(flyers[0].get("B"), Some(&atom("tweety")));
    Ok(())
}
