use anyhow::Result;
use istinbat_query::{
    Clause, Commit, DEFAULT_WORLD, Difference, Engine, Fact, Modal, QueryError, ResolverConfig, Rule, Temporal,
    Term,
};
use pretty_assertions::assert_eq;

fn atom(name: &str) -> Term {
    Term::atom(name)
}

fn var(name: &str) -> Term {
    Term::var(name)
}

fn call<const N: usize>(name: &str, arguments: [Term; N]) -> Term {
    Term::compound(name, arguments)
}

#[test]
fn it_starts_in_reality() {
    let engine = Engine::new();
    assert_eq!(engine.current_world(), DEFAULT_WORLD);
    assert_eq!(engine.worlds().collect::<Vec<_>>(), vec!["Reality"]);
    assert_eq!(engine.config(), &ResolverConfig::default());
}

#[test]
fn world_names_are_unique_and_must_exist() {
    let mut engine = Engine::new();
    assert!(engine.create_world("Dream", None));
    assert!(!engine.create_world("Dream", None));
    assert!(!engine.create_world("Orphan", Some("Missing")));
    assert!(!engine.switch_world("Missing"));
    assert_eq!(engine.current_world(), "Reality");
}

#[test]
fn it_forks_the_current_world_by_default() -> Result<()> {
    let mut engine = Engine::new();
    assert!(engine.create_world("A", None));
    assert!(engine.switch_world("A"));
    engine.assertz(Fact::new(atom("only_in_a"))?);

    assert!(engine.create_world("B", None));
    assert!(engine.switch_world("B"));
    assert!(engine.ask(atom("only_in_a"))?);

    assert!(engine.switch_world("Reality"));
    assert!(!engine.ask(atom("only_in_a"))?);
    Ok(())
}

#[test]
fn only_inactive_non_default_worlds_can_be_removed() {
    let mut engine = Engine::new();
    assert!(engine.create_world("Scratch", None));
    assert!(engine.switch_world("Scratch"));
    assert!(!engine.remove_world("Scratch"));
    assert!(!engine.remove_world("Reality"));
    assert!(engine.switch_world("Reality"));
    assert!(engine.remove_world("Scratch"));
    assert!(!engine.remove_world("Scratch"));
}

#[test]
fn diffs_include_rules() -> Result<()> {
    let mut engine = Engine::new();
    assert!(engine.create_world("Future", None));
    assert!(engine.switch_world("Future"));
    let rule = Rule::new(atom("prosperity"), [call("energy", [atom("solar")])])?;
    engine.assertz(rule.clone());
    assert_eq!(
        engine.compare_worlds("Reality", "Future"),
        Some(vec![Difference::Added(Clause::Rule(rule))])
    );
    Ok(())
}

#[test]
fn modal_facts() -> Result<()> {
    let mut engine = Engine::new();
    engine.must("exists", [atom("gravity")]);
    engine.can("rains", [atom("tomorrow")]);
    engine.assertz(Fact::new(call("shines", [atom("sun")]))?);

    assert!(engine.is_necessary("exists", [atom("gravity")]));
    assert!(!engine.is_necessary("rains", [atom("tomorrow")]));
    assert!(!engine.is_necessary("shines", [atom("sun")]));

    assert!(engine.is_possible("exists", [atom("gravity")]));
    assert!(engine.is_possible("rains", [atom("tomorrow")]));
    assert!(engine.is_possible("shines", [atom("sun")]));
    assert!(!engine.is_possible("shines", [atom("moon")]));

    // Annotated facts still take part in ordinary resolution
    assert!(engine.ask(call("exists", [var("What")]))?);
    Ok(())
}

#[test]
fn modal_goals_inside_rules() -> Result<()> {
    let mut engine = Engine::new();
    engine.must("law", [atom("gravity")]);
    engine.assertz(Rule::new(
        call("certain", [var("X")]),
        [call("is_necessary", [call("law", [var("X")])])],
    )?);
    assert!(engine.ask(call("certain", [atom("gravity")]))?);
    assert!(!engine.ask(call("certain", [atom("magic")]))?);
    assert!(engine.ask(call("is_possible", [call("law", [var("_")])]))?);
    Ok(())
}

#[test]
fn temporal_facts_are_retrievable() -> Result<()> {
    let mut engine = Engine::new();
    engine.always("rises", [atom("sun")]);
    engine.eventually("sets", [atom("sun")]);
    engine.next("season", [atom("summer")]);
    engine.until("dark", [atom("dawn")]);
    engine.assertz(Fact::new(call("rises", [atom("moon")]))?);

    let rising = engine.temporal(&call("rises", [var("Body")]));
    assert_eq!(rising.len(), 1);
    assert_eq!(rising[0].0.head(), &call("rises", [atom("sun")]));
    assert_eq!(rising[0].1, Temporal::Always);

    let next = engine.facts_with(&call("season", [var("S")]), |fact| fact.temporal() == Temporal::Next);
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].modal(), Modal::None);

    assert_eq!(engine.temporal(&call("dark", [var("_")]))[0].1, Temporal::Until);
    assert_eq!(engine.temporal(&call("sets", [var("_")]))[0].1, Temporal::Eventually);
    Ok(())
}

#[test]
fn transactions_apply_in_order() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(call("count", [Term::integer(1)]))?);

    let mut transaction = engine.edit();
    transaction
        .retract_all(call("count", [var("_")]))
        .assert(Fact::new(call("count", [Term::integer(2)]))?)
        .asserta(Fact::new(call("count", [Term::integer(0)]))?)
        .retract(call("missing", [var("_")]));
    let commit = engine.commit(transaction);
    assert_eq!(commit, Commit { asserted: 2, retracted: 1 });

    let counts: Vec<Term> = engine
        .query(call("count", [var("N")]))
        .map(|solution| solution.map(|solution| solution.get("N").cloned()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(counts, vec![Term::integer(0), Term::integer(2)]);
    Ok(())
}

#[test]
fn depth_limit_is_configurable() -> Result<()> {
    let mut engine = Engine::with_config(ResolverConfig::default().with_max_depth(20));
    engine.assertz(Rule::new(
        call("countdown", [var("N")]),
        [
            Term::greater(var("N"), Term::integer(0)),
            Term::is(var("M"), call("-", [var("N"), Term::integer(1)])),
            call("countdown", [var("M")]),
        ],
    )?);
    engine.assertz(Fact::new(call("countdown", [Term::integer(0)]))?);

    assert!(engine.ask(call("countdown", [Term::integer(10)]))?);
    assert_eq!(
        engine.ask(call("countdown", [Term::integer(100)])),
        Err(QueryError::DepthExceeded { limit: 20 })
    );
    // The knowledge base is untouched by the aborted query
    assert_eq!(engine.knowledge().len(), 2);
    Ok(())
}

#[test]
fn unification_and_disunification_goals() -> Result<()> {
    let engine = Engine::new();
    let solution = engine
        .query(Term::unifies(
            Term::list_pattern([var("H")], var("T")),
            Term::list([atom("a"), atom("b")]),
        ))
        .next()
        .transpose()?;
    let solution = solution.ok_or_else(|| anyhow::anyhow!("expected a solution"))?;
    assert_eq!(solution.get("H"), Some(&atom("a")));
    assert_eq!(solution.get("T"), Some(&Term::list([atom("b")])));

    assert!(engine.ask(call("\\=", [atom("a"), atom("b")]))?);
    assert!(!engine.ask(call("\\=", [var("X"), atom("b")]))?);
    assert!(engine.ask(atom("true"))?);
    assert!(!engine.ask(atom("fail"))?);
    Ok(())
}

#[test]
fn probability_thresholds_take_explicit_arguments() -> Result<()> {
    let mut engine = Engine::new();
    engine.assertz(Fact::new(atom("storm"))?.with_probability(0.6)?);
    assert!(engine.ask(vec![atom("storm"), atom("maybe")])?);
    assert!(!engine.ask(vec![atom("storm"), atom("likely")])?);
    assert!(engine.ask(vec![atom("storm"), call("likely", [Term::float(0.55)])])?);
    assert!(!engine.ask(vec![atom("storm"), call("maybe", [Term::float(0.7)])])?);
    Ok(())
}

#[test]
fn clauses_survive_a_json_round_trip() -> Result<()> {
    let fact = Fact::new(call("cause", [atom("spring"), atom("summer")]))?
        .with_probability(0.9)?
        .with_temporal(Temporal::Next);
    let clause = Clause::from(fact);
    let json = serde_json::to_string(&clause)?;
    let back: Clause = serde_json::from_str(&json)?;
    assert_eq!(back, clause);

    let invalid = r#"{"Fact":{"head":{"Number":3}}}"#;
    assert!(serde_json::from_str::<Clause>(invalid).is_err());
    Ok(())
}
