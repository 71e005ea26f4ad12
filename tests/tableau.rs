//! End-to-end proofs through the public API.

use larch::{
    BranchId, Close, Config, Decomposition, EngineError, FormalSystem, MistakeKind, Propositional, RuleContext,
    Session, prove,
};

fn ctx(pairs: &[(&str, i64)]) -> RuleContext {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn session(text: &str) -> Session {
    let mut session = Session::new(Config::default()).unwrap();
    session.new_proof(text).unwrap();
    session
}

fn leaf_closures(session: &Session) -> Vec<Option<Close>> {
    let tree = session.proof().unwrap().tree();
    tree.leaves().into_iter().map(|id| tree.node(id).unwrap().closed).collect()
}

#[test]
fn self_implication_is_a_tautology() {
    let mut session = session("p imp p");
    let root = session.proof().unwrap().root().clone();
    assert_eq!(root.to_string(), "~(p imp p)");

    let strict = Propositional.rule("false imp").unwrap().strict(&root).unwrap();
    let texts: Vec<String> = strict.formulas().iter().map(|f| f.to_string()).collect();
    assert!(matches!(strict, Decomposition::SameBranch(_)));
    assert_eq!(texts, vec!["p".to_string(), "~p".to_string()]);

    let created = session.use_rule("false imp", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(leaf_closures(&session), vec![Some(Close::Contradiction { first: 1, second: 2 })]);

    let verdict = prove("p imp p").unwrap();
    assert!(verdict.closed);
    assert!(verdict.tautology);
}

#[test]
fn conjunction_closes_by_emptiness_only() {
    let mut session = session("p and q");
    assert!(session.solve().unwrap());
    assert!(!session.proof().unwrap().is_successful());
    assert_eq!(leaf_closures(&session), vec![Some(Close::Emptiness), Some(Close::Emptiness)]);

    let branches: Vec<Vec<String>> = session
        .proof()
        .unwrap()
        .tree()
        .branch_ids()
        .into_iter()
        .map(|b| session.proof().unwrap().branch_formulas(b).unwrap().iter().map(|f| f.to_string()).collect())
        .collect();
    assert_eq!(branches, vec![vec!["~(p and q)", "~p"], vec!["~(p and q)", "~q"]]);

    let verdict = prove("p and q").unwrap();
    assert!(verdict.closed);
    assert!(!verdict.tautology);
}

#[test]
fn double_negation_drops_both_signs() {
    let lexicon = larch::Lexicon::for_system(&Propositional).unwrap();
    let formula = larch::Formula::new(lexicon.tokenize("not not p").unwrap(), Propositional.operators());
    let result = Propositional.rule("double not").unwrap().strict(&formula).unwrap();
    assert_eq!(result.into_branches().concat().iter().map(|f| f.to_string()).collect::<Vec<_>>(), vec!["p"]);
}

#[test]
fn missing_sentence_is_reported() {
    let mut session = session("( p or q ) and r");
    session.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 7)])).unwrap();
    assert_eq!(session.proof().unwrap().branch_formulas(BranchId(1)).unwrap().len(), 2);

    let err = session.use_rule("true and", &ctx(&[("sentenceID", 99), ("tokenID", 1)])).unwrap_err();
    assert_eq!(err.mistake().map(|m| m.kind), Some(MistakeKind::NoSuchSentence));
    assert_eq!(err.to_string(), "No such sentence");
}

#[test]
fn premise_cannot_be_decomposed_twice() {
    let mut session = session("p imp ( q imp p )");
    let context = ctx(&[("sentenceID", 0), ("tokenID", 3)]);
    session.use_rule("false imp", &context).unwrap();

    let err = session.use_rule("false imp", &context).unwrap_err();
    assert_eq!(err.mistake().map(|m| m.kind), Some(MistakeKind::AlreadyUsed));
}

#[test]
fn classic_tautologies() {
    let cases = [
        "p or ~p",
        "( p imp q ) imp ( ~q imp ~p )",
        "( p and q ) imp p",
        "~ ( p and ~p )",
        "( ( p imp q ) and ( q imp r ) ) imp ( p imp r )",
        "~ ( p or q ) imp ( ~p and ~q )",
        "p imp ( q imp p )",
    ];
    for input in cases {
        let verdict = prove(input).unwrap();
        assert!(verdict.tautology, "'{input}' should be a tautology:\n{}", verdict.tree);
    }
}

#[test]
fn non_tautologies_still_close() {
    for input in ["p", "p or q", "( p imp q ) imp p", "p and ~p", "( p or q ) imp ( p and q )"] {
        let verdict = prove(input).unwrap();
        assert!(verdict.closed, "'{input}' should close");
        assert!(!verdict.tautology, "'{input}' is not a tautology");
    }
}

#[test]
fn undo_restores_the_open_branch() {
    let mut session = session("p or q");
    session.use_rule("false or", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
    assert!(session.proof_finished().unwrap());

    let undone = session.undo(1).unwrap();
    assert_eq!(undone.len(), 1);
    assert_eq!(undone[0].rule, "false or");
    assert!(!session.proof_finished().unwrap());
    assert_eq!(session.branch_strings().unwrap(), vec!["~(p or q)".to_string()]);

    assert!(matches!(session.undo(1), Err(EngineError::NothingToUndo { requested: 1, available: 0 })));
}

#[test]
fn bad_input_never_starts_a_proof() {
    let mut session = Session::new(Config::default()).unwrap();
    assert!(matches!(session.new_proof("p % q"), Err(EngineError::Lex(_))));
    assert!(matches!(session.new_proof("( p and q"), Err(EngineError::Syntax(m)) if m.kind == MistakeKind::BracketNotClosed));
    assert!(matches!(session.solve(), Err(EngineError::NoProof)));
}

#[test]
fn unknown_system_is_rejected() {
    let config = Config { system: "modal".to_string(), ..Config::default() };
    assert!(matches!(Session::new(config), Err(EngineError::UnknownSystem(name)) if name == "modal"));
}
