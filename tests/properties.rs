//! Property-based tests for formulas and the solver.
//!
//! Formulas are generated as small syntax trees over three variables, printed
//! with explicit brackets and fed through the lexicon like user input.

use larch::{Config, FormalSystem, Formula, Lexicon, Propositional, Session, prove};
use proptest::prelude::*;

// ===== Strategies =====

#[derive(Debug, Clone)]
enum Expr {
    Var(usize),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Imp(Box<Expr>, Box<Expr>),
    Wrapped(Box<Expr>),
}

const VARS: [&str; 3] = ["p", "q", "r"];

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Var(i) => VARS[*i].to_string(),
            Expr::Not(e) => format!("~ ( {} )", e.render()),
            Expr::And(a, b) => format!("( {} ) and ( {} )", a.render(), b.render()),
            Expr::Or(a, b) => format!("( {} ) or ( {} )", a.render(), b.render()),
            Expr::Imp(a, b) => format!("( {} ) -> ( {} )", a.render(), b.render()),
            Expr::Wrapped(e) => format!("( {} )", e.render()),
        }
    }

    fn eval(&self, valuation: [bool; 3]) -> bool {
        match self {
            Expr::Var(i) => valuation[*i],
            Expr::Not(e) => !e.eval(valuation),
            Expr::And(a, b) => a.eval(valuation) && b.eval(valuation),
            Expr::Or(a, b) => a.eval(valuation) || b.eval(valuation),
            Expr::Imp(a, b) => !a.eval(valuation) || b.eval(valuation),
            Expr::Wrapped(e) => e.eval(valuation),
        }
    }

    fn is_tautology(&self) -> bool {
        (0..8u8).all(|bits| self.eval([bits & 1 != 0, bits & 2 != 0, bits & 4 != 0]))
    }
}

fn arb_expr(depth: u32) -> impl Strategy<Value = Expr> {
    let leaf = (0..VARS.len()).prop_map(Expr::Var);
    leaf.prop_recursive(depth, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
            inner.clone().prop_map(|e| Expr::Wrapped(Box::new(e))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Or(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Expr::Imp(Box::new(a), Box::new(b))),
        ]
    })
}

fn parse(text: &str) -> Formula {
    let lexicon = Lexicon::for_system(&Propositional).unwrap();
    Formula::new(lexicon.tokenize(text).unwrap(), Propositional.operators())
}

fn non_brackets(formula: &Formula) -> Vec<String> {
    formula.tokens().iter().filter(|t| !t.is_bracket()).map(|t| t.lexem.clone()).collect()
}

// ===== Properties =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_reduce_brackets_is_idempotent(e in arb_expr(4)) {
        let once = parse(&e.render()).reduce_brackets();
        prop_assert_eq!(once.reduce_brackets(), once.clone());
        prop_assert!(once.brackets_balanced());
    }

    #[test]
    fn prop_split_keeps_every_symbol(e in arb_expr(4)) {
        let formula = parse(&e.render());
        if let Some(c) = formula.components() {
            let mut rejoined: Vec<String> = c.left.as_ref().map(non_brackets).unwrap_or_default();
            rejoined.push(c.connective.lexem.clone());
            rejoined.extend(c.right.as_ref().map(non_brackets).unwrap_or_default());
            prop_assert_eq!(rejoined, non_brackets(&formula));
        }
    }

    #[test]
    fn prop_rules_produce_balanced_formulas(e in arb_expr(4)) {
        let formula = parse(&e.render()).reduce_brackets();
        for candidate in [formula.clone(), Propositional.prepare_for_proving(&formula)] {
            for rule in Propositional.rules() {
                if let Some(result) = rule.strict(&candidate) {
                    for produced in result.formulas() {
                        prop_assert!(produced.brackets_balanced(), "'{}' on '{}' gave '{}'", rule.name, candidate, produced);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_solver_decides_tautologies(e in arb_expr(3)) {
        let verdict = prove(&e.render()).unwrap();
        prop_assert!(verdict.closed, "'{}' did not close", e.render());
        prop_assert_eq!(verdict.tautology, e.is_tautology(), "'{}'\n{}", e.render(), verdict.tree);
    }

    #[test]
    fn prop_replayed_log_rebuilds_the_tree(e in arb_expr(3)) {
        let mut session = Session::new(Config::default()).unwrap();
        session.new_proof(&e.render()).unwrap();
        session.solve().unwrap();
        let tree = session.render_tree().unwrap();
        let log = session.export_log().unwrap();

        session.reset_proof();
        session.replay_log(&log).unwrap();
        prop_assert_eq!(session.render_tree().unwrap(), tree);
        prop_assert!(session.proof_finished().unwrap());
    }
}
