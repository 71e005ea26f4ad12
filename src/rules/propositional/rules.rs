use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::engine::{History, RuleIndex, SyntaxAlphabet, canonical_key, check_closure, check_syntax, contradicts};
use crate::system::FormalSystem;
use crate::{
    Close, Formula, Mistake, MistakeKind, OperatorTable, Rule, RuleContext, SENTENCE_ID, TOKEN_ID, Token,
};

use crate::rules::propositional::{
    helpers::{double_not_naive, double_not_strict, smullyan_naive, smullyan_strict},
    predicates::find_rule,
};

pub const NEGATION: &str = "not";
pub const NEGATION_LEXEME: &str = "~";

const USED_TYPES: [&str; 5] = ["and", "or", "imp", "not", "sentvar"];
const TAGS: [&str; 2] = ["propositional", "uses negation"];

const ALPHABET: SyntaxAlphabet<'static> =
    SyntaxAlphabet { variables: &["sentvar"], unary: &[NEGATION], binary: &["and", "or", "imp"] };

/// Binding strengths; the negation binds tightest, the implication weakest.
pub static OPERATORS: Lazy<Arc<OperatorTable>> =
    Lazy::new(|| Arc::new(OperatorTable::new([("and", 3), ("or", 3), ("imp", 2), (NEGATION, 4)], [NEGATION], NEGATION)));

bitflags::bitflags! {
    /// One row of the Smullyan table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Smullyan: u8 {
        /// Left operand kept as is (otherwise negated).
        const KEEP_LEFT  = 1 << 0;
        /// Right operand kept as is (otherwise negated).
        const KEEP_RIGHT = 1 << 1;
        /// Applies to the formula itself, not to a negated one.
        const WHOLE      = 1 << 2;
        /// Operands go on two new branches.
        const SPLIT      = 1 << 3;
    }
}

/// `(rule, connective, row)` for every binary-connective rule, in priority
/// order.
pub const TABLE: [(&str, &str, Smullyan); 6] = [
    ("true and", "and", Smullyan::KEEP_LEFT.union(Smullyan::KEEP_RIGHT).union(Smullyan::WHOLE)),
    ("false or", "or", Smullyan::empty()),
    ("false imp", "imp", Smullyan::KEEP_LEFT),
    (
        "true or",
        "or",
        Smullyan::KEEP_LEFT.union(Smullyan::KEEP_RIGHT).union(Smullyan::WHOLE).union(Smullyan::SPLIT),
    ),
    ("false and", "and", Smullyan::SPLIT),
    ("true imp", "imp", Smullyan::KEEP_RIGHT.union(Smullyan::WHOLE).union(Smullyan::SPLIT)),
];

pub fn table_entry(rule: &str) -> Option<(&'static str, Smullyan)> {
    TABLE.iter().find(|(name, _, _)| *name == rule).map(|(_, kind, flags)| (*kind, *flags))
}

// --- Rules ---------------------------------------------------------------------

fn rule_double_not() -> Rule {
    rule! {
        name: "double not",
        symbolic: "~~A / A",
        docs: "Removes a double negation: from ~~A infer A.",
        context: &[SENTENCE_ID],
        strict: |formula: &Formula| double_not_strict(formula),
        naive: |branch: &[Formula], context: &RuleContext| double_not_naive(branch, context),
    }
}

fn rule_true_and() -> Rule {
    rule! {
        name: "true and",
        symbolic: "A and B / A; B",
        docs: "A true conjunction puts both conjuncts on the branch.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "and", flags("true and")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("true and")),
    }
}

fn rule_false_or() -> Rule {
    rule! {
        name: "false or",
        symbolic: "~(A or B) / ~A; ~B",
        docs: "A false disjunction puts both negated disjuncts on the branch.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "or", flags("false or")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("false or")),
    }
}

fn rule_false_imp() -> Rule {
    rule! {
        name: "false imp",
        symbolic: "~(A -> B) / A; ~B",
        docs: "A false implication puts its antecedent and its negated consequent on the branch.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "imp", flags("false imp")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("false imp")),
    }
}

fn rule_true_or() -> Rule {
    rule! {
        name: "true or",
        symbolic: "(A or B) / A | B",
        docs: "A true disjunction splits the branch, one disjunct on each side.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "or", flags("true or")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("true or")),
    }
}

fn rule_false_and() -> Rule {
    rule! {
        name: "false and",
        symbolic: "~(A and B) / ~A | ~B",
        docs: "A false conjunction splits the branch, one negated conjunct on each side.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "and", flags("false and")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("false and")),
    }
}

fn rule_true_imp() -> Rule {
    rule! {
        name: "true imp",
        symbolic: "(A -> B) / ~A | B",
        docs: "A true implication splits the branch: the negated antecedent or the consequent.",
        context: &[SENTENCE_ID, TOKEN_ID],
        strict: |formula: &Formula| smullyan_strict(formula, "imp", flags("true imp")),
        naive: |branch: &[Formula], context: &RuleContext| smullyan_naive(branch, context, flags("true imp")),
    }
}

fn flags(rule: &str) -> Smullyan {
    table_entry(rule).map_or(Smullyan::empty(), |(_, flags)| flags)
}

/// Every rule, in priority order.
pub fn get() -> Vec<Rule> {
    vec![
        rule_double_not(),
        rule_true_and(),
        rule_false_or(),
        rule_false_imp(),
        rule_true_or(),
        rule_false_and(),
        rule_true_imp(),
    ]
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(get);

static INDEX: Lazy<RuleIndex> = Lazy::new(|| {
    let names: Vec<&'static str> = RULES.iter().map(|r| r.name).collect();
    RuleIndex::chain(&names)
});

// --- Formal system ---------------------------------------------------------------

/// Classical propositional logic over `and`, `or`, `imp` and `not`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Propositional;

impl FormalSystem for Propositional {
    fn name(&self) -> &'static str {
        "propositional"
    }

    fn tags(&self) -> &'static [&'static str] {
        &TAGS
    }

    fn used_types(&self) -> &'static [&'static str] {
        &USED_TYPES
    }

    fn operators(&self) -> Arc<OperatorTable> {
        Arc::clone(&OPERATORS)
    }

    fn rules(&self) -> &[Rule] {
        &RULES
    }

    fn rule_index(&self) -> &RuleIndex {
        &INDEX
    }

    fn find_rule(&self, formula: &Formula) -> Option<&'static str> {
        find_rule(formula)
    }

    fn check_syntax(&self, formula: &Formula) -> Result<(), Mistake> {
        if let Some(i) =
            formula.tokens().iter().position(|t| !t.is_bracket() && !USED_TYPES.contains(&t.kind.as_str()))
        {
            let token = &formula.tokens()[i];
            return Err(Mistake::with_message(
                MistakeKind::InvalidSyntax,
                format!("'{}' can't be used in this system (position {})", token.lexem, i + 1),
            )
            .with_extra("pos", i + 1));
        }
        check_syntax(formula.tokens(), &ALPHABET)
    }

    fn prepare_for_proving(&self, formula: &Formula) -> Formula {
        formula.reduce_brackets().with_prefix(Token::new(NEGATION, NEGATION_LEXEME))
    }

    fn check_closure(&self, branch: &[Formula], history: &History) -> Option<Close> {
        check_closure(branch, history)
    }

    fn contradicts(&self, first: &Formula, second: &Formula) -> bool {
        contradicts(first, second)
    }

    fn checker(&self, rule: &str, premise: &Formula, conclusion: &Formula) -> Option<Mistake> {
        let Some(used) = self.rule(rule) else {
            return Some(Mistake::new(MistakeKind::UnknownRule).with_extra("rule", rule));
        };
        let Some(result) = used.strict(premise) else {
            return Some(
                Mistake::with_message(MistakeKind::WrongRule, format!("'{rule}' can't be used on '{premise}'"))
                    .with_extra("rule", rule)
                    .with_extra("premise", premise.to_string()),
            );
        };

        let key = canonical_key(conclusion);
        let derived = result.formulas().into_iter().any(|f| canonical_key(f) == key);
        if derived && find_rule(premise) == Some(rule) {
            return None;
        }
        Some(
            Mistake::with_message(
                MistakeKind::WrongPrecedence,
                format!("Check which connective is the main one in '{premise}'"),
            )
            .with_extra("rule", rule)
            .with_extra("premise", premise.to_string()),
        )
    }

    fn auto_context(&self, rule: &str, formula: &Formula, position: usize) -> RuleContext {
        let mut context = RuleContext::from([(SENTENCE_ID.variable.to_string(), position as i64)]);
        let token = table_entry(rule).and_then(|(_, flags)| {
            if flags.contains(Smullyan::WHOLE) {
                formula.main_connective()
            } else {
                let stripped = formula.strip_prefix(NEGATION)?;
                let shift = (formula.len() + 1 - stripped.len()) / 2;
                stripped.main_connective().map(|main| main + shift)
            }
        });
        if let Some(token) = token {
            context.insert(TOKEN_ID.variable.to_string(), token as i64);
        }
        context
    }
}
