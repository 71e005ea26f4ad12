//! Formal-system capability interface.
//!
//! A formal system bundles everything the engine needs to know about one
//! logic: its alphabet, operator table, rules, rule priority, closure
//! criterion and checker. The engine only talks to `dyn FormalSystem`;
//! systems are picked by name at startup with [`by_name`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::{CanonicalKey, History, RuleIndex, canonical_key};
use crate::{
    Close, ContextDef, Decisions, Decomposition, EngineError, Formula, Mistake, MistakeKind, OperatorTable, Rule,
    RuleContext, SENTENCE_ID,
};

/// How the history of one new branch changes after a rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOp {
    /// The premise was consumed; later scans on this branch skip it.
    Add(CanonicalKey),
    Keep,
}

/// Result of a successful `use_rule`.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub decomposition: Decomposition,
    /// One entry per produced branch.
    pub history: Vec<HistoryOp>,
    pub decisions: Decisions,
}

pub trait FormalSystem: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lexicon tags this system activates.
    fn tags(&self) -> &'static [&'static str];

    /// Token types the system understands.
    fn used_types(&self) -> &'static [&'static str];

    fn operators(&self) -> Arc<OperatorTable>;

    fn rules(&self) -> &[Rule];

    /// Order in which the solver consults the rules.
    fn rule_index(&self) -> &RuleIndex;

    /// Name of the rule that decomposes `formula` by its main connective.
    fn find_rule(&self, formula: &Formula) -> Option<&'static str>;

    fn check_syntax(&self, formula: &Formula) -> Result<(), Mistake>;

    /// Turn the user's formula into the root of a refutation tree.
    fn prepare_for_proving(&self, formula: &Formula) -> Formula;

    fn check_closure(&self, branch: &[Formula], history: &History) -> Option<Close>;

    /// Whether a user may close a branch on `first` and `second`.
    fn contradicts(&self, first: &Formula, second: &Formula) -> bool;

    /// Validate one formula a rule application produced from `premise`.
    fn checker(&self, rule: &str, premise: &Formula, conclusion: &Formula) -> Option<Mistake>;

    /// Context the solver logs for a rule it applied to the formula at
    /// `position` on its branch, such that `naive` reproduces the step.
    fn auto_context(&self, rule: &str, formula: &Formula, position: usize) -> RuleContext;

    // --- Provided --------------------------------------------------------------

    fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules().iter().find(|r| r.name == name)
    }

    fn rules_docs(&self) -> BTreeMap<&'static str, &'static str> {
        self.rules().iter().map(|r| (r.name, r.docs)).collect()
    }

    fn rules_symbolic(&self) -> BTreeMap<&'static str, &'static str> {
        self.rules().iter().map(|r| (r.name, r.symbolic)).collect()
    }

    fn needed_context(&self, rule: &str) -> Option<&'static [ContextDef]> {
        self.rule(rule).map(|r| r.context)
    }

    /// Apply a rule by name on a branch, the way a user (or a replay) does.
    ///
    /// Checks run in a fixed order: rule name, presence and range of the
    /// sentence, reuse of a non-reusable rule, the remaining context. The
    /// rule's naive form then performs the step and reports its own mistakes.
    fn use_rule(
        &self,
        name: &str,
        branch: &[Formula],
        history: &History,
        context: &RuleContext,
    ) -> Result<RuleOutcome, Mistake> {
        let rule = self.rule(name).ok_or_else(|| {
            Mistake::with_message(MistakeKind::UnknownRule, format!("No such rule: '{name}'")).with_extra("rule", name)
        })?;

        let sentence = *context.get(SENTENCE_ID.variable).ok_or_else(|| missing_context(SENTENCE_ID.variable))?;
        let premise = usize::try_from(sentence)
            .ok()
            .and_then(|i| branch.get(i))
            .ok_or_else(|| Mistake::new(MistakeKind::NoSuchSentence).with_extra("sentenceID", sentence))?;

        let key = canonical_key(premise);
        if !rule.reusable && history.contains_key(&key) {
            return Err(Mistake::new(MistakeKind::AlreadyUsed).with_extra("sentenceID", sentence));
        }

        let mut needed = RuleContext::new();
        for def in rule.context {
            let value = context.get(def.variable).ok_or_else(|| missing_context(def.variable))?;
            needed.insert(def.variable.to_string(), *value);
        }

        let decomposition = rule.naive(branch, &needed)?;
        let op = if rule.reusable { HistoryOp::Keep } else { HistoryOp::Add(key) };
        let history = vec![op; decomposition.branch_count()];
        Ok(RuleOutcome { decomposition, history, decisions: Decisions::new() })
    }
}

fn missing_context(variable: &str) -> Mistake {
    Mistake::with_message(MistakeKind::WrongContext, format!("Missing context value '{variable}'"))
        .with_extra("variable", variable)
}

/// Formal system registered under `name`.
pub fn by_name(name: &str) -> Result<Arc<dyn FormalSystem>, EngineError> {
    match name {
        "propositional" | "analytic_freedom" => Ok(Arc::new(crate::Propositional)),
        other => Err(EngineError::UnknownSystem(other.to_string())),
    }
}
