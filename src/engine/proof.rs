//! A proof in progress: the tree, the rule log and the active branch.
//!
//! Every mutation goes through a rule application that is appended to
//! `used_rules`, so the log alone is enough to rebuild the proof from its
//! root. `copy` and `replay` rely on that.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::solver;
use super::{NodeId, ProofTree, SolveMetrics};
use crate::system::FormalSystem;
use crate::{
    BranchId, Close, DeclaredClose, EngineError, Formula, Mistake, MistakeKind, ProofLog, RuleContext,
    SENTENCE_ID, UsedRule,
};

/// Direction for sibling navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

pub struct Proof {
    pub(crate) system: Arc<dyn FormalSystem>,
    pub(crate) tree: ProofTree,
    pub(crate) used_rules: Vec<UsedRule>,
    declared: Vec<DeclaredClose>,
    active: BranchId,
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof")
            .field("system", &self.system.name())
            .field("tree", &self.tree)
            .field("used_rules", &self.used_rules)
            .field("declared", &self.declared)
            .field("active", &self.active)
            .finish()
    }
}

impl Proof {
    /// Start a proof with `root` (already prepared) as the only node.
    pub fn new(system: Arc<dyn FormalSystem>, root: Formula) -> Self {
        Proof {
            system,
            tree: ProofTree::new(root),
            used_rules: Vec::new(),
            declared: Vec::new(),
            active: BranchId::ROOT,
        }
    }

    pub fn system(&self) -> &dyn FormalSystem {
        self.system.as_ref()
    }

    pub fn root(&self) -> &Formula {
        &self.tree.root().formula
    }

    pub fn tree(&self) -> &ProofTree {
        &self.tree
    }

    pub fn used_rules(&self) -> &[UsedRule] {
        &self.used_rules
    }

    pub fn active_branch(&self) -> BranchId {
        self.active
    }

    pub fn branch_formulas(&self, branch: BranchId) -> Result<Vec<Formula>, EngineError> {
        self.tree.branch_formulas(branch)
    }

    pub fn is_closed(&self) -> bool {
        self.tree.is_closed()
    }

    pub fn is_successful(&self) -> bool {
        self.tree.is_successful()
    }

    // --- Rules and closure --------------------------------------------------

    /// Close `branch` if the system's closure criterion holds.
    ///
    /// Returns the new closure, `None` when the branch stays open or was
    /// already closed.
    pub fn deal_closure(&mut self, branch: BranchId) -> Result<Option<Close>, EngineError> {
        let leaf = self.tree.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        let node = self.tree_node(leaf)?;
        if node.closed.is_some() {
            return Ok(None);
        }
        let close = self.system.check_closure(&self.tree.formulas(leaf), &node.history);
        if let Some(close) = close {
            self.tree.close(branch, close)?;
            debug!(%branch, %close, "branch closed");
        }
        Ok(close)
    }

    /// Close `branch` on two formulas the user points at. Positions are
    /// zero-based, root formula at 0.
    pub fn contradict(&mut self, branch: BranchId, first: usize, second: usize) -> Result<Close, EngineError> {
        let leaf = self.tree.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        if self.tree_node(leaf)?.closed.is_some() {
            return Err(EngineError::BranchClosed(branch));
        }
        let formulas = self.tree.formulas(leaf);
        let (Some(a), Some(b)) = (formulas.get(first), formulas.get(second)) else {
            return Err(Mistake::new(MistakeKind::NoSuchSentence).into());
        };
        if first == second || !self.system.contradicts(a, b) {
            return Err(Mistake::with_message(
                MistakeKind::NoContradiction,
                format!("'{a}' and '{b}' don't contradict each other"),
            )
            .with_extra("first", first)
            .with_extra("second", second)
            .into());
        }

        let close = Close::Contradiction { first: first.min(second), second: first.max(second) };
        self.tree.close(branch, close)?;
        self.declared.push(DeclaredClose { branch, first, second });
        debug!(%branch, %close, "contradiction declared");
        Ok(close)
    }

    /// Apply `rule` on `branch` with a user-supplied context.
    ///
    /// The context must name exactly the variables the rule needs. Returns
    /// the ids of the branches the application produced.
    pub fn use_rule_on(
        &mut self,
        rule: &str,
        branch: BranchId,
        context: &RuleContext,
    ) -> Result<Vec<BranchId>, EngineError> {
        let needed = self.system.needed_context(rule).ok_or_else(|| {
            Mistake::with_message(MistakeKind::UnknownRule, format!("No such rule: '{rule}'")).with_extra("rule", rule)
        })?;
        let expected: BTreeSet<&str> = needed.iter().map(|def| def.variable).collect();
        let given: BTreeSet<&str> = context.keys().map(String::as_str).collect();
        if expected != given {
            let names = expected.iter().copied().collect::<Vec<_>>().join(", ");
            return Err(Mistake::with_message(MistakeKind::WrongContext, format!("'{rule}' needs: {names}"))
                .with_extra("rule", rule)
                .into());
        }

        let leaf = self.tree.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        let node = self.tree_node(leaf)?;
        if node.closed.is_some() {
            return Err(EngineError::BranchClosed(branch));
        }
        let formulas = self.tree.formulas(leaf);
        let outcome = self.system.use_rule(rule, &formulas, &node.history, context)?;

        let (layer, created) = self.tree.append(branch, outcome.decomposition, &outcome.history)?;
        self.used_rules.push(UsedRule {
            layer,
            branch,
            rule: rule.to_string(),
            context: context.clone(),
            decisions: outcome.decisions,
            auto: false,
        });
        debug!(rule, %branch, layer, branches = created.len(), "rule applied");

        if let Some(first) = created.first() {
            self.active = *first;
        }
        Ok(created)
    }

    /// Apply `rule` on the active branch.
    pub fn use_rule(&mut self, rule: &str, context: &RuleContext) -> Result<Vec<BranchId>, EngineError> {
        self.use_rule_on(rule, self.active, context)
    }

    /// Roll back the last `n` rule applications and return them.
    pub fn undo(&mut self, n: usize) -> Result<Vec<UsedRule>, EngineError> {
        let available = self.used_rules.len();
        if n == 0 || n > available {
            return Err(EngineError::NothingToUndo { requested: n, available });
        }
        let undone = self.used_rules.split_off(available - n);
        let from = undone.iter().map(|u| u.layer).min().unwrap_or(1);
        self.tree.prune_from(from);
        self.declared.retain(|d| {
            self.tree.leaf(d.branch).and_then(|id| self.tree.node(id)).is_some_and(|node| node.closed.is_some())
        });

        let preferred = self.used_rules.last().map_or(BranchId::ROOT, |u| u.branch);
        self.settle_active(preferred);
        Ok(undone)
    }

    /// Independent proof rebuilt from the rule log.
    pub fn copy(&self) -> Result<Proof, EngineError> {
        Proof::replay(Arc::clone(&self.system), &self.log())
    }

    pub fn log(&self) -> ProofLog {
        ProofLog {
            system: self.system.name().to_string(),
            root: self.root().tokens().to_vec(),
            rules: self.used_rules.clone(),
            declared: self.declared.clone(),
        }
    }

    /// Rebuild a proof by re-applying every logged rule in order and every
    /// declared contradiction, then close whatever branches the final tree
    /// allows.
    pub fn replay(system: Arc<dyn FormalSystem>, log: &ProofLog) -> Result<Proof, EngineError> {
        if log.system != system.name() {
            return Err(EngineError::UnknownSystem(log.system.clone()));
        }
        let root = Formula::new(log.root.clone(), system.operators());
        let mut proof = Proof::new(system, root);

        for used in &log.rules {
            proof.use_rule_on(&used.rule, used.branch, &used.context)?;
            let Some(last) = proof.used_rules.last_mut() else {
                return Err(EngineError::Invariant("replayed rule was not recorded".to_string()));
            };
            if last.layer != used.layer {
                return Err(EngineError::Invariant(format!(
                    "'{}' replayed at layer {} instead of {}",
                    used.rule, last.layer, used.layer
                )));
            }
            last.auto = used.auto;
            last.decisions = used.decisions.clone();
        }

        for declared in &log.declared {
            proof.contradict(declared.branch, declared.first, declared.second)?;
        }
        for branch in proof.tree.branch_ids() {
            proof.deal_closure(branch)?;
        }
        let preferred = proof.used_rules.last().map_or(BranchId::ROOT, |u| u.branch);
        proof.settle_active(preferred);
        Ok(proof)
    }

    /// Validate every rule application of a finished proof.
    ///
    /// Returns the distinct mistakes found; an empty list means the proof is
    /// correct.
    pub fn check(&self) -> Result<Vec<Mistake>, EngineError> {
        if !self.is_closed() {
            return Err(EngineError::Unfinished);
        }
        if self.used_rules.is_empty() {
            return Err(EngineError::NoRulesUsed);
        }

        let mut mistakes: Vec<Mistake> = Vec::new();
        for used in &self.used_rules {
            let created = self.tree.nodes_in_layer(used.layer);
            let parent = created
                .first()
                .and_then(|&id| self.tree.node(id))
                .and_then(|node| node.parent())
                .ok_or_else(|| EngineError::Invariant(format!("no nodes recorded for layer {}", used.layer)))?;

            let sentence = used.context.get(SENTENCE_ID.variable).copied().unwrap_or_default();
            let premise = usize::try_from(sentence)
                .ok()
                .and_then(|i| self.tree.formulas(parent).into_iter().nth(i))
                .ok_or_else(|| EngineError::Invariant(format!("premise {sentence} of '{}' is gone", used.rule)))?;

            for id in created {
                let conclusion = &self.tree_node(id)?.formula;
                if let Some(mistake) = self.system.checker(&used.rule, &premise, conclusion) {
                    if !mistakes.contains(&mistake) {
                        mistakes.push(mistake);
                    }
                }
            }
        }
        Ok(mistakes)
    }

    // --- Solver -------------------------------------------------------------

    /// Run the solver. `Ok(false)` means the strategy could not close the
    /// tree; the proof is then left as it was.
    pub fn solve(&mut self) -> Result<bool, EngineError> {
        self.solve_with_metrics().map(|(closed, _)| closed)
    }

    pub fn solve_with_metrics(&mut self) -> Result<(bool, SolveMetrics), EngineError> {
        let outcome = solver::solve(self)?;
        self.settle_active(self.active);
        Ok(outcome)
    }

    // --- Navigation ---------------------------------------------------------

    pub fn jump(&mut self, branch: BranchId) -> Result<(), EngineError> {
        self.tree.leaf(branch).ok_or(EngineError::UnknownBranch(branch))?;
        self.active = branch;
        Ok(())
    }

    /// Move to the neighbouring branch in left-to-right leaf order.
    pub fn jump_side(&mut self, side: Side) -> Result<BranchId, EngineError> {
        let branches = self.tree.branch_ids();
        let at = branches.iter().position(|b| *b == self.active).ok_or(EngineError::UnknownBranch(self.active))?;
        let target = match side {
            Side::Left => at.checked_sub(1),
            Side::Right => Some(at + 1),
        }
        .and_then(|i| branches.get(i).copied())
        .ok_or(EngineError::NoNeighbour(side.name()))?;
        self.active = target;
        Ok(target)
    }

    /// Move to the next open branch to the right of the active one, wrapping
    /// around.
    pub fn next_open(&mut self) -> Result<BranchId, EngineError> {
        let branches = self.tree.branch_ids();
        let at = branches.iter().position(|b| *b == self.active).unwrap_or(0);
        let target = branches
            .iter()
            .cycle()
            .skip(at + 1)
            .take(branches.len())
            .copied()
            .find(|b| !self.tree.is_branch_closed(*b))
            .ok_or(EngineError::AllClosed)?;
        self.active = target;
        Ok(target)
    }

    pub fn render_tree(&self) -> String {
        self.tree.render()
    }

    // --- Internals ----------------------------------------------------------

    fn tree_node(&self, id: NodeId) -> Result<&super::ProofNode, EngineError> {
        self.tree.node(id).ok_or_else(|| EngineError::Invariant(format!("node {id} is missing")))
    }

    /// Point the active branch at `preferred` if it is still a leaf,
    /// otherwise at the first open branch, otherwise at the first branch.
    fn settle_active(&mut self, preferred: BranchId) {
        if self.tree.leaf(preferred).is_some() {
            self.active = preferred;
            return;
        }
        let branches = self.tree.branch_ids();
        self.active = branches
            .iter()
            .copied()
            .find(|b| !self.tree.is_branch_closed(*b))
            .or_else(|| branches.first().copied())
            .unwrap_or(BranchId::ROOT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexicon;

    fn proof(text: &str) -> Proof {
        let system = crate::system::by_name("propositional").unwrap();
        let lexicon = Lexicon::for_system(system.as_ref()).unwrap();
        let formula = Formula::new(lexicon.tokenize(text).unwrap(), system.operators());
        let root = system.prepare_for_proving(&formula);
        Proof::new(system, root)
    }

    fn ctx(pairs: &[(&str, i64)]) -> RuleContext {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn manual_steps_close_a_tautology() {
        let mut proof = proof("p imp p");
        let created = proof.use_rule("false imp", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
        assert_eq!(created, vec![BranchId::ROOT]);
        assert_eq!(proof.deal_closure(BranchId::ROOT).unwrap(), Some(Close::Contradiction { first: 1, second: 2 }));
        assert!(proof.is_closed());
        assert!(proof.is_successful());
        assert!(proof.check().unwrap().is_empty());
    }

    #[test]
    fn context_must_match_the_rule_exactly() {
        let mut proof = proof("p imp p");
        let err = proof.use_rule("false imp", &ctx(&[("sentenceID", 0)])).unwrap_err();
        assert_eq!(err.mistake().map(|m| m.kind), Some(MistakeKind::WrongContext));

        let err = proof.use_rule("double not", &ctx(&[("sentenceID", 0), ("tokenID", 1)])).unwrap_err();
        assert_eq!(err.mistake().map(|m| m.kind), Some(MistakeKind::WrongContext));
        assert!(proof.used_rules().is_empty());
    }

    #[test]
    fn fork_moves_active_branch_and_navigation_follows_leaves() {
        let mut proof = proof("p and q");
        let created = proof.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
        assert_eq!(created, vec![BranchId(1), BranchId(2)]);
        assert_eq!(proof.active_branch(), BranchId(1));

        assert_eq!(proof.jump_side(Side::Right).unwrap(), BranchId(2));
        assert!(matches!(proof.jump_side(Side::Right), Err(EngineError::NoNeighbour("right"))));
        assert_eq!(proof.jump_side(Side::Left).unwrap(), BranchId(1));
        assert!(matches!(proof.jump(BranchId(7)), Err(EngineError::UnknownBranch(BranchId(7)))));

        proof.deal_closure(BranchId(2)).unwrap();
        assert_eq!(proof.next_open().unwrap(), BranchId(1));
        proof.deal_closure(BranchId(1)).unwrap();
        assert!(matches!(proof.next_open(), Err(EngineError::AllClosed)));
    }

    #[test]
    fn undo_restores_tree_and_log() {
        let mut proof = proof("p and q");
        proof.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
        assert_eq!(proof.tree().len(), 3);

        let undone = proof.undo(1).unwrap();
        assert_eq!(undone.len(), 1);
        assert_eq!(proof.tree().len(), 1);
        assert_eq!(proof.active_branch(), BranchId::ROOT);
        assert!(matches!(proof.undo(1), Err(EngineError::NothingToUndo { requested: 1, available: 0 })));
    }

    #[test]
    fn undoing_a_fork_frees_its_branch_ids() {
        let mut proof = proof("( p and q ) and r");
        let created = proof.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 7)])).unwrap();
        assert_eq!(created, vec![BranchId(1), BranchId(2)]);
        let created = proof.use_rule("false and", &ctx(&[("sentenceID", 1), ("tokenID", 3)])).unwrap();
        assert_eq!(created, vec![BranchId(3), BranchId(4)]);
        assert_eq!(proof.tree().branch_ids(), vec![BranchId(3), BranchId(4), BranchId(2)]);

        proof.undo(1).unwrap();
        assert_eq!(proof.tree().branch_ids(), vec![BranchId(1), BranchId(2)]);
        assert_eq!(proof.active_branch(), BranchId(1));
        assert!(matches!(proof.jump(BranchId(3)), Err(EngineError::UnknownBranch(BranchId(3)))));
        assert_eq!(proof.next_open().unwrap(), BranchId(2));
        proof.jump(BranchId(1)).unwrap();
        let created = proof.use_rule("false and", &ctx(&[("sentenceID", 1), ("tokenID", 3)])).unwrap();
        assert_eq!(created, vec![BranchId(3), BranchId(4)]);

        proof.undo(2).unwrap();
        assert_eq!(proof.active_branch(), BranchId::ROOT);
        assert!(matches!(proof.jump(BranchId(1)), Err(EngineError::UnknownBranch(BranchId(1)))));
        assert_eq!(proof.next_open().unwrap(), BranchId::ROOT);
        let created = proof.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 7)])).unwrap();
        assert_eq!(created, vec![BranchId(1), BranchId(2)]);
    }

    #[test]
    fn declared_contradiction_survives_copy_and_undo() {
        let mut proof = proof("p imp ~ ~ p");
        proof.use_rule("false imp", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();
        assert_eq!(proof.deal_closure(BranchId::ROOT).unwrap(), None);

        let kind = |err: EngineError| err.mistake().map(|m| m.kind);
        assert_eq!(kind(proof.contradict(BranchId::ROOT, 0, 1).unwrap_err()), Some(MistakeKind::NoContradiction));
        assert_eq!(kind(proof.contradict(BranchId::ROOT, 1, 1).unwrap_err()), Some(MistakeKind::NoContradiction));
        assert_eq!(kind(proof.contradict(BranchId::ROOT, 1, 9).unwrap_err()), Some(MistakeKind::NoSuchSentence));

        assert_eq!(proof.contradict(BranchId::ROOT, 2, 1).unwrap(), Close::Contradiction { first: 1, second: 2 });
        assert!(proof.is_closed());
        assert!(proof.is_successful());
        assert!(matches!(proof.contradict(BranchId::ROOT, 1, 2), Err(EngineError::BranchClosed(BranchId::ROOT))));

        let copy = proof.copy().unwrap();
        assert!(copy.is_closed());
        assert_eq!(copy.log(), proof.log());

        proof.undo(1).unwrap();
        assert!(proof.log().declared.is_empty());
        assert!(!proof.is_closed());
    }

    #[test]
    fn copy_is_independent_of_the_live_proof() {
        let mut proof = proof("p and q");
        proof.use_rule("false and", &ctx(&[("sentenceID", 0), ("tokenID", 3)])).unwrap();

        let mut copy = proof.copy().unwrap();
        assert_eq!(copy.used_rules(), proof.used_rules());
        assert!(copy.solve().unwrap());
        assert!(!proof.is_closed());
    }

    #[test]
    fn check_needs_a_finished_proof() {
        let proof = proof("p and q");
        assert!(matches!(proof.check(), Err(EngineError::Unfinished)));
    }
}
