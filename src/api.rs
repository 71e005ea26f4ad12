use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{Proof, Side, SolveMetrics};
use crate::system::{FormalSystem, by_name};
use crate::{
    BranchId, Close, Config, ContextDef, EngineError, Formula, Lexicon, Mistake, MistakeKind, ProofLog, RuleContext,
    Token, UsedRule,
};

/// An interactive proving session.
///
/// Holds one formal system, its lexicon and at most one proof. Every proof
/// operation fails with [`EngineError::NoProof`] until
/// [`new_proof`](Session::new_proof) succeeds.
pub struct Session {
    config: Config,
    system: Arc<dyn FormalSystem>,
    lexicon: Lexicon,
    proof: Option<Proof>,
}

/// Result of [`prove`] and [`prove_with`].
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// The input as given.
    pub formula: String,
    /// Every branch got closed.
    pub closed: bool,
    /// Every branch got closed by a contradiction.
    pub tautology: bool,
    pub metrics: SolveMetrics,
    /// Plain-text rendering of the finished tree.
    pub tree: String,
    pub log: ProofLog,
}

/// Prove `text` with the default configuration.
///
/// # Example
/// ```
/// let verdict = larch::prove("p or ~p").unwrap();
/// assert!(verdict.tautology);
///
/// let verdict = larch::prove("p and q").unwrap();
/// assert!(verdict.closed && !verdict.tautology);
/// ```
pub fn prove(text: &str) -> Result<Verdict, EngineError> {
    prove_with(text, &Config::default())
}

pub fn prove_with(text: &str, config: &Config) -> Result<Verdict, EngineError> {
    let mut session = Session::new(config.clone())?;
    session.new_proof(text)?;
    let proof = session.proof_mut()?;
    let (closed, metrics) = proof.solve_with_metrics()?;

    Ok(Verdict {
        formula: text.to_string(),
        closed,
        tautology: closed && proof.is_successful(),
        metrics,
        tree: proof.render_tree(),
        log: proof.log(),
    })
}

impl Session {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let system = by_name(&config.system)?;
        let lexicon = if config.language_tags.is_empty() {
            Lexicon::for_system(system.as_ref())?
        } else {
            let tags: Vec<&str> = config.language_tags.iter().map(String::as_str).collect();
            Lexicon::new(&tags, system.used_types())?
        };
        Ok(Session { config, system, lexicon, proof: None })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn system(&self) -> &dyn FormalSystem {
        self.system.as_ref()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    // --- Proof lifecycle ------------------------------------------------------

    /// Tokenize, syntax-check and prepare `text`, then start a proof of it.
    pub fn new_proof(&mut self, text: &str) -> Result<&Proof, EngineError> {
        let formula = Formula::new(self.lexicon.tokenize(text)?, self.system.operators());
        self.system.check_syntax(&formula).map_err(EngineError::Syntax)?;

        let root = self.system.prepare_for_proving(&formula);
        let mut proof = Proof::new(Arc::clone(&self.system), root);
        if self.config.auto_close {
            proof.deal_closure(BranchId::ROOT)?;
        }
        info!(formula = %formula, "proof started");
        Ok(self.proof.insert(proof))
    }

    pub fn reset_proof(&mut self) {
        self.proof = None;
    }

    pub fn proof(&self) -> Result<&Proof, EngineError> {
        self.proof.as_ref().ok_or(EngineError::NoProof)
    }

    fn proof_mut(&mut self) -> Result<&mut Proof, EngineError> {
        self.proof.as_mut().ok_or(EngineError::NoProof)
    }

    // --- Rules ----------------------------------------------------------------

    /// Apply a rule on the active branch, then close what can be closed.
    pub fn use_rule(&mut self, rule: &str, context: &RuleContext) -> Result<Vec<BranchId>, EngineError> {
        let auto_close = self.config.auto_close;
        let proof = self.proof_mut()?;
        let created = proof.use_rule(rule, context).inspect_err(|err| {
            if let Some(mistake) = err.mistake() {
                warn!(rule, kind = %mistake.kind, "{mistake}");
            }
        })?;
        if auto_close {
            for &branch in &created {
                proof.deal_closure(branch)?;
            }
        }
        Ok(created)
    }

    /// Check closure of the active branch.
    pub fn deal_closure(&mut self) -> Result<Option<Close>, EngineError> {
        let proof = self.proof_mut()?;
        let branch = proof.active_branch();
        proof.deal_closure(branch)
    }

    /// Close the active branch on two formulas the user points at.
    pub fn contradict(&mut self, first: usize, second: usize) -> Result<Close, EngineError> {
        let proof = self.proof_mut()?;
        let branch = proof.active_branch();
        proof.contradict(branch, first, second).inspect_err(|err| {
            if let Some(mistake) = err.mistake() {
                warn!(first, second, kind = %mistake.kind, "{mistake}");
            }
        })
    }

    pub fn undo(&mut self, n: usize) -> Result<Vec<UsedRule>, EngineError> {
        let undone = self.proof_mut()?.undo(n)?;
        info!(steps = undone.len(), "undone");
        Ok(undone)
    }

    pub fn solve(&mut self) -> Result<bool, EngineError> {
        self.proof_mut()?.solve()
    }

    pub fn check(&self) -> Result<Vec<Mistake>, EngineError> {
        self.proof()?.check()
    }

    // --- Branches -------------------------------------------------------------

    /// Jump to `"left"`, `"right"` or a branch number.
    pub fn jump(&mut self, target: &str) -> Result<BranchId, EngineError> {
        let proof = self.proof_mut()?;
        match target.trim() {
            "left" => proof.jump_side(Side::Left),
            "right" => proof.jump_side(Side::Right),
            other => {
                let id = other.parse::<u32>().map(BranchId).map_err(|_| {
                    Mistake::with_message(MistakeKind::WrongContext, format!("'{other}' is not a branch"))
                })?;
                proof.jump(id)?;
                Ok(id)
            }
        }
    }

    /// Jump to the next open branch.
    pub fn next(&mut self) -> Result<BranchId, EngineError> {
        self.proof_mut()?.next_open()
    }

    pub fn proof_finished(&self) -> Result<bool, EngineError> {
        Ok(self.proof()?.is_closed())
    }

    /// Whether the input is a tautology, decided on a copy of the proof.
    pub fn is_tautology(&self) -> Result<bool, EngineError> {
        let mut copy = self.proof()?.copy()?;
        Ok(copy.solve()? && copy.is_successful())
    }

    /// Suggest the next move.
    ///
    /// A finished proof reports its first checker mistake as the error, or
    /// `None` when it is correct. An open proof is solved on a copy and the
    /// first automatic step on the active branch is returned, falling back to
    /// the first automatic step anywhere.
    pub fn hint(&self) -> Result<Option<UsedRule>, EngineError> {
        let proof = self.proof()?;
        if proof.is_closed() {
            if proof.used_rules().is_empty() {
                return Ok(None);
            }
            return match proof.check()?.into_iter().next() {
                Some(mistake) => Err(mistake.into()),
                None => Ok(None),
            };
        }

        let mut copy = proof.copy()?;
        if !copy.solve()? {
            return Ok(None);
        }
        let active = proof.active_branch();
        let moves = copy.used_rules().get(proof.used_rules().len()..).unwrap_or_default();
        let hint = moves
            .iter()
            .find(|u| u.auto && u.branch == active)
            .or_else(|| moves.iter().find(|u| u.auto))
            .cloned();
        if let Some(used) = &hint {
            debug!(rule = %used.rule, branch = %used.branch, "hint");
        }
        Ok(hint)
    }

    /// Formulas of the active branch, root first.
    pub fn branch_strings(&self) -> Result<Vec<String>, EngineError> {
        let proof = self.proof()?;
        let formulas = proof.branch_formulas(proof.active_branch())?;
        Ok(formulas.iter().map(Formula::to_string).collect())
    }

    pub fn render_tree(&self) -> Result<String, EngineError> {
        Ok(self.proof()?.render_tree())
    }

    // --- Catalog --------------------------------------------------------------

    pub fn rules_docs(&self) -> BTreeMap<&'static str, &'static str> {
        self.system.rules_docs()
    }

    pub fn rules_symbolic(&self) -> BTreeMap<&'static str, &'static str> {
        self.system.rules_symbolic()
    }

    pub fn needed_context(&self, rule: &str) -> Result<&'static [ContextDef], EngineError> {
        self.system
            .needed_context(rule)
            .ok_or_else(|| Mistake::new(MistakeKind::UnknownRule).with_extra("rule", rule).into())
    }

    /// Fresh token of type `kind` for the current root formula.
    pub fn generate(&self, kind: &str) -> Result<Token, EngineError> {
        Ok(self.lexicon.generate(self.proof()?.root(), kind)?)
    }

    // --- Logs -----------------------------------------------------------------

    pub fn export_log(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.proof()?.log())?)
    }

    /// Replace the current proof with one rebuilt from a JSON log.
    pub fn replay_log(&mut self, json: &str) -> Result<&Proof, EngineError> {
        let log: ProofLog = serde_json::from_str(json)?;
        let proof = Proof::replay(Arc::clone(&self.system), &log)?;
        info!(rules = log.rules.len(), "proof replayed");
        Ok(self.proof.insert(proof))
    }
}
