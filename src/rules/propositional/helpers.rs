use crate::rules::propositional::rules::{NEGATION, NEGATION_LEXEME, Smullyan};
use crate::{ContextDef, Decomposition, Formula, Mistake, MistakeKind, RuleContext, SENTENCE_ID, TOKEN_ID, Token};

/// Both operands of `formula` when its main connective is of type `kind`.
pub fn strip_around(formula: &Formula, kind: &str) -> Option<(Formula, Formula)> {
    let components = formula.components()?;
    if components.connective.kind != kind {
        return None;
    }
    Some((components.left?, components.right?))
}

/// `~F`, or `F` itself when the operand is kept.
pub fn negate(formula: Formula, keep: bool) -> Formula {
    if keep { formula } else { formula.with_prefix(Token::new(NEGATION, NEGATION_LEXEME)) }
}

/// Operands placed on one branch or on two, negated per the table entry.
fn assemble(left: Formula, right: Formula, flags: Smullyan) -> Decomposition {
    let left = negate(left, flags.contains(Smullyan::KEEP_LEFT));
    let right = negate(right, flags.contains(Smullyan::KEEP_RIGHT));
    if flags.contains(Smullyan::SPLIT) {
        Decomposition::NewBranches(vec![vec![left], vec![right]])
    } else {
        Decomposition::SameBranch(vec![left, right])
    }
}

pub fn smullyan_strict(formula: &Formula, kind: &str, flags: Smullyan) -> Option<Decomposition> {
    let stripped = if flags.contains(Smullyan::WHOLE) { formula.clone() } else { formula.strip_prefix(NEGATION)? };
    let (left, right) = strip_around(&stripped, kind)?;
    Some(assemble(left, right, flags))
}

/// Split the chosen sentence at the chosen token, whatever its connective.
///
/// Nothing checks that the token is the main connective or matches the rule;
/// the checker reports that afterwards.
pub fn smullyan_naive(branch: &[Formula], context: &RuleContext, flags: Smullyan) -> Result<Decomposition, Mistake> {
    let sentence = sentence_at(branch, context)?;
    let token_id = context_index(context, &TOKEN_ID)?;
    let position = usize::try_from(token_id)
        .ok()
        .filter(|&i| i < sentence.len())
        .ok_or_else(|| Mistake::new(MistakeKind::NoSuchToken).with_extra("tokenID", token_id))?;
    let token = &sentence.tokens()[position];

    let ops = sentence.operators();
    let refused = if token.is_bracket() {
        Some(MistakeKind::DivideByBracket)
    } else if token.kind == ops.negation() {
        Some(MistakeKind::DivideByNegation)
    } else if !ops.is_connective(&token.kind) {
        Some(MistakeKind::DivideByVariable)
    } else {
        None
    };
    if let Some(kind) = refused {
        return Err(Mistake::new(kind).with_extra("tokenID", token_id));
    }

    let stripped = if flags.contains(Smullyan::WHOLE) {
        sentence.clone()
    } else {
        sentence.strip_prefix(NEGATION).ok_or_else(|| Mistake::new(MistakeKind::NoNegation))?
    };

    // Each removed (or re-wrapped) bracket pair shifts the index by one.
    let shift = (sentence.len() + 1 - stripped.len()) / 2;
    let index = position
        .checked_sub(shift)
        .ok_or_else(|| Mistake::new(MistakeKind::NoSuchToken).with_extra("tokenID", token_id))?;

    match stripped.split_at(index) {
        (Some(left), Some(right)) => Ok(assemble(left, right, flags)),
        _ => Err(Mistake::new(MistakeKind::CannotSplit).with_extra("tokenID", token_id)),
    }
}

pub fn double_not_strict(formula: &Formula) -> Option<Decomposition> {
    let inner = formula.strip_prefix(NEGATION)?.strip_prefix(NEGATION)?;
    Some(Decomposition::SameBranch(vec![inner]))
}

pub fn double_not_naive(branch: &[Formula], context: &RuleContext) -> Result<Decomposition, Mistake> {
    let sentence = sentence_at(branch, context)?;
    double_not_strict(sentence).ok_or_else(|| Mistake::new(MistakeKind::CannotPerform))
}

/// Formula picked by `sentenceID`.
pub fn sentence_at<'a>(branch: &'a [Formula], context: &RuleContext) -> Result<&'a Formula, Mistake> {
    let id = context_index(context, &SENTENCE_ID)?;
    usize::try_from(id)
        .ok()
        .and_then(|i| branch.get(i))
        .ok_or_else(|| Mistake::new(MistakeKind::NoSuchSentence).with_extra("sentenceID", id))
}

pub fn context_index(context: &RuleContext, def: &ContextDef) -> Result<i64, Mistake> {
    context.get(def.variable).copied().ok_or_else(|| {
        Mistake::with_message(MistakeKind::WrongContext, format!("Missing context value '{}'", def.variable))
            .with_extra("variable", def.variable)
    })
}
