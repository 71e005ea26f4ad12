use crate::Formula;
use crate::rules::propositional::rules::{NEGATION, TABLE};

/// Rule matching the outer shape of `formula`, `None` for literals.
///
/// A formula under a negation is "false" and is classified by the connective
/// of its operand; anything else is "true" and classified by its own main
/// connective.
pub fn find_rule(formula: &Formula) -> Option<&'static str> {
    let components = formula.components()?;
    if components.connective.kind != NEGATION {
        return rule_name(true, &components.connective.kind);
    }
    let inner = components.right?.components()?;
    if inner.connective.kind == NEGATION {
        return Some("double not");
    }
    rule_name(false, &inner.connective.kind)
}

/// `"{true|false} {connective}"`, when such a rule exists.
pub fn rule_name(polarity: bool, connective: &str) -> Option<&'static str> {
    let prefix = if polarity { "true" } else { "false" };
    TABLE
        .iter()
        .map(|(name, _, _)| *name)
        .find(|name| name.strip_prefix(prefix).and_then(|rest| rest.strip_prefix(' ')) == Some(connective))
}
