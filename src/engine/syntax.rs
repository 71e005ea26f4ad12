//! Syntax check over token shapes.
//!
//! Every token is transcribed to one shape character:
//!
//! ```text
//! s  variable          1  unary connective
//! 2  binary connective ( )  brackets
//! ```
//!
//! The shape string is then rewritten to a fixpoint with `1s -> s`,
//! `s2s -> s` and `(s) -> s`. A well-formed formula ends as a single `s`.
//! Whatever is left otherwise tells which mistake was made, and the slot
//! bookkeeping keeps the original token position of every surviving
//! connective or bracket for the report.

use crate::{Mistake, MistakeKind, Token};

/// Which token types play which role in a system's grammar.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxAlphabet<'a> {
    pub variables: &'a [&'a str],
    pub unary: &'a [&'a str],
    pub binary: &'a [&'a str],
}

const REWRITES: [&str; 3] = ["1s", "s2s", "(s)"];

pub fn check_syntax(tokens: &[Token], alphabet: &SyntaxAlphabet<'_>) -> Result<(), Mistake> {
    let mut shape: Vec<char> = Vec::with_capacity(tokens.len());
    let mut slots: Vec<Option<usize>> = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let kind = token.kind.as_str();
        let c = if token.is_open_bracket() {
            '('
        } else if token.is_close_bracket() {
            ')'
        } else if alphabet.variables.contains(&kind) {
            's'
        } else if alphabet.unary.contains(&kind) {
            '1'
        } else if alphabet.binary.contains(&kind) {
            '2'
        } else {
            continue;
        };
        shape.push(c);
        slots.push(Some(i));
    }

    loop {
        let before = shape.len();
        for pattern in REWRITES {
            let pattern: Vec<char> = pattern.chars().collect();
            while let Some(at) = find(&shape, &pattern) {
                shape.splice(at..at + pattern.len(), ['s']);
                slots.splice(at..at + pattern.len(), [None]);
            }
        }
        if shape.len() == before {
            break;
        }
    }

    if shape == ['s'] {
        return Ok(());
    }
    if !shape.contains(&'s') {
        return Err(Mistake::new(MistakeKind::NoVariables));
    }
    if let Some(at) = find(&shape, &['s', 's']) {
        return Err(located(MistakeKind::NothingBetween, slots[at + 1]));
    }
    if let Some(at) = shape.iter().position(|c| *c == '(') {
        return Err(located(MistakeKind::BracketNotClosed, slots[at]));
    }
    if let Some(at) = shape.iter().position(|c| *c == ')') {
        return Err(located(MistakeKind::BracketNotOpened, slots[at]));
    }
    if let Some(at) = find(&shape, &['s', '2']) {
        return Err(located(MistakeKind::NoRightOperand, slots[at + 1]));
    }
    if let Some(at) = find(&shape, &['2', 's']) {
        return Err(located(MistakeKind::NoLeftOperand, slots[at]));
    }
    Err(Mistake::new(MistakeKind::InvalidSyntax))
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Attach the 1-based token position, when the slot still maps to a token.
fn located(kind: MistakeKind, slot: Option<usize>) -> Mistake {
    match slot {
        Some(index) => Mistake::with_message(kind, format!("{} (position {})", kind.default_message(), index + 1))
            .with_extra("pos", index + 1),
        None => Mistake::new(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: SyntaxAlphabet<'static> =
        SyntaxAlphabet { variables: &["sentvar"], unary: &["not"], binary: &["and", "or", "imp"] };

    fn tokens(text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|w| match w {
                "(" | ")" => Token::literal(w),
                "not" | "and" | "or" | "imp" => Token::new(w, w),
                v => Token::new("sentvar", v),
            })
            .collect()
    }

    fn kind_of(text: &str) -> Option<MistakeKind> {
        check_syntax(&tokens(text), &ALPHABET).err().map(|m| m.kind)
    }

    #[test]
    fn well_formed_formulas_pass() {
        for text in ["p", "not p", "p and q", "( p or q ) imp not not r", "not ( ( p ) )"] {
            assert_eq!(kind_of(text), None, "'{text}' should be valid");
        }
    }

    #[test]
    fn mistakes_are_named() {
        let cases = [
            ("and", MistakeKind::NoVariables),
            ("p q", MistakeKind::NothingBetween),
            ("( p and q", MistakeKind::BracketNotClosed),
            ("p and q )", MistakeKind::BracketNotOpened),
            ("p and", MistakeKind::NoRightOperand),
            ("and q", MistakeKind::NoLeftOperand),
            ("p not", MistakeKind::InvalidSyntax),
        ];
        for (text, expected) in cases {
            assert_eq!(kind_of(text), Some(expected), "checking '{text}'");
        }
    }

    #[test]
    fn reports_position_of_the_offending_token() {
        let mistake = check_syntax(&tokens("p and ( q or r"), &ALPHABET).unwrap_err();
        assert_eq!(mistake.kind, MistakeKind::BracketNotClosed);
        assert_eq!(mistake.extra["pos"], 3);

        let mistake = check_syntax(&tokens("p or q and"), &ALPHABET).unwrap_err();
        assert_eq!(mistake.kind, MistakeKind::NoRightOperand);
        assert_eq!(mistake.extra["pos"], 4);
    }
}
