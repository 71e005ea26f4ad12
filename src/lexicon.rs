//! Tokenizer boundary.
//!
//! The lexicon is a fixed list of entries, each mapping a token type to the
//! regex patterns that spell it. An entry is active when all of its tags are
//! among the active tags and its type is one the formal system uses:
//!
//! ```text
//! tags {propositional, uses negation}  +  used types {and, or, imp, not, sentvar}
//!                 │
//!                 v
//! ^(?:(not\b|~|!|¬)|(and\b|oraz\b|\^|&|∧)|...|(\()|(\))|(\w+))
//!       group 1          group 2                        group n
//! ```
//!
//! The matching group tells the type of the token. Brackets have no tags and
//! are always active. Entries are tried in declaration order, so connective
//! words win over the catch-all variable pattern.

use regex::Regex;

use crate::system::FormalSystem;
use crate::{CLOSE_BRACKET, Formula, LexError, OPEN_BRACKET, Token};

struct Entry {
    kind: &'static str,
    patterns: &'static [&'static str],
    tags: &'static [&'static str],
    literal: bool,
    /// Lexeme used when a rule needs a new token of this type.
    generated: Option<&'static str>,
    /// Generated lexemes must not already occur in the formula.
    find_new: bool,
}

const ENTRIES: &[Entry] = &[
    Entry {
        kind: "not",
        patterns: &[r"not\b", "~", "!", "¬"],
        tags: &["propositional", "uses negation"],
        literal: false,
        generated: Some("~"),
        find_new: false,
    },
    Entry {
        kind: "and",
        patterns: &[r"and\b", r"oraz\b", r"\^", "&", "∧"],
        tags: &["propositional"],
        literal: false,
        generated: Some("and"),
        find_new: false,
    },
    Entry {
        kind: "or",
        patterns: &[r"or\b", r"lub\b", r"\|", r"v\b", "∨"],
        tags: &["propositional"],
        literal: false,
        generated: Some("or"),
        find_new: false,
    },
    Entry {
        kind: "imp",
        patterns: &[r"imp\b", "->", "→"],
        tags: &["propositional"],
        literal: false,
        generated: Some("->"),
        find_new: false,
    },
    Entry {
        kind: OPEN_BRACKET,
        patterns: &[r"\("],
        tags: &[],
        literal: true,
        generated: Some(OPEN_BRACKET),
        find_new: false,
    },
    Entry {
        kind: CLOSE_BRACKET,
        patterns: &[r"\)"],
        tags: &[],
        literal: true,
        generated: Some(CLOSE_BRACKET),
        find_new: false,
    },
    Entry {
        kind: "sentvar",
        patterns: &[r"\w+"],
        tags: &["propositional"],
        literal: false,
        generated: None,
        find_new: true,
    },
];

/// Letters handed out for fresh sentence variables. `v` spells a disjunction.
const FRESH: &str = "abcdefghijklmnopqrstuwxyz";

pub struct Lexicon {
    entries: Vec<&'static Entry>,
    regex: Regex,
    lowercase: bool,
}

impl Lexicon {
    pub fn new(tags: &[&str], used_types: &[&str]) -> Result<Self, LexError> {
        let entries: Vec<&'static Entry> = ENTRIES
            .iter()
            .filter(|e| e.tags.iter().all(|t| tags.contains(t)))
            .filter(|e| e.literal || used_types.contains(&e.kind))
            .collect();

        let groups: Vec<String> = entries.iter().map(|e| format!("({})", e.patterns.join("|"))).collect();
        let regex = Regex::new(&format!("^(?:{})", groups.join("|"))).map_err(|e| LexError::Pattern(e.to_string()))?;
        let lowercase = !entries.iter().flat_map(|e| e.patterns.iter()).any(|p| p.chars().any(|c| c.is_ascii_uppercase()));

        Ok(Lexicon { entries, regex, lowercase })
    }

    /// Lexicon with the system's own tags.
    pub fn for_system(system: &dyn FormalSystem) -> Result<Self, LexError> {
        Self::new(system.tags(), system.used_types())
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexError> {
        let text = if self.lowercase { text.to_ascii_lowercase() } else { text.to_string() };
        let mut tokens = Vec::new();
        let mut position = 0;

        while position < text.len() {
            let rest = &text[position..];
            if let Some(space) = regex!(r"^\s+").find(rest) {
                position += space.end();
                continue;
            }

            let unrecognized = || LexError::Unrecognized {
                symbol: rest.chars().next().map(String::from).unwrap_or_default(),
                position,
            };
            let captures = self.regex.captures(rest).ok_or_else(unrecognized)?;
            let (entry, lexeme) = self
                .entries
                .iter()
                .enumerate()
                .find_map(|(i, entry)| captures.get(i + 1).map(|m| (*entry, m.as_str())))
                .filter(|(_, lexeme)| !lexeme.is_empty())
                .ok_or_else(unrecognized)?;

            tokens.push(if entry.literal { Token::literal(lexeme) } else { Token::new(entry.kind, lexeme) });
            position += lexeme.len();
        }
        Ok(tokens)
    }

    /// A token of type `kind` for a rule to insert into `formula`.
    pub fn generate(&self, formula: &Formula, kind: &str) -> Result<Token, LexError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| LexError::CannotGenerate(kind.to_string()))?;

        if !entry.find_new {
            let lexeme = entry.generated.ok_or_else(|| LexError::CannotGenerate(kind.to_string()))?;
            return Ok(if entry.literal { Token::literal(lexeme) } else { Token::new(kind, lexeme) });
        }

        let used: Vec<&str> = formula.tokens().iter().filter(|t| t.kind == kind).map(|t| t.lexem.as_str()).collect();
        FRESH
            .chars()
            .map(String::from)
            .find(|candidate| !used.contains(&candidate.as_str()))
            .map(|lexeme| Token::new(kind, lexeme))
            .ok_or_else(|| LexError::Exhausted(kind.to_string()))
    }
}
