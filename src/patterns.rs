use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::PatternError;

/// Dotted circle, standing in for a missing base consonant.
pub const PLACEHOLDER_BASE: char = '\u{25CC}';

/// Expansion rounds before a leftover placeholder counts as a grammar defect.
/// Rounds substitute in place, so one round resolves every reference to an
/// earlier fragment; the budget only has to cover forward references.
pub const MAX_EXPANSION_ROUNDS: usize = 3;

// Named fragments of the Khmer syllable grammar. `{NAME}` refers to another
// fragment. Only the syllable grammar and the shifter/sign fragments use
// lookaround; the rewrite rules only reference lookaround-free fragments.
const FRAGMENTS: &[(&str, &str)] = &[
    ("BASE", "[\u{1780}-\u{17A2}\u{17A5}-\u{17B3}\u{25CC}]"),
    ("NON_RO", "[\u{1780}-\u{1799}\u{179B}-\u{17A2}\u{17A5}-\u{17B3}]"),
    ("NON_BA", "[\u{1780}-\u{1793}\u{1795}-\u{17A2}\u{17A5}-\u{17B3}]"),
    (
        "SERIES1",
        concat!(
            "[\u{1780}-\u{1783}\u{1785}-\u{1788}\u{178A}-\u{178D}\u{178F}-\u{1792}",
            "\u{1795}-\u{1797}\u{179E}-\u{17A0}\u{17A2}]"
        ),
    ),
    (
        "SERIES2",
        "[\u{1784}\u{1780}\u{178E}\u{1793}\u{1794}\u{1798}-\u{179D}\u{17A1}\u{17A3}-\u{17B3}]",
    ),
    (
        "VOWEL_TOP",
        "(?:[\u{17B7}-\u{17BA}\u{17BE}\u{17BF}\u{17DD}]|\u{17B6}\u{17C6})",
    ),
    ("VOWEL_ABOVE", "(?:[\u{17C1}-\u{17C5}]?{VOWEL_TOP})"),
    ("VOWEL_SAMYOK", "(?:{VOWEL_ABOVE}|[\u{17C1}-\u{17C3}]?\u{17D0})"),
    ("VOWEL_BELOW", "(?:[\u{17C1}-\u{17C3}][\u{17BB}-\u{17BD}])"),
    // series 1 somewhere in the cluster and no BA
    (
        "STRONG",
        concat!(
            "(?:{SERIES1}\u{17CC}?(?:\u{17D2}{NON_BA}(?:\u{17D2}{NON_BA})?)?",
            "|{NON_BA}\u{17CC}?(?:\u{17D2}{SERIES1}(?:\u{17D2}{NON_BA})?",
            "|\u{17D2}{NON_BA}\u{17D2}{SERIES1}))"
        ),
    ),
    // BA somewhere in the cluster, or series 2 only
    (
        "WEAK",
        concat!(
            "(?:{SERIES2}\u{17CC}?(?:\u{17D2}{SERIES2}(?:\u{17D2}{SERIES2})?)?",
            "|\u{1794}\u{17CC}?{COENG}?",
            "|{BASE}\u{17CC}?(?:\u{17D2}{NON_RO}\u{17D2}\u{1794}|\u{17D2}\u{1794}(?:\u{17D2}{BASE}))?)"
        ),
    ),
    ("COENG", "(?:(?:\u{17D2}{NON_RO})?\u{17D2}{BASE})"),
    // what may follow a right-spacing final coeng
    (
        "COENG_RIGHT",
        "(?:(?:[\u{17C9}\u{17CA}]\u{200C}?)?(?:{VOWEL_BELOW}?{VOWEL_SAMYOK}|{VOWEL_BELOW}))",
    ),
    // what may follow any final coeng
    (
        "COENG_FINAL",
        concat!(
            "(?:(?:[\u{17C9}\u{17CA}]\u{200C}?)?[\u{17C2}-\u{17C3}]?{VOWEL_BELOW}?{VOWEL_ABOVE}?",
            "[\u{17B6}\u{17BF}\u{17C0}\u{17C4}\u{17C5}])"
        ),
    ),
    ("COENG_SHIFT", "(?:\u{17C9}\u{200C}?{VOWEL_SAMYOK})"),
    ("FINAL_COENG", "(?:\u{17D2}\u{200D}{NON_RO})"),
    (
        "SHIFT",
        concat!(
            "(?:(?<={STRONG}{FINAL_COENG}?)\u{17CA}\u{200C}(?={VOWEL_ABOVE})",
            "|(?<={WEAK}{FINAL_COENG}?)\u{17C9}\u{200C}(?={VOWEL_SAMYOK})",
            "|[\u{17C9}\u{17CA}])"
        ),
    ),
    (
        "VOWEL",
        concat!(
            "(?:\u{17C1}[\u{17BC}\u{17BD}]?[\u{17B7}\u{17B9}\u{17BA}]?",
            "|[\u{17C2}\u{17C3}]?[\u{17BC}\u{17BD}]?[\u{17B7}-\u{17BA}]\u{17B6}",
            "|[\u{17C2}\u{17C3}]?[\u{17BB}-\u{17BD}]?\u{17B6}",
            "|\u{17BE}[\u{17BC}\u{17BD}]?\u{17B6}?",
            "|[\u{17C1}-\u{17C5}]?\u{17BB}(?![\u{17D0}\u{17DD}])",
            "|[\u{17BF}\u{17C0}]",
            "|[\u{17C2}-\u{17C5}]?[\u{17BC}\u{17BD}]?[\u{17B7}-\u{17BA}]?)"
        ),
    ),
    (
        "SIGN",
        concat!(
            "(?:(?:[\u{17C6}\u{17CB}\u{17CD}-\u{17CF}\u{17D1}\u{17D3}]",
            "|(?<!\u{17BB}[\u{17B6}\u{17C4}\u{17C5}]?)[\u{17D0}\u{17DD}])",
            "[\u{17C6}\u{17CB}\u{17CD}-\u{17D1}\u{17D3}\u{17DD}]?)"
        ),
    ),
    (
        "SYLLABLE",
        concat!(
            "(?:{BASE}\u{17CC}?{COENG}?",
            "(?:\u{17D2}\u{200D}(?={COENG_RIGHT})",
            "|{FINAL_COENG}(?={COENG_FINAL})",
            "|(?<={WEAK})\u{17D2}\u{200D}{SERIES1}(?={COENG_SHIFT}))?",
            "{SHIFT}?{VOWEL}{SIGN}?[\u{17C7}\u{17C8}]?",
            "|[\u{17A3}\u{17A4}\u{17B4}\u{17B5}]",
            "|[^\u{1780}-\u{17D2}])"
        ),
    ),
];

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("placeholder pattern is a valid regex")
    })
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub body: String,
}

/// The resolved grammar: every fragment with all placeholders substituted.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    fragments: Vec<Fragment>,
    index: HashMap<String, usize>,
    rounds: usize,
}

impl PatternLibrary {
    /// Resolves the built-in Khmer grammar.
    pub fn build() -> Result<Self, PatternError> {
        Self::from_fragments(FRAGMENTS, MAX_EXPANSION_ROUNDS)
    }

    pub fn from_fragments(defs: &[(&str, &str)], max_rounds: usize) -> Result<Self, PatternError> {
        let re = placeholder_re();
        let mut fragments: Vec<Fragment> = defs
            .iter()
            .map(|(name, body)| Fragment {
                name: name.to_string(),
                body: body.to_string(),
            })
            .collect();
        let index: HashMap<String, usize> = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        for fragment in &fragments {
            if let Some(name) = re
                .captures_iter(&fragment.body)
                .map(|caps| caps[1].to_string())
                .find(|name| !index.contains_key(name))
            {
                return Err(PatternError::UnknownFragment {
                    fragment: fragment.name.clone(),
                    name,
                });
            }
        }

        let mut rounds = 0;
        while rounds < max_rounds {
            let mut changed = false;
            for i in 0..fragments.len() {
                if !re.is_match(&fragments[i].body) {
                    continue;
                }
                let expanded = re
                    .replace_all(&fragments[i].body, |caps: &Captures| {
                        fragments[index[&caps[1]]].body.clone()
                    })
                    .into_owned();
                fragments[i].body = expanded;
                changed = true;
            }
            if !changed {
                break;
            }
            rounds += 1;
        }

        for fragment in &fragments {
            let remaining: Vec<String> = re
                .captures_iter(&fragment.body)
                .map(|caps| caps[1].to_string())
                .collect();
            if !remaining.is_empty() {
                return Err(PatternError::Unresolved {
                    fragment: fragment.name.clone(),
                    rounds,
                    remaining,
                });
            }
        }

        debug!(fragments = fragments.len(), rounds, "resolved pattern library");
        Ok(Self {
            fragments,
            index,
            rounds,
        })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.fragments[i].body.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of substitution rounds the grammar needed.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Substitutes resolved fragments into an ad-hoc template.
    pub fn expand(&self, template: &str) -> Result<String, PatternError> {
        let re = placeholder_re();
        if let Some(name) = re
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .find(|name| !self.index.contains_key(name))
        {
            return Err(PatternError::UnknownFragment {
                fragment: template.to_string(),
                name,
            });
        }
        Ok(re
            .replace_all(template, |caps: &Captures| {
                self.fragments[self.index[&caps[1]]].body.clone()
            })
            .into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_grammar_resolves() {
        let lib = PatternLibrary::build().unwrap();
        assert_eq!(lib.len(), FRAGMENTS.len());
        assert!(lib.rounds() <= MAX_EXPANSION_ROUNDS);
        for fragment in lib.iter() {
            assert!(
                !placeholder_re().is_match(&fragment.body),
                "{} still has placeholders",
                fragment.name
            );
        }
    }

    #[test]
    fn test_nested_reference_is_inlined() {
        let lib = PatternLibrary::build().unwrap();
        let samyok = lib.get("VOWEL_SAMYOK").unwrap();
        assert!(samyok.contains(lib.get("VOWEL_TOP").unwrap()));
        assert!(lib.get("SYLLABLE").unwrap().contains(lib.get("SHIFT").unwrap()));
    }

    #[test]
    fn test_rewrite_fragments_compile_without_lookaround() {
        let lib = PatternLibrary::build().unwrap();
        for name in ["STRONG", "WEAK", "FINAL_COENG", "VOWEL_TOP", "COENG"] {
            let body = lib.get(name).unwrap();
            assert!(Regex::new(body).is_ok(), "{name} should compile with regex");
        }
    }

    #[test]
    fn test_forward_reference_takes_extra_round() {
        let defs = [("A", "x{B}"), ("B", "y{C}"), ("C", "z")];
        let lib = PatternLibrary::from_fragments(&defs, 3).unwrap();
        assert_eq!(lib.get("A"), Some("xyz"));
        assert_eq!(lib.rounds(), 2);
    }

    #[test]
    fn test_unknown_fragment_is_rejected() {
        let defs = [("A", "x{MISSING}")];
        match PatternLibrary::from_fragments(&defs, 3) {
            Err(PatternError::UnknownFragment { fragment, name }) => {
                assert_eq!(fragment, "A");
                assert_eq!(name, "MISSING");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_too_deep_nesting_fails_loudly() {
        // each fragment refers forward, so in-place rounds resolve one level at a time
        let defs = [("A", "{B}"), ("B", "{C}"), ("C", "{D}"), ("D", "{E}"), ("E", "e")];
        assert!(PatternLibrary::from_fragments(&defs, 4).is_ok());
        match PatternLibrary::from_fragments(&defs, 2) {
            Err(PatternError::Unresolved { fragment, rounds, .. }) => {
                assert_eq!(fragment, "A");
                assert_eq!(rounds, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_fails_loudly() {
        let defs = [("A", "a{B}"), ("B", "b{A}")];
        assert!(matches!(
            PatternLibrary::from_fragments(&defs, MAX_EXPANSION_ROUNDS),
            Err(PatternError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_expand_template() {
        let lib = PatternLibrary::build().unwrap();
        let expanded = lib.expand("({FINAL_COENG})x").unwrap();
        assert_eq!(expanded, format!("({})x", lib.get("FINAL_COENG").unwrap()));
        assert!(lib.expand("{NOPE}").is_err());
    }
}
