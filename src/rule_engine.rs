use regex::Regex;
use std::borrow::Cow;
use tracing::{debug, trace};

use crate::error::PatternError;
use crate::patterns::PatternLibrary;

// (name, template, replacement), applied in this order to one sorted syllable.
// Templates may reference lookaround-free fragments only. The shifter rules
// capture what would be a lookahead and write it back unchanged.
const RULES: &[(&str, &str, &str)] = &[
    // Rule 0: runs of invisible joiners collapse to their leading sequence
    (
        "collapse-invisibles",
        "([\u{200C}\u{200D}]\u{17D2}?|\u{17D2}\u{200D})[\u{17D2}\u{200C}\u{200D}]+",
        "${1}",
    ),
    // Rule 1: E + II and E + AA are the split vowels OE and OO
    ("compound-oe", "\u{17C1}([\u{17BB}-\u{17BD}]?)\u{17B8}", "\u{17BE}${1}"),
    ("compound-oo", "\u{17C1}([\u{17BB}-\u{17BD}]?)\u{17B6}", "\u{17C4}${1}"),
    // Rule 2: -u comes before OE so the shifter rules can see it
    ("u-before-oe", "(\u{17BE})(\u{17BB}+)", "${2}${1}"),
    // Rule 3: -u under an upper vowel is really a shifter: TRIISAP on strong
    // clusters, MUUSIKATOAN on weak ones. The shifter goes straight after the
    // cluster, ahead of any pre-vowel.
    (
        "strong-shifter",
        "({STRONG}{FINAL_COENG}?)([\u{17C1}-\u{17C5}]?)\u{17BB}({VOWEL_TOP}|\u{17D0})",
        "${1}\u{17CA}${2}${3}",
    ),
    (
        "weak-shifter",
        "({WEAK}{FINAL_COENG}?)([\u{17C1}-\u{17C5}]?)\u{17BB}({VOWEL_TOP}|\u{17D0})",
        "${1}\u{17C9}${2}${3}",
    ),
    // Rule 4: subscript RO renders last
    (
        "coeng-ro-last",
        "(\u{17D2}\u{179A})(\u{17D2}[\u{1780}-\u{17B3}])",
        "${2}${1}",
    ),
    // Rule 5: subscript DA is written as subscript TA
    ("coeng-da-to-ta", "(\u{17D2})\u{178A}", "${1}\u{178F}"),
];

struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered contextual rewrites applied inside one syllable after sorting.
pub struct RuleEngine {
    rules: Vec<RewriteRule>,
}

impl RuleEngine {
    pub fn new(library: &PatternLibrary) -> Result<Self, PatternError> {
        let mut rules = Vec::with_capacity(RULES.len());
        for &(name, template, replacement) in RULES {
            let source = library.expand(template)?;
            let pattern = Regex::new(&source)
                .map_err(|source| PatternError::Regex { rule: name, source })?;
            rules.push(RewriteRule {
                name,
                pattern,
                replacement,
            });
        }
        debug!(rules = rules.len(), "compiled rewrite rules");
        Ok(RuleEngine { rules })
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    pub fn apply<'t>(&self, syllable: &'t str) -> Cow<'t, str> {
        let mut text = Cow::Borrowed(syllable);
        for rule in &self.rules {
            let rewritten = match rule.pattern.replace_all(&text, rule.replacement) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = rewritten {
                trace!(rule = rule.name, from = %text, to = %s, "rewrote syllable");
                text = Cow::Owned(s);
            }
        }
        text
    }
}
