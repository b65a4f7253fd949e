use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::warn;

use crate::category::{categorize_chars, Category};
use crate::error::{Error, PatternError};
use crate::patterns::PatternLibrary;
use crate::rule_engine::RuleEngine;

/// Spelling convention of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Modern Khmer (`km`).
    #[default]
    Standard,
    /// Middle Khmer (`xhm`): a coeng after a vowel marks a final consonant,
    /// which is made explicit with a ZWJ.
    MiddleKhmer,
}

impl Variant {
    pub fn lang_tag(self) -> &'static str {
        match self {
            Variant::Standard => "km",
            Variant::MiddleKhmer => "xhm",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lang_tag())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "standard" => Ok(Variant::Standard),
            "xhm" | "middle-khmer" | "middlekhmer" => Ok(Variant::MiddleKhmer),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub variant: Variant,
    pub enable_rewrite_rules: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Standard,
            enable_rewrite_rules: true,
        }
    }
}

impl NormalizerConfig {
    pub fn with_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }
}

/// Span of one syllable, in char indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable {
    pub start: usize,
    pub end: usize,
}

impl Syllable {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Splits a category sequence into syllables: a base plus every following
/// character that ranks above base. Characters outside syllables are not
/// covered by any span.
pub fn find_syllables(cats: &[Category]) -> Vec<Syllable> {
    let mut syllables = Vec::new();
    let mut i = 0;
    while i < cats.len() {
        if cats[i] != Category::Base {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < cats.len() && cats[j].is_syllable_tail() {
            j += 1;
        }
        syllables.push(Syllable { start: i, end: j });
        i = j;
    }
    syllables
}

/// Upper bound on sort-and-rewrite passes. Moving a ROBAT or a subscript can
/// expose a new subscript to the rules, so one pass does not always settle.
pub const MAX_PASSES: usize = 8;

// upper or pre vowel, coeng, and an optional ZWJ already in place
const FINAL_COENG_MARK: &str = "([\u{17B7}-\u{17C5}]\u{17D2})\u{200D}?";

pub struct Normalizer {
    rules: RuleEngine,
    final_coeng: Regex,
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self, PatternError> {
        let library = PatternLibrary::build()?;
        Self::with_library(&library, config)
    }

    pub fn with_library(
        library: &PatternLibrary,
        config: NormalizerConfig,
    ) -> Result<Self, PatternError> {
        let final_coeng = Regex::new(FINAL_COENG_MARK).map_err(|source| PatternError::Regex {
            rule: "mark-final-coeng",
            source,
        })?;
        Ok(Self {
            rules: RuleEngine::new(library)?,
            final_coeng,
            config,
        })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn mark_final_coengs<'t>(&self, raw_text: &'t str) -> Cow<'t, str> {
        match self.config.variant {
            Variant::MiddleKhmer => self.final_coeng.replace_all(raw_text, "${1}\u{200D}"),
            Variant::Standard => Cow::Borrowed(raw_text),
        }
    }

    /// Syllable spans `normalize` sorts. Under [`Variant::MiddleKhmer`] the
    /// char indices refer to the text after final coengs got their ZWJ.
    pub fn syllables(&self, raw_text: &str) -> Vec<Syllable> {
        let text = self.mark_final_coengs(raw_text);
        let chars: Vec<char> = text.chars().collect();
        find_syllables(&categorize_chars(&chars))
    }

    /// Reorders every syllable of `raw_text` into canonical order and applies
    /// the rewrite rules. Text outside syllables is copied through.
    ///
    /// Passes repeat until the text stops changing, so the result is a fixed
    /// point: normalizing it again returns it unchanged.
    pub fn normalize(&self, raw_text: &str) -> String {
        let mut text = self.pass(raw_text);
        if text == raw_text {
            return text;
        }
        for _ in 1..MAX_PASSES {
            let next = self.pass(&text);
            if next == text {
                return text;
            }
            text = next;
        }
        warn!(passes = MAX_PASSES, "normalization did not settle");
        text
    }

    fn pass(&self, raw_text: &str) -> String {
        let text = self.mark_final_coengs(raw_text);
        let chars: Vec<char> = text.chars().collect();
        let cats = categorize_chars(&chars);

        let mut result = String::with_capacity(text.len());
        let mut cluster = String::with_capacity(16);
        let mut order: Vec<usize> = Vec::with_capacity(16);
        let mut cursor = 0;

        for syllable in find_syllables(&cats) {
            result.extend(&chars[cursor..syllable.start]);

            // stable: category first, then original position
            order.clear();
            order.extend(syllable.range());
            order.sort_unstable_by_key(|&n| (cats[n], n));

            cluster.clear();
            cluster.extend(order.iter().map(|&n| chars[n]));

            if self.config.enable_rewrite_rules {
                result.push_str(&self.rules.apply(&cluster));
            } else {
                result.push_str(&cluster);
            }
            cursor = syllable.end;
        }
        result.extend(&chars[cursor..]);
        result
    }

    pub fn normalize_batch<S>(&self, lines: &[S]) -> Vec<String>
    where
        S: AsRef<str> + Sync,
    {
        lines.par_iter().map(|l| self.normalize(l.as_ref())).collect()
    }
}
