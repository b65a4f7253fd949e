//! Canonical ordering and conformance checking for Khmer text.
//!
//! Khmer syllables can be typed in many orders that render the same. This
//! crate sorts every syllable into one canonical order, applies a handful of
//! spelling rewrites, and can re-parse the result against the syllable
//! grammar to point at characters that do not fit.
//!
//! ```
//! use khmer_normalizer::{check, normalize, Variant};
//!
//! // KA + vowel I + ROBAT: the robat belongs before the vowel
//! let text = normalize("\u{1780}\u{17B7}\u{17CC}", Variant::Standard);
//! assert_eq!(text, "\u{1780}\u{17CC}\u{17B7}");
//! assert_eq!(check(&text), None);
//! ```

pub mod category;
pub mod error;
pub mod input;
pub mod matcher;
pub mod normalization;
pub mod patterns;
pub mod rule_engine;
pub mod validator;

use std::sync::OnceLock;

pub use category::{categorize, classify, Category};
pub use error::{Error, PatternError, Result};
pub use normalization::{find_syllables, Normalizer, NormalizerConfig, Syllable, Variant};
pub use patterns::PatternLibrary;
pub use validator::{Report, Segment, Validator};

struct Shared {
    standard: Normalizer,
    middle_khmer: Normalizer,
    validator: Validator,
}

impl Shared {
    fn build() -> Result<Self, PatternError> {
        let library = PatternLibrary::build()?;
        Ok(Self {
            standard: Normalizer::with_library(
                &library,
                NormalizerConfig::with_variant(Variant::Standard),
            )?,
            middle_khmer: Normalizer::with_library(
                &library,
                NormalizerConfig::with_variant(Variant::MiddleKhmer),
            )?,
            validator: Validator::with_library(&library)?,
        })
    }
}

fn shared() -> &'static Shared {
    static SHARED: OnceLock<Shared> = OnceLock::new();
    SHARED.get_or_init(|| match Shared::build() {
        Ok(shared) => shared,
        // the grammar is compiled into the crate, so this is a build defect
        Err(err) => panic!("built-in Khmer grammar is invalid: {err}"),
    })
}

/// Normalizes `text` with the shared normalizer for `variant`.
pub fn normalize(text: &str, variant: Variant) -> String {
    let shared = shared();
    match variant {
        Variant::Standard => shared.standard.normalize(text),
        Variant::MiddleKhmer => shared.middle_khmer.normalize(text),
    }
}

/// Checks `text` against the syllable grammar. `None` means it conforms;
/// otherwise the returned text marks each defective character as `!c!` and
/// puts a dotted circle where a base consonant is missing.
pub fn check(text: &str) -> Option<String> {
    shared().validator.check(text)
}

/// Like [`check`], but returns the individual segments.
pub fn check_segments(text: &str) -> Report {
    shared().validator.segments(text)
}
