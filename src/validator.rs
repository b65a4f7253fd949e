use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PatternError;
use crate::matcher::Pattern;
use crate::patterns::{PatternLibrary, PLACEHOLDER_BASE};

/// Delimiter written around each defective character in a diagnostic.
pub const DEFECT_MARK: char = '!';

const SYLLABLE: &str = "SYLLABLE";

/// One piece of a validated text. Every variant carries only input text, so
/// the segments of a report concatenate back to the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "kebab-case")]
pub enum Segment {
    /// A well-formed syllable, or a character outside the Khmer letters.
    Matched(String),
    /// Characters that only form a syllable once a base is supplied in front.
    MissingBase(String),
    /// A single character that fits nowhere.
    Defect(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Matched(s) | Segment::MissingBase(s) | Segment::Defect(s) => s,
        }
    }

    pub fn is_conforming(&self) -> bool {
        matches!(self, Segment::Matched(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub segments: Vec<Segment>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.segments.iter().all(Segment::is_conforming)
    }

    /// The input text rebuilt from the segments.
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }

    /// `None` when every segment conforms. Otherwise the text with each
    /// defective character wrapped in [`DEFECT_MARK`] and a
    /// [`PLACEHOLDER_BASE`] in front of every run that lacks a base.
    pub fn diagnostic(&self) -> Option<String> {
        if self.passed() {
            return None;
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Defect(s) => {
                    out.push(DEFECT_MARK);
                    out.push_str(s);
                    out.push(DEFECT_MARK);
                }
                Segment::MissingBase(s) => {
                    out.push(PLACEHOLDER_BASE);
                    out.push_str(s);
                }
                Segment::Matched(s) => out.push_str(s),
            }
        }
        Some(out)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| !s.is_conforming())
    }
}

/// Re-parses text against the syllable grammar, one longest match at a time.
pub struct Validator {
    syllable: Pattern,
}

impl Validator {
    pub fn new() -> Result<Self, PatternError> {
        Self::with_library(&PatternLibrary::build()?)
    }

    pub fn with_library(library: &PatternLibrary) -> Result<Self, PatternError> {
        let source = library
            .get(SYLLABLE)
            .ok_or_else(|| PatternError::UnknownFragment {
                fragment: "validator".to_string(),
                name: SYLLABLE.to_string(),
            })?;
        let syllable = Pattern::parse(SYLLABLE, source)?;
        debug!(grammar = syllable.name(), "compiled syllable grammar");
        Ok(Self { syllable })
    }

    pub fn segments(&self, text: &str) -> Report {
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < chars.len() {
            let rest = &chars[pos..];

            if let Some(len) = self.syllable.longest_match(rest).filter(|&n| n > 0) {
                segments.push(Segment::Matched(rest[..len].iter().collect()));
                pos += len;
                continue;
            }

            // Retry with a dotted circle in front. The match has to use at
            // least one real character to count.
            if let Some(len) = self
                .syllable
                .longest_match_after(PLACEHOLDER_BASE, rest)
                .filter(|&n| n > 1)
            {
                let consumed = len - 1;
                segments.push(Segment::MissingBase(rest[..consumed].iter().collect()));
                pos += consumed;
                continue;
            }

            segments.push(Segment::Defect(rest[0].to_string()));
            pos += 1;
        }

        Report { segments }
    }

    pub fn check(&self, text: &str) -> Option<String> {
        self.segments(text).diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_ascii_pass() {
        let v = Validator::new().unwrap();
        assert_eq!(v.check(""), None);
        assert_eq!(v.check("a"), None);
        assert!(v.segments("").segments.is_empty());
    }

    #[test]
    fn test_simple_syllable_is_one_segment() {
        let v = Validator::new().unwrap();
        let report = v.segments("\u{1780}\u{17B6}");
        assert_eq!(report.segments, vec![Segment::Matched("\u{1780}\u{17B6}".into())]);
    }

    #[test]
    fn test_vowel_without_base() {
        let v = Validator::new().unwrap();
        let report = v.segments("\u{17B6}");
        assert_eq!(report.segments, vec![Segment::MissingBase("\u{17B6}".into())]);
        assert!(!report.passed());
        assert_eq!(report.diagnostic().as_deref(), Some("\u{25CC}\u{17B6}"));
        // the segment itself keeps only the input text
        assert_eq!(report.text(), "\u{17B6}");
    }

    #[test]
    fn test_stray_coeng_is_a_defect() {
        let v = Validator::new().unwrap();
        let report = v.segments("\u{1780}\u{17D2}");
        assert_eq!(
            report.segments,
            vec![
                Segment::Matched("\u{1780}".into()),
                Segment::Defect("\u{17D2}".into())
            ]
        );
        assert_eq!(v.check("\u{1780}\u{17D2}").as_deref(), Some("\u{1780}!\u{17D2}!"));
    }

    #[test]
    fn test_segments_rebuild_input() {
        let v = Validator::new().unwrap();
        let text = "\u{17D2}\u{1780}\u{17B6}\u{17B6}x\u{17CC}\u{17CC}";
        assert_eq!(v.segments(text).text(), text);
    }

    #[test]
    fn test_failures_iterator() {
        let v = Validator::new().unwrap();
        let report = v.segments("\u{1780}\u{17D2}a");
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, vec![&Segment::Defect("\u{17D2}".into())]);
    }

    #[test]
    fn test_report_serializes_with_kinds() {
        let report = Report {
            segments: vec![
                Segment::Matched("a".into()),
                Segment::MissingBase("b".into()),
                Segment::Defect("c".into()),
            ],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"segments":[{"kind":"matched","text":"a"},{"kind":"missing-base","text":"b"},{"kind":"defect","text":"c"}]}"#
        );
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
