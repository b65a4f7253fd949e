use thiserror::Error;

/// Defects in the grammar tables. These are authoring bugs detected once at
/// startup, never conditions of the input text.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("fragment `{fragment}` references unknown fragment `{name}`")]
    UnknownFragment { fragment: String, name: String },

    #[error("fragment `{fragment}` still has placeholders after {rounds} expansion rounds: {remaining:?}")]
    Unresolved {
        fragment: String,
        rounds: usize,
        remaining: Vec<String>,
    },

    #[error("syntax error in `{fragment}` at char {offset}: {reason}")]
    Syntax {
        fragment: String,
        offset: usize,
        reason: &'static str,
    },

    #[error("rule `{rule}` failed to compile: {source}")]
    Regex {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("unknown language variant `{0}` (expected km or xhm)")]
    UnknownVariant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
