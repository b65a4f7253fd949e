use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntactic role of a code point inside a Khmer syllable.
///
/// The declaration order is the canonical order of a syllable: sorting a
/// syllable's characters by `Category` (stably) produces the normalized
/// sequence. `Other` is declared first and never takes part in a syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    Other,
    Base,
    Robat,
    Coeng,
    ZeroWidthCoeng,
    Shift,
    ZeroWidthNonJoiner,
    VowelPre,
    VowelBelow,
    VowelAbove,
    VowelPost,
    Sign,
    FinalSign,
}

impl Category {
    /// True for every category that ranks above `Base`, i.e. the characters
    /// that extend a syllable once it has started.
    pub fn is_syllable_tail(self) -> bool {
        self > Category::Base
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Other => "other",
            Category::Base => "base",
            Category::Robat => "robat",
            Category::Coeng => "coeng",
            Category::ZeroWidthCoeng => "zwj",
            Category::Shift => "shift",
            Category::ZeroWidthNonJoiner => "zwnj",
            Category::VowelPre => "vowel-pre",
            Category::VowelBelow => "vowel-below",
            Category::VowelAbove => "vowel-above",
            Category::VowelPost => "vowel-post",
            Category::Sign => "sign",
            Category::FinalSign => "final-sign",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const TABLE_START: u32 = 0x1780;
pub const TABLE_END: u32 = 0x17DD;
const TABLE_LEN: usize = (TABLE_END - TABLE_START + 1) as usize;

pub const COENG: char = '\u{17D2}';
pub const ZWNJ: char = '\u{200C}';
pub const ZWJ: char = '\u{200D}';

// (first, last, category) runs over U+1780..=U+17DD
const RUNS: &[(u32, u32, Category)] = &[
    (0x1780, 0x17A2, Category::Base),      // consonants
    (0x17A3, 0x17A4, Category::Other),     // deprecated independent vowels
    (0x17A5, 0x17B3, Category::Base),      // independent vowels
    (0x17B4, 0x17B5, Category::Other),     // inherent vowels
    (0x17B6, 0x17B6, Category::VowelPost), // AA
    (0x17B7, 0x17BA, Category::VowelAbove),
    (0x17BB, 0x17BD, Category::VowelBelow),
    (0x17BE, 0x17C5, Category::VowelPre),
    (0x17C6, 0x17C6, Category::Sign),      // NIKAHIT
    (0x17C7, 0x17C8, Category::FinalSign), // REAHMUK, YUUKALEAPINTU
    (0x17C9, 0x17CA, Category::Shift),     // MUUSIKATOAN, TRIISAP
    (0x17CB, 0x17CB, Category::Sign),
    (0x17CC, 0x17CC, Category::Robat),
    (0x17CD, 0x17D1, Category::Sign),
    (0x17D2, 0x17D2, Category::Coeng),
    (0x17D3, 0x17D3, Category::Sign),
    (0x17D4, 0x17DC, Category::Other), // punctuation, currency, avakrahasanya
    (0x17DD, 0x17DD, Category::Sign),
];

const fn build_table() -> [Category; TABLE_LEN] {
    let mut table = [Category::Other; TABLE_LEN];
    let mut r = 0;
    while r < RUNS.len() {
        let (first, last, cat) = RUNS[r];
        let mut cp = first;
        while cp <= last {
            table[(cp - TABLE_START) as usize] = cat;
            cp += 1;
        }
        r += 1;
    }
    table
}

static CATEGORIES: [Category; TABLE_LEN] = build_table();

/// Category of a single code point. Total over `char`.
#[inline]
pub fn classify(c: char) -> Category {
    let cp = c as u32;
    if (TABLE_START..=TABLE_END).contains(&cp) {
        return CATEGORIES[(cp - TABLE_START) as usize];
    }
    match c {
        ZWNJ => Category::ZeroWidthNonJoiner,
        ZWJ => Category::ZeroWidthCoeng,
        _ => Category::Other,
    }
}

/// Classifies every character of `chars` and folds subscripts into the
/// preceding coeng: a base or ZWJ directly after a coeng becomes a coeng
/// itself. The pass runs left to right so it carries through chains.
pub fn categorize_chars(chars: &[char]) -> Vec<Category> {
    let mut cats: Vec<Category> = chars.iter().map(|&c| classify(c)).collect();
    for i in 1..cats.len() {
        if cats[i - 1] == Category::Coeng
            && matches!(cats[i], Category::Base | Category::ZeroWidthCoeng)
        {
            cats[i] = Category::Coeng;
        }
    }
    cats
}

pub fn categorize(text: &str) -> Vec<Category> {
    let chars: Vec<char> = text.chars().collect();
    categorize_chars(&chars)
}
