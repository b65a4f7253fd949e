use khmer_normalizer::{check, check_segments, Segment};

fn matched(s: &str) -> Segment {
    Segment::Matched(s.to_string())
}

fn missing(s: &str) -> Segment {
    Segment::MissingBase(s.to_string())
}

fn defect(s: &str) -> Segment {
    Segment::Defect(s.to_string())
}

#[test]
fn test_conforming_text() {
    assert_eq!(check(""), None);
    assert_eq!(check("plain ascii"), None);
    assert_eq!(check("\u{1780}\u{17CC}\u{17B7}"), None);
    assert_eq!(
        check("\u{1780}\u{17D2}\u{179A}\u{17BB}\u{1798}\u{17A0}\u{17CA}\u{17BB}\u{1793}"),
        None
    );
}

#[test]
fn test_syllables_are_split_longest_first() {
    let report = check_segments(
        "\u{1780}\u{17D2}\u{179A}\u{17BB}\u{1798}\u{17A0}\u{17CA}\u{17BB}\u{1793} \
         \u{179F}\u{17D2}\u{178F}\u{17D2}\u{179A}\u{17B8}\u{17D4}",
    );
    assert_eq!(
        report.segments,
        vec![
            matched("\u{1780}\u{17D2}\u{179A}\u{17BB}"),
            matched("\u{1798}"),
            matched("\u{17A0}\u{17CA}\u{17BB}"),
            matched("\u{1793}"),
            matched(" "),
            matched("\u{179F}\u{17D2}\u{178F}\u{17D2}\u{179A}\u{17B8}"),
            matched("\u{17D4}"),
        ]
    );
    assert!(report.passed());
}

#[test]
fn test_mixed_script_segments_per_char() {
    let report = check_segments("ab \u{1780}\u{17CC}\u{17B7}");
    assert_eq!(
        report.segments,
        vec![
            matched("a"),
            matched("b"),
            matched(" "),
            matched("\u{1780}\u{17CC}\u{17B7}")
        ]
    );
}

#[test]
fn test_missing_base_gets_a_dotted_circle() {
    let text = "\u{1780}\u{17B6}\u{17B6}";
    let report = check_segments(text);
    assert_eq!(
        report.segments,
        vec![matched("\u{1780}\u{17B6}"), missing("\u{17B6}")]
    );
    assert_eq!(
        check(text).as_deref(),
        Some("\u{1780}\u{17B6}\u{25CC}\u{17B6}")
    );
    assert_eq!(report.text(), text);

    let report = check_segments("\u{17B6}\u{1780}");
    assert_eq!(report.segments, vec![missing("\u{17B6}"), matched("\u{1780}")]);
}

#[test]
fn test_zwnj_between_base_and_vowel() {
    let report = check_segments("\u{1780}\u{200C}\u{17B6}");
    assert_eq!(
        report.segments,
        vec![matched("\u{1780}"), matched("\u{200C}"), missing("\u{17B6}")]
    );
}

#[test]
fn test_nikahit_before_vowel() {
    let report = check_segments("\u{1780}\u{17C6}\u{17B6}");
    assert_eq!(
        report.segments,
        vec![matched("\u{1780}\u{17C6}"), missing("\u{17B6}")]
    );
}

#[test]
fn test_stray_coengs() {
    assert_eq!(
        check("\u{1780}\u{17D2}").as_deref(),
        Some("\u{1780}!\u{17D2}!")
    );

    let report = check_segments("\u{1780}\u{17D2}\u{17D2}\u{1780}");
    assert_eq!(
        report.segments,
        vec![
            matched("\u{1780}"),
            defect("\u{17D2}"),
            missing("\u{17D2}\u{1780}")
        ]
    );
    assert_eq!(
        report.diagnostic().as_deref(),
        Some("\u{1780}!\u{17D2}!\u{25CC}\u{17D2}\u{1780}")
    );
    assert_eq!(report.failures().count(), 2);
}
