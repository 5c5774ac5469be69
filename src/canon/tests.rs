use super::*;

fn sample_index() -> CanonicalIndex {
    CanonicalIndex::build(["GEN 1:1", "GEN 1:2", "GEN 1:3", "GEN 2:1", "EXO 1:1"])
        .expect("sample canon should build")
}

#[test]
fn verse_ref_parses_and_displays_canonical_form() {
    let reference: VerseRef = "gen 12:3".parse().expect("reference should parse");
    assert_eq!(reference.book(), "GEN");
    assert_eq!(reference.chapter(), 12);
    assert_eq!(reference.verse(), 3);
    assert_eq!(reference.to_string(), "GEN 12:3");
}

#[test]
fn verse_ref_rejects_malformed_input() {
    assert!("GEN".parse::<VerseRef>().is_err());
    assert!("GEN 1".parse::<VerseRef>().is_err());
    assert!("GEN a:1".parse::<VerseRef>().is_err());
    assert!("GEN 0:1".parse::<VerseRef>().is_err());
    assert!("GEN 1:0".parse::<VerseRef>().is_err());
    assert!("G-N 1:1".parse::<VerseRef>().is_err());
}

#[test]
fn verse_ref_adjacency_requires_same_chapter() {
    let first = VerseRef::new("GEN", 1, 3);
    assert!(first.is_followed_by(&VerseRef::new("GEN", 1, 4)));
    assert!(!first.is_followed_by(&VerseRef::new("GEN", 1, 5)));
    assert!(!first.is_followed_by(&VerseRef::new("GEN", 2, 4)));
    assert!(!first.is_followed_by(&VerseRef::new("EXO", 1, 4)));
}

#[test]
fn build_skips_blank_lines_without_consuming_positions() {
    let index = CanonicalIndex::build(["GEN 1:1", "", "   ", "GEN 1:2"])
        .expect("canon with blank lines should build");

    assert_eq!(index.len(), 2);
    assert_eq!(index.position_of(&VerseRef::new("GEN", 1, 2)), Some(1));
}

#[test]
fn build_from_empty_list_yields_zero_length_index() {
    let index = CanonicalIndex::build(Vec::<String>::new()).expect("empty canon should build");
    assert!(index.is_empty());
    assert_eq!(index.reference_at(0), None);
}

#[test]
fn build_rejects_duplicates_and_malformed_lines() {
    let duplicate = CanonicalIndex::build(["GEN 1:1", "GEN 1:1"]).unwrap_err();
    assert!(duplicate.to_string().contains("duplicate"));

    let malformed = CanonicalIndex::build(["GEN 1:1", "not a reference"]).unwrap_err();
    assert!(malformed.to_string().contains("line 2"));
}

#[test]
fn positions_and_references_are_inverse() {
    let index = sample_index();
    for position in 0..index.len() {
        let reference = index.reference_at(position).expect("position in range");
        assert_eq!(index.position_of(reference), Some(position));
    }
    assert_eq!(index.position_of(&VerseRef::new("LEV", 1, 1)), None);
    assert_eq!(index.reference_at(index.len()), None);
}

#[test]
fn chapter_positions_probe_until_first_gap() {
    let index = sample_index();
    assert_eq!(
        index.chapter_positions("GEN", 1),
        vec![(1, 0), (2, 1), (3, 2)]
    );
    assert_eq!(index.chapter_positions("GEN", 2), vec![(1, 3)]);
    assert!(index.chapter_positions("GEN", 3).is_empty());
}

#[test]
fn chapters_and_books_follow_canon_order() {
    let index = sample_index();
    assert_eq!(index.chapters_of("GEN").into_iter().collect::<Vec<_>>(), vec![1, 2]);
    assert!(index.chapters_of("LEV").is_empty());
    assert_eq!(index.books(), vec!["GEN", "EXO"]);
}

#[test]
fn from_text_reads_newline_delimited_lists() {
    let index = CanonicalIndex::from_text("GEN 1:1\nGEN 1:2\n\nEXO 1:1\n")
        .expect("text canon should build");
    assert_eq!(index.len(), 3);
    assert_eq!(index.reference_at(2).map(ToString::to_string).as_deref(), Some("EXO 1:1"));
}
