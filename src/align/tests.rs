use super::*;
use crate::canon::{CanonicalIndex, VerseRef};
use crate::usfm::ParsedVerseMap;

fn sample_index() -> CanonicalIndex {
    CanonicalIndex::build(["GEN 1:1", "GEN 1:2", "GEN 1:3", "GEN 2:1", "EXO 1:1"])
        .expect("sample canon should build")
}

fn verse_map(entries: &[(&str, &str)]) -> ParsedVerseMap {
    entries
        .iter()
        .map(|(reference, text)| {
            (
                reference.parse::<VerseRef>().expect("test reference should parse"),
                text.to_string(),
            )
        })
        .collect()
}

fn array(slots: &[&str]) -> Vec<String> {
    slots.iter().map(|slot| slot.to_string()).collect()
}

#[test]
fn align_without_existing_starts_from_blank_array() {
    let index = sample_index();
    let aligned = align(None, &verse_map(&[("GEN 2:1", "Thus.")]), &index);

    assert_eq!(aligned, array(&["", "", "", "Thus.", ""]));
}

#[test]
fn align_keeps_untouched_positions() {
    let index = sample_index();
    let existing = array(&["Old text.", "", "", "", ""]);

    let aligned = align(
        Some(existing.as_slice()),
        &verse_map(&[("GEN 1:2", "New text.")]),
        &index,
    );

    assert_eq!(aligned[0], "Old text.");
    assert_eq!(aligned[1], "New text.");
    assert_eq!(existing[1], "", "existing array must not be mutated");
}

#[test]
fn align_overwrites_supplied_positions_even_with_blank_text() {
    let index = sample_index();
    let existing = array(&["a.", "b.", "c.", "d.", "e."]);

    let aligned = align(
        Some(existing.as_slice()),
        &verse_map(&[("GEN 1:3", ""), ("EXO 1:1", "E.")]),
        &index,
    );

    assert_eq!(aligned, array(&["a.", "b.", "", "d.", "E."]));
}

#[test]
fn align_normalizes_length_to_index() {
    let index = sample_index();

    let short = array(&["kept."]);
    let padded = align(Some(short.as_slice()), &ParsedVerseMap::new(), &index);
    assert_eq!(padded, array(&["kept.", "", "", "", ""]));

    let long = array(&["1", "2", "3", "4", "5", "6", "7"]);
    let truncated = align(Some(long.as_slice()), &ParsedVerseMap::new(), &index);
    assert_eq!(truncated, array(&["1", "2", "3", "4", "5"]));
}

#[test]
fn align_reports_unknown_references() {
    let index = sample_index();
    let outcome = align_with_outcome(
        None,
        &verse_map(&[("GEN 1:1", "In."), ("REV 22:21", "Amen.")]),
        &index,
    );

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.unknown_references, vec![VerseRef::new("REV", 22, 21)]);
    assert_eq!(outcome.array.len(), 5);
}

#[test]
fn sequential_alignments_accumulate() {
    let index = sample_index();
    let first = align(None, &verse_map(&[("GEN 1:1", "One.")]), &index);
    let second = align(Some(first.as_slice()), &verse_map(&[("GEN 1:2", "Two.")]), &index);
    let third = align(Some(second.as_slice()), &verse_map(&[("GEN 1:1", "Uno.")]), &index);

    assert_eq!(second, array(&["One.", "Two.", "", "", ""]));
    assert_eq!(third, array(&["Uno.", "Two.", "", "", ""]));
}

#[test]
fn align_against_empty_index_is_empty() {
    let index = CanonicalIndex::default();
    let existing = array(&["orphan."]);
    let aligned = align(Some(existing.as_slice()), &verse_map(&[("GEN 1:1", "x.")]), &index);
    assert!(aligned.is_empty());
}

#[test]
fn merge_verse_maps_lets_later_documents_win() {
    let merged = merge_verse_maps([
        verse_map(&[("GEN 1:1", "first."), ("GEN 1:2", "keep.")]),
        verse_map(&[("GEN 1:1", "second.")]),
    ]);

    assert_eq!(merged.len(), 2);
    assert_eq!(
        merged.get(&VerseRef::new("GEN", 1, 1)).map(String::as_str),
        Some("second.")
    );
}

#[test]
fn stats_counts_filled_and_missing() {
    let stats = stats(&array(&["In the beginning.", "", "", "", ""]));

    assert_eq!(stats.total, 5);
    assert_eq!(stats.filled, 1);
    assert_eq!(stats.missing, 4);
    assert_eq!(stats.completion_percentage, 20.0);
    assert_eq!(stats.filled + stats.missing, stats.total);
}

#[test]
fn stats_treats_single_space_as_filled() {
    let stats = stats(&array(&[" ", ""]));
    assert_eq!(stats.filled, 1);
    assert_eq!(stats.missing, 1);
}

#[test]
fn stats_of_empty_array_is_zero_percent() {
    let stats = stats(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.completion_percentage, 0.0);
}

#[test]
fn missing_ranges_group_by_reference_adjacency() {
    let index = sample_index();
    let ranges = missing_ranges(&array(&["filled.", "", "", "", ""]), &index, 10);

    assert_eq!(ranges, vec!["GEN 1:2 - GEN 1:3", "GEN 2:1", "EXO 1:1"]);
}

#[test]
fn missing_ranges_split_at_filled_positions_and_chapters() {
    let index = CanonicalIndex::build([
        "MAT 1:1", "MAT 1:2", "MAT 1:3", "MAT 1:4", "MAT 2:1", "MAT 2:2",
    ])
    .expect("canon should build");

    let ranges = missing_ranges(&array(&["", "", "", "x.", "", ""]), &index, 10);
    assert_eq!(ranges, vec!["MAT 1:1 - MAT 1:3", "MAT 2:1 - MAT 2:2"]);

    let whole_chapter_and_next = missing_ranges(&array(&["", "", "", "", "x.", ""]), &index, 10);
    assert_eq!(whole_chapter_and_next, vec!["MAT 1:1 - MAT 1:4", "MAT 2:2"]);
}

#[test]
fn missing_ranges_respect_display_cap() {
    let index = sample_index();
    let blank = array(&["", "", "", "", ""]);

    assert_eq!(missing_ranges(&blank, &index, 2), vec!["GEN 1:1 - GEN 1:3", "GEN 2:1"]);
    assert!(missing_ranges(&blank, &index, 0).is_empty());
}

#[test]
fn missing_ranges_of_complete_array_is_empty() {
    let index = sample_index();
    let full = array(&["a.", "b.", "c.", "d.", " "]);
    assert!(missing_ranges(&full, &index, 10).is_empty());
}

#[test]
fn book_progress_counts_per_book() {
    let index = sample_index();
    let progress = book_progress(&array(&["a.", "", "c.", "", "e."]), &index);

    assert_eq!(
        progress,
        vec![
            BookProgress {
                book: "GEN".to_string(),
                chapters: 2,
                total: 4,
                filled: 2,
            },
            BookProgress {
                book: "EXO".to_string(),
                chapters: 1,
                total: 1,
                filled: 1,
            },
        ]
    );
}
