use crate::canon::{CanonicalIndex, VerseRef};
use crate::usfm::ParsedVerseMap;

/// One string per canonical position; an empty string is an unfilled verse.
pub type CanonicalArray = Vec<String>;

#[derive(Debug, Clone, Default)]
pub struct AlignmentOutcome {
    pub array: CanonicalArray,
    pub applied: usize,
    pub unknown_references: Vec<VerseRef>,
}

/// Merges parsed verses into a copy of `existing` at their canonical
/// positions. Untouched positions keep their existing text.
pub fn align(
    existing: Option<&[String]>,
    parsed: &ParsedVerseMap,
    index: &CanonicalIndex,
) -> CanonicalArray {
    align_with_outcome(existing, parsed, index).array
}

/// Same as [`align`], also reporting references the index does not know.
pub fn align_with_outcome(
    existing: Option<&[String]>,
    parsed: &ParsedVerseMap,
    index: &CanonicalIndex,
) -> AlignmentOutcome {
    let length = index.len();
    let mut array = match existing {
        Some(existing) => {
            let mut array = existing.iter().take(length).cloned().collect::<Vec<String>>();
            array.resize(length, String::new());
            array
        }
        None => vec![String::new(); length],
    };

    let mut applied = 0usize;
    let mut unknown_references = Vec::new();
    for (reference, text) in parsed {
        match index.position_of(reference) {
            Some(position) => {
                array[position] = text.clone();
                applied += 1;
            }
            None => unknown_references.push(reference.clone()),
        }
    }

    AlignmentOutcome {
        array,
        applied,
        unknown_references,
    }
}

/// Combines maps from several documents; later maps win per reference.
pub fn merge_verse_maps<I>(maps: I) -> ParsedVerseMap
where
    I: IntoIterator<Item = ParsedVerseMap>,
{
    let mut merged = ParsedVerseMap::new();
    for map in maps {
        merged.extend(map);
    }
    merged
}
