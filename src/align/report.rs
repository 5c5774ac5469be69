use serde::Serialize;

use crate::canon::{CanonicalIndex, VerseRef};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionStats {
    pub total: usize,
    pub filled: usize,
    pub missing: usize,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookProgress {
    pub book: String,
    pub chapters: usize,
    pub total: usize,
    pub filled: usize,
}

/// Only the empty string counts as blank; a single-space placeholder is filled.
fn is_blank(slot: &str) -> bool {
    slot.is_empty()
}

pub fn stats(array: &[String]) -> CompletionStats {
    let total = array.len();
    let filled = array.iter().filter(|slot| !is_blank(slot)).count();
    let completion_percentage = if total == 0 {
        0.0
    } else {
        filled as f64 / total as f64 * 100.0
    };

    CompletionStats {
        total,
        filled,
        missing: total - filled,
        completion_percentage,
    }
}

/// Human-readable runs of missing verses, at most `max_ranges` of them.
///
/// Consecutive blank positions share a run only while their references are
/// in the same chapter with verse numbers one apart.
pub fn missing_ranges(array: &[String], index: &CanonicalIndex, max_ranges: usize) -> Vec<String> {
    let mut ranges = Vec::new();
    let mut run: Option<(&VerseRef, &VerseRef)> = None;

    for (position, slot) in array.iter().enumerate() {
        if ranges.len() >= max_ranges {
            break;
        }

        let reference = match index.reference_at(position) {
            Some(reference) if is_blank(slot) => reference,
            _ => {
                if let Some((first, last)) = run.take() {
                    ranges.push(render_range(first, last));
                }
                continue;
            }
        };

        run = match run {
            Some((first, last)) if last.is_followed_by(reference) => Some((first, reference)),
            Some((first, last)) => {
                ranges.push(render_range(first, last));
                Some((reference, reference))
            }
            None => Some((reference, reference)),
        };
    }

    if let Some((first, last)) = run {
        ranges.push(render_range(first, last));
    }
    ranges.truncate(max_ranges);
    ranges
}

fn render_range(first: &VerseRef, last: &VerseRef) -> String {
    if first == last {
        first.to_string()
    } else {
        format!("{first} - {last}")
    }
}

/// Filled and total verse counts per book, in canon order.
pub fn book_progress(array: &[String], index: &CanonicalIndex) -> Vec<BookProgress> {
    index
        .books()
        .into_iter()
        .map(|book| {
            let chapters = index.chapters_of(book);
            let mut total = 0usize;
            let mut filled = 0usize;
            for chapter in &chapters {
                for (_, position) in index.chapter_positions(book, *chapter) {
                    total += 1;
                    if array.get(position).is_some_and(|slot| !is_blank(slot)) {
                        filled += 1;
                    }
                }
            }

            BookProgress {
                book: book.to_string(),
                chapters: chapters.len(),
                total,
                filled,
            }
        })
        .collect()
}
