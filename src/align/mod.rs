mod alignment;
mod report;
#[cfg(test)]
mod tests;

pub use alignment::{align, align_with_outcome, merge_verse_maps};
pub use report::{BookProgress, CompletionStats, book_progress, missing_ranges, stats};
