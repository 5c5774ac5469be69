use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Serialize, Serializer};

/// A single verse address such as `GEN 1:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseRef {
    book: String,
    chapter: u32,
    verse: u32,
}

impl VerseRef {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn verse(&self) -> u32 {
        self.verse
    }

    /// True when `next` is the verse directly after `self` in the same chapter.
    pub fn is_followed_by(&self, next: &VerseRef) -> bool {
        self.book() == next.book()
            && self.chapter() == next.chapter()
            && self.verse().checked_add(1) == Some(next.verse())
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

impl FromStr for VerseRef {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (book, location) = trimmed
            .split_once(char::is_whitespace)
            .with_context(|| format!("verse reference is missing a chapter:verse part: {trimmed}"))?;
        let (chapter, verse) = location
            .trim()
            .split_once(':')
            .with_context(|| format!("verse reference is missing ':' separator: {trimmed}"))?;

        let chapter = chapter
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid chapter number in reference: {trimmed}"))?;
        let verse = verse
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid verse number in reference: {trimmed}"))?;

        if book.is_empty() || !book.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            bail!("invalid book code in reference: {trimmed}");
        }
        if chapter == 0 || verse == 0 {
            bail!("chapter and verse numbers start at 1: {trimmed}");
        }

        Ok(Self::new(book.to_ascii_uppercase(), chapter, verse))
    }
}

impl Serialize for VerseRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
