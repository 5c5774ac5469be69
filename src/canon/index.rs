use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{Context, Result, bail};

use super::VerseRef;

/// Ordered list of every verse in a canon, with reverse lookup.
///
/// The list is supplied by the caller (one reference per line), so the
/// number of canonical positions always follows the list that was loaded.
#[derive(Debug, Clone, Default)]
pub struct CanonicalIndex {
    references: Vec<VerseRef>,
    positions: HashMap<VerseRef, usize>,
}

impl CanonicalIndex {
    /// Builds an index from reference lines. Blank lines are skipped and do
    /// not take up a position.
    pub fn build<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut references = Vec::new();
        let mut positions = HashMap::new();

        for (line_index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            let reference = line.parse::<VerseRef>().with_context(|| {
                format!("invalid canonical reference on line {}", line_index + 1)
            })?;

            let position = references.len();
            if positions.insert(reference.clone(), position).is_some() {
                bail!(
                    "duplicate canonical reference {} on line {}",
                    reference,
                    line_index + 1
                );
            }
            references.push(reference);
        }

        Ok(Self {
            references,
            positions,
        })
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::build(text.lines())
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn position_of(&self, reference: &VerseRef) -> Option<usize> {
        self.positions.get(reference).copied()
    }

    pub fn reference_at(&self, position: usize) -> Option<&VerseRef> {
        self.references.get(position)
    }

    /// Verses of one chapter in order, found by probing verse numbers from 1
    /// until the first one the canon does not contain.
    pub fn chapter_positions(&self, book: &str, chapter: u32) -> Vec<(u32, usize)> {
        let mut found = Vec::new();
        let mut verse = 1u32;
        while let Some(position) = self.position_of(&VerseRef::new(book, chapter, verse)) {
            found.push((verse, position));
            verse += 1;
        }
        found
    }

    pub fn chapters_of(&self, book: &str) -> BTreeSet<u32> {
        self.references
            .iter()
            .filter(|reference| reference.book() == book)
            .map(VerseRef::chapter)
            .collect()
    }

    /// Book codes in the order they first appear in the canon.
    pub fn books(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.references
            .iter()
            .map(VerseRef::book)
            .filter(|book| seen.insert(*book))
            .collect()
    }
}
