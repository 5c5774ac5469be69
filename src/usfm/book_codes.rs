use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Older or informal book abbreviations still found in `\id` lines, mapped
/// to the three-character codes used by canonical reference lists.
const HISTORICAL_CODES: &[(&str, &str)] = &[
    ("EZE", "EZK"),
    ("JOE", "JOL"),
    ("NAH", "NAM"),
    ("SOS", "SNG"),
    ("SOL", "SNG"),
    ("CAN", "SNG"),
    ("JAM", "JAS"),
    ("MAR", "MRK"),
    ("JOH", "JHN"),
    ("PHI", "PHP"),
    ("TTS", "TIT"),
    ("1JO", "1JN"),
    ("2JO", "2JN"),
    ("3JO", "3JN"),
    ("1KG", "1KI"),
    ("2KG", "2KI"),
    ("JDE", "JUD"),
];

/// Read-only mapping from book codes seen in documents to canonical codes.
///
/// Codes without an entry pass through unchanged, so custom books are
/// never an error.
#[derive(Debug, Clone, Default)]
pub struct BookCodeTable {
    aliases: HashMap<String, String>,
}

impl BookCodeTable {
    pub fn historical() -> Self {
        Self::from_pairs(HISTORICAL_CODES.iter().copied())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(alias, canonical)| {
                (
                    alias.as_ref().trim().to_ascii_uppercase(),
                    canonical.as_ref().trim().to_ascii_uppercase(),
                )
            })
            .collect();
        Self { aliases }
    }

    /// Loads a JSON object of `{"ALIAS": "CODE"}` pairs.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read book code table {}", path.display()))?;
        let pairs: HashMap<String, String> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse book code table {}", path.display()))?;

        if let Some((alias, _)) = pairs.iter().find(|(_, code)| code.trim().is_empty()) {
            bail!(
                "book code table {} maps {} to an empty code",
                path.display(),
                alias
            );
        }

        Ok(Self::from_pairs(pairs))
    }

    pub fn canonicalize(&self, code: &str) -> String {
        let upper = code.trim().to_ascii_uppercase();
        match self.aliases.get(&upper) {
            Some(canonical) => canonical.clone(),
            None => upper,
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
