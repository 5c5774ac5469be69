use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;

use super::{BookCodeTable, Cleanser};
use crate::canon::VerseRef;

/// Cleaned verse text keyed by reference.
pub type ParsedVerseMap = BTreeMap<VerseRef, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerse {
    pub reference: VerseRef,
    pub raw: String,
}

/// Where the parser is within the book/chapter/verse hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserPhase {
    NoBook,
    InBook,
    InChapter,
    InVerse,
}

/// Parser position after a line. Transitions consume a state and return a
/// new one; nothing survives between separate `parse` calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    book: Option<String>,
    chapter: Option<u32>,
    pending: Option<PendingVerse>,
}

impl ParserState {
    pub fn book(&self) -> Option<&str> {
        self.book.as_deref()
    }

    pub fn chapter(&self) -> Option<u32> {
        self.chapter
    }

    pub fn pending(&self) -> Option<&PendingVerse> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> ParserPhase {
        match (&self.book, self.chapter, &self.pending) {
            (_, _, Some(_)) => ParserPhase::InVerse,
            (None, _, None) => ParserPhase::NoBook,
            (Some(_), None, None) => ParserPhase::InBook,
            (Some(_), Some(_), None) => ParserPhase::InChapter,
        }
    }

    /// Ends the document, yielding the verse still being accumulated.
    pub fn finish(self) -> Option<PendingVerse> {
        self.pending
    }
}

/// Why a verse was dropped, narrowed, or a marker was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseDiagnostic {
    OrphanedVerse { line: usize, verse: u32 },
    VerseRangeCollapsed {
        line: usize,
        reference: VerseRef,
        last_verse: u32,
    },
    MalformedMarker { line: usize, text: String },
    BlankVerse { reference: VerseRef },
    DuplicateVerse { reference: VerseRef },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanedVerse { line, verse } => {
                write!(f, "line {line}: verse {verse} has no book or chapter, dropped")
            }
            Self::VerseRangeCollapsed {
                line,
                reference,
                last_verse,
            } => write!(
                f,
                "line {line}: verse range ending at {last_verse} stored as {reference} only"
            ),
            Self::MalformedMarker { line, text } => {
                write!(f, "line {line}: malformed marker ignored: {text}")
            }
            Self::BlankVerse { reference } => {
                write!(f, "{reference} has no text after cleansing, dropped")
            }
            Self::DuplicateVerse { reference } => {
                write!(f, "{reference} appears more than once, last occurrence kept")
            }
        }
    }
}

/// Result of applying one line to a [`ParserState`].
#[derive(Debug, Default)]
pub struct Transition {
    pub state: ParserState,
    pub flushed: Vec<PendingVerse>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Transition {
    fn from_state(state: ParserState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    fn flush(&mut self) {
        if let Some(pending) = self.state.pending.take() {
            self.flushed.push(pending);
        }
    }

    /// Appends continuation text to the pending verse, if there is one.
    fn append(&mut self, text: &str) {
        let text = text.trim();
        let Some(pending) = self.state.pending.as_mut() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        if !pending.raw.is_empty() {
            pending.raw.push(' ');
        }
        pending.raw.push_str(text);
    }

    fn append_or_report(&mut self, line_number: usize, line: &str) {
        if self.state.pending().is_some() {
            self.append(line);
        } else {
            self.diagnostics.push(ParseDiagnostic::MalformedMarker {
                line: line_number,
                text: line.to_string(),
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub verses: ParsedVerseMap,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Line-oriented USFM reader for the `\id`, `\c` and `\v` subset.
#[derive(Debug)]
pub struct UsfmParser {
    book_codes: BookCodeTable,
    cleanser: Cleanser,
    book_line: Regex,
    chapter_line: Regex,
    verse_marker: Regex,
    bare_verse_marker: Regex,
    paratext_line: Regex,
}

impl UsfmParser {
    pub fn new(book_codes: BookCodeTable) -> Result<Self> {
        Ok(Self {
            book_codes,
            cleanser: Cleanser::new()?,
            book_line: Regex::new(r"^\\id(?:\s+(\S+).*)?$")
                .context("failed to compile book line regex")?,
            chapter_line: Regex::new(r"^\\c(?:\s+(\S+)(.*))?$")
                .context("failed to compile chapter line regex")?,
            verse_marker: Regex::new(
                r"\\v\s+(\d+)[a-z]?(?:\s*[-–]\s*(\d+)[a-z]?)?(?:\s+|$)",
            )
            .context("failed to compile verse marker regex")?,
            bare_verse_marker: Regex::new(r"^\\v(?:\s|$)")
                .context("failed to compile bare verse marker regex")?,
            paratext_line: Regex::new(
                r"^\\(?:s\d*|ms\d*|mr|sr|r|d|sp|mt\d*|mte\d*|h\d*|toc\d*|toca\d*|ide|rem|is\d*|ip|ipi|im|imi|ipq|imq|ipr|iq\d*|ib|ili\d*|iot|io\d*|ior|iex|imt\d*|imte\d*|ie|cl|cp|cd|usfm|sts|restore|periph)(?:\s|$)",
            )
            .context("failed to compile paratext line regex")?,
        })
    }

    pub fn parse(&self, text: &str) -> ParsedVerseMap {
        self.parse_with_diagnostics(text).verses
    }

    pub fn parse_with_diagnostics(&self, text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut state = ParserState::default();

        for (index, line) in text.lines().enumerate() {
            let transition = self.step(state, index + 1, line);
            state = transition.state;
            outcome.diagnostics.extend(transition.diagnostics);
            for verse in transition.flushed {
                self.finalize(&mut outcome, verse);
            }
        }

        if let Some(verse) = state.finish() {
            self.finalize(&mut outcome, verse);
        }

        outcome
    }

    /// The canonical book code from the first `\id` line, if any.
    pub fn declared_book(&self, text: &str) -> Option<String> {
        text.lines().find_map(|line| {
            self.book_line
                .captures(line.trim())
                .and_then(|captures| captures.get(1))
                .map(|code| self.book_codes.canonicalize(code.as_str()))
        })
    }

    /// Applies one document line to `state`.
    pub fn step(&self, state: ParserState, line_number: usize, line: &str) -> Transition {
        let mut transition = Transition::from_state(state);
        let line = line.trim();
        if line.is_empty() {
            return transition;
        }

        if let Some(captures) = self.book_line.captures(line) {
            match captures.get(1) {
                Some(code) => {
                    transition.flush();
                    transition.state.book = Some(self.book_codes.canonicalize(code.as_str()));
                    transition.state.chapter = None;
                }
                None => transition.append_or_report(line_number, line),
            }
            return transition;
        }

        if let Some(captures) = self.chapter_line.captures(line) {
            let chapter = captures
                .get(1)
                .and_then(|value| value.as_str().parse::<u32>().ok())
                .filter(|value| *value > 0);
            match chapter {
                Some(chapter) => {
                    transition.flush();
                    transition.state.chapter = Some(chapter);
                    let rest = captures.get(2).map(|value| value.as_str()).unwrap_or("");
                    self.consume_verses(&mut transition, line_number, rest);
                }
                None => transition.append_or_report(line_number, line),
            }
            return transition;
        }

        if self.consume_verses(&mut transition, line_number, line) {
            return transition;
        }

        if self.paratext_line.is_match(line) {
            return transition;
        }

        if self.bare_verse_marker.is_match(line) {
            transition.append_or_report(line_number, line);
            return transition;
        }

        // Plain text outside a verse has nowhere to go.
        if transition.state.phase() == ParserPhase::InVerse {
            transition.append(line);
        }
        transition
    }

    /// Splits `text` at every verse marker. Text before the first marker
    /// continues the pending verse. Returns false when `text` has no marker.
    fn consume_verses(&self, transition: &mut Transition, line_number: usize, text: &str) -> bool {
        let markers = self.verse_marker.captures_iter(text).collect::<Vec<Captures>>();
        let Some(first) = markers.first().and_then(|captures| captures.get(0)) else {
            return false;
        };

        let prefix = &text[..first.start()];
        if !prefix.trim().is_empty() {
            transition.append(prefix);
        }

        for (index, captures) in markers.iter().enumerate() {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let body_end = markers
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map(|next| next.start())
                .unwrap_or(text.len());
            let body = &text[whole.end()..body_end];

            transition.flush();

            let verse = captures
                .get(1)
                .and_then(|value| value.as_str().parse::<u32>().ok())
                .filter(|value| *value > 0);
            let Some(verse) = verse else {
                transition.diagnostics.push(ParseDiagnostic::MalformedMarker {
                    line: line_number,
                    text: whole.as_str().trim().to_string(),
                });
                continue;
            };

            let (Some(book), Some(chapter)) = (transition.state.book(), transition.state.chapter())
            else {
                transition.diagnostics.push(ParseDiagnostic::OrphanedVerse {
                    line: line_number,
                    verse,
                });
                continue;
            };

            let reference = VerseRef::new(book, chapter, verse);
            if let Some(last_verse) = captures
                .get(2)
                .and_then(|value| value.as_str().parse::<u32>().ok())
                .filter(|last| *last != verse)
            {
                transition
                    .diagnostics
                    .push(ParseDiagnostic::VerseRangeCollapsed {
                        line: line_number,
                        reference: reference.clone(),
                        last_verse,
                    });
            }

            transition.state.pending = Some(PendingVerse {
                reference,
                raw: body.trim().to_string(),
            });
        }

        true
    }

    fn finalize(&self, outcome: &mut ParseOutcome, verse: PendingVerse) {
        let cleaned = self.cleanser.clean(&verse.raw);
        if cleaned.trim().is_empty() {
            outcome
                .diagnostics
                .push(ParseDiagnostic::BlankVerse {
                    reference: verse.reference,
                });
            return;
        }

        if outcome
            .verses
            .insert(verse.reference.clone(), cleaned)
            .is_some()
        {
            outcome
                .diagnostics
                .push(ParseDiagnostic::DuplicateVerse {
                    reference: verse.reference,
                });
        }
    }
}
