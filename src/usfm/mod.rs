mod book_codes;
mod cleanse;
mod tokenizer;

pub use book_codes::BookCodeTable;
pub use cleanse::Cleanser;
#[cfg(test)]
pub use cleanse::CleanRule;
pub use tokenizer::{ParseDiagnostic, ParseOutcome, ParsedVerseMap, UsfmParser};
#[cfg(test)]
pub use tokenizer::{ParserPhase, ParserState, PendingVerse};
