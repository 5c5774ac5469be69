mod index;
mod reference;
#[cfg(test)]
mod tests;

pub use index::CanonicalIndex;
pub use reference::VerseRef;
