use std::borrow::Cow;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::trace;

/// One rewrite step of the cleansing pipeline.
#[derive(Debug)]
pub struct CleanRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    repeat: bool,
}

impl CleanRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("failed to compile cleanse rule regex: {name}"))?;
        Ok(Self {
            name,
            pattern,
            replacement,
            repeat: false,
        })
    }

    /// Re-applies the rule until it stops matching. Bracket rules need this
    /// because one application only unwraps the innermost level.
    fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut current = self.pattern.replace_all(text, self.replacement);
        if !self.repeat {
            return current;
        }

        // Each application unwraps a bracket or replaces a separator.
        while self.pattern.is_match(&current) {
            let next = self
                .pattern
                .replace_all(&current, self.replacement)
                .into_owned();
            if next == current {
                break;
            }
            current = Cow::Owned(next);
        }
        current
    }
}

/// Turns raw verse text with inline markup into plain prose.
///
/// Rules run in a fixed order; each one assumes the markup classes handled
/// before it are already gone:
///
/// 1. `word-attributes`: `|key="value"` tails and `\w*` closing tags
/// 2. `notes`, `embedded-spans`: footnote, cross-reference, figure and
///    alternate-numbering spans together with their content
/// 3. `structural-markers`: paragraph and poetry markers
/// 4. `alternate-separators`, `alternate-brackets`: `[a|b|c]`, `[a/b]` and
///    `[a]`, innermost first
/// 5. `leftover-tags`: any other backslash tag
/// 6. `stray-artifacts`: pipes, asterisks and slashes not touching a word
/// 7. `collapse-whitespace`, `trim`
/// 8. `space-before-punctuation`, `repeated-separators`, `open-quote-spacing`,
///    `close-quote-spacing`, `straight-quote-spacing`
/// 9. `terminal-punctuation`
#[derive(Debug)]
pub struct Cleanser {
    rules: Vec<CleanRule>,
}

impl Cleanser {
    pub fn new() -> Result<Self> {
        let rules = vec![
            CleanRule::new(
                "word-attributes",
                r#"\|[^\\|]*\\\+?w\*|\|(?:\s*[A-Za-z0-9_-]+\s*=\s*"[^"]*")+|\\\+?w\*"#,
                "",
            )?,
            CleanRule::new(
                "notes",
                r"(?s)\\f\s.*?\\f\*|\\fe\s.*?\\fe\*|\\x\s.*?\\x\*|\\ef\s.*?\\ef\*|\\ex\s.*?\\ex\*",
                "",
            )?,
            CleanRule::new(
                "embedded-spans",
                r"(?s)\\vp\s.*?\\vp\*|\\va\s.*?\\va\*|\\ca\s.*?\\ca\*|\\fig\s.*?\\fig\*",
                "",
            )?,
            CleanRule::new(
                "structural-markers",
                r"\\(?:p|m|pi|mi|nb|b|pc|pr|pm|pmo|pmc|pmr|po|cls|ph|q|qr|qc|qa|qm|qd|li|lim|lh|lf)\d*(?:\s+|$)",
                " ",
            )?,
            CleanRule::new(
                "alternate-separators",
                r"\[([^\[\]|/]*)[|/]([^\[\]]*)\]",
                "[${1} ${2}]",
            )?
            .repeated(),
            CleanRule::new("alternate-brackets", r"\[([^\[\]|/]*)\]", "${1}")?.repeated(),
            CleanRule::new("leftover-tags", r"\\\+?[A-Za-z0-9]*\*?", "")?,
            CleanRule::new("stray-artifacts", r"\B[|*/]+\B", "")?,
            CleanRule::new("collapse-whitespace", r"\s+", " ")?,
            CleanRule::new("trim", r"^\s+|\s+$", "")?,
            CleanRule::new("space-before-punctuation", r"\s+([,.;:!?])", "${1}")?,
            CleanRule::new("repeated-separators", r"([,;:])[,;:]+", "${1}")?,
            CleanRule::new("open-quote-spacing", r"([“‘])\s+", "${1}")?,
            CleanRule::new("close-quote-spacing", r"\s+([”’])", "${1}")?,
            CleanRule::new("straight-quote-spacing", r#""\s*([^"]*?)\s*""#, r#""${1}""#)?,
            CleanRule::new("terminal-punctuation", r"([^.!?])$", "${1}.")?,
        ];

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CleanRule] {
        &self.rules
    }

    /// Runs the pipeline until the text stops changing, so the result is a
    /// fixed point: `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, raw: &str) -> String {
        // After the first pass whitespace is normalized, so every later pass
        // that changes the text removes characters or appends the one
        // terminal period. The input length bounds the number of passes.
        let max_passes = raw.len() + 3;
        let mut current = self.clean_once(raw);
        for _ in 1..max_passes {
            let next = self.clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// A single pass over every rule in order.
    pub fn clean_once(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for rule in self.rules() {
            let rewritten = match rule.apply(&text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(rewritten) => rewritten,
            };
            if rewritten != text {
                trace!(rule = rule.name(), "cleanse rule rewrote text");
            }
            text = rewritten;
        }
        text
    }
}
