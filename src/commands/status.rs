use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::{default_canon_path, default_db_path, load_canon, open_existing_store};
use crate::align::{
    BookProgress, CompletionStats, align, book_progress, missing_ranges, stats,
};
use crate::cli::StatusArgs;
use crate::usfm::ParsedVerseMap;

#[derive(Debug, Serialize)]
struct StatusReport {
    draft_id: String,
    updated_at: String,
    stats: CompletionStats,
    missing_ranges: Vec<String>,
    books: Vec<BookProgress>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let canon_path = args
        .canon_path
        .clone()
        .unwrap_or_else(|| default_canon_path(&args.cache_root));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), draft_id = %args.draft_id, "status requested");

    let canon = load_canon(&canon_path)?;
    let Some(store) = open_existing_store(&db_path)? else {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    };
    let Some(record) = store.draft(&args.draft_id)? else {
        let available = store.draft_ids()?;
        warn!(
            draft_id = %args.draft_id,
            available = %available.join(", "),
            "draft not found"
        );
        return Ok(());
    };
    if record.canon_sha256 != canon.sha256 {
        warn!(
            draft_id = %args.draft_id,
            stored_length = record.canon_length,
            canon_length = canon.index.len(),
            "draft was saved against a different canonical list"
        );
    }

    let stored = store.load_array(&args.draft_id)?.unwrap_or_default();
    let array = align(Some(stored.as_slice()), &ParsedVerseMap::new(), &canon.index);

    let report = StatusReport {
        draft_id: record.draft_id,
        updated_at: record.updated_at,
        stats: stats(&array),
        missing_ranges: missing_ranges(&array, &canon.index, args.max_ranges),
        books: book_progress(&array, &canon.index),
    };

    if args.json {
        write_json_report(&report)
    } else {
        write_text_report(&report)
    }
}

fn write_json_report(report: &StatusReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize status json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_report(report: &StatusReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Draft: {} (updated {})", report.draft_id, report.updated_at)?;
    writeln!(
        output,
        "Verses: filled={} missing={} total={} completion={:.2}%",
        report.stats.filled,
        report.stats.missing,
        report.stats.total,
        report.stats.completion_percentage,
    )?;

    if report.missing_ranges.is_empty() {
        writeln!(output, "Missing: none")?;
    } else {
        writeln!(output, "Missing:")?;
        for range in &report.missing_ranges {
            writeln!(output, "  {range}")?;
        }
    }

    writeln!(output, "Books:")?;
    for book in report.books.iter().filter(|book| book.filled > 0) {
        writeln!(
            output,
            "  {} chapters={} filled={}/{}",
            book.book, book.chapters, book.filled, book.total
        )?;
    }

    output.flush()?;
    Ok(())
}
