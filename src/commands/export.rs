use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use super::{default_canon_path, default_db_path, load_canon, open_existing_store};
use crate::align::{align, stats};
use crate::cli::{ExportArgs, ExportFormat};
use crate::usfm::ParsedVerseMap;
use crate::util::{ensure_directory, write_json_pretty};

pub fn run(args: ExportArgs) -> Result<()> {
    let canon_path = args
        .canon_path
        .clone()
        .unwrap_or_else(|| default_canon_path(&args.cache_root));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    let canon = load_canon(&canon_path)?;
    let Some(store) = open_existing_store(&db_path)? else {
        bail!("database file missing: {}", db_path.display());
    };
    let Some(stored) = store.load_array(&args.draft_id)? else {
        bail!("draft {} not found in {}", args.draft_id, db_path.display());
    };

    let array = align(Some(stored.as_slice()), &ParsedVerseMap::new(), &canon.index);

    match args.format {
        ExportFormat::Text => write_lines(&args.output, &array)?,
        ExportFormat::Json => write_json_pretty(&args.output, &array)?,
    }

    let completion = stats(&array);
    info!(
        path = %args.output.display(),
        draft_id = %args.draft_id,
        positions = completion.total,
        filled = completion.filled,
        "export completed"
    );

    Ok(())
}

/// One line per canonical position; unfilled verses become empty lines.
fn write_lines(path: &Path, array: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut output = BufWriter::new(file);
    for text in array {
        writeln!(output, "{}", single_line(text))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    output
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
