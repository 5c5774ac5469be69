use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::{
    default_canon_path, default_db_path, default_source_dir, discover_documents, file_label,
    load_book_codes, load_canon,
};
use crate::align::{align_with_outcome, merge_verse_maps, missing_ranges, stats};
use crate::cli::ImportArgs;
use crate::model::{
    CanonInfo, DocumentDiagnostic, ImportCounts, ImportPaths, ImportRunManifest, SourceEntry,
};
use crate::store::{DB_SCHEMA_VERSION, DraftStore};
use crate::usfm::{ParseDiagnostic, ParseOutcome, UsfmParser};
use crate::util::{
    ensure_directory, now_utc_string, read_text, sha256_text, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: ImportArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("import-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let canon_path = args
        .canon_path
        .clone()
        .unwrap_or_else(|| default_canon_path(&cache_root));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&cache_root));
    let import_manifest_path = args.import_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "import_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        cache_root = %cache_root.display(),
        draft_id = %args.draft_id,
        run_id = %run_id,
        dry_run = args.dry_run,
        "starting import"
    );

    let canon = load_canon(&canon_path)?;
    let parser = UsfmParser::new(load_book_codes(args.book_codes.as_deref())?)?;
    let documents = resolve_documents(&args, &cache_root)?;

    let mut counts = ImportCounts {
        document_count: documents.len(),
        ..ImportCounts::default()
    };
    let mut warnings = Vec::new();
    let mut diagnostics = Vec::new();
    let mut source_hashes = Vec::with_capacity(documents.len());
    let mut verse_maps = Vec::with_capacity(documents.len());

    for path in &documents {
        let text = read_text(path)?;
        let outcome = parser.parse_with_diagnostics(&text);
        record_diagnostics(path, &outcome, &mut counts, &mut diagnostics, &mut warnings);

        info!(
            document = %path.display(),
            verses = outcome.verses.len(),
            diagnostics = outcome.diagnostics.len(),
            "parsed document"
        );

        counts.verses_parsed += outcome.verses.len();
        source_hashes.push(SourceEntry {
            filename: file_label(path),
            book_code: parser.declared_book(&text),
            verse_count: outcome.verses.len(),
            sha256: sha256_text(&text),
        });
        verse_maps.push(outcome.verses);
    }

    let merged = merge_verse_maps(verse_maps);
    counts.verses_merged = merged.len();

    let mut store = if args.dry_run && !db_path.exists() {
        None
    } else {
        Some(DraftStore::open(&db_path)?)
    };

    let existing = match store.as_ref() {
        Some(store) => {
            if let Some(record) = store.draft(&args.draft_id)? {
                if record.canon_sha256 != canon.sha256 {
                    let message = format!(
                        "draft {} was saved against a different canonical list ({} positions); realigning to {} positions",
                        args.draft_id,
                        record.canon_length,
                        canon.index.len()
                    );
                    warn!(draft_id = %args.draft_id, "{message}");
                    warnings.push(message);
                }
            }
            store.load_array(&args.draft_id)?
        }
        None => None,
    };

    let alignment = align_with_outcome(existing.as_deref(), &merged, &canon.index);
    counts.verses_applied = alignment.applied;
    counts.unknown_references = alignment.unknown_references.len();
    for reference in &alignment.unknown_references {
        warn!(reference = %reference, "reference not in canonical list, dropped");
        warnings.push(format!("{reference} is not in the canonical list, dropped"));
    }

    let completion = stats(&alignment.array);
    let ranges = missing_ranges(&alignment.array, &canon.index, args.max_ranges);

    let updated_at = now_utc_string();
    if !args.dry_run {
        if let Some(store) = store.as_mut() {
            counts.rows_written = store.save_array(
                &args.draft_id,
                &alignment.array,
                &canon.index,
                &canon.sha256,
                &updated_at,
            )?;
            info!(
                db_path = %db_path.display(),
                rows = counts.rows_written,
                "saved draft"
            );
        }
    }

    let manifest = ImportRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        draft_id: args.draft_id.clone(),
        dry_run: args.dry_run,
        started_at,
        updated_at,
        command: render_import_command(&args),
        canon: CanonInfo {
            path: canon_path.display().to_string(),
            sha256: canon.sha256.clone(),
            length: canon.index.len(),
        },
        paths: ImportPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts,
        stats: completion,
        missing_ranges: ranges,
        source_hashes,
        diagnostics,
        warnings,
    };

    if args.dry_run {
        info!(
            draft_id = %manifest.draft_id,
            verses_applied = manifest.counts.verses_applied,
            filled = completion.filled,
            total = completion.total,
            "import dry-run complete"
        );
        return Ok(());
    }

    write_json_pretty(&import_manifest_path, &manifest)?;
    info!(path = %import_manifest_path.display(), "wrote import run manifest");
    info!(
        draft_id = %manifest.draft_id,
        filled = completion.filled,
        missing = completion.missing,
        total = completion.total,
        completion_percentage = completion.completion_percentage,
        "import completed"
    );

    Ok(())
}

fn resolve_documents(args: &ImportArgs, cache_root: &Path) -> Result<Vec<PathBuf>> {
    if !args.documents.is_empty() {
        return Ok(args.documents.clone());
    }

    let source_dir = args
        .source_dir
        .clone()
        .unwrap_or_else(|| default_source_dir(cache_root));
    let documents = discover_documents(&source_dir)?;
    if documents.is_empty() {
        bail!("no USFM documents found in {}", source_dir.display());
    }
    Ok(documents)
}

fn record_diagnostics(
    path: &Path,
    outcome: &ParseOutcome,
    counts: &mut ImportCounts,
    diagnostics: &mut Vec<DocumentDiagnostic>,
    warnings: &mut Vec<String>,
) {
    for diagnostic in &outcome.diagnostics {
        match diagnostic {
            ParseDiagnostic::OrphanedVerse { .. } => counts.orphaned_verses += 1,
            ParseDiagnostic::VerseRangeCollapsed { .. } => counts.collapsed_ranges += 1,
            ParseDiagnostic::BlankVerse { .. } => counts.blank_verses += 1,
            ParseDiagnostic::DuplicateVerse { .. } => counts.duplicate_verses += 1,
            ParseDiagnostic::MalformedMarker { .. } => counts.malformed_markers += 1,
        }
        warn!(document = %path.display(), diagnostic = %diagnostic, "parse diagnostic");
        warnings.push(format!("{}: {}", file_label(path), diagnostic));
        diagnostics.push(DocumentDiagnostic {
            document: file_label(path),
            diagnostic: diagnostic.clone(),
        });
    }
}

fn render_import_command(args: &ImportArgs) -> String {
    let mut command = format!(
        "versealign import --cache-root {} --draft-id {}",
        args.cache_root.display(),
        args.draft_id
    );

    if let Some(path) = &args.canon_path {
        command.push_str(&format!(" --canon-path {}", path.display()));
    }
    if let Some(path) = &args.db_path {
        command.push_str(&format!(" --db-path {}", path.display()));
    }
    if let Some(path) = &args.source_dir {
        command.push_str(&format!(" --source-dir {}", path.display()));
    }
    for path in &args.documents {
        command.push_str(&format!(" --document {}", path.display()));
    }
    if let Some(path) = &args.book_codes {
        command.push_str(&format!(" --book-codes {}", path.display()));
    }
    command.push_str(&format!(" --max-ranges {}", args.max_ranges));
    if args.dry_run {
        command.push_str(" --dry-run");
    }

    command
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_args() -> ImportArgs {
        ImportArgs {
            cache_root: PathBuf::from(".cache/versealign"),
            canon_path: Some(PathBuf::from("vref.txt")),
            db_path: None,
            draft_id: "nt-draft".to_string(),
            source_dir: None,
            documents: vec![PathBuf::from("41MATxx.SFM"), PathBuf::from("42MRKxx.SFM")],
            book_codes: None,
            import_manifest_path: None,
            max_ranges: 5,
            dry_run: true,
        }
    }

    #[test]
    fn render_import_command_lists_effective_flags() {
        let command = render_import_command(&import_args());
        assert_eq!(
            command,
            "versealign import --cache-root .cache/versealign --draft-id nt-draft --canon-path vref.txt --document 41MATxx.SFM --document 42MRKxx.SFM --max-ranges 5 --dry-run"
        );
    }

    #[test]
    fn resolve_documents_prefers_explicit_paths() {
        let args = import_args();
        let documents =
            resolve_documents(&args, Path::new("/nonexistent")).expect("explicit documents");
        assert_eq!(documents, args.documents);
    }

    #[test]
    fn record_diagnostics_counts_each_kind() {
        let parser = UsfmParser::new(crate::usfm::BookCodeTable::historical())
            .expect("parser should build");
        let outcome = parser.parse_with_diagnostics(
            "\\v 1 orphan\n\\id GEN\n\\c 1\n\\v 2-3 range\n\\v 4 \\f + x\\f*\n\\v 5 a\n\\v 5 b",
        );

        let mut counts = ImportCounts::default();
        let mut diagnostics = Vec::new();
        let mut warnings = Vec::new();
        record_diagnostics(
            Path::new("01GEN.SFM"),
            &outcome,
            &mut counts,
            &mut diagnostics,
            &mut warnings,
        );

        assert_eq!(counts.orphaned_verses, 1);
        assert_eq!(counts.collapsed_ranges, 1);
        assert_eq!(counts.blank_verses, 1);
        assert_eq!(counts.duplicate_verses, 1);
        assert_eq!(warnings.len(), 4);
        assert!(warnings.iter().all(|warning| warning.starts_with("01GEN.SFM: ")));
        assert_eq!(diagnostics.len(), 4);
    }

    #[test]
    fn document_diagnostics_serialize_with_kind_and_fields() {
        let parser = UsfmParser::new(crate::usfm::BookCodeTable::historical())
            .expect("parser should build");
        let outcome = parser.parse_with_diagnostics("\\id GEN\n\\c 1\n\\v 2-3 range");

        let mut counts = ImportCounts::default();
        let mut diagnostics = Vec::new();
        let mut warnings = Vec::new();
        record_diagnostics(
            Path::new("01GEN.SFM"),
            &outcome,
            &mut counts,
            &mut diagnostics,
            &mut warnings,
        );

        let value = serde_json::to_value(&diagnostics).expect("diagnostics should serialize");
        assert_eq!(
            value,
            serde_json::json!([{
                "document": "01GEN.SFM",
                "kind": "verse_range_collapsed",
                "line": 3,
                "reference": "GEN 1:2",
                "last_verse": 3,
            }])
        );
    }
}
