use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::{default_source_dir, discover_documents, file_label, load_book_codes};
use crate::cli::InventoryArgs;
use crate::model::{SourceEntry, SourceInventoryManifest};
use crate::usfm::UsfmParser;
use crate::util::{now_utc_string, read_text, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let source_dir = args
        .source_dir
        .clone()
        .unwrap_or_else(|| default_source_dir(&args.cache_root));
    let parser = UsfmParser::new(load_book_codes(args.book_codes.as_deref())?)?;
    let manifest = build_manifest(&source_dir, &parser)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.cache_root
            .join("manifests")
            .join("source_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path, parser: &UsfmParser) -> Result<SourceInventoryManifest> {
    let paths = discover_documents(source_dir)?;
    if paths.is_empty() {
        bail!("no USFM documents found in {}", source_dir.display());
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        documents.push(describe_document(&path, parser)?);
    }

    documents.sort_by(|a, b| {
        a.book_code
            .cmp(&b.book_code)
            .then(a.filename.cmp(&b.filename))
    });

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

pub fn describe_document(path: &Path, parser: &UsfmParser) -> Result<SourceEntry> {
    let text = read_text(path)?;
    let book_code = parser.declared_book(&text);
    let verse_count = parser.parse(&text).len();

    if book_code.is_none() {
        warn!(document = %path.display(), "document has no \\id line");
    }

    Ok(SourceEntry {
        filename: file_label(path),
        book_code,
        verse_count,
        sha256: sha256_file(path)?,
    })
}
