use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::canon::CanonicalIndex;
use crate::store::DraftStore;
use crate::usfm::BookCodeTable;
use crate::util::{read_text, sha256_text};

pub mod export;
pub mod import;
pub mod inventory;
pub mod status;

const DOCUMENT_EXTENSIONS: &[&str] = &["usfm", "sfm"];

fn default_canon_path(cache_root: &Path) -> PathBuf {
    cache_root.join("vref.txt")
}

fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("versealign.sqlite")
}

fn default_source_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("sources")
}

/// A loaded canonical reference list and the hash of the text it came from.
struct LoadedCanon {
    index: CanonicalIndex,
    sha256: String,
}

fn load_canon(path: &Path) -> Result<LoadedCanon> {
    let text = read_text(path)?;
    let index = CanonicalIndex::from_text(&text)
        .with_context(|| format!("failed to load canonical reference list {}", path.display()))?;

    if index.is_empty() {
        warn!(path = %path.display(), "canonical reference list is empty");
    }

    info!(
        path = %path.display(),
        positions = index.len(),
        books = index.books().len(),
        "loaded canonical reference list"
    );

    Ok(LoadedCanon {
        index,
        sha256: sha256_text(&text),
    })
}

fn load_book_codes(path: Option<&Path>) -> Result<BookCodeTable> {
    match path {
        Some(path) => {
            let table = BookCodeTable::from_json_file(path)?;
            if table.is_empty() {
                warn!(path = %path.display(), "book code table has no aliases");
            }
            info!(path = %path.display(), aliases = table.len(), "loaded book code table");
            Ok(table)
        }
        None => Ok(BookCodeTable::historical()),
    }
}

fn open_existing_store(db_path: &Path) -> Result<Option<DraftStore>> {
    if !db_path.exists() {
        return Ok(None);
    }
    DraftStore::open(db_path).map(Some)
}

/// USFM documents directly inside `dir`, sorted by path.
fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if is_document {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.display().to_string())
}
