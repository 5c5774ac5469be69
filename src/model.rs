use serde::{Deserialize, Serialize};

use crate::align::CompletionStats;
use crate::usfm::ParseDiagnostic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub book_code: Option<String>,
    pub verse_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonInfo {
    pub path: String,
    pub sha256: String,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportCounts {
    pub document_count: usize,
    pub verses_parsed: usize,
    pub verses_merged: usize,
    pub verses_applied: usize,
    pub unknown_references: usize,
    pub orphaned_verses: usize,
    pub collapsed_ranges: usize,
    pub blank_verses: usize,
    pub duplicate_verses: usize,
    pub malformed_markers: usize,
    pub rows_written: usize,
}

/// A parse diagnostic tagged with the document it came from.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDiagnostic {
    pub document: String,
    #[serde(flatten)]
    pub diagnostic: ParseDiagnostic,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub draft_id: String,
    pub dry_run: bool,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub canon: CanonInfo,
    pub paths: ImportPaths,
    pub counts: ImportCounts,
    pub stats: CompletionStats,
    pub missing_ranges: Vec<String>,
    pub source_hashes: Vec<SourceEntry>,
    pub diagnostics: Vec<DocumentDiagnostic>,
    pub warnings: Vec<String>,
}
