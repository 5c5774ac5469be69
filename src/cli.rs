use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "versealign",
    version,
    about = "Align USFM verse text into canonical verse arrays"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Import(ImportArgs),
    Status(StatusArgs),
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/versealign")]
    pub cache_root: PathBuf,

    /// Directory holding .usfm/.sfm documents (defaults to <cache-root>/sources).
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// JSON object mapping document book codes to canonical codes.
    #[arg(long)]
    pub book_codes: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = ".cache/versealign")]
    pub cache_root: PathBuf,

    /// Newline-delimited canonical reference list (defaults to <cache-root>/vref.txt).
    #[arg(long)]
    pub canon_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    pub draft_id: String,

    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Explicit documents; imported in the order given, later ones win.
    #[arg(long = "document")]
    pub documents: Vec<PathBuf>,

    #[arg(long)]
    pub book_codes: Option<PathBuf>,

    #[arg(long)]
    pub import_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub max_ranges: usize,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/versealign")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub canon_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    pub draft_id: String,

    #[arg(long, default_value_t = 10)]
    pub max_ranges: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = ".cache/versealign")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub canon_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "default")]
    pub draft_id: String,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
    pub format: ExportFormat,
}
