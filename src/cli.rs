use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "primitives",
    version,
    about = "Extract enforceable rule primitives from PDF/DOCX documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a document, extract primitives page by page and store them.
    Extract(ExtractArgs),
    /// Print the filtered candidate text of a document without calling the model.
    Candidates(CandidatesArgs),
    /// List the PDF/DOCX documents available in a directory.
    Inventory(InventoryArgs),
    /// List stored primitives.
    List(ListArgs),
    /// Delete a stored primitive by id.
    Delete(DeleteArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StoreBackend {
    Supabase,
    Sqlite,
    None,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supabase => "supabase",
            Self::Sqlite => "sqlite",
            Self::None => "none",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum BlockSource {
    /// Send each page's raw text to the model.
    #[default]
    Page,
    /// Send only the filtered candidate lines of each page.
    Candidates,
}

impl BlockSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Candidates => "candidates",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, value_enum, default_value_t = StoreBackend::Supabase)]
    pub backend: StoreBackend,

    #[arg(long, default_value = ".cache/primitives")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl Default for StoreArgs {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            cache_root: PathBuf::from(".cache/primitives"),
            db_path: None,
        }
    }
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_root.join("primitives.sqlite"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct HeuristicArgs {
    /// Replace the default rejection patterns (repeatable).
    #[arg(long = "reject-pattern")]
    pub reject_patterns: Vec<String>,

    /// Append to the rejection patterns (repeatable).
    #[arg(long = "extra-reject-pattern")]
    pub extra_reject_patterns: Vec<String>,

    #[arg(long, default_value_t = 4)]
    pub min_tokens: usize,
}

impl Default for HeuristicArgs {
    fn default() -> Self {
        Self {
            reject_patterns: Vec::new(),
            extra_reject_patterns: Vec::new(),
            min_tokens: 4,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExtractArgs {
    /// Document to process; prompts for one in --dir when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BlockSource::Page)]
    pub block_source: BlockSource,

    /// Extra context sent to the model with every page.
    #[arg(long)]
    pub context: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[command(flatten)]
    pub heuristic: HeuristicArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CandidatesArgs {
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub heuristic: HeuristicArgs,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub id: i64,
}
