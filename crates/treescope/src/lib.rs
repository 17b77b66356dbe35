// Declare all our modules
pub mod analyzer;
pub mod commands;
pub mod config;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod language;
pub mod limits;
pub mod parser;
pub mod plugins;
pub mod queries;
pub mod query_service;
pub mod search;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use analyzer::analyze_file;
pub use error::Error;
pub use query_service::execute_query;
pub use search::cache::SearchCache;
pub use search::{list_files, search_content};
pub use treescope_contracts as contracts;

use commands::{
    analyze::run_analyze, files::run_files, lang::run_langs, query::run_query,
    search::run_search,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Language-aware code analysis and search, built on tree-sitter, fd, and ripgrep."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the structure of a source file.
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),
    /// Run a named or ad-hoc tree-sitter query against a file.
    #[command(visible_alias = "q")]
    Query(QueryArgs),
    /// Search file contents using ripgrep.
    #[command(visible_alias = "s")]
    Search(SearchArgs),
    /// List files using fd.
    #[command(visible_alias = "f")]
    Files(FilesArgs),
    /// List supported languages and their available queries.
    #[command(visible_alias = "l")]
    Langs(LangsArgs),
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Source file to analyze.
    pub file: PathBuf,
    /// Language tag; inferred from the extension when omitted.
    #[arg(short, long)]
    pub language: Option<String>,
    /// Output formatter: full, compact, csv, json, toon.
    #[arg(long, default_value = "full")]
    pub format: String,
    /// Write formatted output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Source file to query.
    pub file: PathBuf,
    /// Language tag; inferred from the extension when omitted.
    #[arg(short, long)]
    pub language: Option<String>,
    /// Named query key (e.g. functions, classes, imports).
    #[arg(short, long)]
    pub key: Option<String>,
    /// Ad-hoc tree-sitter query string; mutually exclusive with --key.
    #[arg(long)]
    pub query_string: Option<String>,
    /// Predicate filter, e.g. "name=~get.*,public=true".
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Parser, Debug, Default)]
pub struct SearchArgs {
    /// The pattern to search for.
    pub query: String,
    /// Directories to search (default: current directory).
    #[arg(default_value = ".")]
    pub roots: Vec<PathBuf>,
    /// Search specific files instead of directories.
    #[arg(long, conflicts_with = "roots")]
    pub files: Vec<PathBuf>,
    /// Case mode: smart, insensitive, sensitive.
    #[arg(long, default_value = "smart")]
    pub case: String,
    /// Treat the query as a literal string.
    #[arg(short = 'F', long)]
    pub fixed_strings: bool,
    /// Match whole words only.
    #[arg(short, long)]
    pub word: bool,
    /// Allow matches to span lines.
    #[arg(short = 'U', long)]
    pub multiline: bool,
    /// Restrict to files matching these globs.
    #[arg(short = 'g', long = "glob")]
    pub include_globs: Vec<String>,
    /// Exclude files matching these globs.
    #[arg(long = "exclude-glob")]
    pub exclude_globs: Vec<String>,
    /// Follow symbolic links.
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,
    /// Search hidden files and directories.
    #[arg(long)]
    pub hidden: bool,
    /// Ignore .gitignore and friends.
    #[arg(long)]
    pub no_ignore: bool,
    /// Skip files larger than this (e.g. 10M).
    #[arg(long)]
    pub max_filesize: Option<String>,
    #[arg(short = 'B', long)]
    pub context_before: Option<i64>,
    #[arg(short = 'A', long)]
    pub context_after: Option<i64>,
    /// Text encoding hint passed through to ripgrep.
    #[arg(long)]
    pub encoding: Option<String>,
    /// Cap on the number of returned matches.
    #[arg(short = 'm', long)]
    pub max_count: Option<i64>,
    /// Per-command timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<i64>,
    /// Print only the total match count.
    #[arg(long)]
    pub total_only: bool,
    /// Print per-file match counts.
    #[arg(long)]
    pub count_only_matches: bool,
    /// Print a compact summary of the top matching files.
    #[arg(long)]
    pub summary_only: bool,
    /// Group matches by file.
    #[arg(long)]
    pub group_by_file: bool,
    /// Shorten file paths in results.
    #[arg(long)]
    pub optimize_paths: bool,
    /// Response encoding: json, toon.
    #[arg(long, default_value = "json")]
    pub output_format: String,
    /// Save the response to this file (relative to the project root).
    #[arg(short, long)]
    pub output_file: Option<String>,
    /// With --output-file, print only a minimal acknowledgment.
    #[arg(long)]
    pub suppress_output: bool,
    /// Disable parallel dispatch across multiple roots.
    #[arg(long)]
    pub no_parallel: bool,
}

#[derive(Parser, Debug, Default)]
pub struct FilesArgs {
    /// Directories to list (default: current directory).
    #[arg(default_value = ".")]
    pub roots: Vec<PathBuf>,
    /// Name pattern (regex, or glob with --glob).
    #[arg(short, long)]
    pub pattern: Option<String>,
    /// Interpret the pattern as a glob.
    #[arg(long)]
    pub glob: bool,
    /// fd type filters (f, d, l, x, e).
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,
    /// Restrict to these extensions.
    #[arg(short = 'e', long = "extension")]
    pub extensions: Vec<String>,
    /// Exclude paths matching these patterns.
    #[arg(short = 'E', long = "exclude")]
    pub exclude: Vec<String>,
    /// Maximum directory depth.
    #[arg(short, long)]
    pub depth: Option<i64>,
    /// Follow symbolic links.
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,
    /// Include hidden files.
    #[arg(long)]
    pub hidden: bool,
    /// Ignore .gitignore and friends.
    #[arg(long)]
    pub no_ignore: bool,
    /// fd size filters (e.g. +10M).
    #[arg(short = 'S', long = "size")]
    pub size: Vec<String>,
    /// Only files changed within this period (e.g. 2d).
    #[arg(long)]
    pub changed_within: Option<String>,
    /// Only files changed before this period.
    #[arg(long)]
    pub changed_before: Option<String>,
    /// Match the pattern against the full path.
    #[arg(long)]
    pub full_path_match: bool,
    /// Cap on the number of returned paths.
    #[arg(long)]
    pub limit: Option<i64>,
    /// Print only the total file count.
    #[arg(long)]
    pub count_only: bool,
}

#[derive(Parser, Debug)]
pub struct LangsArgs {
    /// Describe the queries available for one language.
    pub language: Option<String>,
}

/// CLI entry point, called from main.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Query(args) => run_query(args),
        Commands::Search(args) => run_search(args).await,
        Commands::Files(args) => run_files(args).await,
        Commands::Langs(args) => run_langs(args),
    }
}
