use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagedex_core::extract::PageExtractor;
use pagedex_core::{build_index, search_with, Corpus, ExtractorSet, IndexConfig, IndexStore, PageRecord};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pagedex-indexer")]
#[command(about = "Build, inspect and query a page-level TF-IDF index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from every supported document under a directory (or a single file)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Optional JSON config with tokenizer and weighting settings
        #[arg(long)]
        config: Option<String>,
    },
    /// Run a query against a stored index and print the hits as JSON
    Search {
        #[arg(long)]
        index: String,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long)]
        config: Option<String>,
    },
    /// Print a summary of a stored index
    Inspect {
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config } => {
            let config = IndexConfig::load_or_default(config.as_deref())?;
            build(&input, &output, &config)
        }
        Commands::Search { index, query, k, config } => {
            if k == 0 {
                bail!("--k must be a positive integer");
            }
            let config = IndexConfig::load_or_default(config.as_deref())?;
            let index = IndexStore::new(&index).load()?;
            let hits = search_with(&query, k, &index, &config.snippet);
            let out = serde_json::json!({ "query": query, "results": hits });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Commands::Inspect { index } => inspect(&index),
    }
}

fn build(input: &str, output: &str, config: &IndexConfig) -> Result<()> {
    let corpus = collect_corpus(Path::new(input), &ExtractorSet::standard())?;
    let index = build_index(&corpus, config);
    IndexStore::new(output).save(&index)?;
    tracing::info!(output, num_pages = index.num_pages(), "index build complete");
    Ok(())
}

fn inspect(dir: &str) -> Result<()> {
    let (index, info) = IndexStore::new(dir).load_with_info()?;
    let mut documents: Vec<&str> = index.pages().iter().map(|p| p.document_id.as_str()).collect();
    documents.dedup();
    let out = serde_json::json!({
        "format_version": info.as_ref().map(|i| i.version),
        "created_at": info.as_ref().map(|i| i.created_at.as_str()),
        "num_documents": documents.len(),
        "num_pages": index.num_pages(),
        "vocabulary_size": index.vocabulary_size(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Supported files under `root` in path order, keyed by their `/`-joined
/// path relative to `root`. Entries the walk cannot read are logged and skipped.
fn supported_files(root: &Path, extractor: &dyn PageExtractor) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        let rel = p.strip_prefix(root).unwrap_or(p);
        let id = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        if extractor.supports(&id) {
            files.push((id, p.to_path_buf()));
        } else {
            tracing::debug!(path = %p.display(), "skipping unsupported file");
        }
    }
    files
}

/// Every supported file under `input`, in path order. Document ids are paths
/// relative to `input` (the file name when `input` is a file).
fn collect_corpus(input: &Path, extractor: &dyn PageExtractor) -> Result<Corpus> {
    let files = if input.is_dir() {
        supported_files(input, extractor)
    } else if input.is_file() {
        let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if !extractor.supports(&name) {
            bail!("unsupported document type: {}", input.display());
        }
        vec![(name, input.to_path_buf())]
    } else {
        bail!("input path does not exist: {}", input.display());
    };

    let mut corpus = Corpus::new();
    for (id, path) in files {
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let pages = match extractor.extract_pages(&id, &bytes) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(document = %id, error = %e, "skipping unreadable document");
                continue;
            }
        };
        tracing::info!(document = %id, pages = pages.len(), "extracted");
        corpus.extend(pages.into_iter().enumerate().map(|(i, text)| PageRecord::new(id.clone(), i as u32 + 1, text)));
    }
    Ok(corpus)
}
