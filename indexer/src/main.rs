use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use dirsearch_core::dumps::{DumpPaths, LoadedDumps};
use dirsearch_core::normalize::normalize;
use dirsearch_core::{build, count_matches, search, EngineConfig, EntityType};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the directory search index from dumps and inspect it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Directory holding the four JSON dumps
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// JSON file with scoring overrides
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable English stemming regardless of the config file
    #[arg(long, default_value_t = false)]
    stemming: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and report document, term and skipped-record counts
    Build {
        #[command(flatten)]
        input: Input,
        /// Print every skipped record
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Build the index and print one page of results as JSON
    Query {
        #[command(flatten)]
        input: Input,
        /// Free-text query
        query: String,
        #[arg(long, default_value_t = 0)]
        min_index: usize,
        #[arg(long, default_value_t = 10)]
        max_index: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, verbose } => build_report(&input, verbose),
        Commands::Query { input, query, min_index, max_index } => run_query(&input, &query, min_index, max_index),
    }
}

fn load(input: &Input) -> Result<(LoadedDumps, EngineConfig)> {
    let mut config = match &input.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.stemming |= input.stemming;

    let dumps = LoadedDumps::load(&DumpPaths::in_dir(&input.data_dir));
    if dumps.loaded_count() == 0 {
        bail!("no dumps could be loaded from {}", input.data_dir.display());
    }
    Ok((dumps, config))
}

fn build_report(input: &Input, verbose: bool) -> Result<()> {
    let (dumps, config) = load(input)?;
    let normalized = normalize(&dumps);
    if verbose {
        for skipped in &normalized.skipped {
            println!("skipped: {skipped}");
        }
    }
    let skipped = normalized.skipped.len();
    let count = |t: EntityType| normalized.documents.iter().filter(|d| d.entity_type == t).count();
    let (courses, sections, employees) = (count(EntityType::Course), count(EntityType::Section), count(EntityType::Employee));

    let index = build(normalized.documents, &config);
    let stats = index.stats();
    println!("dumps loaded: {}/4", dumps.loaded_count());
    println!("documents:    {} ({courses} courses, {sections} sections, {employees} employees)", stats.num_docs);
    println!("terms:        {}", stats.num_terms);
    println!("skipped:      {}", skipped + stats.skipped);
    Ok(())
}

fn run_query(input: &Input, query: &str, min_index: usize, max_index: usize) -> Result<()> {
    let (dumps, config) = load(input)?;
    let index = build(normalize(&dumps).documents, &config);
    let hits = search(&index, query, min_index, max_index)?;
    tracing::info!(total = count_matches(&index, query), returned = hits.len(), "query complete");
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}
