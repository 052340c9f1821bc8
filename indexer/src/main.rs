use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::driver::build_index;
use vsm_core::tokenizer::{load_stopwords, Normalizer};
use vsm_core::IndexPaths;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a tf-idf dictionary and postings file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory of documents named by integer docID
    Build {
        /// Directory of documents
        #[arg(short = 'i', long)]
        input: PathBuf,
        /// Output dictionary file
        #[arg(short = 'd', long)]
        dictionary: PathBuf,
        /// Output postings file
        #[arg(short = 'p', long)]
        postings: PathBuf,
        /// Drop English stop words from documents
        #[arg(long, default_value_t = false)]
        remove_stopwords: bool,
        /// Stop-word list, one per line (implies --remove-stopwords)
        #[arg(long)]
        stopwords_file: Option<PathBuf>,
        /// Drop tokens that contain a digit
        #[arg(long, default_value_t = false)]
        remove_numbers: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, dictionary, postings, remove_stopwords, stopwords_file, remove_numbers } => {
            let mut normalizer = Normalizer::new().with_number_removal(remove_numbers);
            if let Some(path) = stopwords_file {
                normalizer = normalizer.with_stopwords(load_stopwords(&path)?);
            } else if remove_stopwords {
                normalizer = normalizer.with_default_stopwords();
            }
            let paths = IndexPaths::new(dictionary, postings);
            let stats = build_index(&input, &paths, &normalizer)?;
            tracing::info!(num_docs = stats.num_docs, num_terms = stats.num_terms, "done");
            Ok(())
        }
    }
}
