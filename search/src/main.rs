use anyhow::Result;
use clap::{Parser, Subcommand};
use search::{build_app, run_batch};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::{IndexPaths, SearchIndex, DEFAULT_TOP_K};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Ranked free-text retrieval over a tf-idf index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a file of queries, one per line
    Run {
        /// Dictionary file
        #[arg(short = 'd', long)]
        dictionary: PathBuf,
        /// Postings file
        #[arg(short = 'p', long)]
        postings: PathBuf,
        /// Queries file
        #[arg(short = 'q', long)]
        queries: PathBuf,
        /// Output file of results
        #[arg(short = 'o', long)]
        output: PathBuf,
        /// Results per query
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Serve /search over HTTP
    Serve {
        #[arg(short = 'd', long)]
        dictionary: PathBuf,
        #[arg(short = 'p', long)]
        postings: PathBuf,
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { dictionary, postings, queries, output, k } => {
            let index = SearchIndex::open(&IndexPaths::new(dictionary, postings))?;
            run_batch(&index, &queries, &output, k)?;
            Ok(())
        }
        Commands::Serve { dictionary, postings, host, port } => {
            let index = SearchIndex::open(&IndexPaths::new(dictionary, postings))?;
            serve(index, &host, port)
        }
    }
}

fn serve(index: SearchIndex, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let app = build_app(index);
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "server listening");
        axum::serve(listener, app).await?;
        Ok::<_, anyhow::Error>(())
    })
}
