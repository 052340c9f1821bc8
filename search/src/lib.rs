use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::{HeaderValue, StatusCode}, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vsm_core::query::PostingSource;
use vsm_core::{DocId, SearchIndex};

/// Evaluate each line of `queries` and write one line of space-separated
/// docIDs per query. Returns the number of queries processed.
pub fn run_queries<S, R, W>(index: &SearchIndex<S>, queries: R, mut out: W, k: usize) -> Result<usize>
where
    S: PostingSource,
    R: BufRead,
    W: Write,
{
    let mut n = 0;
    for line in queries.lines() {
        let line = line?;
        let ranked = index.evaluate(&line, k)?;
        writeln!(out, "{}", format_ranking(&ranked))?;
        n += 1;
    }
    out.flush()?;
    Ok(n)
}

pub fn format_ranking(ranked: &[DocId]) -> String {
    ranked.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
}

/// Run a whole queries file against a loaded index.
pub fn run_batch<S: PostingSource>(index: &SearchIndex<S>, queries: &Path, output: &Path, k: usize) -> Result<usize> {
    let input = File::open(queries)
        .with_context(|| format!("opening queries file {}", queries.display()))?;
    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;
    let n = run_queries(index, BufReader::new(input), BufWriter::new(out), k)?;
    tracing::info!(queries = n, output = %output.display(), "queries processed");
    Ok(n)
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { vsm_core::DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
}

pub type AppState = Arc<SearchIndex>;

/// Browser access for the search endpoint. `allowed` is a comma-separated
/// origin list; unset, empty or unparsable lists leave every origin open.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        tracing::info!(origins = origins.len(), "restricting CORS origins");
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_app(index: SearchIndex) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .with_state(Arc::new(index))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(index): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let q = params.q.clone();
    // postings reads are blocking file I/O
    let (total_hits, hits) = tokio::task::spawn_blocking(move || {
        let scores = index.score(&q)?;
        let total = scores.len();
        Ok::<_, anyhow::Error>((total, vsm_core::query::top_k(scores, k)))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(|e| {
        tracing::error!(error = %e, "search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let results = hits
        .into_iter()
        .map(|d| SearchHit { doc_id: d.doc_id, score: d.score })
        .collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }))
}
