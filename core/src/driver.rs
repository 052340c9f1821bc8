use crate::index::{DocId, IndexBuilder};
use crate::persist::{save_index, IndexPaths};
use crate::tokenizer::Normalizer;
use crate::vector::build_vector_from_reader;
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub postings_bytes: u64,
    pub dictionary_bytes: u64,
}

/// Files directly under `dir`, each named by its integer docID, sorted by docID.
pub fn collect_documents(dir: &Path) -> Result<Vec<(DocId, PathBuf)>> {
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("reading directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let doc_id: DocId = name
            .parse()
            .map_err(|_| anyhow!("file name {:?} in {} is not a docID", name, dir.display()))?;
        docs.push((doc_id, entry.path().to_path_buf()));
    }
    docs.sort_by_key(|(id, _)| *id);
    Ok(docs)
}

/// Build an index over every document in `input` and write it to `paths`.
pub fn build_index(input: &Path, paths: &IndexPaths, normalizer: &Normalizer) -> Result<IndexStats> {
    let docs = collect_documents(input)?;
    let mut builder = IndexBuilder::new();

    for (doc_id, path) in &docs {
        let f = File::open(path).with_context(|| format!("opening document {}", path.display()))?;
        let vector = build_vector_from_reader(normalizer, BufReader::new(f))
            .with_context(|| format!("reading document {}", path.display()))?;
        tracing::debug!(doc_id, terms = vector.len(), "processed document");
        builder.add_document(*doc_id, &vector)?;
    }
    tracing::info!(num_docs = builder.num_docs(), num_terms = builder.num_terms(), "ingested documents");

    let index = builder.finish();
    save_index(paths, &index)?;

    let stats = IndexStats {
        num_docs: index.num_docs(),
        num_terms: index.num_terms(),
        postings_bytes: fs::metadata(&paths.postings)?.len(),
        dictionary_bytes: fs::metadata(&paths.dictionary)?.len(),
    };
    tracing::info!(
        postings_bytes = stats.postings_bytes,
        dictionary_bytes = stats.dictionary_bytes,
        "index build complete"
    );
    Ok(stats)
}
