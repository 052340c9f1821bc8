//! Free-text query evaluation: lnc-style documents, ltn-style queries.
//!
//! Query terms are weighted `(1 + log10(tf_q)) * idf`, document terms carry
//! their stored l-weight, and each accumulated score is divided by the
//! document's length. The query vector itself is not length-normalized.

use crate::index::{DocId, DocLengths, PostingList};
use crate::persist::{load_dictionary, Dictionary, IndexPaths, PostingsReader};
use crate::tokenizer::normalize;
use crate::vector::{log_tf, TermVector};
use anyhow::{anyhow, Result};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

pub const DEFAULT_TOP_K: usize = 10;

/// Anything that can hand back a posting list for a dictionary offset.
pub trait PostingSource {
    fn posting(&self, offset: u64) -> Result<PostingList>;
}

impl PostingSource for PostingsReader {
    fn posting(&self, offset: u64) -> Result<PostingList> {
        self.read_posting(offset)
    }
}

/// In-memory postings where the "offset" is the list's position.
impl PostingSource for Vec<PostingList> {
    fn posting(&self, offset: u64) -> Result<PostingList> {
        self.get(offset as usize)
            .cloned()
            .ok_or_else(|| anyhow!("no posting list at offset {offset}"))
    }
}

/// One entry per distinct normalized term, weighted `1 + log10(count)`.
/// No stop-word or number filtering is applied to queries.
pub fn query_vector(line: &str) -> TermVector {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for token in line.split_whitespace() {
        *counts.entry(normalize(token)).or_insert(0) += 1;
    }
    counts.into_iter().map(|(t, c)| (t, log_tf(c))).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Highest `k` scores, descending; equal scores ordered by ascending docID.
pub fn top_k(scores: HashMap<DocId, f64>, k: usize) -> Vec<ScoredDoc> {
    if k == 0 {
        return Vec::new();
    }
    // min-heap of size k keyed on (score, smaller docID wins)
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, Reverse<DocId>)>> =
        BinaryHeap::with_capacity(k + 1);
    for (doc_id, score) in scores {
        heap.push(Reverse((OrderedFloat(score), Reverse(doc_id))));
        if heap.len() > k {
            heap.pop();
        }
    }
    // ascending order of Reverse<key> is descending order of key
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse((s, Reverse(doc_id)))| ScoredDoc { doc_id, score: s.0 })
        .collect()
}

/// A loaded index: dictionary and length table in memory, postings on demand.
#[derive(Debug)]
pub struct SearchIndex<S = PostingsReader> {
    dictionary: Dictionary,
    lengths: DocLengths,
    postings: S,
}

impl SearchIndex<PostingsReader> {
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let postings = PostingsReader::open(&paths.postings)?;
        let lengths = postings.read_lengths()?;
        let dictionary = load_dictionary(&paths.dictionary)?;
        tracing::info!(num_docs = lengths.len(), num_terms = dictionary.len(), "index loaded");
        Ok(Self { dictionary, lengths, postings })
    }
}

impl<S: PostingSource> SearchIndex<S> {
    pub fn new(dictionary: Dictionary, lengths: DocLengths, postings: S) -> Self {
        Self { dictionary, lengths, postings }
    }

    pub fn num_docs(&self) -> usize {
        self.lengths.len()
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Length-normalized cosine scores for every document sharing a term
    /// with the query.
    pub fn score(&self, line: &str) -> Result<HashMap<DocId, f64>> {
        let mut acc: HashMap<DocId, f64> = HashMap::new();
        for (term, tf_weight) in query_vector(line) {
            let Some(entry) = self.dictionary.get(&term) else {
                tracing::debug!(%term, "term not in dictionary");
                continue;
            };
            // a term in every document adds nothing and must not add candidates
            if entry.idf == 0.0 {
                continue;
            }
            let query_weight = tf_weight * entry.idf;
            let list = self.postings.posting(entry.offset)?;
            for p in list.iter() {
                *acc.entry(p.doc_id).or_insert(0.0) += query_weight * p.weight;
            }
        }

        Ok(acc
            .into_iter()
            .filter_map(|(doc_id, score)| match self.lengths.get(&doc_id) {
                Some(&len) if len > 0.0 => Some((doc_id, score / len)),
                _ => None,
            })
            .collect())
    }

    pub fn search(&self, line: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        Ok(top_k(self.score(line)?, k))
    }

    /// Ranked docIDs only.
    pub fn evaluate(&self, line: &str, k: usize) -> Result<Vec<DocId>> {
        Ok(self.search(line, k)?.into_iter().map(|d| d.doc_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::persist::DictEntry;
    use crate::tokenizer::Normalizer;
    use crate::vector::build_vector;

    /// Build an in-memory index where each term's offset is its term id.
    fn memory_index(docs: &[(DocId, &str)]) -> SearchIndex<Vec<PostingList>> {
        let n = Normalizer::new();
        let mut b = IndexBuilder::new();
        for (id, text) in docs {
            b.add_document(*id, &build_vector(&n, text)).unwrap();
        }
        let idx = b.finish();
        let mut dict = Dictionary::new();
        let mut lists = Vec::new();
        for (i, (term, idf, list)) in idx.terms().enumerate() {
            dict.insert(term, DictEntry { offset: i as u64, idf });
            lists.push(list.clone());
        }
        SearchIndex::new(dict, idx.lengths().clone(), lists)
    }

    #[test]
    fn query_vector_has_one_entry_per_distinct_term() {
        let q = query_vector("Cats cat CAT dog");
        assert_eq!(q.len(), 2);
        assert!((q["cat"] - (1.0 + 3f64.log10())).abs() < 1e-12);
        assert_eq!(q["dog"], 1.0);
    }

    #[test]
    fn query_ignores_document_filters() {
        let q = query_vector("the 1990");
        assert!(q.contains_key("the"));
        assert!(q.contains_key("1990"));
    }

    #[test]
    fn single_term_match() {
        let idx = memory_index(&[(1, "cat dog cat"), (2, "dog dog bird")]);
        assert_eq!(idx.evaluate("cat", DEFAULT_TOP_K).unwrap(), vec![1]);
    }

    #[test]
    fn unknown_terms_match_nothing() {
        let idx = memory_index(&[(1, "cat dog cat"), (2, "dog dog bird")]);
        assert!(idx.evaluate("xyzzy", DEFAULT_TOP_K).unwrap().is_empty());
        assert!(idx.evaluate("", DEFAULT_TOP_K).unwrap().is_empty());
    }

    #[test]
    fn term_in_every_document_adds_no_candidates() {
        let idx = memory_index(&[(1, "cat dog cat"), (2, "dog dog bird")]);
        assert!(idx.evaluate("dog", DEFAULT_TOP_K).unwrap().is_empty());
        assert_eq!(idx.evaluate("dog cat", DEFAULT_TOP_K).unwrap(), vec![1]);
    }

    #[test]
    fn scores_are_normalized_by_document_length() {
        let idx = memory_index(&[(1, "cat dog cat"), (2, "dog dog bird")]);
        let scores = idx.score("bird cat").unwrap();
        let len = (1.0 + (1.0 + 2f64.log10()).powi(2)).sqrt();
        let idf = 2f64.ln();
        assert!((scores[&1] - idf * (1.0 + 2f64.log10()) / len).abs() < 1e-12);
        assert!((scores[&2] - idf / len).abs() < 1e-12);
        assert_eq!(idx.evaluate("bird cat", DEFAULT_TOP_K).unwrap(), vec![1, 2]);
    }

    #[test]
    fn ties_break_on_ascending_doc_id() {
        let idx = memory_index(&[(5, "fish"), (3, "fish"), (4, "cow"), (9, "fish")]);
        assert_eq!(idx.evaluate("fish", DEFAULT_TOP_K).unwrap(), vec![3, 5, 9]);
    }

    #[test]
    fn results_are_capped_at_k() {
        let docs: Vec<(DocId, String)> = (1..=15).map(|i| (i, format!("apple filler{i}"))).collect();
        let mut refs: Vec<(DocId, &str)> = docs.iter().map(|(i, t)| (*i, t.as_str())).collect();
        refs.push((100, "banana"));
        let idx = memory_index(&refs);
        let out = idx.evaluate("apple", DEFAULT_TOP_K).unwrap();
        assert_eq!(out, (1..=10).collect::<Vec<DocId>>());
        assert_eq!(idx.evaluate("apple", 3).unwrap(), vec![1, 2, 3]);
        assert!(idx.evaluate("apple", 0).unwrap().is_empty());
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let idx = memory_index(&[(1, "a b c"), (2, "b c d d"), (3, "c d e"), (4, "z")]);
        let first = idx.search("a b d e", DEFAULT_TOP_K).unwrap();
        for _ in 0..5 {
            let again = idx.search("a b d e", DEFAULT_TOP_K).unwrap();
            assert_eq!(again.len(), first.len());
            for (x, y) in first.iter().zip(&again) {
                assert_eq!(x.doc_id, y.doc_id);
                assert_eq!(x.score.to_bits(), y.score.to_bits());
            }
        }
    }

    #[test]
    fn dangling_offset_is_an_error() {
        let idx = memory_index(&[(1, "cat dog cat"), (2, "dog dog bird")]);
        let mut dict = idx.dictionary().clone();
        dict.insert("cat", DictEntry { offset: 99, idf: 2f64.ln() });
        let broken = SearchIndex::new(dict, idx.lengths.clone(), idx.postings.clone());
        assert!(broken.evaluate("cat", DEFAULT_TOP_K).is_err());
        assert!(broken.evaluate("bird", DEFAULT_TOP_K).is_ok());
    }

    #[test]
    fn top_k_orders_by_score_then_doc_id() {
        let scores: HashMap<DocId, f64> = [(1, 0.5), (2, 0.9), (3, 0.5), (4, 0.1)].into_iter().collect();
        let ids: Vec<DocId> = top_k(scores, 3).into_iter().map(|d| d.doc_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
