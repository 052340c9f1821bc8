use crate::vector::{vector_length, TermVector};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// docID -> Euclidean length of the document's l-weighted vector.
pub type DocLengths = BTreeMap<DocId, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64, // l-scheme tf weight, no idf
}

/// docID -> weight for a single term, kept sorted by doc_id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingList(Vec<Posting>);

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `doc_id`.
    pub fn insert(&mut self, doc_id: DocId, weight: f64) {
        match self.0.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(i) => self.0[i].weight = weight,
            Err(i) => self.0.insert(i, Posting { doc_id, weight }),
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<f64> {
        self.0
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| self.0[i].weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(DocId, f64)> for PostingList {
    fn from_iter<I: IntoIterator<Item = (DocId, f64)>>(iter: I) -> Self {
        let mut list = PostingList::new();
        for (doc_id, weight) in iter {
            list.insert(doc_id, weight);
        }
        list
    }
}

/// Dictionary entry while documents are still being added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildEntry {
    pub term_id: TermId,
    pub df: u32,
}

/// Dictionary entry once the whole corpus has been seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEntry {
    pub term_id: TermId,
    pub idf: f64,
}

/// In-memory dictionary and posting store for a single batch build.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    dictionary: HashMap<String, BuildEntry>,
    vocabulary: Vec<String>, // term_id -> term
    postings: Vec<PostingList>, // term_id -> posting list
    lengths: DocLengths,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's finished term-weight vector.
    pub fn add_document(&mut self, doc_id: DocId, vector: &TermVector) -> Result<()> {
        if self.lengths.contains_key(&doc_id) {
            bail!("document {doc_id} added twice");
        }
        self.lengths.insert(doc_id, vector_length(vector));

        for (term, &weight) in vector {
            match self.dictionary.get_mut(term) {
                Some(entry) => {
                    entry.df += 1;
                    self.postings[entry.term_id as usize].insert(doc_id, weight);
                }
                None => {
                    let term_id = self.postings.len() as TermId;
                    self.postings.push(PostingList::from_iter([(doc_id, weight)]));
                    self.vocabulary.push(term.clone());
                    self.dictionary.insert(term.clone(), BuildEntry { term_id, df: 1 });
                }
            }
        }
        Ok(())
    }

    pub fn num_docs(&self) -> usize {
        self.lengths.len()
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn entry(&self, term: &str) -> Option<BuildEntry> {
        self.dictionary.get(term).copied()
    }

    pub fn posting(&self, term_id: TermId) -> Option<&PostingList> {
        self.postings.get(term_id as usize)
    }

    pub fn term(&self, term_id: TermId) -> Option<&str> {
        self.vocabulary.get(term_id as usize).map(String::as_str)
    }

    pub fn lengths(&self) -> &DocLengths {
        &self.lengths
    }

    /// Replace document frequencies with t-scheme idf, `ln(N / df)`.
    pub fn finish(self) -> WeightedIndex {
        let n = self.lengths.len() as f64;
        let dictionary = self
            .dictionary
            .into_iter()
            .map(|(term, e)| {
                let idf = (n / e.df as f64).ln();
                (term, WeightedEntry { term_id: e.term_id, idf })
            })
            .collect();
        WeightedIndex {
            dictionary,
            vocabulary: self.vocabulary,
            postings: self.postings,
            lengths: self.lengths,
        }
    }
}

/// A completed build, ready to be written to disk.
#[derive(Debug)]
pub struct WeightedIndex {
    dictionary: HashMap<String, WeightedEntry>,
    vocabulary: Vec<String>,
    postings: Vec<PostingList>,
    lengths: DocLengths,
}

impl WeightedIndex {
    pub fn entry(&self, term: &str) -> Option<WeightedEntry> {
        self.dictionary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.entry(term).map(|e| e.idf)
    }

    pub fn posting(&self, term: &str) -> Option<&PostingList> {
        let e = self.dictionary.get(term)?;
        self.postings.get(e.term_id as usize)
    }

    /// `(term, idf, postings)` in term-id order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64, &PostingList)> {
        self.vocabulary.iter().zip(&self.postings).map(|(term, list)| {
            let idf = self.dictionary.get(term).map_or(0.0, |e| e.idf);
            (term.as_str(), idf, list)
        })
    }

    pub fn num_docs(&self) -> usize {
        self.lengths.len()
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn lengths(&self) -> &DocLengths {
        &self.lengths
    }
}
