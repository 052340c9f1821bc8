//! Per-document term-frequency vectors.

use crate::tokenizer::Normalizer;
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Sparse term -> weight map. Ordered so that term ids are assigned
/// deterministically when a vector is fed to the index builder.
pub type TermVector = BTreeMap<String, f64>;

/// l-scheme: `1 + log10(tf)`. Zero counts have no weight.
pub fn log_tf(count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        1.0 + (count as f64).log10()
    }
}

/// Euclidean norm of a weighted vector.
pub fn vector_length(vector: &TermVector) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Accumulates raw term counts for one document, then weights them.
#[derive(Debug)]
pub struct VectorBuilder<'a> {
    normalizer: &'a Normalizer,
    counts: BTreeMap<String, u32>,
}

impl<'a> VectorBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self { normalizer, counts: BTreeMap::new() }
    }

    pub fn add_text(&mut self, text: &str) {
        for term in self.normalizer.terms(text) {
            *self.counts.entry(term).or_insert(0) += 1;
        }
    }

    pub fn finish(self) -> TermVector {
        self.counts
            .into_iter()
            .map(|(term, count)| (term, log_tf(count)))
            .collect()
    }
}

pub fn build_vector(normalizer: &Normalizer, text: &str) -> TermVector {
    let mut builder = VectorBuilder::new(normalizer);
    builder.add_text(text);
    builder.finish()
}

/// Same as [`build_vector`] but consumes the input line by line.
pub fn build_vector_from_reader<R: BufRead>(normalizer: &Normalizer, reader: R) -> Result<TermVector> {
    let mut builder = VectorBuilder::new(normalizer);
    for line in reader.lines() {
        builder.add_text(&line?);
    }
    Ok(builder.finish())
}
