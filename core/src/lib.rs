//! Vector-space (tf-idf, cosine) indexing and ranked retrieval.

pub mod driver;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod vector;

pub use index::{DocId, DocLengths, Posting, PostingList, TermId};
pub use persist::{DictEntry, Dictionary, IndexPaths};
pub use query::{SearchIndex, DEFAULT_TOP_K};
