use crate::index::{DocLengths, PostingList, WeightedIndex};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Locations of the two index files.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub dictionary: PathBuf,
    pub postings: PathBuf,
}

impl IndexPaths {
    pub fn new<D: AsRef<Path>, P: AsRef<Path>>(dictionary: D, postings: P) -> Self {
        Self {
            dictionary: dictionary.as_ref().to_path_buf(),
            postings: postings.as_ref().to_path_buf(),
        }
    }
}

/// On-disk dictionary entry: where the term's posting list starts, and its idf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub offset: u64,
    pub idf: f64,
}

/// term -> (postings byte offset, idf), loaded whole at query time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    terms: BTreeMap<String, DictEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, term: impl Into<String>, entry: DictEntry) {
        self.terms.insert(term.into(), entry);
    }

    pub fn get(&self, term: &str) -> Option<&DictEntry> {
        self.terms.get(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DictEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn write_record<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<u64> {
    let bytes = bincode::serialize(value)?;
    out.write_all(&bytes)?;
    Ok(bytes.len() as u64)
}

/// Write the postings file, then the dictionary.
///
/// The postings file starts with the document-length table, followed by one
/// record per term in term-id order. Offsets are only known once each record
/// has been written, so the dictionary file is produced last.
pub fn save_index(paths: &IndexPaths, index: &WeightedIndex) -> Result<Dictionary> {
    let file = File::create(&paths.postings)
        .with_context(|| format!("creating postings file {}", paths.postings.display()))?;
    let mut out = BufWriter::new(file);

    let mut offset = write_record(&mut out, index.lengths())?;
    let mut dictionary = Dictionary::new();
    for (term, idf, list) in index.terms() {
        dictionary.insert(term, DictEntry { offset, idf });
        offset += write_record(&mut out, list)?;
    }
    out.flush()?;
    tracing::debug!(bytes = offset, terms = dictionary.len(), "postings written");

    save_dictionary(&paths.dictionary, &dictionary)?;
    Ok(dictionary)
}

pub fn save_dictionary(path: &Path, dictionary: &Dictionary) -> Result<()> {
    let mut f = File::create(path)
        .with_context(|| format!("creating dictionary file {}", path.display()))?;
    let bytes = bincode::serialize(dictionary)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_dictionary(path: &Path) -> Result<Dictionary> {
    let mut f = File::open(path)
        .with_context(|| format!("opening dictionary file {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let dict = bincode::deserialize(&buf)
        .with_context(|| format!("decoding dictionary file {}", path.display()))?;
    Ok(dict)
}

/// Random-access reader over the postings file. The handle stays open for
/// the reader's lifetime; reads are serialized through a lock so the reader
/// can be shared between threads.
#[derive(Debug)]
pub struct PostingsReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
}

impl PostingsReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path)
            .with_context(|| format!("opening postings file {}", path.display()))?;
        Ok(Self { path, file: Mutex::new(BufReader::new(f)) })
    }

    fn read_at<T: DeserializeOwned>(&self, offset: u64) -> Result<T> {
        let mut f = self.file.lock();
        f.seek(SeekFrom::Start(offset))?;
        let value = bincode::deserialize_from(&mut *f).with_context(|| {
            format!("decoding record at offset {offset} in {}", self.path.display())
        })?;
        Ok(value)
    }

    pub fn read_lengths(&self) -> Result<DocLengths> {
        self.read_at(0)
    }

    pub fn read_posting(&self, offset: u64) -> Result<PostingList> {
        self.read_at(offset)
    }
}
