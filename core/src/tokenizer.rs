use anyhow::{Context, Result};
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Map a raw token to its canonical term: NFKC, lowercase, then Snowball English
/// stemming repeated until the stem no longer changes, so that normalizing a
/// term a second time returns it unchanged.
pub fn normalize(token: &str) -> String {
    let mut term = token.nfkc().collect::<String>().to_lowercase();
    loop {
        let stem = STEMMER.stem(&term).into_owned();
        if stem.is_empty() || stem == term {
            return term;
        }
        term = stem;
    }
}

fn has_numbers(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
}

/// Split text into sentences, then each sentence into words (UAX #29).
/// Segments made only of punctuation or whitespace are dropped.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.unicode_sentences().flat_map(|s| s.unicode_words())
}

/// Read a stop-word list, one word per line, kept as written apart from
/// surrounding whitespace. Blank lines are ignored.
pub fn load_stopwords<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading stop-word file {}", path.display()))?;
    Ok(text
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Document-side term policy. Filters look at the raw token, and stop words
/// match exactly, case included. Anything that survives goes through
/// [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    stopwords: Option<HashSet<String>>,
    remove_numbers: bool,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_stopwords(self) -> Self {
        self.with_stopwords(STOPWORDS.iter().copied())
    }

    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = Some(words.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_number_removal(mut self, remove: bool) -> Self {
        self.remove_numbers = remove;
        self
    }

    pub fn removes_stopwords(&self) -> bool {
        self.stopwords.is_some()
    }

    pub fn removes_numbers(&self) -> bool {
        self.remove_numbers
    }

    fn is_stopword(&self, token: &str) -> bool {
        match &self.stopwords {
            Some(words) => words.contains(token),
            None => false,
        }
    }

    /// Whether a raw token survives the enabled filters.
    pub fn accepts(&self, token: &str) -> bool {
        if self.is_stopword(token) {
            return false;
        }
        !(self.remove_numbers && has_numbers(token))
    }

    pub fn term(&self, token: &str) -> Option<String> {
        if self.accepts(token) {
            Some(normalize(token))
        } else {
            None
        }
    }

    /// Normalized terms of `text` in reading order, filters applied.
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        tokenize(text).filter_map(move |t| self.term(t))
    }
}
