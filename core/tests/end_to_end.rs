use std::fs;
use tempfile::tempdir;
use vsm_core::driver::build_index;
use vsm_core::persist::{load_dictionary, PostingsReader};
use vsm_core::tokenizer::Normalizer;
use vsm_core::{IndexPaths, SearchIndex, DEFAULT_TOP_K};

fn write_corpus(dir: &std::path::Path, docs: &[(&str, &str)]) {
    for (name, text) in docs {
        fs::write(dir.join(name), text).unwrap();
    }
}

#[test]
fn cat_query_returns_only_doc_one() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    write_corpus(&corpus, &[("1", "cat dog cat"), ("2", "dog dog bird")]);

    let paths = IndexPaths::new(dir.path().join("dictionary.bin"), dir.path().join("postings.bin"));
    let stats = build_index(&corpus, &paths, &Normalizer::new()).unwrap();
    assert_eq!(stats.num_docs, 2);
    assert_eq!(stats.num_terms, 3);

    let index = SearchIndex::open(&paths).unwrap();
    assert_eq!(index.evaluate("cat", DEFAULT_TOP_K).unwrap(), vec![1]);
    assert!(index.evaluate("xyzzy", DEFAULT_TOP_K).unwrap().is_empty());

    let dict = load_dictionary(&paths.dictionary).unwrap();
    let cat = dict.get("cat").unwrap();
    assert!((cat.idf - 2f64.ln()).abs() < 1e-12);
    let reader = PostingsReader::open(&paths.postings).unwrap();
    let list = reader.read_posting(cat.offset).unwrap();
    assert!((list.get(1).unwrap() - (1.0 + 2f64.log10())).abs() < 1e-12);
    assert_eq!(list.get(2), None);
}

#[test]
fn multi_line_documents_and_empty_files() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    write_corpus(
        &corpus,
        &[
            ("3", "Oil prices rose sharply.\nTraders said oil supply was tight.\n"),
            ("7", "Wheat harvest was poor this year.\n"),
            ("11", ""),
        ],
    );
    let paths = IndexPaths::new(dir.path().join("d"), dir.path().join("p"));
    build_index(&corpus, &paths, &Normalizer::new()).unwrap();

    let index = SearchIndex::open(&paths).unwrap();
    assert_eq!(index.num_docs(), 3);
    assert_eq!(index.evaluate("OIL supplies", DEFAULT_TOP_K).unwrap(), vec![3]);
    assert_eq!(index.evaluate("wheat oil", DEFAULT_TOP_K).unwrap().len(), 2);

    let lengths = PostingsReader::open(&paths.postings).unwrap().read_lengths().unwrap();
    assert_eq!(lengths[&11], 0.0);
}

#[test]
fn filters_only_apply_to_documents() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus).unwrap();
    write_corpus(&corpus, &[("1", "the year 1987 was good"), ("2", "a good harvest")]);
    let paths = IndexPaths::new(dir.path().join("d"), dir.path().join("p"));
    let normalizer = Normalizer::new().with_default_stopwords().with_number_removal(true);
    build_index(&corpus, &paths, &normalizer).unwrap();

    let index = SearchIndex::open(&paths).unwrap();
    assert!(index.dictionary().get("the").is_none());
    assert!(index.dictionary().get("1987").is_none());
    assert!(index.evaluate("the 1987", DEFAULT_TOP_K).unwrap().is_empty());
    assert_eq!(index.evaluate("the year", DEFAULT_TOP_K).unwrap(), vec![1]);
}

#[test]
fn missing_index_files_are_fatal() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path().join("d"), dir.path().join("p"));
    assert!(SearchIndex::open(&paths).is_err());
}
