//! Analyzer pipelines and their registration
//!
//! Each pipeline is registered under a caller-chosen name in one index
//! context; registering a name again replaces the pipeline for subsequent
//! ingests and queries only. Already-written postings keep whatever
//! tokenization produced them. Parameters are validated before anything is
//! registered, so a failed registration leaves an earlier pipeline under
//! the same name untouched.

use tantivy::tokenizer::{
    AsciiFoldingFilter, Language, LowerCaser, NgramTokenizer, RawTokenizer, RemoveLongFilter,
    SimpleTokenizer, Stemmer, TextAnalyzer,
};
use tantivy::Index;

use crate::errors::{Error, Result};
use crate::tokenizer::EdgeNgramTokenizer;

fn register(index: &Index, name: &str, analyzer: TextAnalyzer) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidConfig(
            "Tokenizer name must not be empty".into(),
        ));
    }
    index.tokenizers().register(name, analyzer);
    Ok(())
}

/// Map an ISO-639-1 code to a stemmer language
pub fn stemmer_language(lang: &str) -> Result<Language> {
    let language = match lang {
        "ar" => Language::Arabic,
        "da" => Language::Danish,
        "nl" => Language::Dutch,
        "en" => Language::English,
        "fi" => Language::Finnish,
        "fr" => Language::French,
        "de" => Language::German,
        "el" => Language::Greek,
        "hu" => Language::Hungarian,
        "it" => Language::Italian,
        "no" => Language::Norwegian,
        "pt" => Language::Portuguese,
        "ro" => Language::Romanian,
        "ru" => Language::Russian,
        "es" => Language::Spanish,
        "sv" => Language::Swedish,
        "ta" => Language::Tamil,
        "tr" => Language::Turkish,
        _ => return Err(Error::UnsupportedLanguage(lang.to_string())),
    };
    Ok(language)
}

/// Register an n-gram pipeline: grams of `min_gram..=max_gram` chars,
/// optionally only those anchored at the token start
pub fn register_ngram(
    index: &Index,
    name: &str,
    min_gram: usize,
    max_gram: usize,
    prefix_only: bool,
) -> Result<()> {
    if min_gram == 0 {
        return Err(Error::InvalidConfig("min_gram must be at least 1".into()));
    }
    if min_gram > max_gram {
        return Err(Error::InvalidConfig(format!(
            "min_gram {} must not exceed max_gram {}",
            min_gram, max_gram
        )));
    }
    let tokenizer = NgramTokenizer::new(min_gram, max_gram, prefix_only)
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let analyzer = TextAnalyzer::builder(tokenizer)
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();

    register(index, name, analyzer)
}

/// Register an edge n-gram pipeline: start-anchored grams, at most
/// `limit` grams per token
pub fn register_edge_ngram(
    index: &Index,
    name: &str,
    min_gram: usize,
    max_gram: usize,
    limit: usize,
) -> Result<()> {
    let analyzer = TextAnalyzer::builder(EdgeNgramTokenizer::new(min_gram, max_gram, limit)?)
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();

    register(index, name, analyzer)
}

/// Register a simple language-aware pipeline: word tokenization, tokens
/// over `text_limit` bytes removed, lowercasing, ASCII folding, stemming
pub fn register_simple(index: &Index, name: &str, text_limit: usize, lang: &str) -> Result<()> {
    if text_limit == 0 {
        return Err(Error::InvalidConfig("text_limit must be at least 1".into()));
    }
    let language = stemmer_language(lang)?;

    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(text_limit))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .filter(Stemmer::new(language))
        .build();

    register(index, name, analyzer)
}

/// Register a segmenting pipeline for CJK text
#[cfg(feature = "jieba")]
pub fn register_segmenting(index: &Index, name: &str, text_limit: usize) -> Result<()> {
    if text_limit == 0 {
        return Err(Error::InvalidConfig("text_limit must be at least 1".into()));
    }
    let analyzer = TextAnalyzer::builder(tantivy_jieba::JiebaTokenizer {})
        .filter(RemoveLongFilter::limit(text_limit))
        .filter(LowerCaser)
        .build();

    register(index, name, analyzer)
}

/// Register a segmenting pipeline for CJK text
#[cfg(not(feature = "jieba"))]
pub fn register_segmenting(_index: &Index, _name: &str, _text_limit: usize) -> Result<()> {
    Err(Error::InvalidConfig(
        "Segmenting tokenizer support not compiled in (enable the 'jieba' feature)".into(),
    ))
}

/// Register a raw pipeline: the whole field value is one token
pub fn register_raw(index: &Index, name: &str) -> Result<()> {
    let analyzer = TextAnalyzer::builder(RawTokenizer::default()).build();
    register(index, name, analyzer)
}
