//! Edge n-gram tokenizer
//!
//! Splits text into words and emits grams anchored at the start of each
//! word, from `min_gram` to `max_gram` characters, capped at `limit`
//! grams per word. Useful for search-as-you-type prefix matching without
//! the posting blowup of full n-grams.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::{Error, Result};

/// Tokenizer emitting start-anchored grams per word
#[derive(Debug, Clone)]
pub struct EdgeNgramTokenizer {
    min_gram: usize,
    max_gram: usize,
    limit: usize,
}

impl EdgeNgramTokenizer {
    /// Create an edge n-gram tokenizer.
    ///
    /// Requires `1 <= min_gram <= max_gram` and `limit >= 1`.
    pub fn new(min_gram: usize, max_gram: usize, limit: usize) -> Result<Self> {
        if min_gram == 0 {
            return Err(Error::InvalidConfig("min_gram must be at least 1".into()));
        }
        if min_gram > max_gram {
            return Err(Error::InvalidConfig(format!(
                "min_gram {} must not exceed max_gram {}",
                min_gram, max_gram
            )));
        }
        if limit == 0 {
            return Err(Error::InvalidConfig("limit must be at least 1".into()));
        }
        Ok(Self {
            min_gram,
            max_gram,
            limit,
        })
    }
}

impl Tokenizer for EdgeNgramTokenizer {
    type TokenStream<'a> = EdgeNgramTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> EdgeNgramTokenStream {
        let mut tokens = Vec::new();

        for (position, (word_offset, word)) in text.unicode_word_indices().enumerate() {
            // Byte offset of each char boundary, plus the end of the word
            let mut boundaries: Vec<usize> = word.char_indices().map(|(idx, _)| idx).collect();
            boundaries.push(word.len());
            let char_count = boundaries.len() - 1;

            let mut emitted = 0;
            for gram_len in self.min_gram..=self.max_gram {
                if gram_len > char_count || emitted >= self.limit {
                    break;
                }
                let gram_end = boundaries[gram_len];
                tokens.push(Token {
                    offset_from: word_offset,
                    offset_to: word_offset + gram_end,
                    position,
                    text: word[..gram_end].to_string(),
                    position_length: 1,
                });
                emitted += 1;
            }
        }

        EdgeNgramTokenStream {
            tokens,
            index: 0,
            token: Token::default(),
        }
    }
}

/// Token stream over precomputed edge n-grams
pub struct EdgeNgramTokenStream {
    tokens: Vec<Token>,
    index: usize,
    token: Token,
}

impl TokenStream for EdgeNgramTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            self.token = self.tokens[self.index].clone();
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gram_texts(tokenizer: &mut EdgeNgramTokenizer, text: &str) -> Vec<String> {
        let mut stream = tokenizer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            out.push(stream.token().text.clone());
        }
        out
    }

    #[test]
    fn test_basic_grams() {
        let mut tokenizer = EdgeNgramTokenizer::new(2, 4, 10).unwrap();
        let grams = gram_texts(&mut tokenizer, "hello");
        assert_eq!(grams, vec!["he", "hel", "hell"]);
    }

    #[test]
    fn test_grams_per_word() {
        let mut tokenizer = EdgeNgramTokenizer::new(1, 2, 10).unwrap();
        let grams = gram_texts(&mut tokenizer, "ab cd");
        assert_eq!(grams, vec!["a", "ab", "c", "cd"]);
    }

    #[test]
    fn test_limit_caps_grams() {
        let mut tokenizer = EdgeNgramTokenizer::new(1, 10, 2).unwrap();
        let grams = gram_texts(&mut tokenizer, "elephant");
        assert_eq!(grams, vec!["e", "el"]);
    }

    #[test]
    fn test_short_word_produces_fewer_grams() {
        let mut tokenizer = EdgeNgramTokenizer::new(2, 5, 10).unwrap();
        let grams = gram_texts(&mut tokenizer, "ab");
        assert_eq!(grams, vec!["ab"]);
    }

    #[test]
    fn test_word_shorter_than_min_gram() {
        let mut tokenizer = EdgeNgramTokenizer::new(3, 5, 10).unwrap();
        let grams = gram_texts(&mut tokenizer, "ab");
        assert!(grams.is_empty());
    }

    #[test]
    fn test_multibyte_chars() {
        let mut tokenizer = EdgeNgramTokenizer::new(1, 2, 10).unwrap();
        let grams = gram_texts(&mut tokenizer, "héllo");
        assert_eq!(grams, vec!["h", "hé"]);
    }

    #[test]
    fn test_positions_and_offsets() {
        let mut tokenizer = EdgeNgramTokenizer::new(2, 2, 10).unwrap();
        let mut stream = tokenizer.token_stream("ab cd");

        assert!(stream.advance());
        assert_eq!(stream.token().position, 0);
        assert_eq!(stream.token().offset_from, 0);
        assert_eq!(stream.token().offset_to, 2);

        assert!(stream.advance());
        assert_eq!(stream.token().position, 1);
        assert_eq!(stream.token().offset_from, 3);
        assert_eq!(stream.token().offset_to, 5);

        assert!(!stream.advance());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(EdgeNgramTokenizer::new(0, 2, 10).is_err());
        assert!(EdgeNgramTokenizer::new(3, 2, 10).is_err());
        assert!(EdgeNgramTokenizer::new(1, 2, 0).is_err());
    }
}
