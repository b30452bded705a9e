//! Tokenizers used by token-based matchers.

use std::collections::HashSet;
use std::sync::Arc;

/// Shared, memoized token set.
pub type TokenSet = Arc<HashSet<String>>;

/// Splits text into a set of tokens.
///
/// `id` identifies the tokenizer configuration; columns key their token
/// caches by it, so two tokenizers that produce different tokens must not
/// share an id.
pub trait Tokenizer: Send + Sync {
    fn id(&self) -> String;

    fn tokenize(&self, text: &str) -> HashSet<String>;

    fn tokenize_all(&self, texts: &[String]) -> HashSet<String> {
        texts.iter().flat_map(|text| self.tokenize(text)).collect()
    }
}

/// Character n-gram tokenizer over lowercased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramTokenizer {
    n: usize,
}

impl NGramTokenizer {
    pub fn new(n: usize) -> Self {
        Self { n: n.max(1) }
    }
}

impl Tokenizer for NGramTokenizer {
    fn id(&self) -> String {
        format!("ngram_{}", self.n)
    }

    fn tokenize(&self, text: &str) -> HashSet<String> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        if chars.is_empty() {
            return HashSet::new();
        }
        if chars.len() <= self.n {
            return HashSet::from([chars.iter().collect()]);
        }
        chars
            .windows(self.n)
            .map(|window| window.iter().collect())
            .collect()
    }
}
