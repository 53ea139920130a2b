use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this (in chars) carry no search value.
pub const MIN_TOKEN_LEN: usize = 2;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Shared by indexing and querying so both sides always agree on terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tokenizer {
    stemming: bool,
}

impl Tokenizer {
    pub fn new(stemming: bool) -> Self { Self { stemming } }

    /// NFKC-normalize, lowercase, split on non-alphanumeric runs, drop short
    /// tokens, then run the optional normalization step.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
            .map(|t| self.normalize(t))
            .collect()
    }

    /// Distinct terms of `text` with their occurrence counts, in first-seen order.
    pub fn term_frequencies(&self, text: &str) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = Vec::new();
        let mut slot: HashMap<String, usize> = HashMap::new();
        for token in self.tokenize(text) {
            match slot.get(&token) {
                Some(&i) => out[i].1 += 1,
                None => {
                    slot.insert(token.clone(), out.len());
                    out.push((token, 1));
                }
            }
        }
        out
    }

    /// Distinct query terms, in first-seen order.
    pub fn query_terms(&self, query: &str) -> Vec<String> {
        self.term_frequencies(query).into_iter().map(|(t, _)| t).collect()
    }

    fn normalize(&self, token: &str) -> String {
        if self.stemming {
            STEMMER.stem(token).into_owned()
        } else {
            token.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::default().tokenize("Intro to Programming (15-112)");
        assert_eq!(t, vec!["intro", "to", "programming", "15", "112"]);
    }

    #[test]
    fn frequencies_keep_counts() {
        let tf = Tokenizer::default().term_frequencies("data Data DATA structures");
        assert_eq!(tf, vec![("data".to_string(), 3), ("structures".to_string(), 1)]);
    }

    #[test]
    fn stemming_is_opt_in() {
        assert_eq!(Tokenizer::default().tokenize("running"), vec!["running"]);
        assert_eq!(Tokenizer::new(true).tokenize("running"), vec!["run"]);
    }
}
