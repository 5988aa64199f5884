use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The reserved token every out-of-vocabulary token resolves to
pub static UNK_TOKEN: &str = "$UNK";

/// The reserved token used to right-pad shorter sequences, when present
pub static PAD_TOKEN: &str = "$PAD";

/// A closed mapping from tokens to integer indexes
///
/// The index of a token is its position in the token list. The unknown token is always present.
/// Vocabularies without a dedicated padding token pad with the unknown index, which is safe
/// because padded positions are masked out of every aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
    unk_index: usize,
    pad_index: Option<usize>,
}

impl Vocabulary {
    /// Create a vocabulary from an ordered list of unique tokens, appending `$UNK` if missing
    pub fn new<I, T>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut list: Vec<String> = tokens.into_iter().map(Into::into).collect();

        if !list.iter().any(|t| t == UNK_TOKEN) {
            list.push(UNK_TOKEN.to_string());
        }

        let mut index = HashMap::with_capacity(list.len());
        for (i, token) in list.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(Error::invalid(format!(
                    "duplicate vocabulary token: {token}"
                )));
            }
        }

        let unk_index = index[UNK_TOKEN];
        let pad_index = index.get(PAD_TOKEN).copied();

        Ok(Self {
            tokens: list,
            index,
            unk_index,
            pad_index,
        })
    }

    /// Return a copy of this vocabulary with a dedicated `$PAD` entry appended
    pub fn with_padding(self) -> Self {
        if self.pad_index.is_some() {
            return self;
        }

        let mut tokens = self.tokens;
        let pad_index = tokens.len();
        tokens.push(PAD_TOKEN.to_string());

        let mut index = self.index;
        index.insert(PAD_TOKEN.to_string(), pad_index);

        Self {
            tokens,
            index,
            unk_index: self.unk_index,
            pad_index: Some(pad_index),
        }
    }

    /// The index for a token, resolving misses to the unknown index
    pub fn index_of(&self, token: &str) -> usize {
        self.get(token).unwrap_or(self.unk_index)
    }

    /// The index for a token, if the token is part of the vocabulary
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Whether the token has its own entry
    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// The token stored at an index
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// The index of `$UNK`
    pub fn unk_index(&self) -> usize {
        self.unk_index
    }

    /// The index used for padded positions
    pub fn pad_index(&self) -> usize {
        self.pad_index.unwrap_or(self.unk_index)
    }

    /// Whether the given token is one of the reserved entries
    pub fn is_reserved(token: &str) -> bool {
        token == UNK_TOKEN || token == PAD_TOKEN
    }

    /// All tokens, ordered by index
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The number of entries, reserved ones included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Vocabularies always hold `$UNK`, so this is only true for a hand-built edge case
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = Error;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        Self::new(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

/// Build a vocabulary from tokenized training sequences
///
/// Tokens seen fewer than `min_count` times are dropped, the rest are ordered by descending
/// frequency (ties broken alphabetically) and truncated to `max_size`. `$UNK` takes index 0.
pub fn build_vocabulary<I, S, T>(
    sequences: I,
    min_count: Option<usize>,
    max_size: Option<usize>,
) -> Vocabulary
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let min_count = min_count.unwrap_or(1);

    let mut counts: HashMap<String, usize> = HashMap::new();
    for sequence in sequences {
        for token in sequence {
            let token = token.as_ref();

            if Vocabulary::is_reserved(token) {
                continue;
            }

            *counts.entry(token.to_string()).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect();

    ranked.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));

    if let Some(max_size) = max_size {
        ranked.truncate(max_size);
    }

    let mut tokens = Vec::with_capacity(ranked.len() + 1);
    tokens.push(UNK_TOKEN.to_string());
    tokens.extend(ranked.into_iter().map(|(token, _)| token));

    let mut index = HashMap::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        index.insert(token.clone(), i);
    }

    Vocabulary {
        tokens,
        index,
        unk_index: 0,
        pad_index: None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn corpus() -> Vec<Vec<&'static str>> {
        vec![
            vec!["a", "good", "movie"],
            vec!["a", "bad", "movie"],
            vec!["good", "good", "fun"],
        ]
    }

    #[test]
    fn test_build_orders_by_frequency_then_token() {
        let vocab = build_vocabulary(corpus(), None, None);

        assert_eq!(
            vocab.tokens(),
            &["$UNK", "good", "a", "movie", "bad", "fun"]
        );
        assert_eq!(vocab.unk_index(), 0);
        assert_eq!(vocab.pad_index(), 0);
    }

    #[test]
    fn test_build_respects_min_count_and_max_size() {
        let vocab = build_vocabulary(corpus(), Some(2), None);
        assert_eq!(vocab.tokens(), &["$UNK", "good", "a", "movie"]);

        let vocab = build_vocabulary(corpus(), Some(2), Some(1));
        assert_eq!(vocab.tokens(), &["$UNK", "good"]);
    }

    #[test]
    fn test_misses_resolve_to_unknown() {
        let vocab = Vocabulary::new(["$UNK", "good", "bad"]).unwrap();

        assert_eq!(vocab.index_of("good"), 1);
        assert_eq!(vocab.index_of("bad"), 2);
        assert_eq!(vocab.index_of("great"), 0);
        assert_eq!(vocab.get("great"), None);
    }

    #[test]
    fn test_new_appends_unknown_and_rejects_duplicates() {
        let vocab = Vocabulary::new(["good", "bad"]).unwrap();
        assert_eq!(vocab.unk_index(), 2);

        let err = Vocabulary::new(["good", "good"]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_with_padding_keeps_existing_indexes() {
        let vocab = build_vocabulary(corpus(), None, None).with_padding();

        assert_eq!(vocab.index_of("good"), 1);
        assert_eq!(vocab.pad_index(), vocab.len() - 1);
        assert_eq!(vocab.token(vocab.pad_index()), Some(PAD_TOKEN));
    }

    #[test]
    fn test_json_round_trip_preserves_indexes() {
        let vocab = build_vocabulary(corpus(), None, None).with_padding();

        let json = serde_json::to_string(&vocab).unwrap();
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, vocab);
        assert_eq!(restored.pad_index(), vocab.pad_index());
    }
}
