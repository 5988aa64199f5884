use std::fmt::Debug;

use derive_new::new;
use serde::{Deserialize, Serialize};

/// A trait for items that can be used for text classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the input text for the item
    fn input(&self) -> &str;

    /// Returns the class label for the item
    fn class_label(&self) -> &str;

    /// Returns the tokens of the input text
    fn tokens(&self) -> Vec<String> {
        tokenize(self.input())
    }
}

/// A tokenized text with its gold class label
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Example {
    /// The tokens of the text, in order
    pub tokens: Vec<String>,

    /// The class name label
    pub label: String,
}

impl Example {
    /// Tokenize a dataset item into an example
    pub fn from_item<I: Item>(item: &I) -> Self {
        Self::new(item.tokens(), item.class_label().to_string())
    }
}

/// Lower-cased whitespace tokenization
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Split examples into parallel token sequences and labels
pub fn unzip_examples(examples: &[Example]) -> (Vec<Vec<String>>, Vec<String>) {
    examples
        .iter()
        .map(|example| (example.tokens.clone(), example.label.clone()))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_on_whitespace() {
        assert_eq!(
            tokenize("  A  Good\tMovie \n"),
            vec!["a", "good", "movie"]
        );
        assert!(tokenize("   ").is_empty());
    }
}
