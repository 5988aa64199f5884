use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Trainable vector averaging, optionally over frozen pretrained vectors
pub mod averaging;

/// LSTM sequence classification
pub mod recurrent;

/// Seeded construction of the layers the models share
pub mod layers;

/// The model families the text classification pipeline can train
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Length-normalised average of token embeddings followed by a linear layer
    Averaging,

    /// LSTM over the token embeddings, classifying from the last real hidden state
    Recurrent,
}

impl ModelKind {
    /// The unique string token that identifies this model kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Averaging => "averaging",
            ModelKind::Recurrent => "recurrent",
        }
    }
}

impl TryFrom<&str> for ModelKind {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "averaging" => Ok(ModelKind::Averaging),
            "recurrent" | "rnn" => Ok(ModelKind::Recurrent),
            _ => Err(ModelError::Unknown(value.to_string())),
        }
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// No model found for the given string
    #[error("no model found for {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!(ModelKind::try_from("RNN").unwrap(), ModelKind::Recurrent);
        assert_eq!(
            ModelKind::try_from(ModelKind::Averaging.as_str()).unwrap(),
            ModelKind::Averaging
        );
        assert!(ModelKind::try_from("bert").is_err());
    }
}
