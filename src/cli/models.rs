use std::fmt::Display;

use crate::models::{ModelError, ModelKind};

/// Available Models, as named on the command line
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Model {
    /// Averaged embeddings learned from scratch
    Averaging,

    /// LSTM over embeddings learned from scratch
    Recurrent,

    /// Averaged GloVe vectors, kept frozen, feeding a linear classifier
    Glove,
}

impl Model {
    /// The model family that gets trained
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Averaging | Model::Glove => ModelKind::Averaging,
            Model::Recurrent => ModelKind::Recurrent,
        }
    }

    /// Whether the model needs a pretrained vector file
    pub fn needs_pretrained(&self) -> bool {
        matches!(self, Model::Glove)
    }
}

impl TryFrom<&str> for Model {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "averaging" => Ok(Model::Averaging),
            "recurrent" | "rnn" => Ok(Model::Recurrent),
            "glove" => Ok(Model::Glove),
            _ => Err(ModelError::Unknown(value.to_string())),
        }
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Model::Averaging => "averaging",
            Model::Recurrent => "recurrent",
            Model::Glove => "glove",
        };

        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glove_trains_the_averaging_family() {
        let model = Model::try_from("GloVe").unwrap();

        assert_eq!(model.kind(), ModelKind::Averaging);
        assert!(model.needs_pretrained());
        assert_eq!(Model::try_from("rnn").unwrap().kind(), ModelKind::Recurrent);
        assert!(matches!(
            Model::try_from("bert"),
            Err(ModelError::Unknown(name)) if name == "bert"
        ));
    }
}
