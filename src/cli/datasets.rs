use std::fmt::Display;

use crate::{
    datasets::sst::{self, LabelScheme, ReaderOptions},
    pipelines::text_classification::Example,
};

/// The Dataset enum
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Dataset {
    /// Stanford Sentiment Treebank
    Sst,
}

impl Dataset {
    /// Load a split as tokenized examples
    ///
    /// Phrase-level rows are only kept for the training split.
    pub fn examples(&self, data_dir: &str, mode: &str, binary: bool) -> std::io::Result<Vec<Example>> {
        match self {
            Dataset::Sst => {
                let scheme = if binary {
                    LabelScheme::Binary
                } else {
                    LabelScheme::Ternary
                };
                let options = ReaderOptions::new(mode == "train", false, scheme);

                Ok(sst::Dataset::load_with(data_dir, mode, &options)?.examples())
            }
        }
    }
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.to_lowercase() == sst::DATASET {
            Ok(Dataset::Sst)
        } else {
            Err(Self::Error::Unknown(value.to_string()))
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::Sst => sst::DATASET,
        };

        write!(f, "{}", name)
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),
}
