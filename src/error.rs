/// Errors raised by the sentiment classifiers and their collaborators
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Empty sequences, unknown labels, mismatched counts, bad grids or vector files
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The training loss stopped being a finite number
    #[error("numerical divergence in epoch {epoch}: loss is {loss}")]
    NumericalDivergence {
        /// The epoch (1-based) in which the loss diverged
        epoch: usize,

        /// The offending loss value
        loss: f64,
    },

    /// A prediction was requested from a classifier that was never fitted
    #[error("the classifier has not been fitted")]
    NotFitted,

    /// Filesystem errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV decoding errors
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML decoding errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Unable to save or load a model record or config
    #[error("unable to persist the model: {0}")]
    Record(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`] with a formatted message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// A Result with the crate's Error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
