/// Common traits for text classification models
pub mod model;

/// Batcher
pub mod batcher;

/// Text Classification Items
pub mod item;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// The fit/predict classifier used by the binaries and the grid search
pub mod estimator;

pub use batcher::{encode, Batcher, EncodedSequences};
pub use estimator::{SentimentClassifier, TrainedModel};
pub use inference::infer;
pub use item::{tokenize, unzip_examples, Example, Item};
pub use model::Classifier;
pub use training::{train, Config, Summary};
