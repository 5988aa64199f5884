use crate::{error::Result, pipelines::text_classification::Example};

/// Parameter grids and combinations
pub mod grid;

/// Stratified fold assignment
pub mod folds;

/// Grid search with k-fold cross validation
pub mod cross_validation;

pub use cross_validation::{search, CandidateResult, GridSearch, SearchResult, WORST_SCORE};
pub use grid::{ParamGrid, ParamSet, ParamValue};

/// A classifier that can be fit on labeled examples and asked for labels
pub trait Estimator {
    /// Train on the given examples, replacing any previous fit
    fn fit(&mut self, examples: &[Example]) -> Result<()>;

    /// Predict a class label for each token sequence
    fn predict(&self, sequences: &[Vec<String>]) -> Result<Vec<String>>;
}
