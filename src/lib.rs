//! # Burn Sentiment
//!
//! Sentiment classifiers over token sequences: length-masked averages of word embeddings and
//! LSTMs, trained with burn, plus cross-validated grid search over their hyperparameters.
#![forbid(unsafe_code)]

/// Errors
pub mod error;

/// Vocabularies, label sets and pretrained vectors
pub mod vocab;

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Hyperparameter search
pub mod search;

/// Datasets
pub mod datasets;

/// Utilities
pub mod utils;

/// CLI indexes and utilities
pub mod cli;

pub use error::{Error, Result};
