/// CLI Indexes: Datasets
pub mod datasets;

/// CLI Indexes: Models
pub mod models;
