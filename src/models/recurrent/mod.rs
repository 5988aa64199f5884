/// Model definition
pub mod model;

/// Model configuration
pub mod config;

pub use config::Config;
pub use model::Model;
