use burn::tensor::backend::Backend;
use rand::Rng;

use crate::{
    error::Result,
    models::layers,
    vocab::EmbeddingMatrix,
};

use super::Model;

/// The Model Configuration
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Number of vocabulary entries
    pub vocab_size: usize,

    /// Number of classes
    pub n_classes: usize,

    /// Embedding dimension
    #[config(default = 50)]
    pub embed_dim: usize,

    /// Keep the embedding table fixed during training
    #[config(default = false)]
    pub freeze_embedding: bool,
}

impl Config {
    /// Initializes a model with seeded random weights, or with a pretrained embedding table
    pub fn init<B: Backend, R: Rng>(
        &self,
        device: &B::Device,
        pretrained: Option<&EmbeddingMatrix>,
        rng: &mut R,
    ) -> Result<Model<B>> {
        let embedding = layers::embedding(
            self.vocab_size,
            self.embed_dim,
            pretrained,
            self.freeze_embedding,
            rng,
            device,
        )?;

        let output = layers::random_linear(self.embed_dim, self.n_classes, rng, device);

        Ok(Model { embedding, output })
    }
}
