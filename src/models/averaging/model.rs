use burn::{
    module::Module,
    nn::{Embedding, Linear},
    tensor::{
        backend::{AutodiffBackend, Backend},
        Tensor,
    },
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};
use derive_new::new;

use crate::{
    pipelines::text_classification::{
        batcher::{Infer, Train},
        Classifier,
    },
    utils::tensors::length_mask,
};

/// Averages the embeddings of the real tokens of each sequence and classifies the average
#[derive(Module, Debug, new)]
pub struct Model<B: Backend> {
    /// Token embeddings
    pub embedding: Embedding<B>,

    /// Linear layer from the averaged embedding to class scores
    pub output: Linear<B>,
}

impl<B: Backend> Model<B> {
    /// The mean embedding of each sequence's real tokens: [batch_size, embed_dim]
    ///
    /// Padded positions are embedded along with everything else and then zeroed by a mask built
    /// from the recorded lengths, so the divisor is the true length rather than the width.
    pub fn average(&self, input: Infer<B>) -> Tensor<B, 2> {
        let [batch_size, width] = input.tokens.dims();

        let embedded = self.embedding.forward(input.tokens);
        let [_, _, embed_dim] = embedded.dims();

        let mask = length_mask(input.lengths.clone(), width)
            .reshape([batch_size, width, 1])
            .repeat(2, embed_dim);

        let summed = (embedded * mask)
            .sum_dim(1)
            .reshape([batch_size, embed_dim]);

        let lengths = input
            .lengths
            .float()
            .reshape([batch_size, 1])
            .repeat(1, embed_dim);

        summed / lengths
    }
}

impl<B: Backend> Classifier<B> for Model<B> {
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        self.output.forward(self.average(input))
    }
}

impl<B: AutodiffBackend> TrainStep<Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: Train<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward(batch);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<Train<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: Train<B>) -> ClassificationOutput<B> {
        self.forward(batch)
    }
}
