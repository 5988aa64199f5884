use burn::{
    module::Module,
    nn::loss::CrossEntropyLossConfig,
    tensor::{activation::softmax, backend::Backend, Tensor},
    train::ClassificationOutput,
};

use super::batcher::{Infer, Train};

/// A trait for models that can be used for Text Classification
///
/// Every model kind only has to provide `logits`; the loss and probabilities are shared.
pub trait Classifier<B: Backend>: Module<B> {
    /// Unnormalised class scores: [batch_size, n_classes]
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2>;

    /// Defines forward pass for training
    fn forward(&self, batch: Train<B>) -> ClassificationOutput<B> {
        let output = self.logits(batch.input);
        let targets = batch.targets;

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference
    fn infer(&self, input: Infer<B>) -> Tensor<B, 2> {
        softmax(self.logits(input), 1)
    }
}
