use burn::{
    module::Module,
    nn::{lstm::Lstm, Embedding, Linear},
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
    utils::tensors::last_position_mask,
};

/// Runs an LSTM over the embedded tokens and classifies each sequence from its last real state
#[derive(Module, Debug, new)]
pub struct Model<B: Backend> {
    /// Token embeddings
    pub embedding: Embedding<B>,

    /// The recurrent cell
    pub lstm: Lstm<B>,

    /// Linear layer from the final hidden state to class scores
    pub output: Linear<B>,
}

impl<B: Backend> Model<B> {
    /// The hidden state at each sequence's last real token: [batch_size, hidden_dim]
    pub fn final_states(&self, input: Infer<B>) -> Tensor<B, 2> {
        let [batch_size, width] = input.tokens.dims();

        let embedded = self.embedding.forward(input.tokens);
        let (_, hidden_states) = self.lstm.forward(embedded, None);
        let [_, _, hidden_dim] = hidden_states.dims();

        let mask = last_position_mask(input.lengths, width)
            .reshape([batch_size, width, 1])
            .repeat(2, hidden_dim);

        (hidden_states * mask)
            .sum_dim(1)
            .reshape([batch_size, hidden_dim])
    }
}

impl<B: Backend> Classifier<B> for Model<B> {
    fn logits(&self, input: Infer<B>) -> Tensor<B, 2> {
        self.output.forward(self.final_states(input))
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        tensor::Distribution,
    };
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        models::recurrent::Config,
        pipelines::text_classification::Batcher,
        utils::tensors::to_rows,
        vocab::{LabelSet, Vocabulary},
    };

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_seeded_models_match_despite_backend_randomness() {
        let device = NdArrayDevice::Cpu;
        let vocab = Arc::new(Vocabulary::new(["$UNK", "good", "bad"]).unwrap());
        let labels = Arc::new(LabelSet::new(["negative", "positive"]));

        let build = |backend_seed: u64| {
            let model = Config::new(vocab.len(), labels.len())
                .with_embed_dim(4)
                .with_hidden_dim(3)
                .init::<TestBackend, _>(&device, None, &mut StdRng::seed_from_u64(5))
                .unwrap();

            // Disturb the backend generator between construction and first use
            TestBackend::seed(backend_seed);
            let _ = Tensor::<TestBackend, 2>::random([4, 4], Distribution::Default, &device);

            model
        };

        let first = build(1);
        let second = build(2);

        let batcher = Batcher::<TestBackend>::new(vocab.clone(), labels.clone(), device);
        let input = || batcher.infer(&[vec!["good", "bad"]]).unwrap();

        assert_eq!(
            to_rows(first.logits(input())),
            to_rows(second.logits(input()))
        );
    }

    #[test]
    fn test_padding_does_not_change_the_final_state() {
        let device = NdArrayDevice::Cpu;
        let vocab = Vocabulary::new(["$UNK", "good", "bad"]).unwrap();
        let labels = LabelSet::new(["negative", "positive"]);

        let model = Config::new(vocab.len(), labels.len())
            .with_embed_dim(4)
            .with_hidden_dim(3)
            .init::<TestBackend, _>(&device, None, &mut StdRng::seed_from_u64(5))
            .unwrap();

        let batcher = Batcher::<TestBackend>::new(Arc::new(vocab), Arc::new(labels), device);

        let tight = to_rows(model.logits(batcher.infer(&[vec!["good", "bad"]]).unwrap()));
        let padded = to_rows(
            model.logits(
                batcher
                    .clone()
                    .with_max_seq_length(Some(6))
                    .infer(&[vec!["good", "bad"]])
                    .unwrap(),
            ),
        );

        assert_eq!(tight[0].len(), 2);
        assert!(tight[0]
            .iter()
            .zip(&padded[0])
            .all(|(a, b)| (a - b).abs() < 1e-5));
    }
}
