use burn::tensor::backend::{AutodiffBackend, Backend};

use crate::{
    error::Result,
    search::Estimator,
    utils::{classes::argmax_rows, tensors::to_rows},
};

use super::{tokenize, Batcher, Classifier, SentimentClassifier};

/// Class probabilities for each sequence, computed `batch_size` sequences at a time
pub fn predict_proba<B, M, S, T>(
    model: &M,
    batcher: &Batcher<B>,
    sequences: &[S],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>>
where
    B: Backend,
    M: Classifier<B>,
    S: AsRef<[T]>,
    T: AsRef<str>,
{
    let mut probabilities = Vec::with_capacity(sequences.len());

    for chunk in sequences.chunks(batch_size.max(1)) {
        let item = batcher.infer(chunk)?;

        probabilities.extend(to_rows(model.infer(item)));
    }

    Ok(probabilities)
}

/// The most probable class id for each sequence
pub fn predict_ids<B, M, S, T>(
    model: &M,
    batcher: &Batcher<B>,
    sequences: &[S],
    batch_size: usize,
) -> Result<Vec<usize>>
where
    B: Backend,
    M: Classifier<B>,
    S: AsRef<[T]>,
    T: AsRef<str>,
{
    let probabilities = predict_proba(model, batcher, sequences, batch_size)?;

    Ok(argmax_rows(&probabilities))
}

/// Define inference function
///
/// Loads a saved classifier from `artifact_dir` and labels each raw text sample.
pub fn infer<B: AutodiffBackend>(
    device: B::Device,
    artifact_dir: &str,
    samples: &[String],
) -> Result<Vec<String>> {
    log::info!("Loading the classifier from {artifact_dir}");

    let classifier = SentimentClassifier::<B>::load(artifact_dir, device)?;

    let sequences: Vec<Vec<String>> = samples.iter().map(|s| tokenize(s)).collect();

    log::info!("Running inference on {} samples", sequences.len());

    classifier.predict(&sequences)
}
