use std::{fmt::Debug, sync::Arc};

use burn::tensor::{backend::Backend, Int, Tensor};
use derive_new::new;

use crate::{
    error::{Error, Result},
    utils::tensors,
    vocab::{LabelSet, Vocabulary},
};

use super::Example;

/// Token sequences mapped through a vocabulary and right-padded to a common width
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSequences {
    /// One row of vocabulary indexes per sequence, each exactly `width` long
    pub indices: Vec<Vec<usize>>,

    /// The true (unpadded) length of each row
    pub lengths: Vec<usize>,

    /// The padded width shared by every row
    pub width: usize,
}

/// Encode token sequences as padded vocabulary indexes
///
/// The width is the longest sequence unless a fixed `width` is given, in which case longer
/// sequences are truncated and their recorded length clamped to it. Tokens outside the
/// vocabulary map to the unknown index. Empty sequences are rejected because their average is
/// undefined.
pub fn encode<S, T>(
    sequences: &[S],
    vocab: &Vocabulary,
    width: Option<usize>,
) -> Result<EncodedSequences>
where
    S: AsRef<[T]>,
    T: AsRef<str>,
{
    if let Some(position) = sequences.iter().position(|s| s.as_ref().is_empty()) {
        return Err(Error::invalid(format!(
            "sequence {position} is empty; every example needs at least one token"
        )));
    }

    if width == Some(0) {
        return Err(Error::invalid("the padded width must be at least 1"));
    }

    let width = width.unwrap_or_else(|| {
        sequences
            .iter()
            .map(|s| s.as_ref().len())
            .max()
            .unwrap_or(0)
    });

    let pad_index = vocab.pad_index();

    let mut indices = Vec::with_capacity(sequences.len());
    let mut lengths = Vec::with_capacity(sequences.len());

    for sequence in sequences {
        let mut row: Vec<usize> = sequence
            .as_ref()
            .iter()
            .take(width)
            .map(|token| vocab.index_of(token.as_ref()))
            .collect();

        lengths.push(row.len());
        row.resize(width, pad_index);
        indices.push(row);
    }

    Ok(EncodedSequences {
        indices,
        lengths,
        width,
    })
}

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Padded vocabulary indexes as 2D tensor: [batch_size, width]
    pub tokens: Tensor<B, 2, Int>,

    /// True length of each sequence: [batch_size]
    pub lengths: Tensor<B, 1, Int>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification examples
#[derive(Clone, Debug)]
pub struct Batcher<B: Backend> {
    /// Vocabulary for converting tokens to indexes
    pub vocab: Arc<Vocabulary>,

    /// Class labels for converting class names to class ids
    pub labels: Arc<LabelSet>,

    /// Optional fixed width; batches are padded to their longest sequence otherwise
    pub max_seq_length: Option<usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(vocab: Arc<Vocabulary>, labels: Arc<LabelSet>, device: B::Device) -> Self {
        Self {
            vocab,
            labels,
            max_seq_length: None,
            device,
        }
    }

    /// Pad every batch to a fixed width
    pub fn with_max_seq_length(mut self, max_seq_length: Option<usize>) -> Self {
        self.max_seq_length = max_seq_length;
        self
    }

    /// Collects token sequences into an inference batch
    pub fn infer<S, T>(&self, sequences: &[S]) -> Result<Infer<B>>
    where
        S: AsRef<[T]>,
        T: AsRef<str>,
    {
        let encoded = encode(sequences, &self.vocab, self.max_seq_length)?;

        Ok(Infer {
            tokens: tensors::index_matrix(&encoded.indices, encoded.width, &self.device),
            lengths: tensors::index_vector(&encoded.lengths, &self.device),
        })
    }

    /// Collects token sequences and their labels into a training batch
    pub fn train_batch<S, T, L>(&self, sequences: &[S], labels: &[L]) -> Result<Train<B>>
    where
        S: AsRef<[T]>,
        T: AsRef<str>,
        L: AsRef<str>,
    {
        if sequences.len() != labels.len() {
            return Err(Error::invalid(format!(
                "{} sequences but {} labels",
                sequences.len(),
                labels.len()
            )));
        }

        let class_ids = labels
            .iter()
            .map(|label| self.labels.id(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let input = self.infer(sequences)?;

        Ok(Train {
            input,
            targets: tensors::index_vector(&class_ids, &self.device),
        })
    }

    /// Collects examples into a training batch
    pub fn train(&self, examples: &[&Example]) -> Result<Train<B>> {
        let sequences: Vec<&[String]> = examples.iter().map(|e| e.tokens.as_slice()).collect();
        let labels: Vec<&str> = examples.iter().map(|e| e.label.as_str()).collect();

        self.train_batch(&sequences, &labels)
    }
}
