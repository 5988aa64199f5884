/// Token vocabularies and the vocabulary builder
pub mod vocabulary;

/// Closed label sets
pub mod labels;

/// Pretrained word vectors and their alignment with a vocabulary
pub mod pretrained;

pub use labels::LabelSet;
pub use pretrained::{align_embedding, load_glove, EmbeddingMatrix, Lookup};
pub use vocabulary::{build_vocabulary, Vocabulary, PAD_TOKEN, UNK_TOKEN};
