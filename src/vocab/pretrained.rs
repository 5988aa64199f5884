use std::collections::HashMap;

use rand::Rng;

use crate::{
    error::{Error, Result},
    utils::files::read_file,
};

use super::Vocabulary;

/// A pretrained word-vector lookup, such as GloVe
pub type Lookup = HashMap<String, Vec<f32>>;

/// An embedding matrix aligned with a vocabulary, one row per index
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingMatrix {
    /// Row-major values, `rows * dim` long
    pub values: Vec<f32>,

    /// Number of rows
    pub rows: usize,

    /// Embedding dimension
    pub dim: usize,
}

impl EmbeddingMatrix {
    /// The vector stored for a vocabulary index
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }
}

/// Load a GloVe-style text file: each line holds a token followed by its components
pub async fn load_glove(path: &str) -> Result<Lookup> {
    let lines = read_file(path).await?;

    parse_glove(lines)
}

/// Parse GloVe-style lines into a lookup, checking that every vector has the same dimension
pub fn parse_glove<I, L>(lines: I) -> Result<Lookup>
where
    I: IntoIterator<Item = L>,
    L: AsRef<str>,
{
    let mut lookup = Lookup::new();
    let mut dim = None;

    for (number, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(' ');
        let token = fields.next().unwrap_or_default();

        let vector = fields
            .map(str::parse::<f32>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::invalid(format!("line {}: {}", number + 1, e)))?;

        if vector.is_empty() {
            return Err(Error::invalid(format!(
                "line {}: no vector components for {token}",
                number + 1
            )));
        }

        match dim {
            None => dim = Some(vector.len()),
            Some(d) if d != vector.len() => {
                return Err(Error::invalid(format!(
                    "line {}: expected {d} components, found {}",
                    number + 1,
                    vector.len()
                )));
            }
            _ => {}
        }

        lookup.insert(token.to_string(), vector);
    }

    log::debug!("Parsed {} pretrained vectors", lookup.len());

    Ok(lookup)
}

/// Restrict a pretrained lookup to a vocabulary
///
/// The returned vocabulary keeps, in their original order, the reserved tokens plus every token
/// the lookup covers. Reserved tokens missing from the lookup get vectors drawn uniformly from
/// `[-0.5, 0.5)`.
pub fn align_embedding<R: Rng>(
    lookup: &Lookup,
    vocab: &Vocabulary,
    rng: &mut R,
) -> Result<(EmbeddingMatrix, Vocabulary)> {
    let dim = lookup_dim(lookup)?;

    let mut tokens = Vec::new();
    let mut values: Vec<f32> = Vec::new();

    for token in vocab.tokens() {
        match lookup.get(token) {
            Some(vector) => values.extend_from_slice(vector),
            None if Vocabulary::is_reserved(token) => {
                values.extend((0..dim).map(|_| rng.gen_range(-0.5..0.5)));
            }
            None => continue,
        }

        tokens.push(token.clone());
    }

    let restricted = Vocabulary::new(tokens)?;

    log::info!(
        "Aligned {} of {} vocabulary entries with pretrained vectors of dimension {dim}",
        restricted.len(),
        vocab.len()
    );

    let matrix = EmbeddingMatrix {
        rows: restricted.len(),
        dim,
        values,
    };

    Ok((matrix, restricted))
}

fn lookup_dim(lookup: &Lookup) -> Result<usize> {
    let mut dims = lookup.values().map(Vec::len);

    let dim = dims
        .next()
        .ok_or_else(|| Error::invalid("the pretrained lookup is empty"))?;

    if dim == 0 || dims.any(|d| d != dim) {
        return Err(Error::invalid(
            "pretrained vectors must share one non-zero dimension",
        ));
    }

    Ok(dim)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn lookup() -> Lookup {
        parse_glove(["good 1 2 3", "", "bad -1 -2 -3", "movie 0.5 0.5 0.5"]).unwrap()
    }

    #[test]
    fn test_parse_glove() {
        let lookup = lookup();

        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup["bad"], vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_parse_glove_rejects_ragged_vectors() {
        let err = parse_glove(["good 1 2 3", "bad 1 2"]).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        assert!(parse_glove(["good 1 x 3"]).is_err());
    }

    #[test]
    fn test_align_restricts_and_seeds_reserved_rows() {
        let vocab = Vocabulary::new(["$UNK", "good", "great", "bad"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let (matrix, restricted) = align_embedding(&lookup(), &vocab, &mut rng).unwrap();

        assert_eq!(restricted.tokens(), &["$UNK", "good", "bad"]);
        assert_eq!(matrix.rows, 3);
        assert_eq!(matrix.dim, 3);
        assert_eq!(matrix.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(2), &[-1.0, -2.0, -3.0]);
        assert!(matrix.row(0).iter().all(|v| (-0.5..0.5).contains(v)));
    }

    #[test]
    fn test_align_is_reproducible_with_a_seed() {
        let vocab = Vocabulary::new(["$UNK", "good"]).unwrap().with_padding();

        let (first, _) = align_embedding(&lookup(), &vocab, &mut StdRng::seed_from_u64(1)).unwrap();
        let (second, _) =
            align_embedding(&lookup(), &vocab, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.rows, 3);
    }

    #[test]
    fn test_align_rejects_empty_lookup() {
        let vocab = Vocabulary::new(["$UNK"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(align_embedding(&Lookup::new(), &vocab, &mut rng).is_err());
    }
}
