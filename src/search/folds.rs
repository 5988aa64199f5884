use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Error, Result};

/// Partition example indexes into `k` stratified folds
///
/// Examples of each label are dealt round-robin across the folds, so every fold gets a share of
/// every label with at least `k` examples. With a seed the examples are shuffled before dealing;
/// either way each fold lists its indexes in ascending (original) order.
pub fn stratified_folds<L: AsRef<str>>(
    labels: &[L],
    k: usize,
    seed: Option<u64>,
) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(Error::invalid(format!(
            "cross validation needs at least 2 folds, got {k}"
        )));
    }

    if k > labels.len() {
        return Err(Error::invalid(format!(
            "cannot split {} examples into {k} folds",
            labels.len()
        )));
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    if let Some(seed) = seed {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for index in order {
        by_label
            .entry(labels[index].as_ref())
            .or_default()
            .push(index);
    }

    let mut folds = vec![Vec::new(); k];
    let mut next = 0;

    // Continue dealing where the previous label stopped so small classes don't all pile into
    // the first folds
    for members in by_label.values() {
        for index in members {
            folds[next].push(*index);
            next = (next + 1) % k;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }

    Ok(folds)
}

/// The indexes outside a held-out fold, in ascending order
pub fn complement(n: usize, fold: &[usize]) -> Vec<usize> {
    let mut held_out = vec![false; n];
    for index in fold {
        held_out[*index] = true;
    }

    (0..n).filter(|index| !held_out[*index]).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn labels() -> Vec<&'static str> {
        vec!["pos", "neg", "pos", "neg", "pos", "neu", "neg", "pos", "neg"]
    }

    #[test]
    fn test_folds_are_disjoint_ordered_and_complete() {
        let folds = stratified_folds(&labels(), 3, None).unwrap();

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..9).collect::<Vec<_>>());

        for fold in &folds {
            assert!(fold.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(fold.len(), 3);
        }
    }

    #[test]
    fn test_folds_are_stratified() {
        let folds = stratified_folds(&labels(), 2, None).unwrap();
        let labels = labels();

        for fold in &folds {
            let pos = fold.iter().filter(|i| labels[**i] == "pos").count();
            let neg = fold.iter().filter(|i| labels[**i] == "neg").count();
            assert_eq!(pos, 2);
            assert_eq!(neg, 2);
        }
    }

    #[test]
    fn test_seeded_folds_are_reproducible() {
        let first = stratified_folds(&labels(), 3, Some(9)).unwrap();
        let second = stratified_folds(&labels(), 3, Some(9)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(stratified_folds(&labels(), 1, None).is_err());
        assert!(stratified_folds(&labels(), 10, None).is_err());
    }

    #[test]
    fn test_complement() {
        assert_eq!(complement(5, &[1, 3]), vec![0, 2, 4]);
    }
}
