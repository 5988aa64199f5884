use std::hash::Hash;

/// Invert a map by swapping keys and values, such as turning `id2label` into `label2id`
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Index of the largest value in each row, the first one winning ties
pub fn argmax_rows(rows: &[Vec<f32>]) -> Vec<usize> {
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, value)| {
                    if *value > best.1 {
                        (i, *value)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_invert_map() {
        let id2label = BTreeMap::from([(0, "negative".to_string()), (1, "positive".to_string())]);

        let label2id: BTreeMap<String, usize> = invert_map(id2label);

        assert_eq!(label2id["positive"], 1);
    }

    #[test]
    fn test_argmax_rows_prefers_first_on_ties() {
        let rows = vec![vec![0.1, 0.7, 0.2], vec![0.5, 0.5, 0.0]];

        assert_eq!(argmax_rows(&rows), vec![1, 0]);
    }
}
