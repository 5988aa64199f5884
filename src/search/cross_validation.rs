use derive_new::new;

use crate::{
    error::{Error, Result},
    pipelines::text_classification::{unzip_examples, Example},
    utils::metrics::macro_f1,
};

use super::{
    folds::{complement, stratified_folds},
    Estimator, ParamGrid, ParamSet,
};

/// The score recorded for a fold whose estimator could not be built, fitted or evaluated
pub const WORST_SCORE: f64 = f64::NEG_INFINITY;

/// Cross-validated scores for one parameter combination
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateResult {
    /// The parameter combination
    pub params: ParamSet,

    /// Macro F1 on each held-out fold, in fold order
    pub fold_scores: Vec<f64>,

    /// Mean of the fold scores
    pub mean_score: f64,
}

/// The outcome of a grid search
#[derive(Debug)]
pub struct SearchResult<E> {
    /// The winning combination
    pub best_params: ParamSet,

    /// Its mean cross-validated score
    pub best_score: f64,

    /// Every candidate, in enumeration order
    pub candidates: Vec<CandidateResult>,

    /// An estimator refit on the full training set with the winning combination
    pub estimator: E,
}

/// Exhaustive search over a parameter grid with stratified k-fold cross validation
#[derive(Clone, Debug, new)]
pub struct GridSearch {
    /// Number of folds
    pub folds: usize,

    /// Shuffle seed for fold assignment; folds follow the input order when absent
    pub seed: Option<u64>,
}

impl GridSearch {
    /// Score every combination of `grid`, pick the best mean and refit it on all `examples`
    ///
    /// A fold that fails is scored [`WORST_SCORE`] and the search moves on. Ties go to the
    /// combination enumerated first.
    pub fn search<E, F>(
        &self,
        examples: &[Example],
        factory: F,
        grid: &ParamGrid,
    ) -> Result<SearchResult<E>>
    where
        E: Estimator,
        F: Fn(&ParamSet) -> Result<E>,
    {
        grid.validate()?;

        let labels: Vec<&str> = examples.iter().map(|e| e.label.as_str()).collect();
        let folds = stratified_folds(&labels, self.folds, self.seed)?;

        let combinations = grid.combinations();

        log::info!(
            "Searching {} combinations with {}-fold cross validation ({} fits)",
            combinations.len(),
            self.folds,
            combinations.len() * self.folds
        );

        let mut candidates: Vec<CandidateResult> = Vec::with_capacity(combinations.len());
        let mut best: Option<usize> = None;

        for (index, params) in combinations.into_iter().enumerate() {
            let fold_scores: Vec<f64> = folds
                .iter()
                .enumerate()
                .map(|(fold_index, fold)| {
                    score_fold(examples, fold, &factory, &params).unwrap_or_else(|e| {
                        log::warn!("Fold {fold_index} failed for {params}: {e}");
                        WORST_SCORE
                    })
                })
                .collect();

            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;

            log::info!("{params}: mean macro F1 {mean_score:.4} over {fold_scores:?}");

            let improves = match best {
                None => true,
                Some(best) => mean_score > candidates[best].mean_score,
            };
            if improves {
                best = Some(index);
            }

            candidates.push(CandidateResult {
                params,
                fold_scores,
                mean_score,
            });
        }

        let best = best.ok_or_else(|| Error::invalid("the grid produced no combinations"))?;
        let CandidateResult {
            params: best_params,
            mean_score: best_score,
            ..
        } = candidates[best].clone();

        log::info!("Best combination {best_params} (mean macro F1 {best_score:.4}); refitting");

        let mut estimator = factory(&best_params)?;
        estimator.fit(examples)?;

        Ok(SearchResult {
            best_params,
            best_score,
            candidates,
            estimator,
        })
    }
}

/// Search with `k` folds taken in input order
pub fn search<E, F>(
    examples: &[Example],
    factory: F,
    grid: &ParamGrid,
    k: usize,
) -> Result<SearchResult<E>>
where
    E: Estimator,
    F: Fn(&ParamSet) -> Result<E>,
{
    GridSearch::new(k, None).search(examples, factory, grid)
}

fn score_fold<E, F>(
    examples: &[Example],
    fold: &[usize],
    factory: &F,
    params: &ParamSet,
) -> Result<f64>
where
    E: Estimator,
    F: Fn(&ParamSet) -> Result<E>,
{
    let train: Vec<Example> = complement(examples.len(), fold)
        .into_iter()
        .map(|i| examples[i].clone())
        .collect();

    let held_out: Vec<Example> = fold.iter().map(|i| examples[*i].clone()).collect();
    let (sequences, gold) = unzip_examples(&held_out);

    let mut estimator = factory(params)?;
    estimator.fit(&train)?;

    let predicted = estimator.predict(&sequences)?;

    Ok(macro_f1(&gold, &predicted))
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::BTreeMap, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::search::ParamValue;

    /// Predicts the majority label seen in training, or a fixed label when asked to
    struct Majority {
        constant: Option<String>,
        fail: bool,
        label: Option<String>,
    }

    impl Estimator for Majority {
        fn fit(&mut self, examples: &[Example]) -> Result<()> {
            if self.fail {
                return Err(Error::NumericalDivergence {
                    epoch: 1,
                    loss: f64::NAN,
                });
            }

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for example in examples {
                *counts.entry(example.label.as_str()).or_default() += 1;
            }

            self.label = counts
                .into_iter()
                .max_by_key(|(_, count)| *count)
                .map(|(label, _)| label.to_string());

            Ok(())
        }

        fn predict(&self, sequences: &[Vec<String>]) -> Result<Vec<String>> {
            let label = self
                .constant
                .clone()
                .or_else(|| self.label.clone())
                .ok_or(Error::NotFitted)?;

            Ok(vec![label; sequences.len()])
        }
    }

    fn examples() -> Vec<Example> {
        ["pos", "neg", "pos", "pos", "neg", "pos", "neg", "pos", "pos"]
            .iter()
            .enumerate()
            .map(|(i, label)| Example::new(vec![format!("w{i}")], label.to_string()))
            .collect()
    }

    fn factory(fits: Rc<Cell<usize>>) -> impl Fn(&ParamSet) -> Result<Majority> {
        move |params: &ParamSet| {
            fits.set(fits.get() + 1);

            let constant = match params.get("constant") {
                Some(value) => Some(value.as_str()?.to_string()),
                None => None,
            };

            Ok(Majority {
                constant,
                fail: params.get("fail").map(ParamValue::as_bool).transpose()?.unwrap_or(false),
                label: None,
            })
        }
    }

    #[test]
    fn test_every_combination_is_fit_once_per_fold_before_the_refit() {
        let fits = Rc::new(Cell::new(0));
        let grid = ParamGrid::new()
            .with("embed_dim", [50, 100, 200])
            .with("eta", [0.001, 0.01]);

        let result = search(&examples(), factory(fits.clone()), &grid, 3).unwrap();

        assert_eq!(fits.get(), 6 * 3 + 1);
        assert_eq!(result.candidates.len(), 6);
        assert!(result.candidates.iter().all(|c| c.fold_scores.len() == 3));
    }

    #[test]
    fn test_best_mean_wins_and_ties_go_to_the_first() {
        let grid = ParamGrid::new().with("constant", ["neg", "pos", "pos"]);

        let result = search(&examples(), factory(Rc::new(Cell::new(0))), &grid, 3).unwrap();

        assert_eq!(result.best_params.get("constant"), Some(&ParamValue::from("pos")));
        assert_eq!(result.best_params, result.candidates[1].params);
        assert_eq!(result.best_score, result.candidates[1].mean_score);
        assert_eq!(result.candidates[1].mean_score, result.candidates[2].mean_score);
    }

    #[test]
    fn test_failing_folds_score_worst_without_stopping_the_search() {
        let grid = ParamGrid::new().with("fail", [true, false]);

        let result = search(&examples(), factory(Rc::new(Cell::new(0))), &grid, 3).unwrap();

        assert!(result.candidates[0]
            .fold_scores
            .iter()
            .all(|score| *score == WORST_SCORE));
        assert_eq!(result.best_params.get("fail"), Some(&ParamValue::Bool(false)));
        assert!(result.best_score.is_finite());
    }

    #[test]
    fn test_winning_mean_is_bounded_by_its_fold_scores() {
        let grid = ParamGrid::new().with("embedding_dim", [50, 100]);

        let result = search(&examples(), factory(Rc::new(Cell::new(0))), &grid, 2).unwrap();

        let winner = result
            .candidates
            .iter()
            .find(|c| c.params == result.best_params)
            .unwrap();
        let min = winner.fold_scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = winner.fold_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        assert!(result.best_score >= min);
        assert!(result.best_score <= max);
    }

    #[test]
    fn test_seeded_searches_are_deterministic() {
        let grid = ParamGrid::new().with("constant", ["neg", "pos"]);
        let search = GridSearch::new(3, Some(17));

        let first = search
            .search(&examples(), factory(Rc::new(Cell::new(0))), &grid)
            .unwrap();
        let second = search
            .search(&examples(), factory(Rc::new(Cell::new(0))), &grid)
            .unwrap();

        assert_eq!(first.best_params, second.best_params);
        assert_eq!(first.candidates, second.candidates);
    }

    #[test]
    fn test_refit_uses_every_example() {
        let grid = ParamGrid::new();

        let result = search(&examples(), factory(Rc::new(Cell::new(0))), &grid, 3).unwrap();

        assert!(result.best_params.is_empty());
        assert_eq!(result.estimator.label.as_deref(), Some("pos"));
    }
}
