use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_sentiment::{
    pipelines::text_classification::{tokenize, unzip_examples, Config, Example, SentimentClassifier},
    search::{search, Estimator, GridSearch, ParamGrid},
};
use pretty_assertions::assert_eq;

type Backend = Autodiff<NdArray<f32>>;

fn examples() -> Vec<Example> {
    [
        ("a good and fun film", "positive"),
        ("great acting , good story", "positive"),
        ("fun , great , moving", "positive"),
        ("good fun", "positive"),
        ("a bad and dull film", "negative"),
        ("awful acting , bad story", "negative"),
        ("dull , awful , boring", "negative"),
        ("bad boring", "negative"),
    ]
    .iter()
    .map(|(text, label)| Example::new(tokenize(text), label.to_string()))
    .collect()
}

fn config() -> Config {
    Config::new()
        .with_max_iter(40)
        .with_batch_size(8)
        .with_eta(0.05)
        .with_embed_dim(10)
        .with_seed(7)
}

#[test]
fn fit_predict_returns_one_known_label_per_sequence() {
    let mut classifier = SentimentClassifier::<Backend>::new(config(), NdArrayDevice::Cpu);
    classifier.fit(&examples()).unwrap();

    let sequences = vec![tokenize("good story"), tokenize("an unseen phrase entirely")];
    let predicted = classifier.predict(&sequences).unwrap();

    assert_eq!(predicted.len(), 2);
    for label in predicted {
        assert!(label == "positive" || label == "negative");
    }
}

#[test]
fn seeded_fits_are_deterministic() {
    let (sequences, _) = unzip_examples(&examples());

    let mut first = SentimentClassifier::<Backend>::new(config(), NdArrayDevice::Cpu);
    first.fit(&examples()).unwrap();

    let mut second = SentimentClassifier::<Backend>::new(config(), NdArrayDevice::Cpu);
    second.fit(&examples()).unwrap();

    assert_eq!(
        first.predict_proba(&sequences).unwrap(),
        second.predict_proba(&sequences).unwrap()
    );
}

#[test]
fn grid_search_scores_every_combination_and_refits_the_winner() {
    let grid = ParamGrid::new().with("embedding_dim", [5, 10]);
    let factory = SentimentClassifier::<Backend>::factory(config(), NdArrayDevice::Cpu, None);

    let result = search(&examples(), factory, &grid, 2).unwrap();

    assert_eq!(result.candidates.len(), 2);
    for candidate in &result.candidates {
        assert_eq!(candidate.fold_scores.len(), 2);
        assert!(candidate
            .fold_scores
            .iter()
            .all(|score| (0.0..=1.0).contains(score)));
    }

    assert!(grid.combinations().contains(&result.best_params));
    assert!(result.estimator.is_fitted());

    let best = result
        .candidates
        .iter()
        .map(|c| c.mean_score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_score, best);
}

#[test]
fn recurrent_models_can_be_searched_with_early_stopping() {
    let grid = ParamGrid::new()
        .with("model", ["recurrent"])
        .with("hidden_dim", [4])
        .with("early_stopping", [true])
        .with("validation_fraction", [0.25]);
    let factory = SentimentClassifier::<Backend>::factory(config(), NdArrayDevice::Cpu, None);

    let result = GridSearch::new(2, Some(3))
        .search(&examples(), factory, &grid)
        .unwrap();

    let summary = result.estimator.summary().unwrap();
    assert!(summary.best_score.is_some());
    assert!(summary.best_epoch <= summary.epochs);
}

#[test]
fn unknown_hyperparameters_fail_every_fold_without_aborting() {
    let grid = ParamGrid::new().with("dropout", [0.5]);
    let factory = SentimentClassifier::<Backend>::factory(config(), NdArrayDevice::Cpu, None);

    // The refit of the only (failing) combination surfaces the error
    assert!(search(&examples(), factory, &grid, 2).is_err());
}
