use burn::{
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
    train::{ClassificationOutput, TrainOutput, TrainStep},
    LearningRate,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::{
    error::{Error, Result},
    models::ModelKind,
    search::{
        folds::{complement, stratified_folds},
        ParamSet,
    },
    utils::metrics::macro_f1,
};

use super::{batcher::Train, inference::predict_ids, Batcher, Classifier, Example};

/// Define configuration struct for the experiment
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Which model family to train
    #[config(default = "ModelKind::Averaging")]
    pub model: ModelKind,

    /// Embedding dimension, ignored when pretrained vectors set it
    #[config(default = 50)]
    pub embed_dim: usize,

    /// LSTM hidden size for the recurrent model
    #[config(default = 50)]
    pub hidden_dim: usize,

    /// Batch size
    #[config(default = 1028)]
    pub batch_size: usize,

    /// Maximum number of passes over the training data
    #[config(default = 1000)]
    pub max_iter: usize,

    /// Initial learning rate
    #[config(default = 0.001)]
    pub eta: LearningRate,

    /// L2 penalty applied as Adam weight decay; 0 disables it
    #[config(default = 0.0)]
    pub l2_strength: f64,

    /// Hold out part of the training data and stop on its macro F1
    #[config(default = false)]
    pub early_stopping: bool,

    /// Fraction of the training data held out when early stopping
    #[config(default = 0.1)]
    pub validation_fraction: f64,

    /// Passes without improvement tolerated before stopping
    #[config(default = 10)]
    pub n_iter_no_change: usize,

    /// Minimum improvement that resets the no-improvement count
    #[config(default = 1e-5)]
    pub tol: f64,

    /// Keep the embedding table fixed
    #[config(default = false)]
    pub freeze_embedding: bool,

    /// Tokens seen fewer times than this are left out of the vocabulary
    #[config(default = 1)]
    pub min_count: usize,

    /// Maximum number of vocabulary entries besides the reserved ones
    #[config(default = "None")]
    pub max_vocab_size: Option<usize>,

    /// Seed for initialisation, shuffling and validation splits
    #[config(default = 42)]
    pub seed: u64,
}

impl Config {
    /// Apply a hyperparameter combination from a grid search
    pub fn with_params(mut self, params: &ParamSet) -> Result<Self> {
        for (name, value) in params.iter() {
            match name {
                "model" => {
                    self.model = ModelKind::try_from(value.as_str()?)
                        .map_err(|e| Error::invalid(e.to_string()))?;
                }
                "embed_dim" | "embedding_dim" => self.embed_dim = value.as_usize()?,
                "hidden_dim" => self.hidden_dim = value.as_usize()?,
                "batch_size" => self.batch_size = value.as_usize()?,
                "max_iter" => self.max_iter = value.as_usize()?,
                "eta" | "learning_rate" => self.eta = value.as_f64()?,
                "l2_strength" => self.l2_strength = value.as_f64()?,
                "early_stopping" => self.early_stopping = value.as_bool()?,
                "validation_fraction" => self.validation_fraction = value.as_f64()?,
                "n_iter_no_change" => self.n_iter_no_change = value.as_usize()?,
                "tol" => self.tol = value.as_f64()?,
                "freeze_embedding" => self.freeze_embedding = value.as_bool()?,
                "min_count" => self.min_count = value.as_usize()?,
                "max_vocab_size" => self.max_vocab_size = Some(value.as_usize()?),
                "seed" => self.seed = value.as_usize()? as u64,
                other => {
                    return Err(Error::invalid(format!("unknown hyperparameter: {other}")));
                }
            }
        }

        self.validate()?;

        Ok(self)
    }

    /// Check the values that would make training meaningless
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.max_iter == 0 {
            return Err(Error::invalid("batch_size and max_iter must be positive"));
        }

        if self.embed_dim == 0 || self.hidden_dim == 0 {
            return Err(Error::invalid("embed_dim and hidden_dim must be positive"));
        }

        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(Error::invalid(format!("invalid learning rate {}", self.eta)));
        }

        if self.early_stopping && !(0.0 < self.validation_fraction && self.validation_fraction < 1.0)
        {
            return Err(Error::invalid(format!(
                "validation_fraction must be in (0, 1), got {}",
                self.validation_fraction
            )));
        }

        Ok(())
    }

    fn optimizer(&self) -> AdamConfig {
        let weight_decay = if self.l2_strength > 0.0 {
            Some(WeightDecayConfig::new(self.l2_strength as _))
        } else {
            None
        };

        AdamConfig::new().with_weight_decay(weight_decay)
    }
}

/// What happened during a training run
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Number of completed passes over the training data
    pub epochs: usize,

    /// Summed batch loss of the last pass
    pub final_loss: f64,

    /// Best validation macro F1, when early stopping
    pub best_score: Option<f64>,

    /// The pass whose parameters were kept
    pub best_epoch: usize,
}

/// Counts passes without improvement, by validation score or by training loss
#[derive(Clone, Debug)]
struct Stopper {
    tol: f64,
    patience: usize,
    best_score: f64,
    best_error: f64,
    no_improvement: usize,
}

impl Stopper {
    fn new(tol: f64, patience: usize) -> Self {
        Self {
            tol,
            patience,
            best_score: f64::NEG_INFINITY,
            best_error: f64::INFINITY,
            no_improvement: 0,
        }
    }

    /// Record a validation score, returning whether it is the best so far
    fn update_score(&mut self, score: f64) -> bool {
        if score < self.best_score + self.tol {
            self.no_improvement += 1;
        } else {
            self.no_improvement = 0;
        }

        if score > self.best_score {
            self.best_score = score;
            true
        } else {
            false
        }
    }

    /// Record a training loss
    fn update_error(&mut self, error: f64) {
        if error > self.best_error - self.tol {
            self.no_improvement += 1;
        } else {
            self.no_improvement = 0;
        }

        if error < self.best_error {
            self.best_error = error;
        }
    }

    fn should_stop(&self) -> bool {
        self.no_improvement > self.patience
    }
}

/// Hold out one stratified fold of roughly `fraction` of the examples for validation
///
/// The fold count is `1 / fraction` rounded and clamped to `[2, n]`, so both sides are never
/// empty and every label with at least that many examples is represented in the held-out fold.
fn split_validation<'a>(
    examples: &'a [Example],
    fraction: f64,
    rng: &mut StdRng,
) -> Result<(Vec<&'a Example>, Vec<&'a Example>)> {
    let n = examples.len();
    if n < 2 {
        return Err(Error::invalid(
            "early stopping needs at least 2 training examples",
        ));
    }

    let k = ((1.0 / fraction).round() as usize).clamp(2, n);
    let labels: Vec<&str> = examples.iter().map(|e| e.label.as_str()).collect();
    let folds = stratified_folds(&labels, k, Some(rng.gen()))?;

    let fit: Vec<&Example> = complement(n, &folds[0])
        .into_iter()
        .map(|i| &examples[i])
        .collect();
    let valid: Vec<&Example> = folds[0].iter().map(|i| &examples[*i]).collect();

    log::debug!(
        "Validation split: {} training, {} validation",
        fit.len(),
        valid.len()
    );

    Ok((fit, valid))
}

/// Macro F1 of a model on labeled examples
pub fn evaluate<B, M>(
    model: &M,
    batcher: &Batcher<B>,
    examples: &[&Example],
    batch_size: usize,
) -> Result<f64>
where
    B: Backend,
    M: Classifier<B>,
{
    let sequences: Vec<&[String]> = examples.iter().map(|e| e.tokens.as_slice()).collect();
    let gold: Vec<&str> = examples.iter().map(|e| e.label.as_str()).collect();

    let predicted = predict_ids(model, batcher, &sequences, batch_size)?
        .into_iter()
        .map(|id| batcher.labels.name(id).unwrap_or_default().to_string())
        .collect::<Vec<_>>();

    Ok(macro_f1(&gold, &predicted))
}

/// Train a model with mini-batch Adam on a seeded shuffle of the examples
///
/// With early stopping the parameters of the best-scoring pass are returned, otherwise those
/// of the last pass. A non-finite loss aborts with [`Error::NumericalDivergence`].
pub fn train<B, M>(
    model: M,
    examples: &[Example],
    batcher_train: &Batcher<B>,
    batcher_valid: &Batcher<B::InnerBackend>,
    config: &Config,
    rng: &mut StdRng,
) -> Result<(M, Summary)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Classifier<B> + TrainStep<Train<B>, ClassificationOutput<B>>,
    M::InnerModule: Classifier<B::InnerBackend>,
{
    config.validate()?;

    if examples.is_empty() {
        return Err(Error::invalid("cannot train on an empty dataset"));
    }

    let (fit_set, valid_set) = if config.early_stopping {
        split_validation(examples, config.validation_fraction, rng)?
    } else {
        (examples.iter().collect(), Vec::new())
    };

    log::info!(
        "Training a {} model on {} examples for up to {} epochs",
        config.model,
        fit_set.len(),
        config.max_iter
    );

    let mut optim = config.optimizer().init::<B, M>();
    let mut stopper = Stopper::new(config.tol, config.n_iter_no_change);

    let mut model = model;
    let mut best_model: Option<M> = None;
    let mut order: Vec<usize> = (0..fit_set.len()).collect();

    let mut summary = Summary {
        epochs: 0,
        final_loss: f64::NAN,
        best_score: None,
        best_epoch: 0,
    };

    for epoch in 1..=config.max_iter {
        order.shuffle(rng);

        let mut epoch_loss = 0.0;

        for chunk in order.chunks(config.batch_size) {
            let items: Vec<&Example> = chunk.iter().map(|i| fit_set[*i]).collect();
            let batch = batcher_train.train(&items)?;

            let TrainOutput { grads, item } = TrainStep::step(&model, batch);

            let loss = item.loss.into_scalar().elem::<f64>();
            if !loss.is_finite() {
                return Err(Error::NumericalDivergence { epoch, loss });
            }

            epoch_loss += loss;
            model = optim.step(config.eta, model, grads);
        }

        summary.epochs = epoch;
        summary.final_loss = epoch_loss;

        if config.early_stopping {
            let score = evaluate(&model.valid(), batcher_valid, &valid_set, config.batch_size)?;

            if stopper.update_score(score) {
                best_model = Some(model.clone());
                summary.best_score = Some(score);
                summary.best_epoch = epoch;
            }

            log::debug!("Epoch {epoch}: loss {epoch_loss:.5}, validation macro F1 {score:.4}");
        } else {
            stopper.update_error(epoch_loss);
            summary.best_epoch = epoch;

            log::debug!("Epoch {epoch}: loss {epoch_loss:.5}");
        }

        if stopper.should_stop() {
            log::info!(
                "Stopping after epoch {epoch}: no improvement greater than {} for {} epochs",
                config.tol,
                stopper.no_improvement
            );
            break;
        }
    }

    if let Some(best) = best_model {
        model = best;
    }

    log::info!(
        "Finished after {} epochs (kept epoch {}, final loss {:.5})",
        summary.epochs,
        summary.best_epoch,
        summary.final_loss
    );

    Ok((model, summary))
}
