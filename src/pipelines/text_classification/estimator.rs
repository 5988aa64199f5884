use std::{fs::File, io::BufWriter, path::Path, sync::Arc};

use burn::{
    config::Config as _,
    module::{AutodiffModule, Module},
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::{Error, Result},
    models::{averaging, recurrent, ModelKind},
    search::{Estimator, ParamSet},
    vocab::{align_embedding, build_vocabulary, EmbeddingMatrix, LabelSet, Lookup, Vocabulary},
};

use super::{
    inference::{predict_ids, predict_proba},
    training::{train, Summary},
    unzip_examples, Batcher, Config, Example,
};

/// A trained model of either family, on a backend without autodiff
#[derive(Debug)]
pub enum TrainedModel<B: Backend> {
    /// Masked average of embeddings
    Averaging(averaging::Model<B>),

    /// LSTM over embeddings
    Recurrent(recurrent::Model<B>),
}

impl<B: Backend> TrainedModel<B> {
    fn predict_proba(
        &self,
        batcher: &Batcher<B>,
        sequences: &[Vec<String>],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>> {
        match self {
            TrainedModel::Averaging(model) => predict_proba(model, batcher, sequences, batch_size),
            TrainedModel::Recurrent(model) => predict_proba(model, batcher, sequences, batch_size),
        }
    }

    fn predict_ids(
        &self,
        batcher: &Batcher<B>,
        sequences: &[Vec<String>],
        batch_size: usize,
    ) -> Result<Vec<usize>> {
        match self {
            TrainedModel::Averaging(model) => predict_ids(model, batcher, sequences, batch_size),
            TrainedModel::Recurrent(model) => predict_ids(model, batcher, sequences, batch_size),
        }
    }
}

/// Everything a fitted classifier needs for prediction
#[derive(Debug)]
struct Fitted<B: Backend> {
    /// The training config, with the embedding dimension actually used
    config: Config,
    vocab: Arc<Vocabulary>,
    labels: Arc<LabelSet>,
    model: TrainedModel<B>,
}

/// A sentiment classifier trained with burn, usable as a grid-search estimator
pub struct SentimentClassifier<B: AutodiffBackend> {
    /// Training configuration
    pub config: Config,

    device: B::Device,

    /// Pretrained vectors; when present they fix the embedding dimension
    pretrained: Option<Arc<Lookup>>,

    fitted: Option<Fitted<B::InnerBackend>>,

    summary: Option<Summary>,
}

impl<B: AutodiffBackend> SentimentClassifier<B> {
    /// An unfitted classifier
    pub fn new(config: Config, device: B::Device) -> Self {
        Self {
            config,
            device,
            pretrained: None,
            fitted: None,
            summary: None,
        }
    }

    /// Initialise the embedding table from pretrained vectors
    pub fn with_pretrained(mut self, lookup: Arc<Lookup>) -> Self {
        self.pretrained = Some(lookup);
        self
    }

    /// A factory for grid search: each call applies a parameter combination to `base`
    pub fn factory(
        base: Config,
        device: B::Device,
        pretrained: Option<Arc<Lookup>>,
    ) -> impl Fn(&ParamSet) -> Result<Self> {
        move |params: &ParamSet| {
            let config = base.clone().with_params(params)?;

            Ok(Self {
                config,
                device: device.clone(),
                pretrained: pretrained.clone(),
                fitted: None,
                summary: None,
            })
        }
    }

    /// Whether `fit` has completed
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// What happened during the last `fit`
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// The class labels, in class id order
    pub fn labels(&self) -> Result<&LabelSet> {
        Ok(&self.fitted()?.labels)
    }

    /// The vocabulary the model was trained with
    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        Ok(&self.fitted()?.vocab)
    }

    /// Class probabilities for each sequence, columns in class id order
    pub fn predict_proba(&self, sequences: &[Vec<String>]) -> Result<Vec<Vec<f32>>> {
        let fitted = self.fitted()?;

        fitted
            .model
            .predict_proba(&self.batcher(fitted), sequences, fitted.config.batch_size)
    }

    /// Save the config, vocabulary, labels and model weights under `artifact_dir`
    pub fn save(&self, artifact_dir: &str) -> Result<()> {
        let fitted = self.fitted()?;

        std::fs::create_dir_all(artifact_dir)?;

        fitted
            .config
            .save(format!("{artifact_dir}/config.json"))?;

        write_json(format!("{artifact_dir}/vocab.json"), &*fitted.vocab)?;
        write_json(format!("{artifact_dir}/labels.json"), &*fitted.labels)?;

        let path = format!("{artifact_dir}/model");
        let recorder = CompactRecorder::new();

        let saved = match &fitted.model {
            TrainedModel::Averaging(model) => {
                recorder.record(model.clone().into_record(), path.into())
            }
            TrainedModel::Recurrent(model) => {
                recorder.record(model.clone().into_record(), path.into())
            }
        };
        saved.map_err(|e| Error::Record(e.to_string()))?;

        log::info!("Saved the {} classifier to {artifact_dir}", fitted.config.model);

        Ok(())
    }

    /// Restore a classifier saved with [`SentimentClassifier::save`]
    pub fn load(artifact_dir: &str, device: B::Device) -> Result<Self> {
        let config = Config::load(format!("{artifact_dir}/config.json"))
            .map_err(|e| Error::Record(format!("unable to load config file: {e}")))?;

        let vocab: Arc<Vocabulary> = Arc::new(read_json(format!("{artifact_dir}/vocab.json"))?);
        let labels: Arc<LabelSet> = Arc::new(read_json(format!("{artifact_dir}/labels.json"))?);

        // Initial weights are replaced by the record
        let mut rng = StdRng::seed_from_u64(config.seed);
        let path = format!("{artifact_dir}/model");
        let recorder = CompactRecorder::new();

        let model = match config.model {
            ModelKind::Averaging => {
                let record = recorder
                    .load(path.into(), &device)
                    .map_err(|e| Error::Record(format!("unable to load model weights: {e}")))?;

                TrainedModel::Averaging(
                    averaging_config(&config, &vocab, &labels)
                        .init::<B::InnerBackend, _>(&device, None, &mut rng)?
                        .load_record(record),
                )
            }
            ModelKind::Recurrent => {
                let record = recorder
                    .load(path.into(), &device)
                    .map_err(|e| Error::Record(format!("unable to load model weights: {e}")))?;

                TrainedModel::Recurrent(
                    recurrent_config(&config, &vocab, &labels)
                        .init::<B::InnerBackend, _>(&device, None, &mut rng)?
                        .load_record(record),
                )
            }
        };

        log::info!("Loaded the {} classifier from {artifact_dir}", config.model);

        Ok(Self {
            config: config.clone(),
            device,
            pretrained: None,
            fitted: Some(Fitted {
                config,
                vocab,
                labels,
                model,
            }),
            summary: None,
        })
    }

    fn fitted(&self) -> Result<&Fitted<B::InnerBackend>> {
        self.fitted.as_ref().ok_or(Error::NotFitted)
    }

    fn batcher(&self, fitted: &Fitted<B::InnerBackend>) -> Batcher<B::InnerBackend> {
        Batcher::new(
            fitted.vocab.clone(),
            fitted.labels.clone(),
            self.device.clone(),
        )
    }

    /// The vocabulary and, with pretrained vectors, the aligned embedding matrix
    fn prepare_vocabulary(
        &self,
        sequences: &[Vec<String>],
        rng: &mut StdRng,
    ) -> Result<(Vocabulary, Option<EmbeddingMatrix>)> {
        let vocab = build_vocabulary(
            sequences,
            Some(self.config.min_count),
            self.config.max_vocab_size,
        )
        .with_padding();

        match &self.pretrained {
            Some(lookup) => {
                let (matrix, restricted) = align_embedding(lookup, &vocab, rng)?;

                log::info!(
                    "Pretrained vectors cover {} of {} vocabulary entries",
                    restricted.len(),
                    vocab.len()
                );

                Ok((restricted, Some(matrix)))
            }
            None => Ok((vocab, None)),
        }
    }
}

impl<B: AutodiffBackend> Estimator for SentimentClassifier<B> {
    fn fit(&mut self, examples: &[Example]) -> Result<()> {
        self.config.validate()?;

        if examples.is_empty() {
            return Err(Error::invalid("cannot fit on an empty dataset"));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let (sequences, gold) = unzip_examples(examples);
        let labels = Arc::new(LabelSet::from_labels(&gold));
        let (vocab, matrix) = self.prepare_vocabulary(&sequences, &mut rng)?;
        let vocab = Arc::new(vocab);

        let mut config = self.config.clone();
        if let Some(matrix) = &matrix {
            config.embed_dim = matrix.dim;
        }

        log::info!(
            "Fitting a {} classifier: {} examples, {} classes, {} vocabulary entries",
            config.model,
            examples.len(),
            labels.len(),
            vocab.len()
        );

        let batcher_train = Batcher::<B>::new(vocab.clone(), labels.clone(), self.device.clone());
        let batcher_valid =
            Batcher::<B::InnerBackend>::new(vocab.clone(), labels.clone(), self.device.clone());

        let (model, summary) = match config.model {
            ModelKind::Averaging => {
                let model = averaging_config(&config, &vocab, &labels).init::<B, _>(
                    &self.device,
                    matrix.as_ref(),
                    &mut rng,
                )?;

                let (model, summary) = train(
                    model,
                    examples,
                    &batcher_train,
                    &batcher_valid,
                    &config,
                    &mut rng,
                )?;

                (TrainedModel::Averaging(model.valid()), summary)
            }
            ModelKind::Recurrent => {
                let model = recurrent_config(&config, &vocab, &labels).init::<B, _>(
                    &self.device,
                    matrix.as_ref(),
                    &mut rng,
                )?;

                let (model, summary) = train(
                    model,
                    examples,
                    &batcher_train,
                    &batcher_valid,
                    &config,
                    &mut rng,
                )?;

                (TrainedModel::Recurrent(model.valid()), summary)
            }
        };

        self.fitted = Some(Fitted {
            config,
            vocab,
            labels,
            model,
        });
        self.summary = Some(summary);

        Ok(())
    }

    fn predict(&self, sequences: &[Vec<String>]) -> Result<Vec<String>> {
        let fitted = self.fitted()?;

        let ids =
            fitted
                .model
                .predict_ids(&self.batcher(fitted), sequences, fitted.config.batch_size)?;

        ids.into_iter()
            .map(|id| {
                fitted
                    .labels
                    .name(id)
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid(format!("no label for class id {id}")))
            })
            .collect()
    }
}

fn averaging_config(config: &Config, vocab: &Vocabulary, labels: &LabelSet) -> averaging::Config {
    averaging::Config::new(vocab.len(), labels.len())
        .with_embed_dim(config.embed_dim)
        .with_freeze_embedding(config.freeze_embedding)
}

fn recurrent_config(config: &Config, vocab: &Vocabulary, labels: &LabelSet) -> recurrent::Config {
    recurrent::Config::new(vocab.len(), labels.len())
        .with_embed_dim(config.embed_dim)
        .with_hidden_dim(config.hidden_dim)
        .with_freeze_embedding(config.freeze_embedding)
}

fn write_json<T: serde::Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;

    Ok(serde_json::from_reader(file)?)
}
