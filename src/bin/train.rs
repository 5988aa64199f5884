//! Command line tool to train a sentiment classifier

use std::sync::Arc;

use anyhow::anyhow;
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_sentiment::{
    cli::{datasets::Dataset, models::Model},
    pipelines::text_classification::{unzip_examples, Config, SentimentClassifier},
    search::Estimator,
    utils::metrics::ClassificationReport,
    vocab::load_glove,
};
use pico_args::Arguments;

type Backend = Autodiff<NdArray<f32>>;

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help            Print help
  -m, --model           The model to use: 'averaging', 'recurrent' or 'glove' (defaults to 'averaging')
  -d, --data-dir        The path to the top-level data directory (defaults to 'data')
  --dataset             The dataset to use (defaults to 'sst')
  -n, --max-iter        Maximum number of epochs to train for
  -b, --batch-size      Batch size
  -e, --embed-dim       Embedding dimension (ignored with pretrained vectors)
  --glove               A GloVe vector file to initialise the embeddings from
  --binary              Drop the neutral class
  --early-stopping      Hold out part of the training data and stop on its macro F1
  --seed                Random seed
  -o, --output          Where to save the trained classifier (defaults to '<data-dir>/model')
";

#[derive(Debug)]
struct Args {
    model: Model,
    data_dir: String,
    dataset: Dataset,
    max_iter: Option<usize>,
    batch_size: Option<usize>,
    embed_dim: Option<usize>,
    glove: Option<String>,
    binary: bool,
    early_stopping: bool,
    seed: Option<u64>,
    output: Option<String>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let model: Option<String> = pargs.opt_value_from_str(["-m", "--model"])?;
        let dataset: Option<String> = pargs.opt_value_from_str("--dataset")?;

        let args = Args {
            model: Model::try_from(model.as_deref().unwrap_or("averaging"))?,
            data_dir: pargs
                .opt_value_from_str(["-d", "--data-dir"])?
                .unwrap_or_else(|| "data".to_string()),
            dataset: Dataset::try_from(dataset.as_deref().unwrap_or("sst"))?,
            max_iter: pargs.opt_value_from_str(["-n", "--max-iter"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            embed_dim: pargs.opt_value_from_str(["-e", "--embed-dim"])?,
            glove: pargs.opt_value_from_str("--glove")?,
            binary: pargs.contains("--binary"),
            early_stopping: pargs.contains("--early-stopping"),
            seed: pargs.opt_value_from_str("--seed")?,
            output: pargs.opt_value_from_str(["-o", "--output"])?,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }

    fn config(&self) -> Config {
        let mut config = Config::new()
            .with_model(self.model.kind())
            .with_freeze_embedding(self.model.needs_pretrained())
            .with_early_stopping(self.early_stopping);

        if let Some(max_iter) = self.max_iter {
            config.max_iter = max_iter;
        }

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        if let Some(embed_dim) = self.embed_dim {
            config.embed_dim = embed_dim;
        }

        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    if args.model.needs_pretrained() && args.glove.is_none() {
        return Err(anyhow!("The {} model needs a vector file: pass --glove FILE", args.model));
    }

    let train = args.dataset.examples(&args.data_dir, "train", args.binary)?;
    let dev = args.dataset.examples(&args.data_dir, "dev", args.binary)?;

    let device = NdArrayDevice::Cpu;
    let mut classifier = SentimentClassifier::<Backend>::new(args.config(), device);

    if let Some(path) = &args.glove {
        let lookup = load_glove(path).await?;
        classifier = classifier.with_pretrained(Arc::new(lookup));
    }

    classifier.fit(&train)?;

    let (sequences, gold) = unzip_examples(&dev);
    let predicted = classifier.predict(&sequences)?;
    let report = ClassificationReport::new(&gold, &predicted, &classifier.labels()?.names());

    println!("{report}");

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| format!("{}/model", args.data_dir));

    classifier.save(&output)?;
    println!("Saved the classifier to {output}");

    Ok(())
}
