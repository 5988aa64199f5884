//! Command line tool for a cross-validated hyperparameter grid search

use std::sync::Arc;

use anyhow::anyhow;
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_sentiment::{
    cli::{datasets::Dataset, models::Model},
    pipelines::text_classification::{unzip_examples, Config, SentimentClassifier},
    search::{Estimator, GridSearch, ParamGrid},
    utils::metrics::ClassificationReport,
    vocab::load_glove,
};
use pico_args::Arguments;

type Backend = Autodiff<NdArray<f32>>;

const HELP: &str = "\
Usage: search GRID [OPTIONS]

Arguments:
  GRID                 A YAML file mapping parameter names to lists of candidate values

Options:
  -h, --help           Print help
  -m, --model          The base model: 'averaging', 'recurrent' or 'glove' (defaults to 'averaging')
  -k, --folds          Number of cross validation folds (defaults to 3)
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  --dataset            The dataset to use (defaults to 'sst')
  --glove              A GloVe vector file to initialise the embeddings from
  --binary             Drop the neutral class
  --seed               Shuffle the examples before assigning folds
  -o, --output         Save the refit winner to this directory
";

#[derive(Debug)]
struct Args {
    grid: String,
    model: Model,
    folds: usize,
    data_dir: String,
    dataset: Dataset,
    glove: Option<String>,
    binary: bool,
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
            folds: pargs.opt_value_from_str(["-k", "--folds"])?.unwrap_or(3),
            data_dir: pargs
                .opt_value_from_str(["-d", "--data-dir"])?
                .unwrap_or_else(|| "data".to_string()),
            dataset: Dataset::try_from(dataset.as_deref().unwrap_or("sst"))?,
            glove: pargs.opt_value_from_str("--glove")?,
            binary: pargs.contains("--binary"),
            seed: pargs.opt_value_from_str("--seed")?,
            output: pargs.opt_value_from_str(["-o", "--output"])?,
            grid: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: GRID"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
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

    let grid = ParamGrid::from_yaml(&tokio::fs::read_to_string(&args.grid).await?)?;

    let train = args.dataset.examples(&args.data_dir, "train", args.binary)?;
    let dev = args.dataset.examples(&args.data_dir, "dev", args.binary)?;

    let pretrained = match &args.glove {
        Some(path) => Some(Arc::new(load_glove(path).await?)),
        None => None,
    };

    let base = Config::new()
        .with_model(args.model.kind())
        .with_freeze_embedding(args.model.needs_pretrained());

    let factory = SentimentClassifier::<Backend>::factory(base, NdArrayDevice::Cpu, pretrained);

    let result = GridSearch::new(args.folds, args.seed).search(&train, factory, &grid)?;

    println!("{:<60} {:>10}", "parameters", "mean F1");
    for candidate in &result.candidates {
        println!(
            "{:<60} {:>10.4}",
            candidate.params.to_string(),
            candidate.mean_score
        );
    }

    println!(
        "\nBest parameters: {} (mean macro F1 {:.4})\n",
        result.best_params, result.best_score
    );

    let classifier = result.estimator;

    let (sequences, gold) = unzip_examples(&dev);
    let predicted = classifier.predict(&sequences)?;
    let report = ClassificationReport::new(&gold, &predicted, &classifier.labels()?.names());

    println!("{report}");

    if let Some(output) = &args.output {
        classifier.save(output)?;
        println!("Saved the classifier to {output}");
    }

    Ok(())
}
