//! Command line tool to label texts with a saved sentiment classifier

use anyhow::{anyhow, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_sentiment::pipelines::text_classification::infer;
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer ARTIFACT_DIR TEXT...

Arguments:
  ARTIFACT_DIR         A directory written by the train or search tools
  TEXT                 One or more texts to classify

Options:
  -h, --help           Print help
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The saved classifier
    artifact_dir: String,

    /// The texts to classify
    samples: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    if help {
        return Ok(Args {
            help,
            artifact_dir: String::new(),
            samples: Vec::new(),
        });
    }

    let artifact_dir: String = pargs.free_from_str().map_err(|e| match e {
        pico_args::Error::MissingArgument => anyhow!("Missing required argument: ARTIFACT_DIR"),
        _ => anyhow!("{}", e),
    })?;

    let samples = pargs
        .finish()
        .into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|arg| anyhow!("Invalid UTF-8 in argument: {:?}", arg))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Args {
        help,
        artifact_dir,
        samples,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    if args.samples.is_empty() {
        return Err(anyhow!("Missing required argument: TEXT"));
    }

    let device = NdArrayDevice::Cpu;

    let predictions = infer::<Autodiff<NdArray<f32>>>(device, &args.artifact_dir, &args.samples)?;

    for (text, class) in args.samples.iter().zip(predictions) {
        println!("{class}\t{text}");
    }

    Ok(())
}
