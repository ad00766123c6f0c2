use crate::common::*;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct FitArgs {
    /// symbol file, plain text or `.gz`. Whitespace-separated
    /// non-negative integers; lines starting with `#` or `%` are
    /// skipped.
    #[arg(required = true)]
    data_file: Box<str>,

    /// number of hidden states
    #[arg(long, short = 'c', default_value_t = 2)]
    num_states: usize,

    /// alphabet size; symbols must be in `0..K`. If omitted, one past
    /// the largest symbol in the data file.
    #[arg(long, short = 'k')]
    alphabet_size: Option<usize>,

    /// number of symbols per minibatch
    #[arg(long, short = 'b', default_value_t = 2000)]
    batch_size: usize,

    /// maximum number of EM epochs (at least one is always run)
    #[arg(long, short = 'i', default_value_t = 10)]
    max_epochs: usize,

    /// stop once an epoch improves the log-likelihood by no more than this
    #[arg(long, short = 't', default_value_t = 0.0)]
    threshold: f64,

    /// Laplace smoothing of the sufficient statistics
    #[arg(long, default_value_t = 1e-7)]
    smoothing: f64,

    /// random seed for the initial parameters
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// output header: writes `{out}.prior.tsv`, `{out}.emission.tsv`,
    /// `{out}.llik.tsv` and `{out}.states.gz`
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn run_fit(args: FitArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let data = LabelFileMinibatches::new(&args.data_file, args.batch_size)?;
    let alphabet_size = resolve_alphabet_size(&data, args.alphabet_size)?;

    let options = MixtureOptions {
        num_states: args.num_states,
        alphabet_size,
        smoothing: args.smoothing,
        seed: args.seed,
    };

    let mut mixture = MultinomialMixture::new(&options)?;

    info!(
        "fitting {} states over {} symbols",
        args.num_states, alphabet_size
    );

    let train_config = TrainConfig {
        max_epochs: args.max_epochs,
        threshold: args.threshold,
        show_progress: true,
        verbose: args.verbose,
    };

    let summary = mixture.train(&data, &train_config)?;
    info!("stopped after {} epoch(s): {:?}", summary.epochs, summary.stop);

    let states = mixture.infer(&data)?;
    info!("assigned {} examples", states.len());

    mkdir(&args.out)?;

    let params = mixture.params();
    params.prior().to_tsv(&(args.out.to_string() + ".prior.tsv"))?;
    params
        .emission()
        .to_tsv(&(args.out.to_string() + ".emission.tsv"))?;
    write_types(&summary.llik_trace, &(args.out.to_string() + ".llik.tsv"))?;
    write_types(&states, &(args.out.to_string() + ".states.gz"))?;

    info!("done");
    Ok(())
}
