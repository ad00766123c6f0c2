use crate::common::*;

use lentil::model_selection::{KFold, ModelGrid, Selection};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct SelectArgs {
    /// symbol file, plain text or `.gz` (same format as `fit`)
    #[arg(required = true)]
    data_file: Box<str>,

    /// candidate numbers of hidden states (comma-separated)
    #[arg(long, short = 'c', value_delimiter(','), default_values_t = vec![2, 4, 8])]
    num_states: Vec<usize>,

    /// alphabet size. If omitted, one past the largest symbol.
    #[arg(long, short = 'k')]
    alphabet_size: Option<usize>,

    /// candidate epoch budgets (comma-separated)
    #[arg(long, short = 'i', value_delimiter(','), default_values_t = vec![10])]
    max_epochs: Vec<usize>,

    /// candidate stopping thresholds (comma-separated)
    #[arg(long, short = 't', value_delimiter(','), default_values_t = vec![0.0])]
    thresholds: Vec<f64>,

    /// Laplace smoothing of the sufficient statistics
    #[arg(long, default_value_t = 1e-7)]
    smoothing: f64,

    /// number of cross-validation folds
    #[arg(long, short = 'f', default_value_t = 3)]
    folds: usize,

    /// number of symbols per minibatch
    #[arg(long, short = 'b', default_value_t = 2000)]
    batch_size: usize,

    /// maximum number of threads
    #[arg(long)]
    max_threads: Option<usize>,

    /// random seed for the fold split and initial parameters
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// output header: writes `{out}.selection.tsv`
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn run_select(args: SelectArgs) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let data = LabelFileMinibatches::new(&args.data_file, args.batch_size)?;
    let alphabet_size = resolve_alphabet_size(&data, args.alphabet_size)?;
    let symbols = collect_symbols(&data)?;
    info!("read {} examples from {}", symbols.len(), args.data_file);

    let kfold = KFold {
        num_folds: args.folds,
        batch_size: args.batch_size,
        max_threads: args.max_threads.unwrap_or_else(num_cpus::get),
        seed: args.seed,
    };

    let grid = ModelGrid {
        num_states: args.num_states.clone(),
        max_epochs: args.max_epochs.clone(),
        thresholds: args.thresholds.clone(),
        smoothing: args.smoothing,
    };

    let selection = kfold.select(&symbols, alphabet_size, &grid)?;

    mkdir(&args.out)?;
    write_lines(
        &selection_lines(&selection),
        &(args.out.to_string() + ".selection.tsv"),
    )?;

    let best = selection.best_summary();
    info!(
        "selected {} states (validation log-likelihood {:.4})",
        best.config.num_states, best.avg_valid
    );
    Ok(())
}

fn selection_lines(selection: &Selection) -> Vec<Box<str>> {
    let header = [
        "num_states",
        "max_epochs",
        "threshold",
        "avg_train",
        "std_train",
        "avg_valid",
        "std_valid",
        "selected",
    ]
    .join("\t");

    let mut lines = vec![header.into_boxed_str()];
    for (i, s) in selection.summaries.iter().enumerate() {
        lines.push(
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                s.config.num_states,
                s.config.max_epochs,
                s.config.threshold,
                s.avg_train,
                s.std_train,
                s.avg_valid,
                s.std_valid,
                (i == selection.best) as u8
            )
            .into_boxed_str(),
        );
    }
    lines
}
