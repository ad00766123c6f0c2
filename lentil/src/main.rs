mod common;
mod run_fit;
mod run_select;

use crate::run_fit::*;
use crate::run_select::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit a multinomial mixture by minibatch EM and label every symbol
    /// with its most likely hidden state
    Fit(FitArgs),

    /// Choose the number of hidden states by k-fold cross-validation
    Select(SelectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Fit(args) => {
            run_fit(args.clone())?;
        }
        Commands::Select(args) => {
            run_select(args.clone())?;
        }
    }

    Ok(())
}
