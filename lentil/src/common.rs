pub use log::info;

pub use lentil::minibatch::{collect_symbols, scan_alphabet_size};
pub use lentil::{LabelFileMinibatches, MixtureOptions, MultinomialMixture, TrainConfig};

pub use matrix_util::common_io::{mkdir, write_lines, write_types};
pub use matrix_util::traits::IoOps;

pub fn init_logger(verbose: bool) {
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

/// `K` from the command line, or one past the largest symbol in `data`
pub fn resolve_alphabet_size(
    data: &LabelFileMinibatches,
    alphabet_size: Option<usize>,
) -> anyhow::Result<usize> {
    match alphabet_size {
        Some(k) => Ok(k),
        None => {
            let k = scan_alphabet_size(data)?;
            info!("alphabet size inferred from {}: {}", data.file(), k);
            Ok(k)
        }
    }
}
