use thiserror::Error;

/// Failures of the mixture model itself.
///
/// Running out of minibatches is not an error; sources signal it by
/// ending their iterator.
#[derive(Debug, Error)]
pub enum MixtureError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("symbol {symbol} at position {position} is outside the alphabet [0, {alphabet_size})")]
    MalformedInput {
        position: usize,
        symbol: usize,
        alphabet_size: usize,
    },
    #[error("degenerate parameters: {0}")]
    DegenerateParameters(String),
    #[error("shape mismatch: {0}")]
    Shape(String),
}
