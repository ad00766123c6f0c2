//! Latent state labelling of categorical data.
//!
//! A finite mixture of categorical distributions ("multinomial
//! mixture") estimated by Expectation-Maximization over minibatches:
//! responsibilities are computed per minibatch, their sufficient
//! statistics accumulated across the whole epoch, and the parameters
//! replaced once per epoch.
//!
//! ```ignore
//! use lentil::{Minibatches, MixtureOptions, MultinomialMixture, TrainConfig};
//!
//! let data = Minibatches::new(&symbols, 2000)?;
//! let mut mm = MultinomialMixture::new(&MixtureOptions::new(40, alphabet_size))?;
//! mm.train(&data, &TrainConfig::default())?;
//! let states = mm.infer(&data)?;
//! ```

/// Error kinds of the mixture model
pub mod error;

/// Prior and emission distributions
pub mod params;

/// E-step: posterior responsibilities and expected log-likelihood
pub mod estep;

/// Epoch-level sufficient statistics and the M-step
pub mod sufficient_stats;

/// Minibatch sources: in-memory and streamed from text files
pub mod minibatch;

/// Model construction and options
pub mod mixture;

/// EM epoch loop
pub mod train;

/// Arg-max state assignment and likelihood scoring
pub mod inference;

/// k-fold grid search over configurations
pub mod model_selection;

pub use error::MixtureError;
pub use minibatch::{LabelFileMinibatches, MinibatchSource, Minibatches};
pub use mixture::{MixtureOptions, MultinomialMixture};
pub use params::MixtureParameters;
pub use train::{StopReason, TrainConfig, TrainSummary};
