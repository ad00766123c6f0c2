use crate::error::MixtureError;
use crate::params::{check_dims, MixtureParameters};
use crate::sufficient_stats::SufficientStats;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Laplace smoothing floor of the sufficient statistics
pub const DEFAULT_SMOOTHING: f64 = 1e-7;

/// Fixed at construction
#[derive(Debug, Clone)]
pub struct MixtureOptions {
    /// Number of hidden states C
    pub num_states: usize,
    /// Symbols are in `0..alphabet_size` (K)
    pub alphabet_size: usize,
    /// Default: 1e-7
    pub smoothing: f64,
    /// Seed for the random initial parameters. Default: 42
    pub seed: u64,
}

impl Default for MixtureOptions {
    fn default() -> Self {
        MixtureOptions {
            num_states: 2,
            alphabet_size: 2,
            smoothing: DEFAULT_SMOOTHING,
            seed: 42,
        }
    }
}

impl MixtureOptions {
    pub fn new(num_states: usize, alphabet_size: usize) -> Self {
        Self {
            num_states,
            alphabet_size,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), MixtureError> {
        check_dims(self.num_states, self.alphabet_size)?;
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(MixtureError::Configuration(format!(
                "smoothing must be a positive number, got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

/// Mixture of categorical distributions over a finite alphabet,
/// estimated by minibatch EM (see `train`) and used for hard state
/// assignment (see `infer`).
#[derive(Debug, Clone)]
pub struct MultinomialMixture {
    pub(crate) params: MixtureParameters,
    pub(crate) stats: SufficientStats,
}

impl MultinomialMixture {
    /// Random initial parameters drawn from `options.seed`
    pub fn new(options: &MixtureOptions) -> Result<Self, MixtureError> {
        options.validate()?;
        let mut rng = StdRng::seed_from_u64(options.seed);
        let params = MixtureParameters::random(options.num_states, options.alphabet_size, &mut rng)?;
        Self::from_parameters(params, options.smoothing)
    }

    /// Start from known parameters
    pub fn from_parameters(params: MixtureParameters, smoothing: f64) -> Result<Self, MixtureError> {
        MixtureOptions {
            num_states: params.num_states(),
            alphabet_size: params.alphabet_size(),
            smoothing,
            seed: 0,
        }
        .validate()?;

        let stats = SufficientStats::new(params.num_states(), params.alphabet_size(), smoothing);
        Ok(Self { params, stats })
    }

    pub fn params(&self) -> &MixtureParameters {
        &self.params
    }

    pub fn num_states(&self) -> usize {
        self.params.num_states()
    }

    pub fn alphabet_size(&self) -> usize {
        self.params.alphabet_size()
    }

    pub fn smoothing(&self) -> f64 {
        self.stats.smoothing()
    }
}
