//! Prior and emission distributions of a multinomial mixture.
//!
//! ```text
//! z_u ~ Categorical(prior)              prior[c],       c in 0..C
//! x_u | z_u = c ~ Categorical(emission[:,c])  emission[v,c],  v in 0..K
//! ```

use crate::error::MixtureError;
use matrix_util::ndarray_util::*;
use matrix_util::traits::{SampleOps, StochasticOps};
use rand::Rng;

/// Tolerance for the sum-to-one checks
pub const PROB_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParameters {
    prior: Array1<f64>,
    emission: Array2<f64>,
}

pub(crate) fn check_dims(num_states: usize, alphabet_size: usize) -> Result<(), MixtureError> {
    if num_states == 0 {
        return Err(MixtureError::Configuration(
            "number of hidden states must be positive".into(),
        ));
    }
    if alphabet_size == 0 {
        return Err(MixtureError::Configuration(
            "alphabet size must be positive".into(),
        ));
    }
    Ok(())
}

impl MixtureParameters {
    /// Random valid distributions: each prior and emission column is a
    /// `U(0,1]` vector renormalized to sum to one
    ///
    /// * `num_states` - C
    /// * `alphabet_size` - K
    pub fn random<R: Rng>(
        num_states: usize,
        alphabet_size: usize,
        rng: &mut R,
    ) -> Result<Self, MixtureError> {
        check_dims(num_states, alphabet_size)?;

        let mut prior = Array1::<f64>::runif_rng(num_states, rng);
        prior.sum_to_one_columns_inplace();

        let mut emission = Array2::<f64>::runif_rng((alphabet_size, num_states), rng);
        emission.sum_to_one_columns_inplace();

        Ok(Self { prior, emission })
    }

    /// Take user-provided distributions after checking shapes and
    /// normalization
    ///
    /// * `prior` - length C
    /// * `emission` - K x C, columns sum to one
    pub fn from_parts(prior: Array1<f64>, emission: Array2<f64>) -> Result<Self, MixtureError> {
        check_dims(prior.len(), emission.nrows())?;

        if emission.ncols() != prior.len() {
            return Err(MixtureError::Shape(format!(
                "emission has {} columns for {} hidden states",
                emission.ncols(),
                prior.len()
            )));
        }

        let ret = Self { prior, emission };
        ret.validate(PROB_TOL)?;
        Ok(ret)
    }

    /// Built by the M-step; the caller guarantees normalization
    pub(crate) fn from_parts_unchecked(prior: Array1<f64>, emission: Array2<f64>) -> Self {
        debug_assert_eq!(prior.len(), emission.ncols());
        Self { prior, emission }
    }

    pub fn prior(&self) -> &Array1<f64> {
        &self.prior
    }

    pub fn emission(&self) -> &Array2<f64> {
        &self.emission
    }

    pub fn num_states(&self) -> usize {
        self.prior.len()
    }

    pub fn alphabet_size(&self) -> usize {
        self.emission.nrows()
    }

    /// Check that prior and every emission column are probability
    /// vectors up to `tol`
    pub fn validate(&self, tol: f64) -> Result<(), MixtureError> {
        let nonneg = |x: &f64| x.is_finite() && *x >= 0.0;

        if !self.prior.iter().all(nonneg) || !self.emission.iter().all(nonneg) {
            return Err(MixtureError::DegenerateParameters(
                "negative or non-finite probability".into(),
            ));
        }

        let prior_dev = self.prior.max_column_sum_deviation();
        if prior_dev > tol {
            return Err(MixtureError::DegenerateParameters(format!(
                "prior deviates from 1 by {:e}",
                prior_dev
            )));
        }

        let emission_dev = self.emission.max_column_sum_deviation();
        if emission_dev > tol {
            return Err(MixtureError::DegenerateParameters(format!(
                "emission column deviates from 1 by {:e}",
                emission_dev
            )));
        }

        Ok(())
    }

    /// Reject symbols outside `[0, K)` before they index the emission
    pub fn check_symbols(&self, symbols: &[usize]) -> Result<(), MixtureError> {
        let alphabet_size = self.alphabet_size();
        match symbols.iter().position(|&x| x >= alphabet_size) {
            Some(position) => Err(MixtureError::MalformedInput {
                position,
                symbol: symbols[position],
                alphabet_size,
            }),
            None => Ok(()),
        }
    }

    /// `joint[u,c] = emission[x_u,c] * prior[c]` (U x C)
    pub fn joint_for_symbols(&self, symbols: &[usize]) -> Result<Array2<f64>, MixtureError> {
        self.check_symbols(symbols)?;
        let emission_for_symbols = self.emission.select(Axis(0), symbols);
        Ok(emission_for_symbols * &self.prior)
    }
}
