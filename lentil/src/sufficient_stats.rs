//! Sufficient statistics of one epoch and the M-step update.
//!
//! Every accumulator starts at a Laplace smoothing floor `s`:
//!
//! ```text
//! prior_numerator[c]       = s          prior_denominator = C * s
//! emission_numerator[v,c]  = s          emission_denominator[c] = K * s
//! ```
//!
//! so that each denominator equals the sum of its numerator over the
//! normalized axis, both before and after any number of `accumulate`
//! calls. `finalize` therefore produces exact probability vectors up to
//! rounding, and never divides by zero.

use crate::error::MixtureError;
use crate::params::MixtureParameters;
use log::warn;
use matrix_util::ndarray_util::*;
use matrix_util::traits::GroupSumOps;

#[derive(Debug, Clone)]
pub struct SufficientStats {
    smoothing: f64,
    pub prior_numerator: Array1<f64>,
    pub prior_denominator: f64,
    /// K x C
    pub emission_numerator: Array2<f64>,
    pub emission_denominator: Array1<f64>,
}

impl SufficientStats {
    /// Accumulators for `num_states` (C) hidden states over an alphabet
    /// of `alphabet_size` (K) symbols, set to the smoothing floor
    pub fn new(num_states: usize, alphabet_size: usize, smoothing: f64) -> Self {
        let mut ret = Self {
            smoothing,
            prior_numerator: Array1::zeros(num_states),
            prior_denominator: 0.0,
            emission_numerator: Array2::zeros((alphabet_size, num_states)),
            emission_denominator: Array1::zeros(num_states),
        };
        ret.reset();
        ret
    }

    pub fn num_states(&self) -> usize {
        self.prior_numerator.len()
    }

    pub fn alphabet_size(&self) -> usize {
        self.emission_numerator.nrows()
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Back to the smoothing floor; called at the start of every epoch
    pub fn reset(&mut self) {
        let s = self.smoothing;
        let nc = self.num_states() as f64;
        let nk = self.alphabet_size() as f64;

        self.prior_numerator.fill(s);
        self.prior_denominator = s * nc;
        self.emission_numerator.fill(s);
        self.emission_denominator.fill(s * nk);
    }

    /// Fold one minibatch's responsibilities into the running sums.
    ///
    /// * `symbols` - the minibatch (length U)
    /// * `posterior` - U x C responsibilities from the E-step
    pub fn accumulate(
        &mut self,
        symbols: &[usize],
        posterior: &Array2<f64>,
    ) -> Result<(), MixtureError> {
        if posterior.dim() != (symbols.len(), self.num_states()) {
            return Err(MixtureError::Shape(format!(
                "posterior {:?} for {} symbols and {} states",
                posterior.dim(),
                symbols.len(),
                self.num_states()
            )));
        }

        let emission_add = posterior
            .sum_rows_by_group(symbols, self.alphabet_size())
            .map_err(|e| MixtureError::Shape(e.to_string()))?;

        let mass = posterior.sum_axis(Axis(0));

        self.prior_numerator += &mass;
        self.prior_denominator += mass.sum();
        self.emission_numerator += &emission_add;
        self.emission_denominator += &mass;
        Ok(())
    }

    /// Hidden states that received no more than their smoothing floor
    pub fn collapsed_states(&self) -> Vec<usize> {
        let floor = 2.0 * self.smoothing * self.alphabet_size() as f64;
        self.emission_denominator
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d <= floor)
            .map(|(c, _)| c)
            .collect()
    }

    /// M-step: new parameters from the accumulated statistics
    ///
    /// ```text
    /// prior[c]      = prior_numerator[c] / prior_denominator
    /// emission[v,c] = emission_numerator[v,c] / emission_denominator[c]
    /// ```
    pub fn finalize(&self) -> MixtureParameters {
        for c in self.collapsed_states() {
            warn!(
                "hidden state {} received almost no responsibility; its emission stays near uniform",
                c
            );
        }

        let prior = &self.prior_numerator / self.prior_denominator;
        let emission = &self.emission_numerator / &self.emission_denominator;
        MixtureParameters::from_parts_unchecked(prior, emission)
    }
}
