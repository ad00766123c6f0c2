//! Hard state assignment and held-out scoring with fixed parameters.

use crate::error::MixtureError;
use crate::estep::normalize_joint;
use crate::minibatch::MinibatchSource;
use crate::mixture::MultinomialMixture;
use crate::params::MixtureParameters;
use anyhow::Context;
use matrix_util::ndarray_util::*;
use matrix_util::traits::ArgmaxOps;

/// `argmax_c prior[c] * emission[x_u,c]` for each symbol, lowest state
/// index on ties
pub fn assign_states(
    params: &MixtureParameters,
    symbols: &[usize],
) -> Result<Vec<usize>, MixtureError> {
    Ok(params.joint_for_symbols(symbols)?.argmax_rows())
}

/// Hard assignments over all minibatches, concatenated in enumeration order
pub fn infer_states<B>(params: &MixtureParameters, data: &B) -> anyhow::Result<Vec<usize>>
where
    B: MinibatchSource + ?Sized,
{
    let mut states = vec![];
    for (b, mb) in data.minibatches()?.enumerate() {
        let symbols = mb.with_context(|| format!("failed to read minibatch #{}", b))?;
        states.extend(assign_states(params, &symbols)?);
    }
    Ok(states)
}

/// Marginal log-likelihood `sum_u ln sum_c prior[c] * emission[x_u,c]`
/// and the number of examples it covers
pub fn log_marginal<B>(params: &MixtureParameters, data: &B) -> anyhow::Result<(f64, usize)>
where
    B: MinibatchSource + ?Sized,
{
    let mut llik = 0.0;
    let mut ntot = 0;
    for (b, mb) in data.minibatches()?.enumerate() {
        let symbols = mb.with_context(|| format!("failed to read minibatch #{}", b))?;
        let joint = params.joint_for_symbols(&symbols)?;
        llik += joint.sum_axis(Axis(1)).mapv(f64::ln).sum();
        ntot += symbols.len();
    }
    Ok((llik, ntot))
}

impl MultinomialMixture {
    /// The most likely hidden state of every example in `data`, in
    /// input order. Parameters are not modified.
    pub fn infer<B>(&self, data: &B) -> anyhow::Result<Vec<usize>>
    where
        B: MinibatchSource + ?Sized,
    {
        infer_states(&self.params, data)
    }

    pub fn infer_minibatch(&self, symbols: &[usize]) -> Result<Vec<usize>, MixtureError> {
        assign_states(&self.params, symbols)
    }

    /// U x C posterior responsibilities of one minibatch
    pub fn posterior(&self, symbols: &[usize]) -> Result<Array2<f64>, MixtureError> {
        normalize_joint(&self.params.joint_for_symbols(symbols)?)
    }

    /// Total marginal log-likelihood of `data` and the number of examples
    pub fn log_likelihood<B>(&self, data: &B) -> anyhow::Result<(f64, usize)>
    where
        B: MinibatchSource + ?Sized,
    {
        log_marginal(&self.params, data)
    }
}
