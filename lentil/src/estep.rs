//! E-step over one minibatch.
//!
//! ```text
//! joint[u,c]     = emission[x_u,c] * prior[c]
//! posterior[u,c] = joint[u,c] / sum_c' joint[u,c']
//! llik           = sum_{u,c} posterior[u,c] * ln joint[u,c]
//! ```
//!
//! `llik` is the batch's contribution to the expected complete-data
//! log-likelihood under the current parameters.

use crate::error::MixtureError;
use crate::params::MixtureParameters;
use matrix_util::ndarray_util::*;
use ndarray::Zip;

/// Responsibilities of one minibatch and its likelihood contribution
pub struct EStepOut {
    /// U x C, each row sums to one
    pub posterior: Array2<f64>,
    /// To be added to the running epoch total
    pub llik: f64,
}

/// Normalize joint probabilities into posterior responsibilities.
///
/// Fails on any row whose normalizer is non-positive or non-finite.
pub fn normalize_joint(joint: &Array2<f64>) -> Result<Array2<f64>, MixtureError> {
    let denominator = joint.sum_axis(Axis(1));

    if let Some(u) = denominator.iter().position(|&d| !(d.is_finite() && d > 0.0)) {
        return Err(MixtureError::DegenerateParameters(format!(
            "example {} has marginal probability {}",
            u, denominator[u]
        )));
    }

    Ok(joint / &denominator.insert_axis(Axis(1)))
}

/// `sum posterior * ln joint`, taking `0 * ln 0 = 0`
pub fn expected_log_joint(posterior: &Array2<f64>, joint: &Array2<f64>) -> f64 {
    Zip::from(posterior)
        .and(joint)
        .fold(0.0, |acc, &p, &j| if p > 0.0 { acc + p * j.ln() } else { acc })
}

/// Run the E-step on `symbols` with fixed `params`
pub fn e_step(params: &MixtureParameters, symbols: &[usize]) -> Result<EStepOut, MixtureError> {
    let joint = params.joint_for_symbols(symbols)?;
    let posterior = normalize_joint(&joint)?;
    let llik = expected_log_joint(&posterior, &joint);
    Ok(EStepOut { posterior, llik })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn toy_params() -> MixtureParameters {
        MixtureParameters::from_parts(array![0.25, 0.75], array![[0.9, 0.2], [0.1, 0.8]]).unwrap()
    }

    #[test]
    fn test_posterior_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = MixtureParameters::random(5, 11, &mut rng).unwrap();
        let symbols: Vec<usize> = (0..100).map(|i| (i * 7) % 11).collect();

        let out = e_step(&params, &symbols).unwrap();
        assert_eq!(out.posterior.dim(), (100, 5));
        for row in out.posterior.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert!(out.llik.is_finite());
        assert!(out.llik < 0.0);
    }

    #[test]
    fn test_toy_values() {
        let out = e_step(&toy_params(), &[0]).unwrap();
        // joint = [0.225, 0.15]
        assert_abs_diff_eq!(out.posterior, array![[0.6, 0.4]], epsilon = 1e-12);

        let expected = 0.6 * 0.225_f64.ln() + 0.4 * 0.15_f64.ln();
        assert_abs_diff_eq!(out.llik, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_single_example_batch() {
        let out = e_step(&toy_params(), &[1]).unwrap();
        assert_eq!(out.posterior.nrows(), 1);
        assert_abs_diff_eq!(out.posterior.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_batch() {
        let out = e_step(&toy_params(), &[]).unwrap();
        assert_eq!(out.posterior.dim(), (0, 2));
        assert_eq!(out.llik, 0.0);
    }

    #[test]
    fn test_zero_joint_cell_ignored() {
        let params =
            MixtureParameters::from_parts(array![0.5, 0.5], array![[1.0, 0.5], [0.0, 0.5]])
                .unwrap();
        let out = e_step(&params, &[1]).unwrap();
        assert_abs_diff_eq!(out.posterior, array![[0.0, 1.0]], epsilon = 1e-12);
        assert_abs_diff_eq!(out.llik, 0.25_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_marginal_is_degenerate() {
        let params =
            MixtureParameters::from_parts(array![0.5, 0.5], array![[1.0, 1.0], [0.0, 0.0]])
                .unwrap();
        assert!(matches!(
            e_step(&params, &[1]),
            Err(MixtureError::DegenerateParameters(_))
        ));
    }

    #[test]
    fn test_malformed_symbol() {
        assert!(matches!(
            e_step(&toy_params(), &[0, 5]),
            Err(MixtureError::MalformedInput { .. })
        ));
    }
}
