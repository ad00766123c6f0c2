//! Minibatch EM epoch loop.
//!
//! One epoch = reset the sufficient statistics, stream every minibatch
//! through the E-step and fold it into the statistics, then replace the
//! parameters once from the statistics. Training stops after
//! `max(max_epochs, 1)` epochs or as soon as the epoch log-likelihood
//! improves by no more than `threshold`, whichever comes first.

use crate::error::MixtureError;
use crate::estep::e_step;
use crate::minibatch::MinibatchSource;
use crate::mixture::MultinomialMixture;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::info;

pub const DEFAULT_MAX_EPOCHS: usize = 10;

#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Epoch budget; zero still runs one epoch. Default: 10
    pub max_epochs: usize,
    /// Stop once the epoch log-likelihood gains no more than this. Default: 0
    pub threshold: f64,
    pub show_progress: bool,
    pub verbose: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            max_epochs: DEFAULT_MAX_EPOCHS,
            threshold: 0.0,
            show_progress: false,
            verbose: false,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), MixtureError> {
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(MixtureError::Configuration(format!(
                "stopping threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    EpochBudgetExhausted,
}

/// Terminal state after `epochs` completed epochs, if any; the budget
/// is checked before convergence
pub fn stop_reason(
    epochs: usize,
    max_epochs: usize,
    delta: f64,
    threshold: f64,
) -> Option<StopReason> {
    if epochs >= max_epochs.max(1) {
        Some(StopReason::EpochBudgetExhausted)
    } else if delta <= threshold {
        Some(StopReason::Converged)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub epochs: usize,
    pub stop: StopReason,
    /// Expected complete-data log-likelihood of each epoch, evaluated
    /// with the parameters in force during that epoch
    pub llik_trace: Vec<f64>,
}

impl MultinomialMixture {
    /// Fit the parameters by EM on minibatches from `data`.
    ///
    /// The source is enumerated once per epoch. Any failure while
    /// reading or processing a minibatch aborts training; parameters
    /// then keep the values of the last completed epoch.
    pub fn train<B>(&mut self, data: &B, config: &TrainConfig) -> anyhow::Result<TrainSummary>
    where
        B: MinibatchSource + ?Sized,
    {
        config.validate()?;

        let max_epochs = config.max_epochs.max(1);
        let pb = ProgressBar::new(max_epochs as u64);

        if !config.show_progress || config.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        let mut llik_trace = Vec::with_capacity(max_epochs);
        let mut old_llik = f64::NEG_INFINITY;

        let stop = loop {
            let llik = self.run_epoch(data)?;
            let delta = llik - old_llik;
            old_llik = llik;
            llik_trace.push(llik);
            pb.inc(1);

            info!("[{}] log-likelihood: {}", llik_trace.len(), llik);

            if let Some(stop) =
                stop_reason(llik_trace.len(), max_epochs, delta, config.threshold)
            {
                break stop;
            }
        };

        pb.finish_and_clear();

        Ok(TrainSummary {
            epochs: llik_trace.len(),
            stop,
            llik_trace,
        })
    }

    /// One full pass over `data` followed by the M-step.
    ///
    /// Returns the epoch's expected complete-data log-likelihood.
    pub fn run_epoch<B>(&mut self, data: &B) -> anyhow::Result<f64>
    where
        B: MinibatchSource + ?Sized,
    {
        self.stats.reset();

        let mut llik = 0.0;
        let mut ntot = 0;

        for (b, mb) in data.minibatches()?.enumerate() {
            let symbols = mb.with_context(|| format!("failed to read minibatch #{}", b))?;
            let out = e_step(&self.params, &symbols)
                .with_context(|| format!("E-step failed on minibatch #{}", b))?;
            self.stats.accumulate(&symbols, &out.posterior)?;
            llik += out.llik;
            ntot += symbols.len();
        }

        if ntot == 0 {
            return Err(anyhow::anyhow!("no examples in the training data"));
        }

        self.params = self.stats.finalize();
        Ok(llik)
    }
}
