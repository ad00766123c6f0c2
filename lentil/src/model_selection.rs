//! k-fold cross-validated grid search over mixture configurations.
//!
//! Each configuration is trained on the training part of every fold and
//! scored by the mean per-example marginal log-likelihood on both parts.
//! The winner has the highest average validation score; ties go to the
//! lower validation standard deviation, then to the earlier grid entry.

use crate::minibatch::Minibatches;
use crate::mixture::{MixtureOptions, MultinomialMixture, DEFAULT_SMOOTHING};
use crate::train::{TrainConfig, DEFAULT_MAX_EPOCHS};
use log::info;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

/// Example indices of one train/validation split
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

///
/// Shuffle `0..n` and deal it into `num_folds` validation sets; every
/// example is validated exactly once.
///
/// * `n` - number of examples
/// * `num_folds` - between 2 and `n`
/// * `seed` - shuffling seed
///
pub fn build_folds(n: usize, num_folds: usize, seed: u64) -> anyhow::Result<Vec<Fold>> {
    if num_folds < 2 || num_folds > n {
        return Err(anyhow::anyhow!(
            "need 2 <= #folds <= #examples, got {} folds for {} examples",
            num_folds,
            n
        ));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    Ok((0..num_folds)
        .map(|k| {
            let (valid, train): (Vec<(usize, usize)>, Vec<(usize, usize)>) = indices
                .iter()
                .copied()
                .enumerate()
                .partition(|(i, _)| i % num_folds == k);
            Fold {
                train: train.into_iter().map(|(_, x)| x).collect(),
                valid: valid.into_iter().map(|(_, x)| x).collect(),
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub num_states: usize,
    pub max_epochs: usize,
    pub threshold: f64,
    pub smoothing: f64,
}

/// Candidate values; the grid is their cartesian product
#[derive(Debug, Clone)]
pub struct ModelGrid {
    pub num_states: Vec<usize>,
    pub max_epochs: Vec<usize>,
    pub thresholds: Vec<f64>,
    pub smoothing: f64,
}

impl Default for ModelGrid {
    fn default() -> Self {
        ModelGrid {
            num_states: vec![2],
            max_epochs: vec![DEFAULT_MAX_EPOCHS],
            thresholds: vec![0.0],
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl ModelGrid {
    pub fn configs(&self) -> Vec<ModelConfig> {
        let mut ret = vec![];
        for &num_states in self.num_states.iter() {
            for &max_epochs in self.max_epochs.iter() {
                for &threshold in self.thresholds.iter() {
                    ret.push(ModelConfig {
                        num_states,
                        max_epochs,
                        threshold,
                        smoothing: self.smoothing,
                    });
                }
            }
        }
        ret
    }
}

/// Mean per-example log-likelihood on each side of one fold
#[derive(Debug, Clone, Copy)]
pub struct FoldScore {
    pub train: f64,
    pub valid: f64,
}

#[derive(Debug, Clone)]
pub struct CvSummary {
    pub config: ModelConfig,
    pub folds: Vec<FoldScore>,
    pub avg_train: f64,
    pub std_train: f64,
    pub avg_valid: f64,
    pub std_valid: f64,
}

#[derive(Debug, Clone)]
pub struct Selection {
    /// Index into `summaries`
    pub best: usize,
    /// One per grid configuration, in grid order
    pub summaries: Vec<CvSummary>,
}

impl Selection {
    pub fn best_summary(&self) -> &CvSummary {
        &self.summaries[self.best]
    }
}

/// mean and population standard deviation
fn mean_std(xs: &[f64]) -> (f64, f64) {
    let xs = ArrayView1::from(xs);
    (xs.mean().unwrap_or(f64::NAN), xs.std(0.0))
}

/// Highest finite average validation score, ties by lower standard
/// deviation, then by lower index
pub fn pick_best(summaries: &[CvSummary]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in summaries.iter().enumerate() {
        if !s.avg_valid.is_finite() {
            continue;
        }
        best = match best {
            None => Some(i),
            Some(b) => {
                let sb = &summaries[b];
                if s.avg_valid > sb.avg_valid
                    || (s.avg_valid == sb.avg_valid && s.std_valid < sb.std_valid)
                {
                    Some(i)
                } else {
                    Some(b)
                }
            }
        };
    }
    best
}

#[derive(Debug, Clone)]
pub struct KFold {
    /// Default: 3
    pub num_folds: usize,
    /// Default: 2000
    pub batch_size: usize,
    /// Upper bound on worker threads. Default: all logical CPUs
    pub max_threads: usize,
    /// Seeds both the fold split and model initialization. Default: 42
    pub seed: u64,
}

impl Default for KFold {
    fn default() -> Self {
        KFold {
            num_folds: 3,
            batch_size: 2000,
            max_threads: num_cpus::get(),
            seed: 42,
        }
    }
}

impl KFold {
    /// Cross-validate every configuration of `grid` on `symbols` and
    /// pick the winner. Configurations run in parallel.
    pub fn select(
        &self,
        symbols: &[usize],
        alphabet_size: usize,
        grid: &ModelGrid,
    ) -> anyhow::Result<Selection> {
        let configs = grid.configs();
        if configs.is_empty() {
            return Err(anyhow::anyhow!("empty model grid"));
        }

        let folds = build_folds(symbols.len(), self.num_folds, self.seed)?;

        let num_threads = self.max_threads.clamp(1, num_cpus::get().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        info!(
            "{} configurations x {} folds on {} threads",
            configs.len(),
            folds.len(),
            num_threads
        );

        let summaries = pool.install(|| {
            configs
                .par_iter()
                .enumerate()
                .map(|(i, config)| {
                    self.cross_validate(config, symbols, alphabet_size, &folds)
                        .map_err(|e| anyhow::anyhow!("configuration #{}: {}", i + 1, e))
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })?;

        for (i, s) in summaries.iter().enumerate() {
            info!(
                "config #{} {:?}: TR avg {:.4} std {:.4}, VL avg {:.4} std {:.4}",
                i + 1,
                s.config,
                s.avg_train,
                s.std_train,
                s.avg_valid,
                s.std_valid
            );
        }

        let best = pick_best(&summaries)
            .ok_or(anyhow::anyhow!("no configuration produced a finite score"))?;

        info!("model selection winner: config #{} {:?}", best + 1, summaries[best].config);

        Ok(Selection { best, summaries })
    }

    /// Train `config` on each fold and score both sides
    pub fn cross_validate(
        &self,
        config: &ModelConfig,
        symbols: &[usize],
        alphabet_size: usize,
        folds: &[Fold],
    ) -> anyhow::Result<CvSummary> {
        let train_config = TrainConfig {
            max_epochs: config.max_epochs,
            threshold: config.threshold,
            show_progress: false,
            verbose: false,
        };

        let mut scores = Vec::with_capacity(folds.len());

        for (k, fold) in folds.iter().enumerate() {
            let train_data = Minibatches::from_indices(symbols, &fold.train, self.batch_size)?;
            let valid_data = Minibatches::from_indices(symbols, &fold.valid, self.batch_size)?;

            let mut mm = MultinomialMixture::new(&MixtureOptions {
                num_states: config.num_states,
                alphabet_size,
                smoothing: config.smoothing,
                seed: self.seed.wrapping_add(k as u64),
            })?;

            mm.train(&train_data, &train_config)?;

            let (tr_llik, tr_n) = mm.log_likelihood(&train_data)?;
            let (vl_llik, vl_n) = mm.log_likelihood(&valid_data)?;

            scores.push(FoldScore {
                train: tr_llik / tr_n as f64,
                valid: vl_llik / vl_n as f64,
            });
        }

        let train: Vec<f64> = scores.iter().map(|s| s.train).collect();
        let valid: Vec<f64> = scores.iter().map(|s| s.valid).collect();
        let (avg_train, std_train) = mean_std(&train);
        let (avg_valid, std_valid) = mean_std(&valid);

        Ok(CvSummary {
            config: config.clone(),
            folds: scores,
            avg_train,
            std_train,
            avg_valid,
            std_valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn summary(avg_valid: f64, std_valid: f64) -> CvSummary {
        CvSummary {
            config: ModelConfig {
                num_states: 2,
                max_epochs: 1,
                threshold: 0.0,
                smoothing: 1e-7,
            },
            folds: vec![],
            avg_train: 0.0,
            std_train: 0.0,
            avg_valid,
            std_valid,
        }
    }

    #[test]
    fn test_folds_partition() {
        let folds = build_folds(10, 3, 1).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.valid.clone()).collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for f in folds.iter() {
            assert_eq!(f.train.len() + f.valid.len(), 10);
            assert!(f.valid.iter().all(|x| !f.train.contains(x)));
        }
    }

    #[test]
    fn test_bad_fold_count() {
        assert!(build_folds(10, 1, 0).is_err());
        assert!(build_folds(3, 4, 0).is_err());
    }

    #[test]
    fn test_grid_product() {
        let grid = ModelGrid {
            num_states: vec![2, 3],
            max_epochs: vec![5],
            thresholds: vec![0.0, 0.1],
            ..Default::default()
        };
        let configs = grid.configs();
        assert_eq!(configs.len(), 4);
        assert_eq!(configs[0].num_states, 2);
        assert_eq!(configs[1].threshold, 0.1);
        assert_eq!(configs[3].num_states, 3);
    }

    #[test]
    fn test_pick_best_tie_break() {
        let summaries = vec![
            summary(-1.2, 0.1),
            summary(-1.0, 0.3),
            summary(-1.0, 0.2),
            summary(-1.0, 0.2),
            summary(f64::NAN, 0.0),
        ];
        assert_eq!(pick_best(&summaries), Some(2));
        assert_eq!(pick_best(&[summary(f64::NAN, 0.0)]), None);
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[1.0, 3.0]);
        assert_abs_diff_eq!(m, 2.0);
        assert_abs_diff_eq!(s, 1.0);

        let (m, s) = mean_std(&[-2.0, -2.0, -2.0]);
        assert_abs_diff_eq!(m, -2.0);
        assert_abs_diff_eq!(s, 0.0);
    }

    #[test]
    fn test_select_runs() {
        let symbols: Vec<usize> = (0..120).map(|i| if i % 4 == 0 { 2 } else { i % 2 }).collect();
        let kfold = KFold {
            num_folds: 3,
            batch_size: 16,
            max_threads: 2,
            seed: 5,
        };
        let grid = ModelGrid {
            num_states: vec![1, 2],
            max_epochs: vec![3],
            ..Default::default()
        };

        let selection = kfold.select(&symbols, 3, &grid).unwrap();
        assert_eq!(selection.summaries.len(), 2);
        assert!(selection.best < 2);
        for s in selection.summaries.iter() {
            assert_eq!(s.folds.len(), 3);
            assert!(s.avg_valid.is_finite() && s.avg_valid < 0.0);
        }
    }
}
