use approx::assert_abs_diff_eq;
use lentil::params::PROB_TOL;
use lentil::{
    LabelFileMinibatches, Minibatches, MixtureOptions, MultinomialMixture, StopReason,
    TrainConfig,
};
use matrix_util::common_io::{create_temp_dir_file, write_lines};

fn clustered_symbols(n: usize) -> Vec<usize> {
    // two groups of symbols with different frequencies
    (0..n)
        .map(|i| match i % 11 {
            0..=3 => 0,
            4..=5 => 1,
            6 => 2,
            7..=8 => 3,
            _ => 4,
        })
        .collect()
}

fn symbol_marginal(mm: &MultinomialMixture, x: usize) -> f64 {
    let params = mm.params();
    params.emission().row(x).dot(params.prior())
}

#[test]
fn two_state_toy_single_batch_one_epoch() -> anyhow::Result<()> {
    let symbols = vec![0, 0, 0, 1, 1, 1, 1];
    let data = Minibatches::new(&symbols, 7)?;
    assert_eq!(data.num_minibatch(), 1);

    let config = TrainConfig {
        max_epochs: 1,
        ..Default::default()
    };

    for seed in [0, 1, 4] {
        let options = MixtureOptions {
            seed,
            ..MixtureOptions::new(2, 2)
        };
        let mut mm = MultinomialMixture::new(&options)?;
        let summary = mm.train(&data, &config)?;

        assert_eq!(summary.epochs, 1);
        assert_eq!(summary.stop, StopReason::EpochBudgetExhausted);
        mm.params().validate(PROB_TOL)?;

        // one M-step already matches the empirical symbol frequencies
        assert_abs_diff_eq!(symbol_marginal(&mm, 0), 3.0 / 7.0, epsilon = 1e-5);
        assert_abs_diff_eq!(symbol_marginal(&mm, 1), 4.0 / 7.0, epsilon = 1e-5);

        // the minority and majority symbols land in different states
        let states = mm.infer(&data)?;
        assert_eq!(states.len(), 7);
        assert_ne!(states[0], states[3], "seed {}", seed);
        assert_eq!(&states[..3], &[states[0]; 3]);
        assert_eq!(&states[3..], &[states[3]; 4]);
    }
    Ok(())
}

#[test]
fn epoch_likelihood_trace_does_not_decrease() -> anyhow::Result<()> {
    let data = Minibatches::new(&clustered_symbols(500), 64)?;
    let config = TrainConfig {
        max_epochs: 30,
        threshold: 0.0,
        ..Default::default()
    };

    for seed in 0..20 {
        let options = MixtureOptions {
            seed,
            ..MixtureOptions::new(3, 5)
        };
        let mut mm = MultinomialMixture::new(&options)?;
        let summary = mm.train(&data, &config)?;

        assert_eq!(summary.llik_trace.len(), summary.epochs);
        assert!(
            summary.llik_trace.windows(2).all(|w| w[1] >= w[0] - 1e-5),
            "seed {}: {:?}",
            seed,
            summary.llik_trace
        );
    }
    Ok(())
}

#[test]
fn marginal_likelihood_does_not_decrease() -> anyhow::Result<()> {
    let data = Minibatches::new(&clustered_symbols(500), 64)?;
    let mut mm = MultinomialMixture::new(&MixtureOptions::new(3, 5))?;

    let (mut prev, n) = mm.log_likelihood(&data)?;
    assert_eq!(n, 500);

    for _ in 0..8 {
        mm.run_epoch(&data)?;
        let (llik, _) = mm.log_likelihood(&data)?;
        assert!(llik >= prev - 1e-6, "{} < {}", llik, prev);
        prev = llik;
    }
    Ok(())
}

#[test]
fn parameters_stay_valid_every_epoch() -> anyhow::Result<()> {
    let data = Minibatches::new(&clustered_symbols(300), 17)?;
    let mut mm = MultinomialMixture::new(&MixtureOptions::new(6, 5))?;

    for _ in 0..5 {
        mm.run_epoch(&data)?;
        mm.params().validate(PROB_TOL)?;
        assert!(mm.params().prior().iter().all(|&p| p > 0.0));
        assert!(mm.params().emission().iter().all(|&p| p > 0.0));
    }
    Ok(())
}

#[test]
fn minibatch_partition_does_not_matter() -> anyhow::Result<()> {
    let symbols = clustered_symbols(240);
    let options = MixtureOptions {
        seed: 11,
        ..MixtureOptions::new(3, 5)
    };

    let mut small = MultinomialMixture::new(&options)?;
    let mut large = MultinomialMixture::new(&options)?;
    let mut whole = MultinomialMixture::new(&options)?;

    small.run_epoch(&Minibatches::new(&symbols, 7)?)?;
    large.run_epoch(&Minibatches::new(&symbols, 100)?)?;
    whole.run_epoch(&Minibatches::new(&symbols, symbols.len())?)?;

    assert_abs_diff_eq!(small.params().prior(), whole.params().prior(), epsilon = 1e-10);
    assert_abs_diff_eq!(large.params().prior(), whole.params().prior(), epsilon = 1e-10);
    assert_abs_diff_eq!(
        small.params().emission(),
        whole.params().emission(),
        epsilon = 1e-10
    );
    assert_abs_diff_eq!(
        large.params().emission(),
        whole.params().emission(),
        epsilon = 1e-10
    );
    Ok(())
}

#[test]
fn inference_is_read_only() -> anyhow::Result<()> {
    let data = Minibatches::new(&clustered_symbols(100), 9)?;
    let mut mm = MultinomialMixture::new(&MixtureOptions::new(2, 5))?;
    mm.train(&data, &TrainConfig::default())?;

    let before = mm.params().clone();
    let first = mm.infer(&data)?;
    let second = mm.infer(&data)?;

    assert_eq!(first, second);
    assert_eq!(first.len(), 100);
    assert!(first.iter().all(|&s| s < 2));
    assert_eq!(mm.params(), &before);
    Ok(())
}

#[test]
fn zero_epoch_budget_still_trains_once() -> anyhow::Result<()> {
    let data = Minibatches::new(&clustered_symbols(50), 8)?;
    let mut mm = MultinomialMixture::new(&MixtureOptions::new(2, 5))?;
    let config = TrainConfig {
        max_epochs: 0,
        ..Default::default()
    };
    let summary = mm.train(&data, &config)?;
    assert_eq!(summary.epochs, 1);
    assert_eq!(summary.stop, StopReason::EpochBudgetExhausted);
    assert_eq!(summary.llik_trace.len(), 1);
    Ok(())
}

#[test]
fn gzipped_symbol_file() -> anyhow::Result<()> {
    let symbols = clustered_symbols(90);
    let lines: Vec<Box<str>> = std::iter::once("# symbols".into())
        .chain(symbols.chunks(10).map(|row| {
            row.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" ")
                .into_boxed_str()
        }))
        .collect();

    let file = create_temp_dir_file("symbols.gz")?;
    let file = file.to_str().ok_or(anyhow::anyhow!("non-utf8 path"))?;
    write_lines(&lines, file)?;

    let from_file = LabelFileMinibatches::new(file, 13)?;
    let in_memory = Minibatches::new(&symbols, 13)?;

    let options = MixtureOptions {
        seed: 3,
        ..MixtureOptions::new(3, 5)
    };
    let mut a = MultinomialMixture::new(&options)?;
    let mut b = MultinomialMixture::new(&options)?;

    let config = TrainConfig {
        max_epochs: 3,
        ..Default::default()
    };
    a.train(&from_file, &config)?;
    b.train(&in_memory, &config)?;

    assert_eq!(a.params(), b.params());
    assert_eq!(a.infer(&from_file)?, b.infer(&in_memory)?);
    Ok(())
}
