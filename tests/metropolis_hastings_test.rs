//! End-to-end checks of the single-chain sampler: length, determinism,
//! stationarity for a standard normal target, and the accept/reject edge cases
//! driven by a scripted random source.

use std::collections::VecDeque;

use mini_metropolis::distributions::{
    FnDensity, Gaussian1D, GaussianWalk, Normalized, RandomSource, TryFnDensity,
};
use mini_metropolis::error::SamplerError;
use mini_metropolis::ks_test::one_sample_ks_test;
use mini_metropolis::metropolis_hastings::{metropolis_hastings, MHMarkovChain};
use mini_metropolis::stats::summarize;

/// Random source replaying fixed offsets and uniforms, ignoring the scale.
struct Scripted {
    offsets: VecDeque<f64>,
    uniforms: VecDeque<f64>,
}

impl Scripted {
    fn new(offsets: &[f64], uniforms: &[f64]) -> Self {
        Self {
            offsets: offsets.iter().copied().collect(),
            uniforms: uniforms.iter().copied().collect(),
        }
    }
}

impl RandomSource<f64> for Scripted {
    fn proposal_offset(&mut self, _scale: f64) -> f64 {
        self.offsets.pop_front().expect("Ran out of scripted offsets")
    }

    fn uniform(&mut self) -> f64 {
        self.uniforms.pop_front().expect("Ran out of scripted uniforms")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("density undefined at {0}")]
struct Undefined(f64);

#[test]
fn length_matches_requested_iterations() {
    let target = Gaussian1D::<f64>::standard();
    for n in [0, 1, 2, 17, 1_000] {
        let mut rng = GaussianWalk::<f64>::new().set_seed(n as u64);
        let samples = metropolis_hastings(&target, 2.0, 0.0, n, &mut rng).unwrap();
        assert_eq!(samples.len(), n);
    }
}

#[test]
fn zero_iterations_consume_no_entropy() {
    let target = Gaussian1D::<f64>::standard();
    let mut rng = Scripted::new(&[], &[]);
    let samples = metropolis_hastings(&target, 2.0, 3.0, 0, &mut rng).unwrap();
    assert!(samples.is_empty());
}

#[test]
fn seeded_runs_are_bit_identical() {
    let target = Gaussian1D::<f64>::standard();
    let run = |seed| {
        let mut rng = GaussianWalk::<f64>::new().set_seed(seed);
        metropolis_hastings(&target, 2.0, 0.0, 5_000, &mut rng).unwrap()
    };
    let a = run(42);
    let b = run(42);
    let c = run(43);
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    assert_ne!(a, c);
}

#[test]
fn standard_normal_is_stationary() {
    const N: usize = 100_000;
    const BURNIN: usize = 1_000;

    let target = Gaussian1D::<f64>::standard();
    for seed in [1, 2, 3, 4, 5] {
        let mut rng = GaussianWalk::<f64>::new().set_seed(seed);
        let samples = metropolis_hastings(&target, 2.0, 0.0, N, &mut rng).unwrap();
        let summary = summarize(&samples, BURNIN).unwrap();
        assert!(
            summary.mean.abs() < 0.05,
            "seed {seed}: mean {} too far from 0",
            summary.mean
        );
        assert!(
            (summary.variance - 1.0).abs() < 0.1,
            "seed {seed}: variance {} too far from 1",
            summary.variance
        );
    }
}

#[test]
fn thinned_chain_matches_analytic_cdf() {
    let target = Gaussian1D::<f64>::standard();
    let mut rng = GaussianWalk::<f64>::new().set_seed(2024);
    let samples = metropolis_hastings(&target, 2.0, 0.0, 101_000, &mut rng).unwrap();
    // Thinning keeps the draws close enough to independent for the KS p-value.
    let thinned: Vec<f64> = samples[1_000..].iter().step_by(50).copied().collect();
    let result = one_sample_ks_test(&thinned, |x| target.cdf(x), 0.001).unwrap();
    assert!(!result.is_rejected, "{result:?}");
}

#[test]
fn constant_density_accepts_every_proposal() {
    let flat = FnDensity(|_x: f64| 0.3);
    let offsets = [0.5, -1.25, 2.0, 0.125];
    let mut rng = Scripted::new(&offsets, &[0.99, 0.5, 0.0, 0.999_999]);
    let samples = metropolis_hastings(&flat, 1.0, 1.0, 4, &mut rng).unwrap();

    let mut expected = Vec::new();
    let mut x = 1.0;
    for d in offsets {
        x += d;
        expected.push(x);
    }
    assert_eq!(samples, expected);
}

#[test]
fn zero_density_start_escapes_regardless_of_uniform() {
    let half_line = FnDensity(|x: f64| if x > 0.0 { (-x).exp() } else { 0.0 });
    // u = 0.999999 would reject almost any move with a finite ratio.
    let mut rng = Scripted::new(&[1.5], &[0.999_999]);
    let samples = metropolis_hastings(&half_line, 1.0, -1.0, 1, &mut rng).unwrap();
    assert_eq!(samples, vec![0.5]);
}

#[test]
fn zero_density_to_zero_density_stays_put() {
    let half_line = FnDensity(|x: f64| if x > 0.0 { 1.0 } else { 0.0 });
    let mut rng = Scripted::new(&[-0.5, 0.25], &[0.0, 0.0]);
    let samples = metropolis_hastings(&half_line, 1.0, -2.0, 2, &mut rng).unwrap();
    assert_eq!(samples, vec![-2.0, -2.0]);
}

#[test]
fn rejection_preserves_state_exactly() {
    let target = Gaussian1D::<f64>::standard();
    let x0 = 0.1 + 0.2; // not exactly representable
    // Moving away from the mode has ratio < 1; u = 1 rejects.
    let mut rng = Scripted::new(&[1.0, 3.0], &[1.0, 1.0]);
    let samples = metropolis_hastings(&target, 1.0, x0, 2, &mut rng).unwrap();
    assert_eq!(samples[0].to_bits(), x0.to_bits());
    assert_eq!(samples[1].to_bits(), x0.to_bits());
}

#[test]
fn uniform_equal_to_acceptance_probability_accepts() {
    // pi(x) = 2, pi(y) = 1: a = 0.5 exactly.
    let step = FnDensity(|x: f64| if x < 1.0 { 2.0 } else { 1.0 });
    let mut rng = Scripted::new(&[2.0, -2.0], &[0.5, 0.5]);
    let samples = metropolis_hastings(&step, 1.0, 0.0, 2, &mut rng).unwrap();
    assert_eq!(samples, vec![2.0, 0.0]);
}

#[test]
fn invalid_scale_fails_before_sampling() {
    let target = Gaussian1D::<f64>::standard();
    for scale in [0.0, -0.5] {
        let mut rng = Scripted::new(&[], &[]);
        let res = metropolis_hastings(&target, scale, 0.0, 10, &mut rng);
        assert!(matches!(res, Err(SamplerError::InvalidScale(s)) if s == scale));
    }
}

#[test]
fn non_finite_density_is_reported() {
    let blows_up = FnDensity(|x: f64| if x > 1.0 { f64::INFINITY } else { 1.0 });
    let mut rng = Scripted::new(&[0.5, 1.0], &[0.0, 0.0]);
    let res = metropolis_hastings(&blows_up, 1.0, 0.0, 5, &mut rng);
    assert!(matches!(
        res,
        Err(SamplerError::NonFiniteDensity { x, value }) if x == 1.5 && value == f64::INFINITY
    ));

    let nan = FnDensity(|_x: f64| f64::NAN);
    let mut rng = Scripted::new(&[0.5], &[0.0]);
    let res = metropolis_hastings(&nan, 1.0, 0.0, 1, &mut rng);
    assert!(matches!(res, Err(SamplerError::NonFiniteDensity { .. })));
}

#[test]
fn negative_density_is_reported() {
    let negative = FnDensity(|x: f64| x);
    let mut rng = Scripted::new(&[0.5], &[0.0]);
    let res = metropolis_hastings(&negative, 1.0, -1.0, 1, &mut rng);
    assert!(matches!(
        res,
        Err(SamplerError::NegativeDensity { x, value }) if x == -1.0 && value == -1.0
    ));
}

#[test]
fn density_errors_propagate_unchanged_and_discard_partial_output() {
    let target = TryFnDensity::new(|x: f64| if x < 2.0 { Ok(1.0) } else { Err(Undefined(x)) });
    let mut rng = Scripted::new(&[1.0, 1.0, 1.0], &[0.0, 0.0, 0.0]);
    let mut chain = MHMarkovChain::new(&target, 1.0, 0.0, &mut rng).unwrap();

    match chain.sample(3) {
        Err(SamplerError::Density(Undefined(x))) => assert_eq!(x, 2.0),
        other => panic!("Expected the density error, got {other:?}"),
    }
    // The chain is rolled back to where it started.
    assert_eq!(chain.current_state, 0.0);
    assert_eq!(chain.n_steps(), 0);
}
