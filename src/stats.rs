//! Provides functions for computing MCMC statistics on scalar chains.

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rustfft::{num_complex::Complex, FftPlanner};
use std::collections::VecDeque;
use thiserror::Error;

/// Number of recent steps the windowed acceptance rate looks at.
const ACCEPT_WINDOW: usize = 100;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Cannot discard {burn_in} burn-in samples from {n} samples")]
    BurnInTooLong { burn_in: usize, n: usize },
    #[error("Expected at least {needed} samples, got {got}")]
    TooFewSamples { needed: usize, got: usize },
    #[error("Expected at least 2 chains, got {0}")]
    TooFewChains(usize),
    #[error("Chain has zero variance")]
    ZeroVariance,
    #[error("Samples contain NaN")]
    UndefinedOrder,
}

/// Online statistics of one chain: running moments and a windowed acceptance rate.
///
/// A step counts as accepted when the new state differs from the previous one.
/// Rejected Metropolis–Hastings steps repeat the previous state bit for bit, so
/// this recovers the acceptance rate from the trajectory alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTracker {
    n: u64,
    p_accept: f64,
    mean: f64,
    mean_sq: f64,
    last_state: f64,
    accept_queue: VecDeque<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub n: u64,
    pub p_accept: f64,
    pub mean: f64,
    pub sm2: f64,
}

impl ChainTracker {
    pub fn new(initial_state: f64) -> Self {
        Self {
            n: 0,
            p_accept: 0.0,
            mean: 0.0,
            mean_sq: 0.0,
            last_state: initial_state,
            accept_queue: VecDeque::with_capacity(ACCEPT_WINDOW + 1),
        }
    }

    pub fn step(&mut self, x: f64) {
        self.n += 1;

        let accepted = x.to_bits() != self.last_state.to_bits();
        self.accept_queue.push_back(accepted);
        if self.accept_queue.len() > ACCEPT_WINDOW {
            self.accept_queue.pop_front();
        }
        let n_accepted = self.accept_queue.iter().filter(|&&a| a).count();
        self.p_accept = n_accepted as f64 / self.accept_queue.len() as f64;
        self.last_state = x;

        let n = self.n as f64;
        self.mean = (self.mean * (n - 1.0) + x) / n;
        self.mean_sq = (self.mean_sq * (n - 1.0) + x * x) / n;
    }

    /// Unbiased sample variance; NaN until two states have been seen.
    pub fn sm2(&self) -> f64 {
        let n = self.n as f64;
        (self.mean_sq - self.mean * self.mean) * n / (n - 1.0)
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            n: self.n,
            p_accept: self.p_accept,
            mean: self.mean,
            sm2: self.sm2(),
        }
    }
}

/// Gelman–Rubin potential scale reduction from per-chain statistics.
pub fn collect_rhat(all_chain_stats: &[ChainStats]) -> Result<f64, StatsError> {
    let m = all_chain_stats.len();
    if m < 2 {
        return Err(StatsError::TooFewChains(m));
    }
    if let Some(short) = all_chain_stats.iter().find(|s| s.n < 2) {
        return Err(StatsError::TooFewSamples {
            needed: 2,
            got: short.n as usize,
        });
    }
    let means: Array1<f64> = all_chain_stats.iter().map(|s| s.mean).collect();
    let sm2s: Array1<f64> = all_chain_stats.iter().map(|s| s.sm2).collect();

    let w = sm2s.sum() / m as f64;
    if !(w > 0.0) {
        return Err(StatsError::ZeroVariance);
    }
    // Between-chain variance of the means, i.e. B / n.
    let b = means.var(1.0);
    let n = all_chain_stats.iter().map(|s| s.n as f64).sum::<f64>() / m as f64;
    Ok(((b + w * ((n - 1.0) / n)) / w).sqrt())
}

/// Gelman–Rubin R-hat for chains stored as rows of `chains`.
pub fn rhat(chains: ArrayView2<f64>) -> Result<f64, StatsError> {
    let n = chains.ncols();
    if n < 2 {
        return Err(StatsError::TooFewSamples { needed: 2, got: n });
    }
    let stats: Vec<ChainStats> = chains
        .outer_iter()
        .map(|row| {
            let mut tracker = ChainTracker::new(f64::NAN);
            row.iter().for_each(|&x| tracker.step(x));
            tracker.stats()
        })
        .collect();
    collect_rhat(&stats)
}

/// Summary of the samples kept after burn-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean and unbiased variance of `samples` after discarding the first `burn_in`.
pub fn summarize(samples: &[f64], burn_in: usize) -> Result<SampleSummary, StatsError> {
    if burn_in > samples.len() {
        return Err(StatsError::BurnInTooLong {
            burn_in,
            n: samples.len(),
        });
    }
    let kept = ArrayView1::from(&samples[burn_in..]);
    if kept.len() < 2 {
        return Err(StatsError::TooFewSamples {
            needed: 2,
            got: kept.len(),
        });
    }
    let min = *kept.min().map_err(|_| StatsError::UndefinedOrder)?;
    let max = *kept.max().map_err(|_| StatsError::UndefinedOrder)?;
    let mean = kept.sum() / kept.len() as f64;
    let variance = kept.var(1.0);
    Ok(SampleSummary {
        n: kept.len(),
        mean,
        variance,
        std: variance.sqrt(),
        min,
        max,
    })
}

/// Normalized autocorrelation at lags `0..samples.len()`, computed with an FFT.
pub fn autocorrelation(samples: &[f64]) -> Result<Vec<f64>, StatsError> {
    let n = samples.len();
    if n < 2 {
        return Err(StatsError::TooFewSamples { needed: 2, got: n });
    }
    let mean = samples.iter().sum::<f64>() / n as f64;

    // Zero-padding to at least 2n turns the circular correlation into a linear one.
    let size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&x| Complex::new(x - mean, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(size).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(size).process(&mut buffer);

    let acov0 = buffer[0].re;
    if acov0 <= 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    Ok(buffer[..n].iter().map(|c| c.re / acov0).collect())
}

/// Effective sample size of a single chain.
///
/// Autocorrelations are summed in adjacent pairs while the pair sums stay
/// positive (Geyer's initial positive sequence), with pair sums forced to be
/// non-increasing. The result is capped at `n log10(n)`.
pub fn effective_sample_size(samples: &[f64]) -> Result<f64, StatsError> {
    let rho = autocorrelation(samples)?;
    let n = samples.len();

    let mut tau = -1.0;
    let mut prev_pair = f64::INFINITY;
    for pair in rho.chunks_exact(2) {
        let pair_sum = (pair[0] + pair[1]).min(prev_pair);
        if pair_sum <= 0.0 {
            break;
        }
        tau += 2.0 * pair_sum;
        prev_pair = pair_sum;
    }

    let n = n as f64;
    let max_ess = n * n.log10().max(1.0);
    if tau <= 0.0 {
        return Ok(max_ess);
    }
    Ok((n / tau).min(max_ess))
}
