/*!
Chain abstractions and the machinery that drives them.

A [`MarkovChain`] advances one iteration at a time. [`run_chain`] collects a
fixed number of iterations into an array, and [`ChainRunner`] runs every chain
of a [`HasChains`] sampler in parallel, optionally with progress bars.
*/

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2};
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::error::SamplerError;
use crate::stats::ChainTracker;

/// Iterations between refreshes of the progress bar message.
const MESSAGE_INTERVAL: usize = 100;

pub trait MarkovChain<T> {
    /// Error type of the underlying target density.
    type DensityError;

    /// Does one iteration of the chain, returning the new current state.
    fn step(&mut self) -> Result<T, SamplerError<Self::DensityError>>;

    /// Returns the current state without stepping.
    fn current_state(&self) -> T;
}

/// Runs `n_steps` iterations and returns every visited state.
///
/// Either all `n_steps` states are returned or the first error is.
pub fn run_chain<T, M>(
    chain: &mut M,
    n_steps: usize,
) -> Result<Array1<T>, SamplerError<M::DensityError>>
where
    M: MarkovChain<T>,
{
    let mut out = Vec::with_capacity(n_steps);
    for _ in 0..n_steps {
        out.push(chain.step()?);
    }
    Ok(Array1::from_vec(out))
}

/// Same as [`run_chain`], advancing `pb` once per iteration and showing the
/// acceptance rate over the recent iterations as its message.
pub fn run_chain_with_progress<T, M>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<Array1<T>, SamplerError<M::DensityError>>
where
    M: MarkovChain<T>,
    T: ToPrimitive,
{
    let mut out = Vec::with_capacity(n_steps);
    let mut tracker = ChainTracker::new(chain.current_state().to_f64().unwrap_or(f64::NAN));
    pb.set_length(n_steps as u64);

    for i in 0..n_steps {
        let x = chain.step()?;
        tracker.step(x.to_f64().unwrap_or(f64::NAN));
        out.push(x);
        pb.inc(1);
        if (i + 1) % MESSAGE_INTERVAL == 0 || i + 1 == n_steps {
            pb.set_message(format!("p(accept) {:.2}", tracker.stats().p_accept));
        }
    }

    Ok(Array1::from_vec(out))
}

/// A trait for "anything that owns multiple MarkovChains".
/// - `T` is the state type (e.g. f64).
/// - `Chain` is the MarkovChain type stored by this struct.
pub trait HasChains<T> {
    type Chain: MarkovChain<T> + Send;

    /// Returns a mutable reference to the vector of chains.
    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

/// Density error type of the chains owned by `H`.
pub type ChainError<T, H> = <<H as HasChains<T>>::Chain as MarkovChain<T>>::DensityError;

pub trait ChainRunner<T>: HasChains<T>
where
    T: Clone + Send + ToPrimitive,
{
    /// Runs all chains in parallel for `n_steps` iterations and drops the first
    /// `discard` of each. The result has shape `(n_chains, n_steps - discard)`.
    fn run(
        &mut self,
        n_steps: usize,
        discard: usize,
    ) -> Result<Array2<T>, SamplerError<ChainError<T, Self>>>
    where
        ChainError<T, Self>: Send,
    {
        if discard > n_steps {
            return Err(SamplerError::BurnInTooLong {
                burn_in: discard,
                n_steps,
            });
        }

        let runs: Vec<Array1<T>> = self
            .chains_mut()
            .par_iter_mut()
            .map(|chain| run_chain(chain, n_steps))
            .collect::<Result<_, _>>()?;

        log::info!(
            "Finished {} chain(s) of {} steps, discarding {} as burn-in",
            runs.len(),
            n_steps,
            discard
        );
        Ok(stack_kept(&runs, n_steps, discard))
    }

    /// Like [`ChainRunner::run`], drawing one progress bar per chain.
    fn run_progress(
        &mut self,
        n_steps: usize,
        discard: usize,
    ) -> Result<Array2<T>, SamplerError<ChainError<T, Self>>>
    where
        ChainError<T, Self>: Send,
    {
        if discard > n_steps {
            return Err(SamplerError::BurnInTooLong {
                burn_in: discard,
                n_steps,
            });
        }

        let multi = MultiProgress::new();
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        let runs: Vec<Array1<T>> = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| {
                let pb = multi.add(ProgressBar::new(n_steps as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(pb_style.clone());

                let samples = run_chain_with_progress(chain, n_steps, &pb);
                match &samples {
                    Ok(_) => pb.finish_with_message("Done!"),
                    Err(_) => pb.abandon_with_message("Failed"),
                }
                samples
            })
            .collect::<Result<_, _>>()?;

        Ok(stack_kept(&runs, n_steps, discard))
    }
}

impl<T: Clone + Send + ToPrimitive, H: HasChains<T>> ChainRunner<T> for H {}

fn stack_kept<T: Clone>(runs: &[Array1<T>], n_steps: usize, discard: usize) -> Array2<T> {
    let keep = n_steps - discard;
    Array2::from_shape_fn((runs.len(), keep), |(chain, i)| {
        runs[chain][discard + i].clone()
    })
}
