/*!
# Metropolis–Hastings Sampler

This module implements a random-walk Metropolis–Hastings sampler over a scalar
state. Candidates are formed by adding a symmetric, zero-centred offset to the
current state, so the proposal densities cancel and a move from `x` to `y` is
accepted with probability

\[
a = \min\left(1, \frac{\pi(y)}{\pi(x)}\right).
\]

## Overview

- **Target (`D`)**: any [`TargetDensity`]; evaluated at the current and the
  proposed state on every iteration.
- **Random source (`R`)**: any [`RandomSource`]; one offset and one uniform draw
  per iteration, in that order.
- **Single chain**: [`MHMarkovChain`] and the [`metropolis_hastings`] shortcut.
- **Parallel chains**: [`MetropolisHastings`] owns several independent chains
  that start at the same state and each carry their own seeded [`GaussianWalk`].

## Example Usage

```rust
use mini_metropolis::distributions::{Gaussian1D, GaussianWalk};
use mini_metropolis::metropolis_hastings::metropolis_hastings;

let target = Gaussian1D::<f64>::standard();
let mut rng = GaussianWalk::<f64>::new().set_seed(42);

let samples = metropolis_hastings(&target, 2.0, 0.0, 1_000, &mut rng).unwrap();
assert_eq!(samples.len(), 1_000);
```
*/

use num_traits::Float;
use rand::prelude::*;

use crate::config::SamplerConfig;
use crate::core::{HasChains, MarkovChain};
use crate::distributions::{GaussianWalk, RandomSource, TargetDensity};
use crate::error::SamplerError;

/// Acceptance probability of a move between states with densities `current`
/// and `proposed`.
///
/// When `current` is zero the ratio is undefined. A move into positive density
/// is then always accepted, and a move between two zero-density states never is.
///
/// [`MHMarkovChain`] accepts a move iff the returned probability is positive and
/// `u ≤ a`. The literal rule `u ≤ a` alone would also take a zero-probability
/// move on the single draw `u = 0`; here a move with `a = 0` is always rejected.
///
/// ```rust
/// use mini_metropolis::metropolis_hastings::acceptance_probability;
///
/// assert_eq!(acceptance_probability(0.5, 0.25), 0.5);
/// assert_eq!(acceptance_probability(0.5, 2.0), 1.0);
/// assert_eq!(acceptance_probability(0.0, 0.1), 1.0);
/// assert_eq!(acceptance_probability(0.0, 0.0), 0.0);
/// ```
pub fn acceptance_probability<T: Float>(current: T, proposed: T) -> T {
    if current > T::zero() {
        (proposed / current).min(T::one())
    } else if proposed > T::zero() {
        T::one()
    } else {
        T::zero()
    }
}

fn as_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Evaluates the target and checks that the result is finite and non-negative.
fn checked_density<T, D>(target: &D, x: T) -> Result<T, SamplerError<D::Error>>
where
    T: Float,
    D: TargetDensity<T>,
{
    let value = target.density(x).map_err(SamplerError::Density)?;
    if !value.is_finite() {
        return Err(SamplerError::NonFiniteDensity {
            x: as_f64(x),
            value: as_f64(value),
        });
    }
    if value < T::zero() {
        return Err(SamplerError::NegativeDensity {
            x: as_f64(x),
            value: as_f64(value),
        });
    }
    Ok(value)
}

/**
Runs a single chain of `n` Metropolis–Hastings iterations starting at `initial_state`.

The target and the random source are borrowed, so the caller keeps control of
the entropy stream. The returned vector has exactly `n` entries; `initial_state`
itself is not part of it.

# Errors

Fails before any iteration with [`SamplerError::InvalidScale`] or
[`SamplerError::NonFiniteInitialState`]. During sampling, density failures and
non-finite or negative density values abort the run and no samples are returned.

```rust
use mini_metropolis::distributions::{FnDensity, GaussianWalk};
use mini_metropolis::error::SamplerError;
use mini_metropolis::metropolis_hastings::metropolis_hastings;

let target = FnDensity(|x: f64| (-x.abs()).exp());
let mut rng = GaussianWalk::<f64>::new().set_seed(1);

assert!(metropolis_hastings(&target, 1.0, 0.0, 0, &mut rng).unwrap().is_empty());
assert!(matches!(
    metropolis_hastings(&target, 0.0, 0.0, 10, &mut rng),
    Err(SamplerError::InvalidScale(_))
));
```
*/
pub fn metropolis_hastings<T, D, R>(
    target: &D,
    scale: T,
    initial_state: T,
    n: usize,
    rng: &mut R,
) -> Result<Vec<T>, SamplerError<D::Error>>
where
    T: Float,
    D: TargetDensity<T> + ?Sized,
    R: RandomSource<T> + ?Sized,
{
    MHMarkovChain::new(target, scale, initial_state, rng)?.sample(n)
}

/**
A single random-walk Metropolis–Hastings chain.

The chain owns its target, its proposal scale, its current state and its random
source. Acceptance counters are kept for diagnostics.

# Examples

```rust
use mini_metropolis::core::MarkovChain;
use mini_metropolis::distributions::{Gaussian1D, GaussianWalk};
use mini_metropolis::metropolis_hastings::MHMarkovChain;

let target = Gaussian1D::<f64>::standard();
let rng = GaussianWalk::<f64>::new().set_seed(42);
let mut chain = MHMarkovChain::new(target, 2.0, 0.0, rng).unwrap();

let x = chain.step().unwrap();
assert_eq!(x, chain.current_state());
assert_eq!(chain.n_steps(), 1);
```
*/
#[derive(Debug, Clone)]
pub struct MHMarkovChain<T, D, R> {
    /// The target density to sample from.
    pub target: D,
    /// Scale of the symmetric proposal offset.
    pub scale: T,
    /// The current state of the chain.
    pub current_state: T,
    /// The chain's source of randomness.
    pub rng: R,
    n_steps: usize,
    n_accepted: usize,
}

impl<T, D, R> MHMarkovChain<T, D, R>
where
    T: Float,
    D: TargetDensity<T>,
    R: RandomSource<T>,
{
    /// Creates a chain at `initial_state`, validating the scale and the start.
    pub fn new(
        target: D,
        scale: T,
        initial_state: T,
        rng: R,
    ) -> Result<Self, SamplerError<D::Error>> {
        if !(scale.is_finite() && scale > T::zero()) {
            return Err(SamplerError::InvalidScale(as_f64(scale)));
        }
        if !initial_state.is_finite() {
            return Err(SamplerError::NonFiniteInitialState(as_f64(initial_state)));
        }
        Ok(Self {
            target,
            scale,
            current_state: initial_state,
            rng,
            n_steps: 0,
            n_accepted: 0,
        })
    }

    /**
    Runs `n` iterations and returns the visited states.

    On error the chain is put back into the state it had before the call, and
    none of the states produced so far are returned. Entropy consumed from the
    random source is not given back.
    */
    pub fn sample(&mut self, n: usize) -> Result<Vec<T>, SamplerError<D::Error>> {
        let checkpoint = (self.current_state, self.n_steps, self.n_accepted);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.step() {
                Ok(x) => out.push(x),
                Err(e) => {
                    (self.current_state, self.n_steps, self.n_accepted) = checkpoint;
                    log::debug!("Chain aborted after {} of {} steps: {}", out.len(), n, e);
                    return Err(e);
                }
            }
        }
        log::debug!(
            "Chain finished {} steps, acceptance rate {:.3}",
            n,
            self.acceptance_rate()
        );
        Ok(out)
    }

    /// Number of iterations performed so far.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Number of accepted proposals so far.
    pub fn n_accepted(&self) -> usize {
        self.n_accepted
    }

    /// Fraction of accepted proposals, `0.0` before the first iteration.
    pub fn acceptance_rate(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_steps as f64
        }
    }
}

impl<T, D, R> MarkovChain<T> for MHMarkovChain<T, D, R>
where
    T: Float,
    D: TargetDensity<T>,
    R: RandomSource<T>,
{
    type DensityError = D::Error;

    /**
    Performs one Metropolis–Hastings update.

    An offset `δ` and a uniform `u` are drawn, the candidate is `y = x + δ`, and
    the move is accepted iff `u ≤ min(1, π(y) / π(x))` and that probability is
    positive. A rejected step returns the previous state unchanged.
    */
    fn step(&mut self) -> Result<T, SamplerError<D::Error>> {
        let current = self.current_state;
        let proposed = current + self.rng.proposal_offset(self.scale);
        let u = self.rng.uniform();

        let current_density = checked_density(&self.target, current)?;
        let proposed_density = checked_density(&self.target, proposed)?;
        let accept_prob = acceptance_probability(current_density, proposed_density);

        self.n_steps += 1;
        // A zero-probability move is never taken, even for u = 0.
        if accept_prob > T::zero() && u <= accept_prob {
            self.current_state = proposed;
            self.n_accepted += 1;
        }
        Ok(self.current_state)
    }

    fn current_state(&self) -> T {
        self.current_state
    }
}

/**
Metropolis–Hastings with several independent chains.

All chains start at the same state and share the (immutable) target and scale.
Each chain owns a [`GaussianWalk`] seeded with `seed + i`, so chains never share
a random stream and runs are reproducible after [`MetropolisHastings::set_seed`].
Run them with [`ChainRunner`](crate::core::ChainRunner).

# Examples

```rust
use mini_metropolis::core::ChainRunner;
use mini_metropolis::distributions::Gaussian1D;
use mini_metropolis::metropolis_hastings::MetropolisHastings;

let target = Gaussian1D::<f64>::standard();
let mut mh = MetropolisHastings::new(target, 2.0, 0.0, 4).unwrap().set_seed(42);

// 1,000 steps per chain, the first 100 discarded.
let samples = mh.run(1_000, 100).unwrap();
assert_eq!(samples.shape(), &[4, 900]);
```
*/
#[derive(Debug, Clone)]
pub struct MetropolisHastings<T, D> {
    /// The target density shared by all chains.
    pub target: D,
    /// Scale of the symmetric proposal offset.
    pub scale: T,
    /// Starting state of every chain.
    pub initial_state: T,
    /// The independent Markov chains.
    pub chains: Vec<MHMarkovChain<T, D, GaussianWalk<T>>>,
    /// The global random seed.
    pub seed: u64,
}

impl<T, D> MetropolisHastings<T, D>
where
    T: Float,
    D: TargetDensity<T> + Clone,
    GaussianWalk<T>: RandomSource<T>,
{
    /// Creates `n_chains` chains at `initial_state`, seeded from entropy.
    pub fn new(
        target: D,
        scale: T,
        initial_state: T,
        n_chains: usize,
    ) -> Result<Self, SamplerError<D::Error>> {
        if n_chains == 0 {
            return Err(SamplerError::NoChains);
        }
        let seed = thread_rng().gen::<u64>();
        let chains = (0..n_chains)
            .map(|i| {
                let rng = GaussianWalk::new().set_seed(seed.wrapping_add(i as u64));
                MHMarkovChain::new(target.clone(), scale, initial_state, rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target,
            scale,
            initial_state,
            chains,
            seed,
        })
    }

    /// Creates a sampler from a [`SamplerConfig`], applying its seed if set.
    pub fn from_config(target: D, config: &SamplerConfig) -> Result<Self, SamplerError<D::Error>> {
        config.validate().map_err(SamplerError::relabel)?;
        let scale = T::from(config.scale).ok_or(SamplerError::InvalidScale(config.scale))?;
        let initial_state = T::from(config.initial_state)
            .ok_or(SamplerError::NonFiniteInitialState(config.initial_state))?;

        let mh = Self::new(target, scale, initial_state, config.n_chains)?;
        Ok(match config.seed {
            Some(seed) => mh.set_seed(seed),
            None => mh,
        })
    }

    /**
    Sets a new global seed; chain `i` is re-seeded with `seed + i`.

    ```rust
    use mini_metropolis::distributions::Gaussian1D;
    use mini_metropolis::metropolis_hastings::MetropolisHastings;

    let mh = MetropolisHastings::new(Gaussian1D::<f64>::standard(), 1.0, 0.0, 2)
        .unwrap()
        .set_seed(42);
    assert_eq!(mh.seed, 42);
    ```
    */
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        for (i, chain) in self.chains.iter_mut().enumerate() {
            chain.rng = GaussianWalk::new().set_seed(seed.wrapping_add(i as u64));
        }
        self
    }

    /// Overall acceptance rate across chains.
    pub fn acceptance_rate(&self) -> f64 {
        let steps: usize = self.chains.iter().map(|c| c.n_steps()).sum();
        let accepted: usize = self.chains.iter().map(|c| c.n_accepted()).sum();
        if steps == 0 {
            0.0
        } else {
            accepted as f64 / steps as f64
        }
    }
}

impl<T, D> HasChains<T> for MetropolisHastings<T, D>
where
    T: Float + Send,
    D: TargetDensity<T> + Clone + Send,
    GaussianWalk<T>: RandomSource<T>,
{
    type Chain = MHMarkovChain<T, D, GaussianWalk<T>>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}
